//! Linter configuration file (.azsec.yml)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use azsec_core::{LintConfig, Rule, RuleConfig};
use serde::{Deserialize, Serialize};

use super::error::LinterError;
use crate::cli::LintCommand;

pub const DEFAULT_CONFIG_FILES: [&str; 2] = [".azsec.yml", ".azsec.yaml"];
pub const RECOMMENDED_PRESET: &str = "recommended";

/// Written by `azsec init`
pub const STARTER_CONFIG: &str = r#"# azsec configuration
# Rule documentation: https://github.com/pregress/tflint-ruleset-azurerm-security/tree/main/docs/rules

extends: recommended

rules:
  # Opt-in rules
  azurerm_key_vault_enable_rbac_authorization: false
  azurerm_key_vault_public_network_access_enabled: false

  # Severity overrides
  azurerm_mssql_firewall_rule_all_allowed: error
"#;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Preset the file builds on; only `recommended` exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(default)]
    pub disabled_by_default: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only: Vec<String>,

    /// Rule configurations keyed by rule name
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

impl ConfigFile {
    pub fn from_file(path: &Path) -> Result<Self, LinterError> {
        let content = fs::read_to_string(path)
            .map_err(|e| LinterError::ConfigLoad { path: path.to_path_buf(), message: e.to_string() })?;
        Self::from_yaml(&content).map_err(|message| LinterError::ConfigLoad { path: path.to_path_buf(), message })
    }

    pub fn from_yaml(content: &str) -> Result<Self, String> {
        serde_yml::from_str(content).map_err(|e| format!("Failed to parse YAML config: {e}"))
    }

    /// First default configuration file found in `directory`
    pub fn find_default(directory: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES.iter().map(|name| directory.join(name)).find(|path| path.is_file())
    }

    /// Load the explicit configuration, else the default file in
    /// `directory`, else nothing. Returns the path the file was read from.
    pub fn load(config_path: Option<&Path>, directory: &Path) -> Result<Option<(PathBuf, Self)>, LinterError> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => match Self::find_default(directory) {
                Some(path) => path,
                None => return Ok(None),
            },
        };
        let file = Self::from_file(&path)?;
        Ok(Some((path, file)))
    }

    /// Resolve `extends` against the available rules
    pub fn into_lint_config(self, rules: &[Box<dyn Rule>]) -> Result<LintConfig, String> {
        let mut config = LintConfig { disabled_by_default: self.disabled_by_default, only: self.only, rules: self.rules };
        match self.extends.as_deref() {
            None => {}
            Some(RECOMMENDED_PRESET) => config.extend(LintConfig::recommended(rules)),
            Some(other) => return Err(format!("unknown preset '{other}', expected '{RECOMMENDED_PRESET}'")),
        }
        Ok(config)
    }
}

/// Apply command line rule selection on top of the file configuration
pub fn apply_overrides(config: &mut LintConfig, cmd: &LintCommand) {
    for name in &cmd.enabled_rules {
        config.enable(name.clone());
    }
    for name in &cmd.disabled_rules {
        config.disable(name.clone());
    }
    config.only.extend(cmd.only_rules.iter().cloned());
}

#[cfg(test)]
mod tests {
    use azsec_core::{Level, Severity};
    use azsec_rules::all_rules;

    use super::*;

    #[test]
    fn parses_every_rule_config_form() {
        let file = ConfigFile::from_yaml(
            r#"
extends: recommended
rules:
  azurerm_key_vault_public_network_access_enabled: true
  azurerm_mssql_server_public_network_access_enabled: false
  azurerm_redis_cache_non_ssl_port_enabled: error
  azurerm_storage_account_unsecure_tls: "off"
  azurerm_key_vault_network_acls_default_deny:
    severity: notice
"#,
        )
        .expect("valid yaml");

        assert_eq!(file.extends.as_deref(), Some("recommended"));
        assert_eq!(
            file.rules.get("azurerm_key_vault_public_network_access_enabled"),
            Some(&RuleConfig::Enabled(true))
        );
        assert_eq!(
            file.rules.get("azurerm_mssql_server_public_network_access_enabled"),
            Some(&RuleConfig::Enabled(false))
        );
        assert_eq!(
            file.rules.get("azurerm_redis_cache_non_ssl_port_enabled"),
            Some(&RuleConfig::Level(Level::Error))
        );
        assert_eq!(file.rules.get("azurerm_storage_account_unsecure_tls"), Some(&RuleConfig::Level(Level::Off)));
        assert_eq!(
            file.rules.get("azurerm_key_vault_network_acls_default_deny"),
            Some(&RuleConfig::Full { enabled: None, severity: Some(Severity::Notice) })
        );
    }

    #[test]
    fn extends_fills_in_unmentioned_rules() {
        let rules = all_rules();
        let file = ConfigFile::from_yaml("extends: recommended\nrules:\n  azurerm_redis_cache_non_ssl_port_enabled: error\n")
            .expect("valid yaml");
        let config = file.into_lint_config(&rules).expect("known preset");

        assert_eq!(config.rules.len(), rules.len());
        assert_eq!(
            config.get_rule_config("azurerm_redis_cache_non_ssl_port_enabled"),
            Some(&RuleConfig::Level(Level::Error))
        );
        assert_eq!(
            config.get_rule_config("azurerm_key_vault_enable_rbac_authorization"),
            Some(&RuleConfig::Level(Level::Off))
        );
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let file = ConfigFile { extends: Some("strict".to_string()), ..ConfigFile::default() };
        assert!(file.into_lint_config(&all_rules()).is_err());
    }

    #[test]
    fn default_file_is_found_in_the_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(ConfigFile::load(None, dir.path()).expect("no file"), None);

        fs::write(dir.path().join(".azsec.yaml"), "disabled_by_default: true\n").expect("write");
        let (path, loaded) = ConfigFile::load(None, dir.path()).expect("load").expect("found");
        assert_eq!(path, dir.path().join(".azsec.yaml"));
        assert!(loaded.disabled_by_default);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("custom.yml");
        assert!(matches!(ConfigFile::load(Some(&missing), dir.path()), Err(LinterError::ConfigLoad { .. })));
    }

    #[test]
    fn starter_template_extends_the_recommended_preset() {
        let file = ConfigFile::from_yaml(STARTER_CONFIG).expect("valid template");
        assert_eq!(file.extends.as_deref(), Some(RECOMMENDED_PRESET));
        assert!(file.into_lint_config(&all_rules()).is_ok());
    }
}
