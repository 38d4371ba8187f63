//! Which rules run, and at what severity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::errors::ConfigError;
use crate::issue::Severity;
use crate::rule::Rule;

/// A severity, or `off`
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Deserialize, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[serde(alias = "none")]
    #[strum(to_string = "off", serialize = "none")]
    Off,
    #[serde(alias = "info")]
    #[strum(to_string = "notice", serialize = "info")]
    Notice,
    #[serde(alias = "warn")]
    #[strum(to_string = "warning", serialize = "warn")]
    Warning,
    Error,
}

impl Level {
    pub fn severity(self) -> Option<Severity> {
        match self {
            Level::Off => None,
            Level::Notice => Some(Severity::Notice),
            Level::Warning => Some(Severity::Warning),
            Level::Error => Some(Severity::Error),
        }
    }
}

impl From<Severity> for Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Notice => Level::Notice,
            Severity::Warning => Level::Warning,
            Severity::Error => Level::Error,
        }
    }
}

/// Per-rule setting
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RuleConfig {
    /// `rule: false`
    Enabled(bool),
    /// `rule: warning` or `rule: off`
    Level(Level),
    /// `rule: { enabled: true, severity: error }`
    Full {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
}

impl RuleConfig {
    /// Effective severity for a rule whose default is `default`, `None` when disabled
    fn apply(&self, default: Severity) -> Option<Severity> {
        match self {
            RuleConfig::Enabled(enabled) => enabled.then_some(default),
            RuleConfig::Level(level) => level.severity(),
            RuleConfig::Full { enabled, severity } => {
                enabled.unwrap_or(true).then(|| severity.unwrap_or(default))
            }
        }
    }
}

/// Lint configuration.
///
/// Precedence, highest first: the `only` list, per-rule settings,
/// `disabled_by_default`, the rule's own default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LintConfig {
    #[serde(default)]
    pub disabled_by_default: bool,
    /// When non-empty, nothing else runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only: Vec<String>,
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

impl LintConfig {
    /// Every rule at its default setting
    pub fn recommended(rules: &[Box<dyn Rule>]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                let level = if rule.enabled() { Level::from(rule.severity()) } else { Level::Off };
                (rule.name().to_string(), RuleConfig::Level(level))
            })
            .collect();
        Self { disabled_by_default: false, only: vec![], rules }
    }

    /// Fill in settings this configuration leaves unspecified from `base`
    pub fn extend(&mut self, base: LintConfig) {
        for (name, config) in base.rules {
            self.rules.entry(name).or_insert(config);
        }
    }

    pub fn enable(&mut self, name: impl Into<String>) {
        self.rules.insert(name.into(), RuleConfig::Enabled(true));
    }

    pub fn disable(&mut self, name: impl Into<String>) {
        self.rules.insert(name.into(), RuleConfig::Enabled(false));
    }

    pub fn get_rule_config(&self, name: &str) -> Option<&RuleConfig> {
        self.rules.get(name)
    }

    pub fn is_rule_disabled(&self, rule: &dyn Rule) -> bool {
        self.get_rule_severity(rule).is_none()
    }

    /// Severity `rule` runs at, or `None` when it does not run
    pub fn get_rule_severity(&self, rule: &dyn Rule) -> Option<Severity> {
        let configured = self.get_rule_config(rule.name());
        if !self.only.is_empty() {
            if !self.only.iter().any(|name| name == rule.name()) {
                return None;
            }
            return Some(configured.and_then(|c| c.apply(rule.severity())).unwrap_or(rule.severity()));
        }
        match configured {
            Some(config) => config.apply(rule.severity()),
            None if self.disabled_by_default => None,
            None => rule.enabled().then(|| rule.severity()),
        }
    }

    /// Reject settings for rules that do not exist
    pub fn validate<'a>(&self, known: impl IntoIterator<Item = &'a str>) -> Result<(), ConfigError> {
        let known: Vec<&str> = known.into_iter().collect();
        for name in self.rules.keys().chain(self.only.iter()) {
            if !known.contains(&name.as_str()) {
                return Err(ConfigError::UnknownRule(name.clone()));
            }
        }
        Ok(())
    }
}
