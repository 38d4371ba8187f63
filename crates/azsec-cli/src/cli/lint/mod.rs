//! The `lint`, `rules` and `init` commands

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use azsec_core::LintConfig;
use azsec_rules::rule_set;

pub mod config;
pub mod error;
pub mod formatter;
pub mod workspace;

pub use config::ConfigFile;
pub use error::LinterError;
pub use formatter::{get_formatter, OutputFormatter};

use super::{Context, LintCommand, RulesOutputFormat};

/// How a successful command should exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintOutcome {
    Clean,
    /// Issues at or above the failure threshold were reported
    IssuesFound,
    /// At least one rule did not complete
    RulesFailed,
}

pub fn run_lint(cmd: &LintCommand, ctx: &Context) -> Result<LintOutcome, LinterError> {
    let rules = rule_set();
    let working_directory = std::env::current_dir()?;
    let config = resolve_config(cmd, &working_directory, &rules)?;

    let files = workspace::discover_files(&cmd.directory)?;
    ctx.try_log(|logger| info!(logger, "Linting {} file(s) in {}", files.len(), cmd.directory.display()));
    let document = workspace::load_document(&cmd.directory, &files)?;

    let report = rules.check(&document, &config)?;

    let colors = !cmd.no_color && console::colors_enabled();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    get_formatter(cmd.format, colors).format(&report, &mut out)?;
    out.flush()?;

    let outcome = if !report.failures.is_empty() {
        LintOutcome::RulesFailed
    } else if report.has_issues_at_or_above(cmd.minimum_failure_severity) {
        LintOutcome::IssuesFound
    } else {
        LintOutcome::Clean
    };
    Ok(outcome)
}

/// Configuration file (or none) merged with command line overrides
fn resolve_config(
    cmd: &LintCommand,
    working_directory: &Path,
    rules: &azsec_core::RuleSet,
) -> Result<LintConfig, LinterError> {
    let mut config = match ConfigFile::load(cmd.config_path.as_deref(), working_directory)? {
        Some((path, file)) => file
            .into_lint_config(rules.rules())
            .map_err(|message| LinterError::ConfigLoad { path, message })?,
        None => LintConfig::default(),
    };
    config::apply_overrides(&mut config, cmd);
    Ok(config)
}

pub fn list_rules(format: RulesOutputFormat) -> Result<(), LinterError> {
    let rules = rule_set();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_rules(&rules, format, &mut out)?;
    out.flush()?;
    Ok(())
}

fn write_rules(rules: &azsec_core::RuleSet, format: RulesOutputFormat, out: &mut dyn Write) -> Result<(), LinterError> {
    match format {
        RulesOutputFormat::Table => {
            writeln!(out, "{} {}", rules.name(), rules.version())?;
            let width = rules.rule_names().map(str::len).max().unwrap_or_default();
            for rule in rules.rules() {
                let enabled = if rule.enabled() { "enabled" } else { "disabled" };
                writeln!(out, "  {:<width$}  {:<7}  {enabled}", rule.name(), rule.severity().as_ref())?;
            }
        }
        RulesOutputFormat::Json => {
            let output = serde_json::json!({
                "name": rules.name(),
                "version": rules.version(),
                "rules": rules.rules().iter().map(|rule| {
                    serde_json::json!({
                        "name": rule.name(),
                        "severity": rule.severity(),
                        "enabled": rule.enabled(),
                        "link": rule.link(),
                    })
                }).collect::<Vec<_>>(),
            });
            serde_json::to_writer_pretty(&mut *out, &output)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn init_config(force: bool, ctx: &Context) -> Result<(), LinterError> {
    let path = PathBuf::from(config::DEFAULT_CONFIG_FILES[0]);
    write_starter_config(&path, force)?;
    ctx.try_log(|logger| info!(logger, "Created {} with recommended settings", path.display()));
    Ok(())
}

fn write_starter_config(path: &Path, force: bool) -> Result<(), LinterError> {
    if path.exists() && !force {
        return Err(LinterError::ConfigExists(path.to_path_buf()));
    }
    fs::write(path, config::STARTER_CONFIG)?;
    Ok(())
}
