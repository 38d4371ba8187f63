//! The rule capability and the rule set that runs it

use log::{debug, warn};

use crate::config::LintConfig;
use crate::document::Document;
use crate::errors::{CheckError, ConfigError};
use crate::issue::{Issue, Severity};

/// A single policy check.
///
/// Checks are pure functions of the document: they share no state, so any
/// number of them may run over the same document concurrently.
pub trait Rule: Send + Sync {
    /// Stable identifier, also the key used in configuration files
    fn name(&self) -> &str;

    fn severity(&self) -> Severity;

    /// Whether the rule runs when the configuration says nothing about it
    fn enabled(&self) -> bool;

    /// Documentation URL
    fn link(&self) -> Option<String> {
        None
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError>;
}

/// A rule that aborted instead of completing its check
#[derive(Debug, Clone)]
pub struct RuleFailure {
    pub rule: String,
    pub error: CheckError,
}

/// Outcome of running a rule set over a document
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    /// Findings, grouped by rule in rule set order, each group in insertion order
    pub issues: Vec<Issue>,
    pub failures: Vec<RuleFailure>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.failures.is_empty()
    }

    /// Whether any finding is at least as severe as `minimum`
    pub fn has_issues_at_or_above(&self, minimum: Severity) -> bool {
        self.issues.iter().any(|issue| issue.severity >= minimum)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|issue| issue.severity == severity).count()
    }
}

/// A rule selected to run, with its effective severity
pub struct ActiveRule<'a> {
    pub rule: &'a dyn Rule,
    pub severity: Severity,
}

/// Named, versioned collection of rules
pub struct RuleSet {
    name: String,
    version: String,
    rules: Vec<Box<dyn Rule>>,
}

pub struct RuleSetBuilder {
    name: String,
    version: String,
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSetBuilder {
    pub fn rule(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Box<dyn Rule>>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> RuleSet {
        RuleSet { name: self.name, version: self.version, rules: self.rules }
    }
}

impl RuleSet {
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> RuleSetBuilder {
        RuleSetBuilder { name: name.into(), version: version.into(), rules: vec![] }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&dyn Rule> {
        self.rules.iter().find(|rule| rule.name() == name).map(|rule| rule.as_ref())
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name())
    }

    /// Rules that run under `config`, in rule set order
    pub fn configure(&self, config: &LintConfig) -> Result<Vec<ActiveRule<'_>>, ConfigError> {
        config.validate(self.rule_names())?;
        Ok(self
            .rules
            .iter()
            .filter_map(|rule| {
                let severity = config.get_rule_severity(rule.as_ref())?;
                Some(ActiveRule { rule: rule.as_ref(), severity })
            })
            .collect())
    }

    /// Run every active rule over `document`.
    ///
    /// A rule that fails is recorded in [`LintReport::failures`]; the others
    /// still run.
    pub fn check(&self, document: &Document, config: &LintConfig) -> Result<LintReport, ConfigError> {
        let mut report = LintReport::default();
        for active in self.configure(config)? {
            let name = active.rule.name();
            match active.rule.check(document) {
                Ok(issues) => {
                    debug!("{name}: {} issue(s)", issues.len());
                    report.issues.extend(issues.into_iter().map(|mut issue| {
                        issue.severity = active.severity;
                        issue
                    }));
                }
                Err(error) => {
                    warn!("{name} aborted: {error}");
                    report.failures.push(RuleFailure { rule: name.to_string(), error });
                }
            }
        }
        Ok(report)
    }
}
