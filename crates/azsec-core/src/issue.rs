//! Findings emitted by rule checks

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::document::SourceRange;
use crate::rule::Rule;

/// How serious a finding is, from least to most severe
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRefStr,      // Provides as_ref() -> &str
    Display,       // Provides to_string()
    EnumString,    // Provides from_str()
    IntoStaticStr, // Provides into() -> &'static str
    EnumIter,      // Provides iter() over all variants
    Deserialize,
    Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "info")]
    #[strum(to_string = "notice", serialize = "info")]
    Notice,
    #[serde(alias = "warn")]
    #[strum(to_string = "warning", serialize = "warn")]
    Warning,
    Error,
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub range: SourceRange,
    pub link: Option<String>,
}

/// Append-only accumulator of one rule's findings.
///
/// Issues come back in insertion order; nothing is deduplicated.
pub struct IssueSink {
    rule: String,
    severity: Severity,
    link: Option<String>,
    issues: Vec<Issue>,
}

impl IssueSink {
    pub fn for_rule(rule: &dyn Rule) -> Self {
        Self { rule: rule.name().to_string(), severity: rule.severity(), link: rule.link(), issues: vec![] }
    }

    pub fn record(&mut self, message: impl Into<String>, range: &SourceRange) {
        self.issues.push(Issue {
            rule: self.rule.clone(),
            severity: self.severity,
            message: message.into(),
            range: range.clone(),
            link: self.link.clone(),
        });
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}
