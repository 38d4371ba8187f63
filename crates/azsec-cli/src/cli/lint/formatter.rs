//! Output formatting for lint reports

use std::collections::BTreeMap;
use std::io::{self, Write};

use azsec_core::{Issue, LintReport, RuleFailure, Severity, SourceRange};
use console::style;

use super::error::LinterError;
use crate::cli::LintOutputFormat;

pub trait OutputFormatter {
    fn format(&self, report: &LintReport, out: &mut dyn Write) -> Result<(), LinterError>;
}

pub fn get_formatter(format: LintOutputFormat, colors: bool) -> Box<dyn OutputFormatter> {
    match format {
        LintOutputFormat::Stylish => Box::new(StylishFormatter { colors }),
        LintOutputFormat::Compact => Box::new(CompactFormatter),
        LintOutputFormat::Json => Box::new(JsonFormatter),
        LintOutputFormat::Quickfix => Box::new(QuickfixFormatter),
    }
}

pub struct StylishFormatter {
    pub colors: bool,
}

impl StylishFormatter {
    fn severity_label(&self, severity: Severity) -> String {
        let label = style(format!("{:<7}", severity.as_ref())).force_styling(self.colors);
        match severity {
            Severity::Error => label.red().bold(),
            Severity::Warning => label.yellow().bold(),
            Severity::Notice => label.cyan(),
        }
        .to_string()
    }
}

impl OutputFormatter for StylishFormatter {
    fn format(&self, report: &LintReport, out: &mut dyn Write) -> Result<(), LinterError> {
        if report.is_clean() {
            writeln!(out, "{}", style("✓ No issues found!").green().force_styling(self.colors))?;
            return Ok(());
        }

        let mut by_file: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
        for issue in &report.issues {
            by_file.entry(&*issue.range.file).or_default().push(issue);
        }

        for (file, issues) in by_file {
            writeln!(out, "{}", style(file).underlined().force_styling(self.colors))?;
            for issue in issues {
                let position = format!("{}:{}", issue.range.start.line, issue.range.start.column);
                writeln!(
                    out,
                    "  {position:<8} {}  {}  {}",
                    self.severity_label(issue.severity),
                    issue.message,
                    style(&issue.rule).dim().force_styling(self.colors)
                )?;
            }
            writeln!(out)?;
        }

        for failure in &report.failures {
            writeln!(
                out,
                "{} rule {} did not complete: {}",
                style("failure:").red().bold().force_styling(self.colors),
                failure.rule,
                failure.error
            )?;
        }

        let summary = format!(
            "✖ {} problem(s) ({} error(s), {} warning(s), {} notice(s))",
            report.issues.len(),
            report.count(Severity::Error),
            report.count(Severity::Warning),
            report.count(Severity::Notice)
        );
        writeln!(out, "{}", style(summary).bold().force_styling(self.colors))?;
        Ok(())
    }
}

pub struct CompactFormatter;

impl OutputFormatter for CompactFormatter {
    fn format(&self, report: &LintReport, out: &mut dyn Write) -> Result<(), LinterError> {
        for issue in &report.issues {
            let SourceRange { file, start, .. } = &issue.range;
            writeln!(
                out,
                "{file}:{}:{}: {}: {} ({})",
                start.line, start.column, issue.severity, issue.message, issue.rule
            )?;
        }
        write_failures(report, out, "failure")?;
        Ok(())
    }
}

pub struct QuickfixFormatter;

impl QuickfixFormatter {
    fn marker(severity: Severity) -> char {
        match severity {
            Severity::Error => 'E',
            Severity::Warning => 'W',
            Severity::Notice => 'N',
        }
    }
}

impl OutputFormatter for QuickfixFormatter {
    fn format(&self, report: &LintReport, out: &mut dyn Write) -> Result<(), LinterError> {
        for issue in &report.issues {
            let SourceRange { file, start, .. } = &issue.range;
            writeln!(
                out,
                "{file}:{}:{}: {}: {}",
                start.line,
                start.column,
                Self::marker(issue.severity),
                issue.message
            )?;
        }
        write_failures(report, out, "E")?;
        Ok(())
    }
}

fn write_failures(report: &LintReport, out: &mut dyn Write, label: &str) -> io::Result<()> {
    for RuleFailure { rule, error } in &report.failures {
        let SourceRange { file, start, .. } = error.range();
        writeln!(out, "{file}:{}:{}: {label}: {error} ({rule})", start.line, start.column)?;
    }
    Ok(())
}

pub struct JsonFormatter;

fn range_json(range: &SourceRange) -> serde_json::Value {
    serde_json::json!({
        "filename": &*range.file,
        "start": { "line": range.start.line, "column": range.start.column },
        "end": { "line": range.end.line, "column": range.end.column },
    })
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &LintReport, out: &mut dyn Write) -> Result<(), LinterError> {
        let output = serde_json::json!({
            "issues": report.issues.iter().map(|issue| {
                serde_json::json!({
                    "rule": {
                        "name": issue.rule,
                        "severity": issue.severity,
                        "link": issue.link,
                    },
                    "message": issue.message,
                    "range": range_json(&issue.range),
                })
            }).collect::<Vec<_>>(),
            "errors": report.failures.iter().map(|failure| {
                serde_json::json!({
                    "rule": failure.rule,
                    "message": failure.error.to_string(),
                    "range": range_json(failure.error.range()),
                })
            }).collect::<Vec<_>>(),
        });
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use azsec_core::errors::{CheckError, MalformedExpression};
    use azsec_core::testing::range;

    use super::*;

    fn issue(file: &str, line: usize, severity: Severity, message: &str) -> Issue {
        Issue {
            rule: "azurerm_storage_account_unsecure_tls".to_string(),
            severity,
            message: message.to_string(),
            range: range(file, (line, 3), (line, 10)),
            link: Some("https://example.test/rule.md".to_string()),
        }
    }

    fn sample_report() -> LintReport {
        LintReport {
            issues: vec![
                issue("storage.tf", 4, Severity::Warning, "\"TLS1_0\" is an insecure value as min_tls_version"),
                issue("main.tf", 2, Severity::Error, "bad"),
            ],
            failures: vec![],
        }
    }

    fn render(formatter: &dyn OutputFormatter, report: &LintReport) -> String {
        let mut out = Vec::new();
        formatter.format(report, &mut out).expect("format");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn compact_output() {
        assert_eq!(
            render(&CompactFormatter, &sample_report()),
            "storage.tf:4:3: warning: \"TLS1_0\" is an insecure value as min_tls_version (azurerm_storage_account_unsecure_tls)\n\
             main.tf:2:3: error: bad (azurerm_storage_account_unsecure_tls)\n"
        );
    }

    #[test]
    fn quickfix_output() {
        assert_eq!(
            render(&QuickfixFormatter, &sample_report()),
            "storage.tf:4:3: W: \"TLS1_0\" is an insecure value as min_tls_version\nmain.tf:2:3: E: bad\n"
        );
    }

    #[test]
    fn json_output() {
        let rendered = render(&JsonFormatter, &sample_report());
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(value["issues"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["issues"][0]["rule"]["name"], "azurerm_storage_account_unsecure_tls");
        assert_eq!(value["issues"][0]["rule"]["severity"], "warning");
        assert_eq!(value["issues"][0]["rule"]["link"], "https://example.test/rule.md");
        assert_eq!(value["issues"][0]["range"]["filename"], "storage.tf");
        assert_eq!(value["issues"][0]["range"]["start"]["line"], 4);
        assert_eq!(value["issues"][1]["rule"]["severity"], "error");
        assert_eq!(value["errors"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn stylish_groups_by_file_without_colors() {
        let rendered = render(&StylishFormatter { colors: false }, &sample_report());
        let main = rendered.find("main.tf").expect("main.tf header");
        let storage = rendered.find("storage.tf").expect("storage.tf header");
        assert!(main < storage);
        assert!(rendered.contains("  4:3      warning  \"TLS1_0\" is an insecure value as min_tls_version"));
        assert!(rendered.contains("✖ 2 problem(s) (1 error(s), 1 warning(s), 0 notice(s))"));
        assert!(!rendered.contains('\u{1b}'));
    }

    #[test]
    fn stylish_clean_report() {
        let rendered = render(&StylishFormatter { colors: false }, &LintReport::default());
        assert_eq!(rendered, "✓ No issues found!\n");
    }

    #[test]
    fn failures_are_listed_with_their_location() {
        let report = LintReport {
            issues: vec![],
            failures: vec![RuleFailure {
                rule: "broken".to_string(),
                error: CheckError::from(MalformedExpression::new(&range("main.tf", (3, 5), (3, 9)), "empty root")),
            }],
        };
        let compact = render(&CompactFormatter, &report);
        assert!(compact.starts_with("main.tf:3:5: failure: "));
        assert!(compact.trim_end().ends_with("(broken)"));

        let json: serde_json::Value = serde_json::from_str(&render(&JsonFormatter, &report)).expect("json");
        assert_eq!(json["errors"][0]["rule"], "broken");
        assert_eq!(json["errors"][0]["range"]["start"]["column"], 5);
    }
}
