use azsec_core::eval::evaluate_as;
use azsec_core::schema::{extract, Shape};
use azsec_core::{CheckError, Document, Issue, IssueSink, Rule, Severity};

use crate::rule_id::RuleId;

/// A firewall rule spanning the whole IPv4 range
#[derive(Debug, Default, Clone, Copy)]
pub struct FirewallRuleAllAllowedRule;

impl Rule for FirewallRuleAllAllowedRule {
    fn name(&self) -> &str {
        RuleId::AzurermMssqlFirewallRuleAllAllowed.name()
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn enabled(&self) -> bool {
        true
    }

    fn link(&self) -> Option<String> {
        Some(RuleId::AzurermMssqlFirewallRuleAllAllowed.link())
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError> {
        let shape = Shape::new().attributes(&["start_ip_address", "end_ip_address"]);

        let mut sink = IssueSink::for_rule(self);
        for rule in extract(document, "azurerm_mssql_firewall_rule", &shape) {
            let (Some(start), Some(end)) = (rule.attribute("start_ip_address"), rule.attribute("end_ip_address")) else {
                continue;
            };
            let start = evaluate_as::<String>(start)?;
            let end = evaluate_as::<String>(end)?;
            if start.as_deref() == Some("0.0.0.0") && end.as_deref() == Some("255.255.255.255") {
                sink.record(
                    "Firewall rule allows access from all IP addresses (0.0.0.0-255.255.255.255). \
                     Consider restricting the IP range for better security.",
                    &rule.def_range,
                );
            }
        }
        Ok(sink.into_issues())
    }
}
