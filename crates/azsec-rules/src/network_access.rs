//! Public network access rules that take network rule blocks into account

use azsec_core::eval::evaluate_as;
use azsec_core::schema::{extract, Shape};
use azsec_core::{CheckError, Document, Issue, IssueSink, Rule, Severity};

use crate::rule_id::RuleId;

const PUBLIC_NETWORK_ACCESS: &str = "public_network_access_enabled";

/// Storage accounts must either disable public access or deny by default
/// in `network_rules`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoragePublicNetworkAccessRule;

impl Rule for StoragePublicNetworkAccessRule {
    fn name(&self) -> &str {
        RuleId::AzurermStorageAccountPublicNetworkAccessEnabled.name()
    }

    fn severity(&self) -> Severity {
        Severity::Notice
    }

    fn enabled(&self) -> bool {
        true
    }

    fn link(&self) -> Option<String> {
        Some(RuleId::AzurermStorageAccountPublicNetworkAccessEnabled.link())
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError> {
        let shape = Shape::new()
            .attribute(PUBLIC_NETWORK_ACCESS)
            .block("network_rules", Shape::new().attribute("default_action"));

        let mut sink = IssueSink::for_rule(self);
        for account in extract(document, "azurerm_storage_account", &shape) {
            let mut denied = false;
            for rules in account.blocks_of("network_rules") {
                if let Some(default_action) = rules.attribute("default_action") {
                    if evaluate_as::<String>(default_action)?.as_deref() == Some("Deny") {
                        denied = true;
                        break;
                    }
                }
            }
            if denied {
                continue;
            }

            match account.attribute(PUBLIC_NETWORK_ACCESS) {
                None if account.first_block("network_rules").is_none() => {
                    sink.record(
                        "public_network_access_enabled is not defined and defaults to true, \
                         consider disabling it or adding network_rules with default_action = \"Deny\"",
                        &account.def_range,
                    );
                }
                None => {}
                Some(attribute) => {
                    if evaluate_as::<bool>(attribute)? == Some(true) {
                        sink.record(
                            "Consider changing public_network_access_enabled to false \
                             or add network_rules with default_action = \"Deny\"",
                            &attribute.expr_range,
                        );
                    }
                }
            }
        }
        Ok(sink.into_issues())
    }
}

/// Event Hub namespaces with public access need a ruleset that does not
/// allow by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventhubPublicNetworkAccessRule;

impl Rule for EventhubPublicNetworkAccessRule {
    fn name(&self) -> &str {
        RuleId::AzurermEventhubNamespacePublicNetworkAccessEnabled.name()
    }

    fn severity(&self) -> Severity {
        Severity::Notice
    }

    fn enabled(&self) -> bool {
        true
    }

    fn link(&self) -> Option<String> {
        Some(RuleId::AzurermEventhubNamespacePublicNetworkAccessEnabled.link())
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError> {
        let shape = Shape::new()
            .attribute(PUBLIC_NETWORK_ACCESS)
            .block("network_rulesets", Shape::new().attribute("default_action"));

        let mut sink = IssueSink::for_rule(self);
        'namespaces: for namespace in extract(document, "azurerm_eventhub_namespace", &shape) {
            if let Some(attribute) = namespace.attribute(PUBLIC_NETWORK_ACCESS) {
                // Only a literal `true` keeps the namespace under inspection
                if evaluate_as::<bool>(attribute)? != Some(true) {
                    continue;
                }
            }

            let mut reported = false;
            for ruleset in namespace.blocks_of("network_rulesets") {
                let Some(default_action) = ruleset.attribute("default_action") else {
                    continue;
                };
                if evaluate_as::<String>(default_action)?.as_deref() == Some("Allow") {
                    sink.record(
                        "public_network_access_enabled is true and network_rulesets block with default_action = Allow, \
                         Consider changing the default_action to deny",
                        &default_action.expr_range,
                    );
                    reported = true;
                } else {
                    continue 'namespaces;
                }
            }

            if !reported {
                sink.record(
                    "public_network_access_enabled is not defined and defaults to true, \
                     consider disabling it or add network_rulesets block with default_action = Deny",
                    &namespace.def_range,
                );
            }
        }
        Ok(sink.into_issues())
    }
}
