//! Key Vault rules that walk nested blocks

use azsec_core::eval::evaluate_as;
use azsec_core::schema::{extract, Shape};
use azsec_core::{CheckError, Document, Issue, IssueSink, Rule, Severity};

use crate::rule_id::RuleId;

const LIFETIME_ACTION_TYPES: [&str; 2] = ["AutoRenew", "EmailContacts"];

/// `certificate_policy > lifetime_action > action > action_type` must be
/// an automatic renewal or a contact notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct CertificateLifetimeActionRule;

impl Rule for CertificateLifetimeActionRule {
    fn name(&self) -> &str {
        RuleId::AzurermKeyVaultCertificateLifetimeAction.name()
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn enabled(&self) -> bool {
        true
    }

    fn link(&self) -> Option<String> {
        Some(RuleId::AzurermKeyVaultCertificateLifetimeAction.link())
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError> {
        let shape = Shape::new().block(
            "certificate_policy",
            Shape::new().block("lifetime_action", Shape::new().block("action", Shape::new().attribute("action_type"))),
        );

        let mut sink = IssueSink::for_rule(self);
        for certificate in extract(document, "azurerm_key_vault_certificate", &shape) {
            let Some(policy) = certificate.first_block("certificate_policy") else {
                sink.record("certificate_policy block is missing", &certificate.def_range);
                continue;
            };
            let Some(lifetime_action) = policy.first_block("lifetime_action") else {
                sink.record("lifetime_action block is missing in certificate_policy", &policy.def_range);
                continue;
            };
            let Some(action) = lifetime_action.first_block("action") else {
                sink.record("action block is missing in lifetime_action", &lifetime_action.def_range);
                continue;
            };
            let Some(action_type) = action.attribute("action_type") else {
                sink.record(
                    "action_type is missing in action block, should be set to either AutoRenew or EmailContacts",
                    &action.def_range,
                );
                continue;
            };
            if let Some(value) = evaluate_as::<String>(action_type)? {
                if !LIFETIME_ACTION_TYPES.iter().any(|allowed| allowed.eq_ignore_ascii_case(&value)) {
                    sink.record(
                        format!("action_type is set to {value}, should be set to either AutoRenew or EmailContacts"),
                        &action_type.expr_range,
                    );
                }
            }
        }
        Ok(sink.into_issues())
    }
}

/// Every `network_acls` block of a key vault must deny by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkAclsDefaultDenyRule;

impl Rule for NetworkAclsDefaultDenyRule {
    fn name(&self) -> &str {
        RuleId::AzurermKeyVaultNetworkAclsDefaultDeny.name()
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn enabled(&self) -> bool {
        true
    }

    fn link(&self) -> Option<String> {
        Some(RuleId::AzurermKeyVaultNetworkAclsDefaultDeny.link())
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError> {
        let shape = Shape::new().block("network_acls", Shape::new().attribute("default_action"));

        let mut sink = IssueSink::for_rule(self);
        for vault in extract(document, "azurerm_key_vault", &shape) {
            if vault.first_block("network_acls").is_none() {
                sink.record(
                    "network_acls block is not defined, consider adding it with default_action = \"Deny\"",
                    &vault.def_range,
                );
                continue;
            }
            for acls in vault.blocks_of("network_acls") {
                let Some(default_action) = acls.attribute("default_action") else {
                    sink.record("default_action is not defined in network_acls block", &acls.def_range);
                    continue;
                };
                if evaluate_as::<String>(default_action)?.is_some_and(|value| value != "Deny") {
                    sink.record("network_acls default_action should be set to \"Deny\"", &default_action.expr_range);
                }
            }
        }
        Ok(sink.into_issues())
    }
}
