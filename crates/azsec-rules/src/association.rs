//! Resources that must be attached to a network security perimeter

use azsec_core::association::{build_associations, target_shape};
use azsec_core::schema::extract;
use azsec_core::{CheckError, Document, Issue, IssueSink, Rule, Severity};
use log::debug;

use crate::rule_id::RuleId;

pub const PERIMETER_ASSOCIATION: &str = "azurerm_network_security_perimeter_association";
pub const PERIMETER_REFERENCE_ATTRIBUTE: &str = "resource_id";

/// Reports every `resource_type` block that no perimeter association
/// references through `resource_id = <type>.<label>.id`.
#[derive(Debug, Clone, Copy)]
pub struct PerimeterAssociationRule {
    pub id: RuleId,
    pub resource_type: &'static str,
    /// Human readable resource kind used in messages
    pub display: &'static str,
}

pub const PERIMETER_ASSOCIATION_RULES: &[PerimeterAssociationRule] = &[
    PerimeterAssociationRule {
        id: RuleId::AzurermEventhubNamespaceNetworkSecurityPerimeterAssociation,
        resource_type: "azurerm_eventhub_namespace",
        display: "EventHub Namespace",
    },
    PerimeterAssociationRule {
        id: RuleId::AzurermKeyVaultNetworkSecurityPerimeterAssociation,
        resource_type: "azurerm_key_vault",
        display: "Key Vault",
    },
    PerimeterAssociationRule {
        id: RuleId::AzurermStorageAccountNetworkSecurityPerimeterAssociation,
        resource_type: "azurerm_storage_account",
        display: "Storage Account",
    },
];

impl Rule for PerimeterAssociationRule {
    fn name(&self) -> &str {
        self.id.name()
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn enabled(&self) -> bool {
        true
    }

    fn link(&self) -> Option<String> {
        Some(self.id.link())
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError> {
        let targets = extract(document, self.resource_type, &target_shape());
        if targets.is_empty() {
            return Ok(vec![]);
        }

        let associations =
            build_associations(document, PERIMETER_ASSOCIATION, PERIMETER_REFERENCE_ATTRIBUTE, self.resource_type)?;
        debug!("{} {} labels referenced by {PERIMETER_ASSOCIATION}", associations.len(), self.resource_type);

        let mut sink = IssueSink::for_rule(self);
        for target in associations.unassociated(&targets)? {
            let label = target.name().unwrap_or_default();
            sink.record(
                format!("{} '{label}' does not have an associated {PERIMETER_ASSOCIATION}", self.display),
                &target.def_range,
            );
        }
        Ok(sink.into_issues())
    }
}
