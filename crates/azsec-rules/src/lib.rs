//! The `azurerm-security` rule catalog
//!
//! Rules come in two flavours. Single-attribute checks are rows of the
//! [`attribute`] table; rules that walk several blocks, follow references
//! or resolve providers have their own types.

pub mod association;
pub mod attribute;
pub mod container_group;
pub mod key_vault;
pub mod mssql;
pub mod network_access;
pub mod provider_features;
pub mod rule_id;

use azsec_core::{Rule, RuleSet};

pub use rule_id::RuleId;

pub const RULESET_NAME: &str = "azurerm-security";
pub const RULESET_VERSION: &str = "0.1.14";
pub const RULESET_REPOSITORY: &str = "https://github.com/pregress/tflint-ruleset-azurerm-security";

/// Every rule of the catalog, sorted by name
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = vec![
        Box::new(container_group::ImageRegistryCredentialIdentityRule),
        Box::new(network_access::EventhubPublicNetworkAccessRule),
        Box::new(network_access::StoragePublicNetworkAccessRule),
        Box::new(provider_features::KeyVaultFeaturesRule),
        Box::new(key_vault::CertificateLifetimeActionRule),
        Box::new(key_vault::NetworkAclsDefaultDenyRule),
        Box::new(mssql::FirewallRuleAllAllowedRule),
    ];
    rules.extend(
        association::PERIMETER_ASSOCIATION_RULES
            .iter()
            .map(|rule| Box::new(*rule) as Box<dyn Rule>),
    );
    rules.extend(attribute::attribute_rules().into_iter().map(|rule| Box::new(rule) as Box<dyn Rule>));
    rules.sort_by(|a, b| a.name().cmp(b.name()));
    rules
}

pub fn rule_set() -> RuleSet {
    RuleSet::builder(RULESET_NAME, RULESET_VERSION).rules(all_rules()).build()
}
