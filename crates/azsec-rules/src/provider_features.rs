//! Soft-delete settings of the provider that manages each key vault

use azsec_core::eval::evaluate_as;
use azsec_core::provider::{resolve_provider, ProviderResolution};
use azsec_core::schema::{extract, extract_blocks, Shape};
use azsec_core::{Block, CheckError, Document, Issue, IssueSink, Rule, Severity};

use crate::rule_id::RuleId;

const KEY_VAULT_FEATURES: [&str; 2] = ["purge_soft_delete_on_destroy", "recover_soft_deleted_key_vaults"];

#[derive(Debug, Default, Clone, Copy)]
pub struct KeyVaultFeaturesRule;

impl KeyVaultFeaturesRule {
    fn provider_shape() -> Shape {
        Shape::new().attribute("alias").block(
            "features",
            Shape::new().block("key_vault", Shape::new().attributes(&KEY_VAULT_FEATURES)),
        )
    }

    fn check_provider(sink: &mut IssueSink, provider: &Block, display_name: &str) -> Result<(), CheckError> {
        let Some(features) = provider.first_block("features") else {
            sink.record(
                format!("features block is missing in the Azure provider configuration of provider {display_name}"),
                &provider.def_range,
            );
            return Ok(());
        };
        let Some(key_vault) = features.first_block("key_vault") else {
            sink.record(
                format!("key_vault block is missing in the features configuration of provider {display_name}"),
                &provider.def_range,
            );
            return Ok(());
        };
        for feature in KEY_VAULT_FEATURES {
            let Some(attribute) = key_vault.attribute(feature) else {
                continue;
            };
            if evaluate_as::<bool>(attribute)? == Some(false) {
                sink.record(
                    format!("{feature} must be set to true in key_vault features of provider {display_name}"),
                    &attribute.range,
                );
            }
        }
        Ok(())
    }
}

impl Rule for KeyVaultFeaturesRule {
    fn name(&self) -> &str {
        RuleId::AzurermKeyvaultFeaturesCheck.name()
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn enabled(&self) -> bool {
        true
    }

    fn link(&self) -> Option<String> {
        Some(RuleId::AzurermKeyvaultFeaturesCheck.link())
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError> {
        let vaults = extract(document, "azurerm_key_vault", &Shape::new().attribute("provider"));
        if vaults.is_empty() {
            return Ok(vec![]);
        }
        let providers = extract_blocks(document, "provider", "azurerm", &Self::provider_shape());

        let mut sink = IssueSink::for_rule(self);
        for vault in &vaults {
            match resolve_provider(vault, &providers)? {
                ProviderResolution::Unbound(_) => {
                    sink.record("No provider configuration found for Azure Key Vault resource", &vault.def_range);
                }
                ProviderResolution::Bound(binding) => {
                    Self::check_provider(&mut sink, binding.provider, binding.display_name())?;
                }
            }
        }
        Ok(sink.into_issues())
    }
}
