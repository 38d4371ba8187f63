//! Type-safe rule identification
//!
//! Every rule in the catalog has a variant here. The snake_case rendering of
//! the variant is the rule's public name, used in configuration files and
//! in reported issues.

use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::{RULESET_REPOSITORY, RULESET_VERSION};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,      // Provides as_ref() -> &str
    Display,       // Provides to_string()
    EnumString,    // Provides from_str()
    IntoStaticStr, // Provides into() -> &'static str
    EnumIter,      // Provides iter() over all variants
    EnumCount,
)]
#[strum(serialize_all = "snake_case")]
pub enum RuleId {
    // Container instances
    AzurermContainerGroupImageRegistryCredentialIdentity,

    // Event Hubs
    AzurermEventhubNamespaceNetworkSecurityPerimeterAssociation,
    AzurermEventhubNamespacePublicNetworkAccessEnabled,
    AzurermEventhubNamespaceUnsecureTls,
    AzurermIothubEndpointEventhubAuthenticationType,

    // Key Vault
    AzurermKeyvaultFeaturesCheck,
    AzurermKeyVaultCertificateLifetimeAction,
    AzurermKeyVaultEnableRbacAuthorization,
    AzurermKeyVaultKeyRotationPolicy,
    AzurermKeyVaultNetworkAclsDefaultDeny,
    AzurermKeyVaultNetworkSecurityPerimeterAssociation,
    AzurermKeyVaultPublicNetworkAccessEnabled,

    // App Service: Linux function apps
    AzurermLinuxFunctionAppFtpsState,
    AzurermLinuxFunctionAppHttpsOnly,
    AzurermLinuxFunctionAppMinimumTlsVersion,
    AzurermLinuxFunctionAppScmIpRestrictionDefaultAction,
    AzurermLinuxFunctionAppSlotFtpsState,
    AzurermLinuxFunctionAppSlotHttpsOnly,
    AzurermLinuxFunctionAppSlotMinimumTlsVersion,

    // App Service: Linux web apps
    AzurermLinuxWebAppFtpsState,
    AzurermLinuxWebAppHttpsOnly,
    AzurermLinuxWebAppMinimumTlsVersion,
    AzurermLinuxWebAppScmIpRestrictionDefaultAction,
    AzurermLinuxWebAppSlotFtpsState,
    AzurermLinuxWebAppSlotHttpsOnly,
    AzurermLinuxWebAppSlotMinimumTlsVersion,

    // SQL
    AzurermMssqlDatabaseEncryption,
    AzurermMssqlFirewallRuleAllAllowed,
    AzurermMssqlServerAzureadAuthenticationOnly,
    AzurermMssqlServerPublicNetworkAccessEnabled,
    AzurermMssqlServerUnsecureTls,

    // Redis
    AzurermRedisCacheActiveDirectoryAuthenticationEnabled,
    AzurermRedisCacheMinimumTlsVersion,
    AzurermRedisCacheNonSslPortEnabled,

    // Storage
    AzurermStorageAccountCrossTenantReplicationEnabled,
    AzurermStorageAccountDefaultToOauthAuthentication,
    AzurermStorageAccountHttpsTrafficOnlyEnabled,
    AzurermStorageAccountNetworkSecurityPerimeterAssociation,
    AzurermStorageAccountPublicNetworkAccessEnabled,
    AzurermStorageAccountUnsecureTls,

    // App Service: Windows function apps
    AzurermWindowsFunctionAppFtpsState,
    AzurermWindowsFunctionAppHttpsOnly,
    AzurermWindowsFunctionAppMinimumTlsVersion,
    AzurermWindowsFunctionAppScmIpRestrictionDefaultAction,
    AzurermWindowsFunctionAppSlotFtpsState,
    AzurermWindowsFunctionAppSlotHttpsOnly,
    AzurermWindowsFunctionAppSlotMinimumTlsVersion,

    // App Service: Windows web apps
    AzurermWindowsWebAppFtpsState,
    AzurermWindowsWebAppHttpsOnly,
    AzurermWindowsWebAppMinimumTlsVersion,
    AzurermWindowsWebAppScmIpRestrictionDefaultAction,
    AzurermWindowsWebAppSlotFtpsState,
    AzurermWindowsWebAppSlotHttpsOnly,
    AzurermWindowsWebAppSlotMinimumTlsVersion,
}

impl RuleId {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Documentation page for the rule, pinned to the ruleset version
    pub fn link(self) -> String {
        format!("{RULESET_REPOSITORY}/blob/v{RULESET_VERSION}/docs/rules/{}.md", self.name())
    }
}
