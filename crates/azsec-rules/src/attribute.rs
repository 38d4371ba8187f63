//! Data-driven attribute rules
//!
//! Most checks in the catalog read one attribute, either on the resource
//! itself or inside its first nested block of some type, and compare its
//! literal value with an expectation. They differ only in data, so they are
//! described by [`AttributeRule`] values instead of hand-written types.

use azsec_core::eval::evaluate_as;
use azsec_core::schema::{extract, Shape};
use azsec_core::{CheckError, Document, Issue, IssueSink, Rule, Severity};

use crate::rule_id::RuleId;

/// What the attribute's literal value must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Bool(bool),
    OneOf(&'static [&'static str]),
    OneOfIgnoreCase(&'static [&'static str]),
    /// Only presence is checked
    Present,
}

/// Where a missing-attribute finding is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Resource,
    /// The nested block holding the attribute
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRule {
    pub id: RuleId,
    pub severity: Severity,
    pub enabled: bool,
    pub resource_type: &'static str,
    /// Nested block type holding the attribute
    pub block: Option<&'static str>,
    pub attribute: &'static str,
    pub expect: Expect,
    /// No finding when `None`
    pub missing_block: Option<&'static str>,
    /// No finding when `None`
    pub missing_attribute: Option<&'static str>,
    pub anchor: Anchor,
    /// `{value}` is replaced with the offending literal
    pub mismatch: &'static str,
}

impl AttributeRule {
    fn shape(&self) -> Shape {
        match self.block {
            Some(block) => Shape::new().block(block, Shape::new().attribute(self.attribute)),
            None => Shape::new().attribute(self.attribute),
        }
    }

    /// The offending value rendered for the message, `None` when satisfied or unknown
    fn violation(&self, attribute: &azsec_core::Attribute) -> Result<Option<String>, CheckError> {
        let violation = match self.expect {
            Expect::Present => None,
            Expect::Bool(expected) => {
                evaluate_as::<bool>(attribute)?.filter(|value| *value != expected).map(|v| v.to_string())
            }
            Expect::OneOf(allowed) => {
                evaluate_as::<String>(attribute)?.filter(|value| !allowed.contains(&value.as_str()))
            }
            Expect::OneOfIgnoreCase(allowed) => evaluate_as::<String>(attribute)?
                .filter(|value| !allowed.iter().any(|a| a.eq_ignore_ascii_case(value))),
        };
        Ok(violation)
    }
}

impl Rule for AttributeRule {
    fn name(&self) -> &str {
        self.id.name()
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn link(&self) -> Option<String> {
        Some(self.id.link())
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError> {
        let mut sink = IssueSink::for_rule(self);
        for resource in extract(document, self.resource_type, &self.shape()) {
            let (holder, anchor) = match self.block {
                None => (&resource, &resource.def_range),
                Some(block_type) => match resource.first_block(block_type) {
                    Some(block) => {
                        let anchor = match self.anchor {
                            Anchor::Resource => &resource.def_range,
                            Anchor::Block => &block.def_range,
                        };
                        (block, anchor)
                    }
                    None => {
                        if let Some(message) = self.missing_block {
                            sink.record(message, &resource.def_range);
                        }
                        continue;
                    }
                },
            };

            match holder.attribute(self.attribute) {
                None => {
                    if let Some(message) = self.missing_attribute {
                        sink.record(message, anchor);
                    }
                }
                Some(attribute) => {
                    if let Some(value) = self.violation(attribute)? {
                        sink.record(self.mismatch.replace("{value}", &value), &attribute.expr_range);
                    }
                }
            }
        }
        Ok(sink.into_issues())
    }
}

const SECURE_MIN_TLS: &[&str] = &["TLS1_2", "TLS1_3"];
const SECURE_APP_TLS: &[&str] = &["1.2", "1.3"];

const fn top_level(
    id: RuleId,
    severity: Severity,
    resource_type: &'static str,
    attribute: &'static str,
    expect: Expect,
    missing: Option<&'static str>,
    mismatch: &'static str,
) -> AttributeRule {
    AttributeRule {
        id,
        severity,
        enabled: true,
        resource_type,
        block: None,
        attribute,
        expect,
        missing_block: None,
        missing_attribute: missing,
        anchor: Anchor::Resource,
        mismatch,
    }
}

const fn disabled(rule: AttributeRule) -> AttributeRule {
    AttributeRule { enabled: false, ..rule }
}

const fn unsecure_tls(id: RuleId, resource_type: &'static str) -> AttributeRule {
    top_level(
        id,
        Severity::Warning,
        resource_type,
        "min_tls_version",
        Expect::OneOf(SECURE_MIN_TLS),
        None,
        "\"{value}\" is an insecure value as min_tls_version",
    )
}

const PUBLIC_NETWORK_ACCESS_MISSING: &str =
    "public_network_access_enabled is not defined and defaults to true, consider disabling it";
const PUBLIC_NETWORK_ACCESS_ENABLED: &str = "Consider changing public_network_access_enabled to false";

/// Rules that stand alone, one resource type each
pub const STANDALONE_RULES: &[AttributeRule] = &[
    unsecure_tls(RuleId::AzurermEventhubNamespaceUnsecureTls, "azurerm_eventhub_namespace"),
    unsecure_tls(RuleId::AzurermMssqlServerUnsecureTls, "azurerm_mssql_server"),
    unsecure_tls(RuleId::AzurermStorageAccountUnsecureTls, "azurerm_storage_account"),
    top_level(
        RuleId::AzurermIothubEndpointEventhubAuthenticationType,
        Severity::Notice,
        "azurerm_iothub_endpoint_eventhub",
        "authentication_type",
        Expect::OneOf(&["identityBased"]),
        Some("authentication_type is not defined and should be \"identityBased\""),
        "authentication_type should be \"identityBased\"",
    ),
    disabled(top_level(
        RuleId::AzurermKeyVaultPublicNetworkAccessEnabled,
        Severity::Notice,
        "azurerm_key_vault",
        "public_network_access_enabled",
        Expect::Bool(false),
        Some(PUBLIC_NETWORK_ACCESS_MISSING),
        PUBLIC_NETWORK_ACCESS_ENABLED,
    )),
    disabled(top_level(
        RuleId::AzurermKeyVaultEnableRbacAuthorization,
        Severity::Warning,
        "azurerm_key_vault",
        "enable_rbac_authorization",
        Expect::Bool(true),
        Some("enable_rbac_authorization is not defined and defaults to false, consider enabling it"),
        "Consider changing enable_rbac_authorization to true",
    )),
    AttributeRule {
        id: RuleId::AzurermKeyVaultKeyRotationPolicy,
        severity: Severity::Warning,
        enabled: true,
        resource_type: "azurerm_key_vault_key",
        block: Some("rotation_policy"),
        attribute: "expire_after",
        expect: Expect::Present,
        missing_block: Some("rotation_policy block is missing, should be defined with expire_after property"),
        missing_attribute: Some("expire_after is missing in rotation_policy block"),
        anchor: Anchor::Block,
        mismatch: "",
    },
    top_level(
        RuleId::AzurermMssqlDatabaseEncryption,
        Severity::Warning,
        "azurerm_mssql_database",
        "transparent_data_encryption_enabled",
        Expect::Bool(true),
        Some("transparent data encryption is not enabled"),
        "transparent data encryption must be enabled",
    ),
    AttributeRule {
        id: RuleId::AzurermMssqlServerAzureadAuthenticationOnly,
        severity: Severity::Warning,
        enabled: true,
        resource_type: "azurerm_mssql_server",
        block: Some("azuread_administrator"),
        attribute: "azuread_authentication_only",
        expect: Expect::Bool(true),
        missing_block: Some("azuread_administrator block is missing, azuread_authentication_only should be set to true"),
        missing_attribute: Some("azuread_authentication_only is missing in azuread_administrator, should be set to true"),
        anchor: Anchor::Block,
        mismatch: "azuread_authentication_only is set to {value}, should be set to true",
    },
    top_level(
        RuleId::AzurermMssqlServerPublicNetworkAccessEnabled,
        Severity::Notice,
        "azurerm_mssql_server",
        "public_network_access_enabled",
        Expect::Bool(false),
        Some(PUBLIC_NETWORK_ACCESS_MISSING),
        PUBLIC_NETWORK_ACCESS_ENABLED,
    ),
    top_level(
        RuleId::AzurermRedisCacheActiveDirectoryAuthenticationEnabled,
        Severity::Notice,
        "azurerm_redis_cache",
        "active_directory_authentication_enabled",
        Expect::Bool(true),
        Some("active_directory_authentication_enabled is not defined and should be true"),
        "active_directory_authentication_enabled should be true",
    ),
    top_level(
        RuleId::AzurermRedisCacheMinimumTlsVersion,
        Severity::Warning,
        "azurerm_redis_cache",
        "minimum_tls_version",
        Expect::OneOf(&["1.2"]),
        Some("minimum_tls_version is missing, should be set to 1.2 or higher"),
        "minimum_tls_version is set to {value}, should be 1.2 or higher",
    ),
    top_level(
        RuleId::AzurermRedisCacheNonSslPortEnabled,
        Severity::Warning,
        "azurerm_redis_cache",
        "non_ssl_port_enabled",
        Expect::Bool(false),
        Some("non_ssl_port_enabled is not defined and should be false"),
        "non_ssl_port_enabled should be false",
    ),
    top_level(
        RuleId::AzurermStorageAccountCrossTenantReplicationEnabled,
        Severity::Warning,
        "azurerm_storage_account",
        "cross_tenant_replication_enabled",
        Expect::Bool(false),
        None,
        "cross_tenant_replication_enabled should be false",
    ),
    top_level(
        RuleId::AzurermStorageAccountDefaultToOauthAuthentication,
        Severity::Warning,
        "azurerm_storage_account",
        "default_to_oauth_authentication",
        Expect::Bool(true),
        Some("default_to_oauth_authentication is not defined and should be true"),
        "default_to_oauth_authentication should be true",
    ),
    top_level(
        RuleId::AzurermStorageAccountHttpsTrafficOnlyEnabled,
        Severity::Warning,
        "azurerm_storage_account",
        "https_traffic_only",
        Expect::Bool(true),
        Some("https_traffic_only is not defined and should be true"),
        "https_traffic_only should be true",
    ),
];

/// An App Service resource type and the ids of the rules that apply to it
pub struct AppService {
    pub resource_type: &'static str,
    pub https_only: RuleId,
    pub ftps_state: RuleId,
    pub minimum_tls_version: RuleId,
    /// Slots have no scm default action check
    pub scm_ip_restriction_default_action: Option<RuleId>,
}

pub const APP_SERVICES: &[AppService] = &[
    AppService {
        resource_type: "azurerm_linux_function_app",
        https_only: RuleId::AzurermLinuxFunctionAppHttpsOnly,
        ftps_state: RuleId::AzurermLinuxFunctionAppFtpsState,
        minimum_tls_version: RuleId::AzurermLinuxFunctionAppMinimumTlsVersion,
        scm_ip_restriction_default_action: Some(RuleId::AzurermLinuxFunctionAppScmIpRestrictionDefaultAction),
    },
    AppService {
        resource_type: "azurerm_linux_function_app_slot",
        https_only: RuleId::AzurermLinuxFunctionAppSlotHttpsOnly,
        ftps_state: RuleId::AzurermLinuxFunctionAppSlotFtpsState,
        minimum_tls_version: RuleId::AzurermLinuxFunctionAppSlotMinimumTlsVersion,
        scm_ip_restriction_default_action: None,
    },
    AppService {
        resource_type: "azurerm_linux_web_app",
        https_only: RuleId::AzurermLinuxWebAppHttpsOnly,
        ftps_state: RuleId::AzurermLinuxWebAppFtpsState,
        minimum_tls_version: RuleId::AzurermLinuxWebAppMinimumTlsVersion,
        scm_ip_restriction_default_action: Some(RuleId::AzurermLinuxWebAppScmIpRestrictionDefaultAction),
    },
    AppService {
        resource_type: "azurerm_linux_web_app_slot",
        https_only: RuleId::AzurermLinuxWebAppSlotHttpsOnly,
        ftps_state: RuleId::AzurermLinuxWebAppSlotFtpsState,
        minimum_tls_version: RuleId::AzurermLinuxWebAppSlotMinimumTlsVersion,
        scm_ip_restriction_default_action: None,
    },
    AppService {
        resource_type: "azurerm_windows_function_app",
        https_only: RuleId::AzurermWindowsFunctionAppHttpsOnly,
        ftps_state: RuleId::AzurermWindowsFunctionAppFtpsState,
        minimum_tls_version: RuleId::AzurermWindowsFunctionAppMinimumTlsVersion,
        scm_ip_restriction_default_action: Some(RuleId::AzurermWindowsFunctionAppScmIpRestrictionDefaultAction),
    },
    AppService {
        resource_type: "azurerm_windows_function_app_slot",
        https_only: RuleId::AzurermWindowsFunctionAppSlotHttpsOnly,
        ftps_state: RuleId::AzurermWindowsFunctionAppSlotFtpsState,
        minimum_tls_version: RuleId::AzurermWindowsFunctionAppSlotMinimumTlsVersion,
        scm_ip_restriction_default_action: None,
    },
    AppService {
        resource_type: "azurerm_windows_web_app",
        https_only: RuleId::AzurermWindowsWebAppHttpsOnly,
        ftps_state: RuleId::AzurermWindowsWebAppFtpsState,
        minimum_tls_version: RuleId::AzurermWindowsWebAppMinimumTlsVersion,
        scm_ip_restriction_default_action: Some(RuleId::AzurermWindowsWebAppScmIpRestrictionDefaultAction),
    },
    AppService {
        resource_type: "azurerm_windows_web_app_slot",
        https_only: RuleId::AzurermWindowsWebAppSlotHttpsOnly,
        ftps_state: RuleId::AzurermWindowsWebAppSlotFtpsState,
        minimum_tls_version: RuleId::AzurermWindowsWebAppSlotMinimumTlsVersion,
        scm_ip_restriction_default_action: None,
    },
];

impl AppService {
    pub fn rules(&self) -> Vec<AttributeRule> {
        let mut rules = vec![
            top_level(
                self.https_only,
                Severity::Warning,
                self.resource_type,
                "https_only",
                Expect::Bool(true),
                Some("https_only is not defined and should be true"),
                "https_only should be true",
            ),
            AttributeRule {
                id: self.ftps_state,
                severity: Severity::Warning,
                enabled: true,
                resource_type: self.resource_type,
                block: Some("site_config"),
                attribute: "ftps_state",
                expect: Expect::OneOfIgnoreCase(&["Disabled"]),
                missing_block: Some("site_config block is missing, ftps_state should be set to Disabled"),
                missing_attribute: Some("ftps_state is missing in site_config, should be set to Disabled"),
                anchor: Anchor::Block,
                mismatch: "ftps_state is set to {value}, should be set to Disabled",
            },
            AttributeRule {
                id: self.minimum_tls_version,
                severity: Severity::Warning,
                enabled: true,
                resource_type: self.resource_type,
                block: Some("site_config"),
                attribute: "minimum_tls_version",
                expect: Expect::OneOf(SECURE_APP_TLS),
                missing_block: Some("site_config block is missing, minimum_tls_version should be set to 1.2 or 1.3"),
                missing_attribute: Some("minimum_tls_version is missing in site_config, should be set to 1.2 or 1.3"),
                anchor: Anchor::Block,
                mismatch: "minimum_tls_version is set to {value}, should be 1.2 or 1.3",
            },
        ];
        if let Some(id) = self.scm_ip_restriction_default_action {
            const MISSING: &str = "scm_ip_restriction_default_action is not defined and should be Deny";
            rules.push(AttributeRule {
                id,
                severity: Severity::Warning,
                enabled: true,
                resource_type: self.resource_type,
                block: Some("site_config"),
                attribute: "scm_ip_restriction_default_action",
                expect: Expect::OneOf(&["Deny"]),
                missing_block: Some(MISSING),
                missing_attribute: Some(MISSING),
                anchor: Anchor::Resource,
                mismatch: "scm_ip_restriction_default_action should be Deny",
            });
        }
        rules
    }
}

/// Every table-driven rule
pub fn attribute_rules() -> Vec<AttributeRule> {
    STANDALONE_RULES
        .iter()
        .copied()
        .chain(APP_SERVICES.iter().flat_map(AppService::rules))
        .collect()
}
