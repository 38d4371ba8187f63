//! Rules that walk nested blocks or combine several attributes

use azsec_core::testing::{document, range};
use azsec_core::{assert_issues, Issue, Rule};
use azsec_rules::container_group::ImageRegistryCredentialIdentityRule;
use azsec_rules::key_vault::{CertificateLifetimeActionRule, NetworkAclsDefaultDenyRule};
use azsec_rules::mssql::FirewallRuleAllAllowedRule;
use azsec_rules::network_access::{EventhubPublicNetworkAccessRule, StoragePublicNetworkAccessRule};
use test_case::test_case;

fn check(rule: &dyn Rule, source: &str) -> Vec<Issue> {
    rule.check(&document(&[("main.tf", source)])).expect("check")
}

fn messages(issues: &[Issue]) -> Vec<&str> {
    issues.iter().map(|issue| issue.message.as_str()).collect()
}

const CERTIFICATE_WITHOUT_POLICY: &str = r#"
resource "azurerm_key_vault_certificate" "example" {
}
"#;

const CERTIFICATE_WITHOUT_LIFETIME_ACTION: &str = r#"
resource "azurerm_key_vault_certificate" "example" {
  certificate_policy {
  }
}
"#;

const CERTIFICATE_WITHOUT_ACTION: &str = r#"
resource "azurerm_key_vault_certificate" "example" {
  certificate_policy {
    lifetime_action {
    }
  }
}
"#;

const CERTIFICATE_WITHOUT_ACTION_TYPE: &str = r#"
resource "azurerm_key_vault_certificate" "example" {
  certificate_policy {
    lifetime_action {
      action {
      }
    }
  }
}
"#;

#[test_case(CERTIFICATE_WITHOUT_POLICY, "certificate_policy block is missing", (2, 1), (2, 51) ; "no policy")]
#[test_case(
    CERTIFICATE_WITHOUT_LIFETIME_ACTION,
    "lifetime_action block is missing in certificate_policy",
    (3, 3),
    (3, 21)
    ; "no lifetime action"
)]
#[test_case(CERTIFICATE_WITHOUT_ACTION, "action block is missing in lifetime_action", (4, 5), (4, 20) ; "no action")]
#[test_case(
    CERTIFICATE_WITHOUT_ACTION_TYPE,
    "action_type is missing in action block, should be set to either AutoRenew or EmailContacts",
    (5, 7),
    (5, 13)
    ; "no action type"
)]
fn certificate_lifetime_action_reports_the_first_missing_level(
    source: &str,
    message: &str,
    start: (usize, usize),
    end: (usize, usize),
) {
    assert_issues!(
        check(&CertificateLifetimeActionRule, source),
        [("azurerm_key_vault_certificate_lifetime_action", message, range("main.tf", start, end))]
    );
}

#[test_case("\"Renew\"", Some("action_type is set to Renew, should be set to either AutoRenew or EmailContacts") ; "unsupported")]
#[test_case("\"AutoRenew\"", None ; "auto renew")]
#[test_case("\"emailcontacts\"", None ; "case insensitive")]
#[test_case("var.action_type", None ; "unknown")]
fn certificate_lifetime_action_type_values(value: &str, expected: Option<&str>) {
    let source = format!(
        r#"
resource "azurerm_key_vault_certificate" "example" {{
  certificate_policy {{
    lifetime_action {{
      action {{
        action_type = {value}
      }}
    }}
  }}
}}
"#
    );
    let issues = check(&CertificateLifetimeActionRule, &source);
    assert_eq!(messages(&issues), expected.into_iter().collect::<Vec<_>>());
}

#[test]
fn network_acls_are_required() {
    assert_issues!(
        check(&NetworkAclsDefaultDenyRule, "\nresource \"azurerm_key_vault\" \"example\" {\n}\n"),
        [(
            "azurerm_key_vault_network_acls_default_deny",
            "network_acls block is not defined, consider adding it with default_action = \"Deny\"",
            range("main.tf", (2, 1), (2, 39))
        )]
    );
}

#[test]
fn every_network_acls_block_is_checked() {
    let source = r#"
resource "azurerm_key_vault" "example" {
  network_acls {
    bypass = "AzureServices"
  }
  network_acls {
    default_action = "Allow"
  }
  network_acls {
    default_action = "Deny"
  }
}
"#;
    assert_issues!(
        check(&NetworkAclsDefaultDenyRule, source),
        [
            (
                "azurerm_key_vault_network_acls_default_deny",
                "default_action is not defined in network_acls block",
                range("main.tf", (3, 3), (3, 15))
            ),
            (
                "azurerm_key_vault_network_acls_default_deny",
                "network_acls default_action should be set to \"Deny\"",
                range("main.tf", (7, 22), (7, 29))
            ),
        ]
    );
}

#[test_case("\"0.0.0.0\"", "\"255.255.255.255\"", true ; "whole range")]
#[test_case("\"10.0.0.0\"", "\"255.255.255.255\"", false ; "partial range")]
#[test_case("\"0.0.0.0\"", "\"0.0.0.0\"", false ; "azure services only")]
#[test_case("var.start_ip", "\"255.255.255.255\"", false ; "unknown start")]
fn firewall_rule_spanning_every_address_is_an_error(start: &str, end: &str, reported: bool) {
    let source = format!(
        "resource \"azurerm_mssql_firewall_rule\" \"open\" {{\n  start_ip_address = {start}\n  end_ip_address   = {end}\n}}\n"
    );
    let issues = check(&FirewallRuleAllAllowedRule, &source);
    if reported {
        assert_issues!(
            issues,
            [(
                "azurerm_mssql_firewall_rule_all_allowed",
                "Firewall rule allows access from all IP addresses (0.0.0.0-255.255.255.255). Consider restricting the IP range for better security.",
                range("main.tf", (1, 1), (1, 46))
            )]
        );
    } else {
        assert!(issues.is_empty());
    }
}

#[test]
fn storage_account_denying_by_default_is_clean() {
    let source = r#"
resource "azurerm_storage_account" "example" {
  public_network_access_enabled = true
  network_rules {
    default_action = "Deny"
  }
}
"#;
    assert!(check(&StoragePublicNetworkAccessRule, source).is_empty());
}

#[test]
fn storage_account_public_access_findings() {
    let source = r#"
resource "azurerm_storage_account" "example" {
}

resource "azurerm_storage_account" "example" {
  public_network_access_enabled = true
}

resource "azurerm_storage_account" "example" {
  public_network_access_enabled = false
}
"#;
    assert_issues!(
        check(&StoragePublicNetworkAccessRule, source),
        [
            (
                "azurerm_storage_account_public_network_access_enabled",
                "public_network_access_enabled is not defined and defaults to true, consider disabling it or adding network_rules with default_action = \"Deny\"",
                range("main.tf", (2, 1), (2, 45))
            ),
            (
                "azurerm_storage_account_public_network_access_enabled",
                "Consider changing public_network_access_enabled to false or add network_rules with default_action = \"Deny\"",
                range("main.tf", (6, 35), (6, 39))
            ),
        ]
    );
}

#[test]
fn storage_account_with_allowing_rules_and_no_flag_is_silent() {
    let source = r#"
resource "azurerm_storage_account" "example" {
  network_rules {
    default_action = "Allow"
  }
}
"#;
    assert!(check(&StoragePublicNetworkAccessRule, source).is_empty());
}

#[test_case("public_network_access_enabled = false" ; "disabled")]
#[test_case("public_network_access_enabled = var.public" ; "unknown")]
fn eventhub_namespace_without_public_access_is_clean(setting: &str) {
    let source = format!("resource \"azurerm_eventhub_namespace\" \"private\" {{\n  {setting}\n}}\n");
    assert!(check(&EventhubPublicNetworkAccessRule, &source).is_empty());
}

#[test]
fn eventhub_namespace_denying_by_default_is_clean() {
    let source = r#"
resource "azurerm_eventhub_namespace" "open" {
  public_network_access_enabled = true
  network_rulesets {
    default_action = "Deny"
  }
}
"#;
    assert!(check(&EventhubPublicNetworkAccessRule, source).is_empty());
}

#[test]
fn eventhub_findings_continue_with_the_next_namespace() {
    let source = r#"
resource "azurerm_eventhub_namespace" "open" {
  public_network_access_enabled = true
  network_rulesets {
    default_action = "Allow"
  }
}

resource "azurerm_eventhub_namespace" "private" {
  public_network_access_enabled = false
}

resource "azurerm_eventhub_namespace" "open" {
}
"#;
    assert_issues!(
        check(&EventhubPublicNetworkAccessRule, source),
        [
            (
                "azurerm_eventhub_namespace_public_network_access_enabled",
                "public_network_access_enabled is true and network_rulesets block with default_action = Allow, Consider changing the default_action to deny",
                range("main.tf", (5, 22), (5, 29))
            ),
            (
                "azurerm_eventhub_namespace_public_network_access_enabled",
                "public_network_access_enabled is not defined and defaults to true, consider disabling it or add network_rulesets block with default_action = Deny",
                range("main.tf", (13, 1), (13, 45))
            ),
        ]
    );
}

#[test]
fn registry_credential_for_acr_server_needs_identity() {
    let source = r#"
resource "azurerm_container_group" "example" {
  image_registry_credential {
    server   = "example.azurecr.io"
    username = "admin"
    password = var.registry_password
  }
}
"#;
    assert_issues!(
        check(&ImageRegistryCredentialIdentityRule, source),
        [(
            "azurerm_container_group_image_registry_credential_identity",
            "user_assigned_identity_id is missing in image_registry_credential for Azure Container Registry image for server example.azurecr.io",
            range("main.tf", (3, 3), (3, 28))
        )]
    );
}

#[test]
fn registry_credential_referencing_a_registry_needs_identity() {
    let source = r#"
resource "azurerm_container_group" "example" {
  image_registry_credential {
    server = azurerm_container_registry.acr.login_server
  }
}
"#;
    let issues = check(&ImageRegistryCredentialIdentityRule, source);
    assert_eq!(
        messages(&issues),
        vec!["user_assigned_identity_id is missing in image_registry_credential for Azure Container Registry image"]
    );
}

#[test_case("server = \"example.azurecr.io\"\n    user_assigned_identity_id = azurerm_user_assigned_identity.pull.id" ; "identity set")]
#[test_case("server = \"index.docker.io\"" ; "other registry")]
#[test_case("server = var.registry" ; "unknown server")]
#[test_case("username = \"admin\"" ; "no server")]
fn registry_credentials_that_pass(body: &str) {
    let source = format!(
        "resource \"azurerm_container_group\" \"example\" {{\n  image_registry_credential {{\n    {body}\n  }}\n}}\n"
    );
    assert!(check(&ImageRegistryCredentialIdentityRule, &source).is_empty());
}

const CONTAINER_GROUP_RULE: &str = "azurerm_container_group_image_registry_credential_identity";

const PUBLIC_IMAGE_WITHOUT_CREDENTIAL: &str = r#"
resource "azurerm_container_group" "example" {
    container {
        name   = "app"
        image  = "nginx:latest"
    }
}"#;

const PUBLIC_IMAGE_WITH_EMPTY_CREDENTIAL: &str = r#"
resource "azurerm_container_group" "example" {
    container {
        name   = "app"
        image  = "nginx:latest"
    }
    image_registry_credential {
    }
}"#;

const REGISTRY_IMAGE_WITH_IDENTITY: &str = r#"
resource "azurerm_container_group" "example" {
    container {
        name   = "app"
        image  = "myregistry.azurecr.io/myapp:latest"
    }
    image_registry_credential {
        user_assigned_identity_id = data.azurerm_user_assigned_identity.example.id
    }
}"#;

const REGISTRY_IMAGES_WITH_MATCHING_CREDENTIALS: &str = r#"
resource "azurerm_container_group" "example" {
    container {
        name   = "app1"
        image  = "myregistry1.azurecr.io/myapp1:latest"
    }
    container {
        name   = "app2"
        image  = "myregistry2.azurecr.io/myapp2:latest"
    }
    image_registry_credential {
        user_assigned_identity_id = data.azurerm_user_assigned_identity.example.id
        server = "myregistry1.azurecr.io"
    }
    image_registry_credential {
        user_assigned_identity_id = data.azurerm_user_assigned_identity.example.id
        server = "myregistry2.azurecr.io"
    }
}"#;

const REGISTRY_IMAGE_FROM_VARIABLE: &str = r#"
resource "azurerm_container_group" "example" {
    container {
        name   = "app"
        image  = var.image
    }
}"#;

#[test_case(PUBLIC_IMAGE_WITHOUT_CREDENTIAL ; "public image without credential")]
#[test_case(PUBLIC_IMAGE_WITH_EMPTY_CREDENTIAL ; "public image with empty credential")]
#[test_case(REGISTRY_IMAGE_WITH_IDENTITY ; "registry image with identity")]
#[test_case(REGISTRY_IMAGES_WITH_MATCHING_CREDENTIALS ; "one credential per registry")]
#[test_case(REGISTRY_IMAGE_FROM_VARIABLE ; "unknown image")]
fn container_images_that_pass(source: &str) {
    assert!(check(&ImageRegistryCredentialIdentityRule, source).is_empty());
}

#[test]
fn registry_image_without_credential_is_reported_on_the_group() {
    let source = r#"
resource "azurerm_container_group" "example" {
    container {
        name   = "app"
        image  = "myregistry.azurecr.io/myapp:latest"
    }
}"#;
    assert_issues!(
        check(&ImageRegistryCredentialIdentityRule, source),
        [(
            CONTAINER_GROUP_RULE,
            "image_registry_credential block is missing for Azure Container Registry image for server myregistry.azurecr.io",
            range("main.tf", (2, 1), (2, 45))
        )]
    );
}

#[test]
fn one_registry_image_among_public_ones_needs_a_credential() {
    let source = r#"
resource "azurerm_container_group" "example" {
    container {
        name   = "app1"
        image  = "nginx:latest"
    }
    container {
        name   = "app2"
        image  = "myregistry.azurecr.io/myapp:latest"
    }
}"#;
    assert_issues!(
        check(&ImageRegistryCredentialIdentityRule, source),
        [(
            CONTAINER_GROUP_RULE,
            "image_registry_credential block is missing for Azure Container Registry image for server myregistry.azurecr.io",
            range("main.tf", (2, 1), (2, 45))
        )]
    );
}

#[test_case(
    "    image_registry_credential {\n    }\n" ; "credential without identity"
)]
#[test_case(
    "    image_registry_credential {\n        user_assigned_identity_id = data.azurerm_user_assigned_identity.example.id\n        server = \"otherregistry.azurecr.io\"\n    }\n"
    ; "credential for another registry"
)]
fn registry_image_credential_must_carry_an_identity_for_its_server(credential: &str) {
    let source = format!(
        "\nresource \"azurerm_container_group\" \"example\" {{\n    container {{\n        name   = \"app\"\n        image  = \"myregistry.azurecr.io/myapp:latest\"\n    }}\n{credential}}}"
    );
    assert_issues!(
        check(&ImageRegistryCredentialIdentityRule, &source),
        [(
            CONTAINER_GROUP_RULE,
            "user_assigned_identity_id is missing in image_registry_credential for Azure Container Registry image for server myregistry.azurecr.io",
            range("main.tf", (7, 5), (7, 30))
        )]
    );
}

#[test]
fn registry_without_a_matching_credential_is_reported_once() {
    let source = r#"
resource "azurerm_container_group" "example" {
    container {
        name   = "app1"
        image  = "myregistry1.azurecr.io/myapp1:latest"
    }
    container {
        name   = "app2"
        image  = "myregistry2.azurecr.io/myapp2:latest"
    }
    image_registry_credential {
        user_assigned_identity_id = data.azurerm_user_assigned_identity.example.id
        server = "myregistry1.azurecr.io"
    }
}"#;
    assert_issues!(
        check(&ImageRegistryCredentialIdentityRule, source),
        [(
            CONTAINER_GROUP_RULE,
            "image_registry_credential block is missing for Azure Container Registry image for server myregistry2.azurecr.io",
            range("main.tf", (2, 1), (2, 45))
        )]
    );
}

#[test]
fn matching_credential_without_identity_is_reported_once() {
    let source = r#"
resource "azurerm_container_group" "example" {
    container {
        image  = "myregistry.azurecr.io/myapp:latest"
    }
    image_registry_credential {
        server = "myregistry.azurecr.io"
    }
}"#;
    assert_eq!(
        messages(&check(&ImageRegistryCredentialIdentityRule, source)),
        vec!["user_assigned_identity_id is missing in image_registry_credential for Azure Container Registry image for server myregistry.azurecr.io"]
    );
}
