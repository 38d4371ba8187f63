use azsec_core::eval::{evaluate_as, Evaluation, ExpectedType};
use azsec_core::schema::{extract, Shape};
use azsec_core::{Block, CheckError, Document, Issue, IssueSink, Rule, Severity, Value};

use crate::rule_id::RuleId;

const REGISTRY_DOMAIN_SUFFIX: &str = ".azurecr.io";
const REGISTRY_RESOURCE: &str = "azurerm_container_registry";
const REGISTRY_IMAGE_MARKER: &str = "azurecr.io/";

/// Images pulled from an Azure Container Registry need an
/// `image_registry_credential` for that server, and every registry
/// credential must pull with a managed identity instead of a username and
/// password.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRegistryCredentialIdentityRule;

impl Rule for ImageRegistryCredentialIdentityRule {
    fn name(&self) -> &str {
        RuleId::AzurermContainerGroupImageRegistryCredentialIdentity.name()
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn enabled(&self) -> bool {
        true
    }

    fn link(&self) -> Option<String> {
        Some(RuleId::AzurermContainerGroupImageRegistryCredentialIdentity.link())
    }

    fn check(&self, document: &Document) -> Result<Vec<Issue>, CheckError> {
        let shape = Shape::new()
            .block("container", Shape::new().attribute("image"))
            .block(
                "image_registry_credential",
                Shape::new().attributes(&["user_assigned_identity_id", "server"]),
            );

        let mut sink = IssueSink::for_rule(self);
        for group in extract(document, "azurerm_container_group", &shape) {
            let credentials: Vec<&Block> = group.blocks_of("image_registry_credential").collect();
            let servers = credentials
                .iter()
                .map(|credential| credential.attribute("server").map(evaluate_as::<String>).transpose())
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(Option::flatten)
                .collect::<Vec<_>>();
            let hosts = registry_hosts(&group)?;
            let mut reported = vec![false; credentials.len()];

            for host in &hosts {
                let matched = servers.iter().position(|server| server.as_deref() == Some(host.as_str()));
                // A credential without a server, or naming a registry no image
                // pulls from, is taken to be the one meant for this host.
                let fallback = || {
                    servers
                        .iter()
                        .position(|server| server.is_none())
                        .or_else(|| {
                            servers.iter().position(|server| {
                                server.as_ref().is_some_and(|server| !hosts.contains(server))
                            })
                        })
                };
                let (index, server_matches) = match matched {
                    Some(index) => (index, true),
                    None => match fallback() {
                        Some(index) => (index, false),
                        None => {
                            sink.record(
                                format!(
                                    "image_registry_credential block is missing for Azure Container Registry \
                                     image for server {host}"
                                ),
                                &group.def_range,
                            );
                            continue;
                        }
                    },
                };
                let credential = credentials[index];
                let serves_host = server_matches || servers[index].is_none();
                let has_identity = credential.attribute("user_assigned_identity_id").is_some();
                if reported[index] || (has_identity && serves_host) {
                    continue;
                }
                reported[index] = true;
                sink.record(missing_identity(Some(host)), &credential.def_range);
            }

            for (index, credential) in credentials.iter().enumerate() {
                if reported[index] || credential.attribute("user_assigned_identity_id").is_some() {
                    continue;
                }
                let Some(server) = credential.attribute("server") else {
                    continue;
                };
                match server.evaluate(ExpectedType::String)? {
                    Evaluation::Known(Value::String(server)) => {
                        if server.ends_with(REGISTRY_DOMAIN_SUFFIX) {
                            sink.record(missing_identity(Some(&server)), &credential.def_range);
                        }
                    }
                    Evaluation::Known(_) => {}
                    Evaluation::Unresolved(traversals) => {
                        if traversals.iter().any(|t| t.root.contains(REGISTRY_RESOURCE)) {
                            sink.record(missing_identity(None), &credential.def_range);
                        }
                    }
                }
            }
        }
        Ok(sink.into_issues())
    }
}

/// Registry hosts of the literal container images pulled from an Azure
/// Container Registry, deduplicated in declaration order
fn registry_hosts(group: &Block) -> Result<Vec<String>, CheckError> {
    let mut hosts: Vec<String> = Vec::new();
    for container in group.blocks_of("container") {
        let Some(image) = container.attribute("image") else {
            continue;
        };
        let Some(image) = evaluate_as::<String>(image)? else {
            continue;
        };
        if !image.contains(REGISTRY_IMAGE_MARKER) {
            continue;
        }
        let host = image.split('/').next().unwrap_or_default().to_string();
        if !hosts.contains(&host) {
            hosts.push(host);
        }
    }
    Ok(hosts)
}

fn missing_identity(server: Option<&str>) -> String {
    match server {
        Some(server) => format!(
            "user_assigned_identity_id is missing in image_registry_credential \
             for Azure Container Registry image for server {server}"
        ),
        None => "user_assigned_identity_id is missing in image_registry_credential \
                 for Azure Container Registry image"
            .to_string(),
    }
}
