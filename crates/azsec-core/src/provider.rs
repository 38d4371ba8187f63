//! Binding resources to the provider configuration that governs them

use log::{debug, trace};

use crate::document::{Block, Step};
use crate::errors::MalformedExpression;
use crate::eval::{evaluate_as, Evaluation, ExpectedType};

/// A resource and the provider block it is realized with
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderBinding<'a> {
    pub resource: &'a Block,
    pub provider: &'a Block,
    display_name: String,
}

impl<'a> ProviderBinding<'a> {
    /// The provider's alias when it has one, otherwise its type name
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnboundReason {
    /// No unaliased provider block exists
    NoDefault,
    /// Several candidates match equally well
    Ambiguous,
    /// `provider = type.alias` names an alias no candidate declares
    AliasNotFound(String),
    /// The `provider` attribute is not of the form `type.alias`
    InvalidReference,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResolution<'a> {
    Bound(ProviderBinding<'a>),
    Unbound(UnboundReason),
}

enum Alias {
    None,
    Literal(String),
    /// Present but not statically known; never matches anything
    Unknown,
}

fn alias_of(provider: &Block) -> Result<Alias, MalformedExpression> {
    let Some(attribute) = provider.attribute("alias") else {
        return Ok(Alias::None);
    };
    Ok(match evaluate_as::<String>(attribute)? {
        Some(alias) => Alias::Literal(alias),
        None => Alias::Unknown,
    })
}

fn provider_type(provider: &Block) -> &str {
    provider.labels.first().map(String::as_str).unwrap_or_default()
}

/// What the resource's `provider` attribute asks for
enum Requested {
    /// No `provider` attribute
    Implicit,
    /// `provider = type`
    Default(String),
    /// `provider = type.alias`
    Aliased(String, String),
    Invalid,
}

fn requested_provider(resource: &Block) -> Result<Requested, MalformedExpression> {
    let Some(attribute) = resource.attribute("provider") else {
        return Ok(Requested::Implicit);
    };
    let requested = match attribute.evaluate(ExpectedType::String)? {
        Evaluation::Known(value) => {
            let parts: Vec<&str> = value.as_str().unwrap_or_default().split('.').collect();
            match parts[..] {
                [root] if !root.is_empty() => Requested::Default(root.to_string()),
                [root, alias] if !root.is_empty() && !alias.is_empty() => {
                    Requested::Aliased(root.to_string(), alias.to_string())
                }
                _ => Requested::Invalid,
            }
        }
        Evaluation::Unresolved(traversals) => match traversals.as_slice() {
            [traversal] => match traversal.steps.as_slice() {
                [] => Requested::Default(traversal.root.clone()),
                [Step::Attr(alias)] => Requested::Aliased(traversal.root.clone(), alias.clone()),
                _ => Requested::Invalid,
            },
            _ => Requested::Invalid,
        },
    };
    Ok(requested)
}

fn bind<'a>(
    resource: &'a Block,
    mut matches: Vec<(&'a Block, Option<String>)>,
    none_found: UnboundReason,
) -> ProviderResolution<'a> {
    match matches.len() {
        0 => ProviderResolution::Unbound(none_found),
        1 => {
            let (provider, alias) = matches.remove(0);
            let display_name = alias.unwrap_or_else(|| provider_type(provider).to_string());
            ProviderResolution::Bound(ProviderBinding { resource, provider, display_name })
        }
        _ => ProviderResolution::Unbound(UnboundReason::Ambiguous),
    }
}

/// Find the provider block among `candidates` that configures `resource`.
///
/// Candidates are the provider blocks of the resource's provider type, e.g.
/// every `provider "azurerm"` block. An unresolvable binding is a normal
/// outcome, reported as [`ProviderResolution::Unbound`].
pub fn resolve_provider<'a>(
    resource: &'a Block,
    candidates: &'a [Block],
) -> Result<ProviderResolution<'a>, MalformedExpression> {
    let mut aliases = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        aliases.push((candidate, alias_of(candidate)?));
    }

    let resolution = match requested_provider(resource)? {
        Requested::Invalid => ProviderResolution::Unbound(UnboundReason::InvalidReference),
        Requested::Aliased(root, alias) => {
            trace!("resolving provider {root}.{alias}");
            let matches = aliases
                .into_iter()
                .filter(|(candidate, _)| provider_type(candidate) == root)
                .filter_map(|(candidate, candidate_alias)| match candidate_alias {
                    Alias::Literal(name) if name == alias => Some((candidate, Some(name))),
                    _ => None,
                })
                .collect();
            bind(resource, matches, UnboundReason::AliasNotFound(alias))
        }
        Requested::Default(root) => {
            let matches = aliases
                .into_iter()
                .filter(|(candidate, alias)| provider_type(candidate) == root && matches!(alias, Alias::None))
                .map(|(candidate, _)| (candidate, None))
                .collect();
            bind(resource, matches, UnboundReason::NoDefault)
        }
        Requested::Implicit => {
            let matches = aliases
                .into_iter()
                .filter(|(_, alias)| matches!(alias, Alias::None))
                .map(|(candidate, _)| (candidate, None))
                .collect();
            bind(resource, matches, UnboundReason::NoDefault)
        }
    };

    if let ProviderResolution::Unbound(ref reason) = resolution {
        debug!("no provider bound for {:?}: {:?}", resource.labels, reason);
    }
    Ok(resolution)
}
