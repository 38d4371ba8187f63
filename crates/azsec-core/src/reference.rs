//! Resolution of traversals into resource identity references

use crate::document::{Index, Step, Traversal};

/// Attribute that carries a resource's identity
pub const IDENTITY_ATTRIBUTE: &str = "id";

/// Parsed meaning of `type.label.id` or `type.label[index].id`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceReference {
    pub resource_type: String,
    pub label: String,
    pub index: Option<Index>,
    pub attribute: String,
}

/// Interpret `traversal` as a reference to the identity of a `target_type`
/// resource. Any other shape, including other terminal attributes, yields `None`.
pub fn resolve_resource_reference(traversal: &Traversal, target_type: &str) -> Option<ResourceReference> {
    if traversal.root != target_type {
        return None;
    }
    let (label, rest) = match traversal.steps.split_first()? {
        (Step::Attr(label), rest) if !label.is_empty() => (label, rest),
        _ => return None,
    };
    let (index, rest) = match rest.split_first() {
        Some((Step::Index(index), rest)) => (Some(index.clone()), rest),
        _ => (None, rest),
    };
    match rest {
        [Step::Attr(attribute)] if attribute == IDENTITY_ATTRIBUTE => Some(ResourceReference {
            resource_type: traversal.root.clone(),
            label: label.clone(),
            index,
            attribute: attribute.clone(),
        }),
        _ => None,
    }
}
