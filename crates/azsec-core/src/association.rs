//! "Is resource X referenced by some resource of kind Y" queries

use std::collections::BTreeSet;

use log::debug;

use crate::document::{Block, Document, Number, Value};
use crate::errors::MalformedExpression;
use crate::eval::ExpectedType;
use crate::reference::resolve_resource_reference;
use crate::schema::{extract, Shape};

/// Meta-arguments that make a resource block stand for several instances
pub const REPETITION_ATTRIBUTES: [&str; 2] = ["count", "for_each"];

/// How many instances a resource block declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    /// A single instance
    None,
    /// `count` or `for_each` with a statically known trip count
    Literal(u64),
    /// `count` or `for_each` that depends on something outside the document
    Unknown,
}

impl Repetition {
    /// Reads `count` first, then `for_each`. The block must have been
    /// extracted with a shape that includes [`REPETITION_ATTRIBUTES`].
    pub fn of(block: &Block) -> Result<Self, MalformedExpression> {
        if let Some(count) = block.attribute("count") {
            let repetition = match count.evaluate(ExpectedType::Number)?.known() {
                Some(Value::Number(Number::Int(n))) if *n >= 0 => Repetition::Literal(*n as u64),
                _ => Repetition::Unknown,
            };
            return Ok(repetition);
        }
        if let Some(for_each) = block.attribute("for_each") {
            let repetition = match for_each.evaluate(ExpectedType::Any)?.known() {
                Some(Value::Array(items)) => Repetition::Literal(items.len() as u64),
                Some(Value::Object(entries)) => Repetition::Literal(entries.len() as u64),
                _ => Repetition::Unknown,
            };
            return Ok(repetition);
        }
        Ok(Repetition::None)
    }
}

/// Shape for target blocks whose associations will be checked
pub fn target_shape() -> Shape {
    Shape::new().attributes(&REPETITION_ATTRIBUTES)
}

/// Labels of `target` resources whose identity is referenced by some
/// associating resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationIndex {
    labels: BTreeSet<String>,
}

impl AssociationIndex {
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Targets that should have an association and do not.
    ///
    /// Unnamed blocks, blocks whose repetition is unknown and blocks with no
    /// instances are never returned.
    pub fn unassociated<'a>(&self, targets: &'a [Block]) -> Result<Vec<&'a Block>, MalformedExpression> {
        let mut missing = vec![];
        for target in targets {
            let Some(label) = target.name() else {
                continue;
            };
            match Repetition::of(target)? {
                Repetition::Unknown => {
                    debug!("skipping {label}: instance count is not statically known");
                    continue;
                }
                Repetition::Literal(0) => continue,
                Repetition::None | Repetition::Literal(_) => {}
            }
            if !self.contains(label) {
                missing.push(target);
            }
        }
        Ok(missing)
    }
}

impl FromIterator<String> for AssociationIndex {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self { labels: iter.into_iter().collect() }
    }
}

/// Collect the labels of `target_type` resources referenced through
/// `via_type.<label>.<reference_attribute>`.
pub fn build_associations(
    document: &Document,
    via_type: &str,
    reference_attribute: &str,
    target_type: &str,
) -> Result<AssociationIndex, MalformedExpression> {
    let mut labels = BTreeSet::new();
    for block in extract(document, via_type, &Shape::new().attribute(reference_attribute)) {
        let Some(attribute) = block.attribute(reference_attribute) else {
            continue;
        };
        let evaluation = attribute.evaluate(ExpectedType::Any)?;
        for traversal in evaluation.traversals() {
            if let Some(reference) = resolve_resource_reference(traversal, target_type) {
                labels.insert(reference.label);
            }
        }
    }
    Ok(AssociationIndex { labels })
}
