//! Schema-driven extraction of blocks from a document
//!
//! A [`Shape`] names the attributes and nested block types a check cares
//! about. Extraction returns copies of the matching blocks cut down to that
//! shape; anything the shape names but the document omits is simply absent.

use log::trace;

use crate::document::{Block, Document};

/// Declarative description of the parts of a block a check reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    attributes: Vec<String>,
    blocks: Vec<(String, Shape)>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    pub fn attributes(mut self, names: &[&str]) -> Self {
        self.attributes.extend(names.iter().map(|name| name.to_string()));
        self
    }

    /// Nested block type, itself cut down to `shape`
    pub fn block(mut self, block_type: impl Into<String>, shape: Shape) -> Self {
        self.blocks.push((block_type.into(), shape));
        self
    }

    fn nested(&self, block_type: &str) -> Option<&Shape> {
        self.blocks.iter().find(|(name, _)| name == block_type).map(|(_, shape)| shape)
    }

    /// Copy of `block` holding only what this shape names
    pub fn project(&self, block: &Block) -> Block {
        Block {
            block_type: block.block_type.clone(),
            labels: block.labels.clone(),
            attributes: block
                .attributes
                .iter()
                .filter(|(name, _)| self.attributes.iter().any(|wanted| wanted == *name))
                .map(|(name, attribute)| (name.clone(), attribute.clone()))
                .collect(),
            blocks: block
                .blocks
                .iter()
                .filter_map(|nested| self.nested(&nested.block_type).map(|shape| shape.project(nested)))
                .collect(),
            def_range: block.def_range.clone(),
            range: block.range.clone(),
        }
    }
}

/// Every `resource "<resource_type>" "..."` block, in document order
pub fn extract(document: &Document, resource_type: &str, shape: &Shape) -> Vec<Block> {
    extract_blocks(document, "resource", resource_type, shape)
}

/// Top-level blocks of `block_type` whose first label is `first_label`,
/// e.g. `provider "azurerm"` blocks.
pub fn extract_blocks(
    document: &Document,
    block_type: &str,
    first_label: &str,
    shape: &Shape,
) -> Vec<Block> {
    let blocks: Vec<Block> = document
        .blocks()
        .filter(|block| {
            block.block_type == block_type
                && block.labels.first().map(String::as_str) == Some(first_label)
        })
        .map(|block| shape.project(block))
        .collect();
    trace!("extracted {} {} \"{}\" block(s)", blocks.len(), block_type, first_label);
    blocks
}
