//! In-memory model of a configuration document
//!
//! The model is produced once by [`parser`] and only ever read afterwards.
//! Blocks keep document order, attribute names are unique per block, and every
//! node remembers the exact [`SourceRange`] it was parsed from.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

pub mod location;
pub mod parser;
mod value;

pub use location::{Pos, SourceMapper, SourceRange};
pub use value::{Number, Value};

use crate::errors::DocumentError;

/// A set of parsed configuration files analyzed together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub files: Vec<File>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub name: Arc<str>,
    pub body: Body,
}

/// Top-level content of a file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub attributes: IndexMap<String, Attribute>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub block_type: String,
    pub labels: Vec<String>,
    pub attributes: IndexMap<String, Attribute>,
    pub blocks: Vec<Block>,
    /// Block type keyword through the last label. Findings about a block are reported here.
    pub def_range: SourceRange,
    /// The whole block, body included
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub expression: Expression,
    pub range: SourceRange,
    pub expr_range: SourceRange,
}

/// Right-hand side of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Traversal(Traversal),
    /// String with interpolations
    Template(Vec<TemplatePart>),
    /// Operators, function calls, conditionals, `for` expressions and
    /// collections holding non-literal items. Only the references survive.
    Opaque(Vec<Traversal>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Interpolation(Expression),
}

/// A variable reference chain such as `azurerm_key_vault.example[0].id`
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub root: String,
    pub steps: Vec<Step>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Attr(String),
    Index(Index),
    Splat,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Index {
    Number(u64),
    Key(String),
    /// Computed at apply time
    Unknown,
}

impl Document {
    /// Parse each `(file name, source)` pair, in the given order.
    pub fn parse<I, N, S>(sources: I) -> Result<Self, DocumentError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<Arc<str>>,
        S: AsRef<str>,
    {
        let files = sources
            .into_iter()
            .map(|(name, source)| parser::parse_file(name, source.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { files })
    }

    /// Parse a single file
    pub fn parse_str(name: impl Into<Arc<str>>, source: &str) -> Result<Self, DocumentError> {
        Ok(Self { files: vec![parser::parse_file(name, source)?] })
    }

    /// Top-level blocks of every file, in file order then document order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.files.iter().flat_map(|file| file.body.blocks.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.files.iter().all(|file| file.body.blocks.is_empty() && file.body.attributes.is_empty())
    }
}

impl Block {
    /// The declared name (second label), which makes a block addressable.
    /// Empty labels are treated as absent.
    pub fn name(&self) -> Option<&str> {
        self.labels.get(1).map(String::as_str).filter(|label| !label.is_empty())
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// First nested block of the given type
    pub fn first_block(&self, block_type: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.block_type == block_type)
    }

    /// Nested blocks of the given type, in document order
    pub fn blocks_of<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |block| block.block_type == block_type)
    }
}

impl Expression {
    /// Every variable traversal referenced anywhere in the expression, in source order
    pub fn variables(&self) -> Vec<&Traversal> {
        let mut out = vec![];
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a Traversal>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Traversal(traversal) => out.push(traversal),
            Expression::Template(parts) => {
                for part in parts {
                    if let TemplatePart::Interpolation(expr) = part {
                        expr.collect_variables(out);
                    }
                }
            }
            Expression::Opaque(traversals) => out.extend(traversals.iter()),
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Expression::Literal(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for step in &self.steps {
            match step {
                Step::Attr(name) => write!(f, ".{name}")?,
                Step::Index(Index::Number(n)) => write!(f, "[{n}]")?,
                Step::Index(Index::Key(key)) => write!(f, "[{key:?}]")?,
                Step::Index(Index::Unknown) => write!(f, "[?]")?,
                Step::Splat => write!(f, "[*]")?,
            }
        }
        Ok(())
    }
}
