//! Static analysis engine for Terraform configurations.
//!
//! The engine reads a parsed [`Document`](document::Document) and offers rule
//! authors a small vocabulary: [`schema::extract`], [`eval::evaluate`],
//! [`reference::resolve_resource_reference`],
//! [`association::build_associations`], [`provider::resolve_provider`] and
//! [`issue::IssueSink::record`]. Rules implement [`rule::Rule`] and are run
//! through a [`rule::RuleSet`].

pub mod association;
pub mod config;
pub mod document;
pub mod errors;
pub mod eval;
pub mod issue;
pub mod provider;
pub mod reference;
pub mod rule;
pub mod schema;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{Level, LintConfig, RuleConfig};
pub use document::{Attribute, Block, Document, Expression, SourceRange, Traversal, Value};
pub use errors::{CheckError, ConfigError, DocumentError, MalformedExpression};
pub use issue::{Issue, IssueSink, Severity};
pub use rule::{LintReport, Rule, RuleFailure, RuleSet};
