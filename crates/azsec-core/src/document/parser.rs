//! Lowering of `hcl-edit` syntax trees into the document model
//!
//! Parsing itself is delegated to `hcl-edit`. This module only walks the
//! resulting tree once, resolving literal values where the syntax allows it
//! and recording the variable traversals of everything else.

use std::ops::Range;
use std::sync::Arc;

use hcl_edit::expr::{
    Expression as HclExpression, ObjectKey, Traversal as HclTraversal, TraversalOperator,
    UnaryOperator,
};
use hcl_edit::structure::{Attribute as HclAttribute, Block as HclBlock, BlockLabel, Body as HclBody};
use hcl_edit::template::Element;
use hcl_edit::Span;
use indexmap::IndexMap;

use super::{
    Attribute, Block, Body, Expression, File, Index, Number, SourceMapper, SourceRange, Step,
    TemplatePart, Traversal, Value,
};
use crate::errors::DocumentError;

/// Parse one configuration file
pub fn parse_file(name: impl Into<Arc<str>>, source: &str) -> Result<File, DocumentError> {
    let name = name.into();
    let body = hcl_edit::parser::parse_body(source).map_err(|e| DocumentError::Parse {
        file: name.to_string(),
        message: e.to_string(),
    })?;
    let lowering = Lowering { mapper: SourceMapper::new(source, name.clone()) };
    Ok(File { name, body: lowering.body(&body) })
}

struct Lowering<'a> {
    mapper: SourceMapper<'a>,
}

impl<'a> Lowering<'a> {
    fn range(&self, span: Option<Range<usize>>) -> SourceRange {
        self.mapper.optional_span_to_range(span.as_ref())
    }

    fn body(&self, body: &HclBody) -> Body {
        Body { attributes: self.attributes(body), blocks: body.blocks().map(|b| self.block(b)).collect() }
    }

    fn attributes(&self, body: &HclBody) -> IndexMap<String, Attribute> {
        let mut attributes = IndexMap::new();
        for attribute in body.attributes() {
            // duplicates are a parse defect upstream; the first definition wins
            attributes
                .entry(attribute.key.as_str().to_string())
                .or_insert_with(|| self.attribute(attribute));
        }
        attributes
    }

    fn attribute(&self, attribute: &HclAttribute) -> Attribute {
        Attribute {
            name: attribute.key.as_str().to_string(),
            expression: self.expression(&attribute.value),
            range: self.range(attribute.span()),
            expr_range: self.range(attribute.value.span()),
        }
    }

    fn block(&self, block: &HclBlock) -> Block {
        let labels = block
            .labels
            .iter()
            .map(|label| match label {
                BlockLabel::String(s) => s.value().to_string(),
                BlockLabel::Ident(ident) => ident.as_str().to_string(),
            })
            .collect();

        let header_start = block.ident.span();
        let header_end = block
            .labels
            .last()
            .and_then(|label| match label {
                BlockLabel::String(s) => s.span(),
                BlockLabel::Ident(ident) => ident.span(),
            })
            .or_else(|| block.ident.span());
        let def_range = match (header_start, header_end) {
            (Some(start), Some(end)) => self.mapper.span_to_range(&(start.start..end.end)),
            _ => self.range(block.span()),
        };

        Block {
            block_type: block.ident.as_str().to_string(),
            labels,
            attributes: self.attributes(&block.body),
            blocks: block.body.blocks().map(|b| self.block(b)).collect(),
            def_range,
            range: self.range(block.span()),
        }
    }

    fn expression(&self, expr: &HclExpression) -> Expression {
        match expr {
            HclExpression::Null(_) => Expression::Literal(Value::Null),
            HclExpression::Bool(b) => Expression::Literal(Value::Bool(*b.value())),
            HclExpression::Number(n) => {
                let n = n.value();
                let number = match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => Number::Int(i),
                    (None, Some(f)) => Number::Float(f),
                    (None, None) => Number::Float(f64::NAN),
                };
                Expression::Literal(Value::Number(number))
            }
            HclExpression::String(s) => Expression::Literal(Value::String(s.value().to_string())),
            HclExpression::Array(array) => {
                let items: Vec<Expression> = array.iter().map(|e| self.expression(e)).collect();
                match items.iter().map(|e| e.as_literal().cloned()).collect::<Option<Vec<_>>>() {
                    Some(values) => Expression::Literal(Value::Array(values)),
                    None => Expression::Opaque(self.references(expr)),
                }
            }
            HclExpression::Object(object) => {
                let mut entries = IndexMap::new();
                for (key, value) in object.iter() {
                    let key = match key {
                        ObjectKey::Ident(ident) => Some(ident.as_str().to_string()),
                        ObjectKey::Expression(key_expr) => match self.expression(key_expr) {
                            Expression::Literal(Value::String(s)) => Some(s),
                            Expression::Literal(other) => Some(other.to_string()),
                            _ => None,
                        },
                    };
                    let value = self.expression(value.expr());
                    match (key, value) {
                        (Some(key), Expression::Literal(value)) => {
                            entries.insert(key, value);
                        }
                        _ => return Expression::Opaque(self.references(expr)),
                    }
                }
                Expression::Literal(Value::Object(entries))
            }
            HclExpression::StringTemplate(template) => self.template(expr, template.iter()),
            HclExpression::HeredocTemplate(heredoc) => self.template(expr, heredoc.template.iter()),
            HclExpression::Parenthesis(inner) => self.expression(inner.inner()),
            HclExpression::Variable(variable) => Expression::Traversal(Traversal {
                root: variable.as_str().to_string(),
                steps: vec![],
                range: self.range(expr.span()),
            }),
            HclExpression::Traversal(traversal) => match self.traversal(traversal, expr.span()) {
                Some(traversal) => Expression::Traversal(traversal),
                None => Expression::Opaque(self.references(expr)),
            },
            HclExpression::UnaryOp(op) => {
                match (op.operator.value(), self.expression(&op.expr)) {
                    (UnaryOperator::Neg, Expression::Literal(Value::Number(Number::Int(i)))) => {
                        Expression::Literal(Value::Number(Number::Int(-i)))
                    }
                    (UnaryOperator::Neg, Expression::Literal(Value::Number(Number::Float(f)))) => {
                        Expression::Literal(Value::Number(Number::Float(-f)))
                    }
                    (UnaryOperator::Not, Expression::Literal(Value::Bool(b))) => {
                        Expression::Literal(Value::Bool(!b))
                    }
                    _ => Expression::Opaque(self.references(expr)),
                }
            }
            HclExpression::Conditional(_)
            | HclExpression::FuncCall(_)
            | HclExpression::BinaryOp(_)
            | HclExpression::ForExpr(_) => Expression::Opaque(self.references(expr)),
        }
    }

    fn template<'e>(
        &self,
        expr: &HclExpression,
        elements: impl Iterator<Item = &'e Element>,
    ) -> Expression {
        let mut parts: Vec<TemplatePart> = vec![];
        for element in elements {
            match element {
                Element::Literal(literal) => match parts.last_mut() {
                    Some(TemplatePart::Literal(text)) => text.push_str(literal.value()),
                    _ => parts.push(TemplatePart::Literal(literal.value().to_string())),
                },
                Element::Interpolation(interpolation) => {
                    parts.push(TemplatePart::Interpolation(self.expression(&interpolation.expr)))
                }
                Element::Directive(_) => return Expression::Opaque(self.references(expr)),
            }
        }
        match parts.as_slice() {
            [] => Expression::Literal(Value::String(String::new())),
            [TemplatePart::Literal(text)] => Expression::Literal(Value::String(text.clone())),
            _ => Expression::Template(parts),
        }
    }

    /// `None` when the traversal is not rooted at a variable, e.g. `func().attr`
    fn traversal(&self, traversal: &HclTraversal, span: Option<Range<usize>>) -> Option<Traversal> {
        let root = traversal.expr.as_variable()?;
        let steps = traversal
            .operators
            .iter()
            .map(|op| match op.value() {
                TraversalOperator::GetAttr(ident) => Step::Attr(ident.as_str().to_string()),
                TraversalOperator::LegacyIndex(n) => Step::Index(Index::Number(*n.value())),
                TraversalOperator::Index(index) => Step::Index(match self.expression(index) {
                    Expression::Literal(Value::Number(Number::Int(i))) if i >= 0 => {
                        Index::Number(i as u64)
                    }
                    Expression::Literal(Value::String(key)) => Index::Key(key),
                    _ => Index::Unknown,
                }),
                TraversalOperator::AttrSplat(_) | TraversalOperator::FullSplat(_) => Step::Splat,
            })
            .collect();
        Some(Traversal { root: root.as_str().to_string(), steps, range: self.range(span) })
    }

    /// Variable traversals referenced by an expression that has no static value
    fn references(&self, expr: &HclExpression) -> Vec<Traversal> {
        let mut found = vec![];
        self.collect_references(expr, &mut found);
        found
    }

    fn collect_references(&self, expr: &HclExpression, found: &mut Vec<Traversal>) {
        match expr {
            HclExpression::Null(_)
            | HclExpression::Bool(_)
            | HclExpression::Number(_)
            | HclExpression::String(_) => {}
            HclExpression::Variable(variable) => found.push(Traversal {
                root: variable.as_str().to_string(),
                steps: vec![],
                range: self.range(expr.span()),
            }),
            HclExpression::Traversal(traversal) => {
                match self.traversal(traversal, expr.span()) {
                    Some(resolved) => found.push(resolved),
                    None => self.collect_references(&traversal.expr, found),
                }
                for op in traversal.operators.iter() {
                    if let TraversalOperator::Index(index) = op.value() {
                        self.collect_references(index, found);
                    }
                }
            }
            HclExpression::Array(elements) => {
                for element in elements.iter() {
                    self.collect_references(element, found);
                }
            }
            HclExpression::Object(object) => {
                for (key, value) in object.iter() {
                    if let ObjectKey::Expression(key_expr) = key {
                        self.collect_references(key_expr, found);
                    }
                    self.collect_references(value.expr(), found);
                }
            }
            HclExpression::StringTemplate(template) => {
                for element in template.iter() {
                    if let Element::Interpolation(interpolation) = element {
                        self.collect_references(&interpolation.expr, found);
                    }
                }
            }
            HclExpression::HeredocTemplate(heredoc) => {
                for element in heredoc.template.iter() {
                    if let Element::Interpolation(interpolation) = element {
                        self.collect_references(&interpolation.expr, found);
                    }
                }
            }
            HclExpression::Parenthesis(inner) => self.collect_references(inner.inner(), found),
            HclExpression::Conditional(cond) => {
                self.collect_references(&cond.cond_expr, found);
                self.collect_references(&cond.true_expr, found);
                self.collect_references(&cond.false_expr, found);
            }
            HclExpression::FuncCall(call) => {
                for arg in call.args.iter() {
                    self.collect_references(arg, found);
                }
            }
            HclExpression::UnaryOp(op) => self.collect_references(&op.expr, found),
            HclExpression::BinaryOp(op) => {
                self.collect_references(&op.lhs_expr, found);
                self.collect_references(&op.rhs_expr, found);
            }
            HclExpression::ForExpr(for_expr) => {
                self.collect_references(&for_expr.intro.collection_expr, found);
                if let Some(ref key_expr) = for_expr.key_expr {
                    self.collect_references(key_expr, found);
                }
                self.collect_references(&for_expr.value_expr, found);
                if let Some(ref cond) = for_expr.cond {
                    self.collect_references(&cond.expr, found);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> File {
        parse_file("main.tf", source).expect("parse")
    }

    fn attr_expr(file: &File, block: usize, name: &str) -> Expression {
        file.body.blocks[block].attributes[name].expression.clone()
    }

    #[test]
    fn def_range_covers_type_and_labels() {
        let file = parse("\nresource \"azurerm_key_vault\" \"example\" {\n  name = \"kv\"\n}\n");
        let block = &file.body.blocks[0];

        assert_eq!(block.block_type, "resource");
        assert_eq!(block.labels, vec!["azurerm_key_vault", "example"]);
        assert_eq!((block.def_range.start.line, block.def_range.start.column), (2, 1));
        assert_eq!((block.def_range.end.line, block.def_range.end.column), (2, 39));
        assert_eq!(block.range.end.line, 4);
    }

    #[test]
    fn unlabeled_block_def_range_is_the_keyword() {
        let file = parse("resource \"a\" \"b\" {\n  site_config {\n  }\n}\n");
        let nested = &file.body.blocks[0].blocks[0];

        assert_eq!(nested.block_type, "site_config");
        assert!(nested.labels.is_empty());
        assert_eq!((nested.def_range.start.line, nested.def_range.start.column), (2, 3));
        assert_eq!((nested.def_range.end.line, nested.def_range.end.column), (2, 14));
    }

    #[test]
    fn expression_range_is_the_right_hand_side() {
        let file = parse("resource \"a\" \"b\" {\n  https_only = false\n}\n");
        let attribute = &file.body.blocks[0].attributes["https_only"];

        assert_eq!((attribute.expr_range.start.line, attribute.expr_range.start.column), (2, 16));
        assert_eq!((attribute.expr_range.end.line, attribute.expr_range.end.column), (2, 21));
        assert_eq!(attribute.expression, Expression::Literal(Value::Bool(false)));
    }

    #[test]
    fn literals_are_resolved() {
        let file = parse(
            r#"
resource "a" "b" {
  count   = 2
  ratio   = -1.5
  name    = "plain"
  joined  = "no ${"interp"} here"
  tags    = { env = "prod" }
  zones   = ["1", "2"]
  nothing = null
}
"#,
        );
        assert_eq!(attr_expr(&file, 0, "count"), Expression::Literal(Value::Number(Number::Int(2))));
        assert_eq!(
            attr_expr(&file, 0, "ratio"),
            Expression::Literal(Value::Number(Number::Float(-1.5)))
        );
        assert_eq!(attr_expr(&file, 0, "name"), Expression::Literal(Value::string("plain")));
        assert!(matches!(attr_expr(&file, 0, "joined"), Expression::Template(_)));
        assert!(matches!(attr_expr(&file, 0, "tags"), Expression::Literal(Value::Object(_))));
        assert_eq!(
            attr_expr(&file, 0, "zones"),
            Expression::Literal(Value::Array(vec![Value::string("1"), Value::string("2")]))
        );
        assert_eq!(attr_expr(&file, 0, "nothing"), Expression::Literal(Value::Null));
    }

    #[test]
    fn traversals_keep_their_steps() {
        let file = parse(
            r#"
resource "a" "b" {
  resource_id = azurerm_key_vault.example[0].id
  by_key      = azurerm_key_vault.example["x"].id
  computed    = azurerm_key_vault.example[var.i].id
  splat       = azurerm_key_vault.example[*].id
}
"#,
        );
        let Expression::Traversal(t) = attr_expr(&file, 0, "resource_id") else {
            panic!("expected traversal");
        };
        assert_eq!(t.root, "azurerm_key_vault");
        assert_eq!(
            t.steps,
            vec![
                Step::Attr("example".into()),
                Step::Index(Index::Number(0)),
                Step::Attr("id".into())
            ]
        );
        assert_eq!(t.to_string(), "azurerm_key_vault.example[0].id");

        let Expression::Traversal(t) = attr_expr(&file, 0, "by_key") else {
            panic!("expected traversal");
        };
        assert_eq!(t.steps[1], Step::Index(Index::Key("x".into())));

        let Expression::Traversal(t) = attr_expr(&file, 0, "computed") else {
            panic!("expected traversal");
        };
        assert_eq!(t.steps[1], Step::Index(Index::Unknown));

        let Expression::Traversal(t) = attr_expr(&file, 0, "splat") else {
            panic!("expected traversal");
        };
        assert_eq!(t.steps[1], Step::Splat);
    }

    #[test]
    fn dynamic_expressions_keep_every_reference() {
        let file = parse(
            r#"
resource "a" "b" {
  server   = "${azurerm_container_registry.acr.name}.${var.suffix}"
  choice   = var.enabled ? local.a : local.b
  call     = lower(var.name)
  mixed    = [var.a, "b"]
}
"#,
        );
        let names = |expr: Expression| {
            expr.variables().iter().map(|t| t.to_string()).collect::<Vec<_>>()
        };
        assert_eq!(
            names(attr_expr(&file, 0, "server")),
            vec!["azurerm_container_registry.acr.name", "var.suffix"]
        );
        assert_eq!(names(attr_expr(&file, 0, "choice")), vec!["var.enabled", "local.a", "local.b"]);
        assert_eq!(names(attr_expr(&file, 0, "call")), vec!["var.name"]);
        assert_eq!(names(attr_expr(&file, 0, "mixed")), vec!["var.a"]);
    }

    #[test]
    fn reports_parse_errors_with_the_file_name() {
        let err = parse_file("broken.tf", "resource \"a\" {").unwrap_err();
        assert!(matches!(err, DocumentError::Parse { ref file, .. } if file == "broken.tf"));
    }
}
