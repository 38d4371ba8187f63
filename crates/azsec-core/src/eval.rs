//! Literal evaluation with symbolic fallback
//!
//! [`evaluate`] never guesses. A literal of the requested type comes back as
//! [`Evaluation::Known`]; anything else comes back as
//! [`Evaluation::Unresolved`] together with every variable traversal the
//! expression mentions, so checks can reason about what a value points at
//! even when they cannot know the value itself.

use crate::document::{Attribute, Expression, Step, TemplatePart, Traversal, Value};
use crate::errors::MalformedExpression;

/// Type a check wants an expression to evaluate to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    Any,
    Bool,
    Number,
    String,
}

impl ExpectedType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            ExpectedType::Any => true,
            ExpectedType::Bool => matches!(value, Value::Bool(_)),
            ExpectedType::Number => matches!(value, Value::Number(_)),
            ExpectedType::String => matches!(value, Value::String(_)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Known(Value),
    /// The value depends on something outside the document. Literals of the
    /// wrong type and `null` also land here, with no traversals.
    Unresolved(Vec<Traversal>),
}

impl Evaluation {
    pub fn known(&self) -> Option<&Value> {
        match self {
            Evaluation::Known(value) => Some(value),
            Evaluation::Unresolved(_) => None,
        }
    }

    pub fn traversals(&self) -> &[Traversal] {
        match self {
            Evaluation::Known(_) => &[],
            Evaluation::Unresolved(traversals) => traversals,
        }
    }
}

/// Evaluate `expr` as a value of type `expected`
pub fn evaluate(expr: &Expression, expected: ExpectedType) -> Result<Evaluation, MalformedExpression> {
    check_well_formed(expr)?;
    let evaluation = match static_value(expr) {
        Some(value) if !value.is_null() && expected.accepts(&value) => Evaluation::Known(value),
        Some(_) => Evaluation::Unresolved(vec![]),
        None => Evaluation::Unresolved(expr.variables().into_iter().cloned().collect()),
    };
    Ok(evaluation)
}

/// Folds templates whose interpolations are all literal, e.g. `"${"a"}b"`.
fn static_value(expr: &Expression) -> Option<Value> {
    match expr {
        Expression::Literal(value) => Some(value.clone()),
        Expression::Template(parts) => {
            let mut out = String::new();
            for part in parts {
                match part {
                    TemplatePart::Literal(text) => out.push_str(text),
                    TemplatePart::Interpolation(inner) => match static_value(inner)? {
                        Value::Null | Value::Array(_) | Value::Object(_) => return None,
                        value => out.push_str(&value.to_string()),
                    },
                }
            }
            Some(Value::String(out))
        }
        Expression::Traversal(_) | Expression::Opaque(_) => None,
    }
}

fn check_well_formed(expr: &Expression) -> Result<(), MalformedExpression> {
    match expr {
        Expression::Literal(_) => Ok(()),
        Expression::Traversal(traversal) => check_traversal(traversal),
        Expression::Template(parts) => parts.iter().try_for_each(|part| match part {
            TemplatePart::Literal(_) => Ok(()),
            TemplatePart::Interpolation(inner) => check_well_formed(inner),
        }),
        Expression::Opaque(traversals) => traversals.iter().try_for_each(check_traversal),
    }
}

fn check_traversal(traversal: &Traversal) -> Result<(), MalformedExpression> {
    if traversal.root.is_empty() {
        return Err(MalformedExpression::new(&traversal.range, "traversal has an empty root"));
    }
    if traversal.steps.iter().any(|step| matches!(step, Step::Attr(name) if name.is_empty())) {
        return Err(MalformedExpression::new(
            &traversal.range,
            format!("traversal '{}' has an empty attribute step", traversal.root),
        ));
    }
    Ok(())
}

/// Rust types a literal can be read into
pub trait FromValue: Sized {
    const EXPECTED: ExpectedType;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const EXPECTED: ExpectedType = ExpectedType::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    const EXPECTED: ExpectedType = ExpectedType::String;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for i64 {
    const EXPECTED: ExpectedType = ExpectedType::Number;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    const EXPECTED: ExpectedType = ExpectedType::Number;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl Attribute {
    pub fn evaluate(&self, expected: ExpectedType) -> Result<Evaluation, MalformedExpression> {
        evaluate(&self.expression, expected)
    }
}

/// Statically known value of `attribute` as `T`, or `None` when the value is
/// unknown, null or of another type.
pub fn evaluate_as<T: FromValue>(attribute: &Attribute) -> Result<Option<T>, MalformedExpression> {
    Ok(attribute.evaluate(T::EXPECTED)?.known().and_then(T::from_value))
}
