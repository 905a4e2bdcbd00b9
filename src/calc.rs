//! Textual `calc()` algebra over custom-property references and literals.
//!
//! Operands that are themselves `calc(...)` expressions are flattened into a
//! parenthesised group, so nesting builders yields a single outer `calc()`:
//! `multiply(divide(2, cols), "100%")` renders `calc((2 / cols) * 100%)`.
//! Nothing here validates the resulting CSS.

use std::fmt;

use crate::rules::Declaration;
use crate::vars::CustomProperty;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expr(String);

impl Expr {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

impl From<&CustomProperty> for Expr {
    fn from(value: &CustomProperty) -> Self {
        Self(value.reference())
    }
}

impl From<Expr> for String {
    fn from(value: Expr) -> Self {
        value.0
    }
}

macro_rules! expr_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

expr_from_number!(i32, i64, u32, u64, usize, f64);

fn operation(operator: &str, left: Expr, right: Expr) -> Expr {
    let body = [left, right]
        .iter()
        .map(|operand| operand.0.replace("calc(", "("))
        .collect::<Vec<_>>()
        .join(&format!(" {} ", operator));
    Expr(format!("calc({})", body))
}

pub fn add(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    operation("+", left.into(), right.into())
}

pub fn subtract(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    operation("-", left.into(), right.into())
}

pub fn multiply(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    operation("*", left.into(), right.into())
}

pub fn divide(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    operation("/", left.into(), right.into())
}

/// `var(--name, fallback)`: resolves to `fallback` while `property` is unset.
/// Passing another `fallback` result nests the chain.
pub fn fallback(property: &CustomProperty, fallback: impl Into<Expr>) -> Expr {
    Expr(format!("var({}, {})", property.name(), fallback.into()))
}

/// Folds `properties` into one reference chain ending in `terminal`, first
/// property most preferred.
pub fn fallback_chain(properties: &[&CustomProperty], terminal: impl Into<Expr>) -> Expr {
    properties
        .iter()
        .rev()
        .fold(terminal.into(), |inner, property| fallback(property, inner))
}

/// A definition of `property` for the selector it is placed in.
pub fn assign(property: &CustomProperty, value: impl Into<Expr>) -> Declaration {
    Declaration::new(property.name(), value.into().into_string())
}

/// Negation used by the inverse class definitions.
pub fn negate(expr: impl Into<Expr>) -> Expr {
    multiply(expr, -1)
}
