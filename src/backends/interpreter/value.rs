//! Runtime values
//!
//! Values print the way the display runtime shows them, e.g. `2`, `0.5`,
//! `(1,hello)`, and carry the type names used in `val x: Int = 2`.

use std::fmt;
use std::sync::Arc;

use super::ast::Literal;
use super::frames::Closure;

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Int(i32),
    Double(f64),
    Bool(bool),
    Char(char),
    Str(Arc<str>),
    Tuple(Arc<[Value]>),
    Function(Arc<Closure>),
    /// Structural definition referenced as a value
    Object(Arc<str>),
}

/// Numeric view of a value; `Char` counts as an integer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i32),
    Double(f64),
}

impl Numeric {
    pub fn to_f64(self) -> f64 {
        match self {
            Numeric::Int(n) => f64::from(n),
            Numeric::Double(d) => d,
        }
    }
}

impl Value {
    pub fn str(text: impl Into<Arc<str>>) -> Self {
        Value::Str(text.into())
    }

    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Unit => Value::Unit,
            Literal::Int(n) => Value::Int(*n),
            Literal::Double(d) => Value::Double(*d),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Char(c) => Value::Char(*c),
            Literal::Str(s) => Value::str(s.as_str()),
        }
    }

    /// Static type name shown next to a displayed binding
    pub fn type_name(&self) -> String {
        match self {
            Value::Unit => "Unit".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Double(_) => "Double".to_string(),
            Value::Bool(_) => "Boolean".to_string(),
            Value::Char(_) => "Char".to_string(),
            Value::Str(_) => "String".to_string(),
            Value::Tuple(items) => {
                let names: Vec<String> = items.iter().map(Value::type_name).collect();
                format!("({})", names.join(", "))
            }
            Value::Function(closure) => format!("Function{}", closure.arity()),
            Value::Object(name) => format!("{}.type", name),
        }
    }

    pub fn as_numeric(&self) -> Option<Numeric> {
        match self {
            Value::Int(n) => Some(Numeric::Int(*n)),
            Value::Char(c) => Some(Numeric::Int(*c as i32)),
            Value::Double(d) => Some(Numeric::Double(*d)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// `==` between two values; numbers compare across types
    pub fn equals(
        &self,
        other: &Value,
    ) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a == b,
            (a, b) => match (a.as_numeric(), b.as_numeric()) {
                (Some(Numeric::Int(x)), Some(Numeric::Int(y))) => x == y,
                (Some(x), Some(y)) => x.to_f64() == y.to_f64(),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(d) => f.write_str(&format_double(*d)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Str(s) => f.write_str(s),
            Value::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Value::Function(closure) => write!(f, "<function{}>", closure.arity()),
            Value::Object(name) => f.write_str(name),
        }
    }
}

/// Doubles print with at least one fractional digit, and in scientific
/// notation outside `[1e-3, 1e7)`
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-3..1e7).contains(&magnitude) {
        let formatted = format!("{:e}", value);
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
        return if mantissa.contains('.') {
            format!("{}E{}", mantissa, exponent)
        } else {
            format!("{}.0E{}", mantissa, exponent)
        };
    }

    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
