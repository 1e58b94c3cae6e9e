//! Runtime values produced by calculators.

use std::fmt;
use std::sync::Arc;

use olapcalc_types::{Dimension, Hierarchy, Level, Member};
use smallvec::SmallVec;

/// A tuple: at most one member per hierarchy, in expression order.
pub type Tuple = SmallVec<[Member; 4]>;

/// A scalar value.
///
/// `Null` is the scalar null sentinel: the value of an empty cell, or of any
/// expression whose inputs resolved to a null member or an unrelated position.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    String(Arc<str>),
    Boolean(bool),
}

impl Value {
    pub fn string(s: &str) -> Value {
        Value::String(Arc::from(s))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of a numeric value, truncating toward zero.
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number()
            .filter(|n| n.is_finite())
            .map(|n| n.trunc() as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
        }
    }
}

/// The result of evaluating a calculator through its category-agnostic entry
/// point. Each variant carries the category's null sentinel: `None` for
/// dimensional objects, `Value::Null` for scalars, an empty list for sets.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcValue {
    Scalar(Value),
    Member(Option<Member>),
    Tuple(Option<Tuple>),
    MemberList(Vec<Member>),
    Hierarchy(Option<Hierarchy>),
    Level(Option<Level>),
    Dimension(Option<Dimension>),
    Void,
}

impl CalcValue {
    /// Whether this is the null value of its category.
    pub fn is_null(&self) -> bool {
        match self {
            CalcValue::Scalar(v) => v.is_null(),
            CalcValue::Member(m) => m.as_ref().is_none_or(Member::is_null),
            CalcValue::Tuple(t) => t.is_none(),
            CalcValue::MemberList(_) | CalcValue::Void => false,
            CalcValue::Hierarchy(h) => h.is_none(),
            CalcValue::Level(l) => l.is_none(),
            CalcValue::Dimension(d) => d.is_none(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            CalcValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            CalcValue::Member(m) => m.as_ref(),
            _ => None,
        }
    }
}

/// Whether a member produced by a calculator is absent or the null member.
pub fn is_null_member(member: Option<&Member>) -> bool {
    member.is_none_or(Member::is_null)
}
