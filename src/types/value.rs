//! The dynamically-typed cell value carried by in-memory rows.
//!
//! Tables arrive from loosely-typed sources (JSON documents, Python objects), so a
//! cell is a small tagged union rather than a generic parameter. The coercion
//! helpers here are the single place where "what number is this cell" and "is this
//! cell falsy" get decided.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest magnitude at which every integer is exactly representable in an `f64`.
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// `null`, `false`, `0`, `0.0`, `NaN` and `""` are falsy.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0 || f.is_nan(),
            Value::String(s) => s.is_empty(),
        }
    }

    /// Interprets the value as a number. Numeric strings parse; `null` and
    /// non-numeric strings yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Builds the most natural value for a computed number: integral results
    /// become `Int`, everything else stays `Float`.
    pub fn from_number(n: f64) -> Value {
        if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_EXACT_F64_INT {
            Value::Int(n as i64)
        } else {
            Value::Float(n)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(v as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falsy_values() {
        assert!(Value::Null.is_falsy());
        assert!(Value::Int(0).is_falsy());
        assert!(Value::Float(0.0).is_falsy());
        assert!(Value::String(String::new()).is_falsy());
        assert!(Value::Bool(false).is_falsy());
        assert!(!Value::Int(-1).is_falsy());
        assert!(!Value::from("0").is_falsy());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::from("abc").as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_from_number_prefers_integers() {
        assert_eq!(Value::from_number(105.0), Value::Int(105));
        assert_eq!(Value::from_number(-2.0), Value::Int(-2));
        assert_eq!(Value::from_number(12.5), Value::Float(12.5));
        assert!(matches!(Value::from_number(f64::NAN), Value::Float(_)));
    }

    #[test]
    fn test_json_untagged_shapes() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, true, 3, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Int(3),
                Value::Float(2.5),
                Value::from("x")
            ]
        );
    }
}
