// crates/areadb-core/src/geometry/scalar.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// A property value: null, boolean, number or string.
///
/// Numbers keep their JSON integer/float identity so that a canonical JSON
/// round trip reproduces the input exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Scalar {
    /// Converts text from a text-based format into a scalar.
    ///
    /// The text becomes a number only if it is a JSON number whose own
    /// string form is byte-identical to the input (`"12"`, `"1.5"`), so that
    /// writing the value back out yields the original text. Anything else
    /// (`"007"`, `"1e5"`, `" 3"`, `"NaN"`) stays a string.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<serde_json::Number>(text) {
            Ok(n) if n.to_string() == text => Scalar::Number(n),
            _ => Scalar::String(text.to_string()),
        }
    }

    /// Converts an arbitrary JSON value. Objects and arrays are not scalars
    /// and are kept as their compact JSON text instead of being dropped.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Scalar::Null,
            serde_json::Value::Bool(b) => Scalar::Bool(b),
            serde_json::Value::Number(n) => Scalar::Number(n),
            serde_json::Value::String(s) => Scalar::String(s),
            other => Scalar::String(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

/// Text form used by the row, markup and attribute-table encoders.
/// Null renders as an empty string.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

/// Non-finite floats have no JSON form and become `Null`.
impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(Scalar::Null, Scalar::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_numbers_become_numbers() {
        assert_eq!(Scalar::from_text("12"), Scalar::from(12i64));
        assert_eq!(Scalar::from_text("-3"), Scalar::from(-3i64));
        assert_eq!(Scalar::from_text("1.5"), Scalar::from(1.5));
    }

    #[test]
    fn lossy_numbers_stay_strings() {
        for text in ["007", "1e5", " 3", "3 ", "+1", "NaN", "1.50", "0x10", ""] {
            assert_eq!(Scalar::from_text(text), Scalar::String(text.into()), "{text:?}");
        }
    }

    #[test]
    fn untagged_json_shape() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[null, true, 4, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::Bool(true),
                Scalar::from(4i64),
                Scalar::from(2.5),
                Scalar::from("x")
            ]
        );
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[null,true,4,2.5,"x"]"#);
    }

    #[test]
    fn nested_json_is_kept_as_text() {
        let s = Scalar::from_json(serde_json::json!({"a": [1, 2]}));
        assert_eq!(s, Scalar::from(r#"{"a":[1,2]}"#));
    }

    #[test]
    fn display_renders_null_empty() {
        assert_eq!(Scalar::Null.to_string(), "");
        assert_eq!(Scalar::from(true).to_string(), "true");
    }
}
