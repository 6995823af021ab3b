//! Field values carried by a frame.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered map of field name to value.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// The value of a single frame field, as it appears in a JSON line.
///
/// Equality is strict: an `Integer(1)` never equals a `Float(1.0)` or a
/// `String("1")`. Wait matching relies on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    /// Addresses are carried as hex strings.
    String(String),
    Bool(bool),
    /// Neighbour tables and endpoint lists.
    List(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    /// The integer narrowed to `T`, or `None` for a non-integer or an
    /// out-of-range value.
    pub fn as_int<T: TryFrom<i64>>(&self) -> Option<T> {
        match *self {
            FieldValue::Integer(v) => T::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => f.write_str("null"),
            FieldValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! integer_field {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::Integer(i64::from(v))
                }
            }

            impl FromFieldValue for $t {
                fn from_field_value(value: &FieldValue) -> Option<Self> {
                    value.as_int()
                }
            }
        )*
    };
}

integer_field!(u8, u16, u32, i64);

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_owned())
    }
}

/// Types a field can be read back as through [`Frame::get_as`](crate::Frame::get_as).
pub trait FromFieldValue: Sized {
    /// `None` when the value has another type or is out of range.
    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

impl FromFieldValue for bool {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match *value {
            FieldValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_narrowing() {
        let v = FieldValue::from(0x1a62u16);
        assert_eq!(v.as_int::<u16>(), Some(0x1a62));
        assert_eq!(v.as_int::<u8>(), None);
        assert_eq!(FieldValue::Integer(-1).as_int::<u32>(), None);
        assert_eq!(FieldValue::from("15").as_int::<u8>(), None);
        assert_eq!(u8::from_field_value(&FieldValue::Float(15.0)), None);
    }

    #[test]
    fn test_equality_is_strict() {
        assert_ne!(FieldValue::Integer(1), FieldValue::Float(1.0));
        assert_ne!(FieldValue::Integer(1), FieldValue::from("1"));
        assert_ne!(FieldValue::Bool(true), FieldValue::Integer(1));
    }

    #[test]
    fn test_neighbour_entry_from_json() {
        let json = r#"["00:0d:6f:00:0a:90:69:e1", "5bbe", 200, null]"#;
        let v: FieldValue = serde_json::from_str(json).unwrap();
        let items = v.as_list().unwrap();
        assert_eq!(items[0].as_str(), Some("00:0d:6f:00:0a:90:69:e1"));
        assert_eq!(items[2].as_int::<u8>(), Some(200));
        assert_eq!(items[3], FieldValue::Null);
        assert_eq!(v.to_string(), "[00:0d:6f:00:0a:90:69:e1, 5bbe, 200, null]");
    }
}
