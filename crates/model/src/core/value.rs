use crate::core::data_type::DataType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, hash::Hash};
use uuid::Uuid;

/// A literal bound to a statement parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    StringArray(Vec<String>),
    Null,
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Int(v) => v.hash(state),
            Uint(v) => v.hash(state),
            Float(v) => {
                // Hash the bits of the float to handle NaN and -0.0 correctly
                let bits = v.to_bits();
                bits.hash(state);
            }
            String(v) => v.hash(state),
            Boolean(v) => v.hash(state),
            Json(v) => {
                let json_str = serde_json::to_string(v).unwrap_or_default();
                json_str.hash(state);
            }
            Uuid(v) => v.hash(state),
            Bytes(v) => v.hash(state),
            Date(v) => v.hash(state),
            Timestamp(v) => v.hash(state),
            StringArray(v) => v.hash(state),
            Null => {}
        }
    }
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Uint(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.parse::<f64>().ok(),
            Value::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Uint(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Json(v) => v.as_str().map(|s| s.to_string()),
            Value::Uuid(v) => Some(v.to_string()),
            Value::Date(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339()),
            Value::Bytes(_) | Value::StringArray(_) | Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Uint(a), Uint(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Long,
            Value::Uint(_) => DataType::Long,
            Value::Float(_) => DataType::Double,
            Value::String(_) => DataType::String,
            Value::Boolean(_) => DataType::Boolean,
            Value::Json(_) => DataType::Json,
            Value::Uuid(_) => DataType::Uuid,
            Value::Bytes(_) => DataType::Bytes,
            Value::Date(_) => DataType::Date,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::StringArray(_) => DataType::Array(Some(Box::new(DataType::String))),
            Value::Null => DataType::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Json(v) => {
                let json_str = v.to_string().replace('\'', "''");
                write!(f, "'{json_str}'")
            }
            Value::Uuid(v) => write!(f, "'{v}'"),
            Value::Bytes(v) => {
                let hex = v
                    .iter()
                    .fold(String::new(), |acc, byte: &u8| acc + &format!("{byte:02x}"));
                write!(f, "X'{hex}'")
            }
            Value::Date(v) => write!(f, "'{v}'"),
            Value::Timestamp(v) => write!(f, "'{v}'"),
            Value::StringArray(v) => {
                let items = v
                    .iter()
                    .map(|s| format!("'{}'", s.replace('\'', "''")))
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "({items})")
            }
            Value::Null => write!(f, "NULL"),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_value!(
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    f32 => Float,
    f64 => Float,
    bool => Boolean,
    String => String,
    &str => String,
    Uuid => Uuid,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    DateTime<Utc> => Timestamp,
    serde_json::Value => Json,
);

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Uint(v as u64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
