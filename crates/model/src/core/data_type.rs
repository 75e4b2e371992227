use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

/// Logical type of a mapped column, as reported by the metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Boolean,
    Char,
    VarChar,
    String,
    Date,
    Time,
    Timestamp,
    Uuid,
    Json,
    Bytes,
    Enum,
    Array(Option<Box<DataType>>),
    Null,
    Custom(String),
}

impl DataType {
    /// Whether the type can take part in `SUM`/`AVG` with a rounding scale.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Short
                | DataType::Int
                | DataType::Long
                | DataType::Float
                | DataType::Double
                | DataType::Decimal
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            DataType::Char | DataType::VarChar | DataType::String | DataType::Enum
        )
    }

    pub fn name(&self) -> Cow<'_, str> {
        match self {
            DataType::Short => Cow::Borrowed("SMALLINT"),
            DataType::Int => Cow::Borrowed("INT"),
            DataType::Long => Cow::Borrowed("BIGINT"),
            DataType::Float => Cow::Borrowed("FLOAT"),
            DataType::Double => Cow::Borrowed("DOUBLE"),
            DataType::Decimal => Cow::Borrowed("DECIMAL"),
            DataType::Boolean => Cow::Borrowed("BOOLEAN"),
            DataType::Char => Cow::Borrowed("CHAR"),
            DataType::VarChar => Cow::Borrowed("VARCHAR"),
            DataType::String => Cow::Borrowed("TEXT"),
            DataType::Date => Cow::Borrowed("DATE"),
            DataType::Time => Cow::Borrowed("TIME"),
            DataType::Timestamp => Cow::Borrowed("TIMESTAMP"),
            DataType::Uuid => Cow::Borrowed("UUID"),
            DataType::Json => Cow::Borrowed("JSON"),
            DataType::Bytes => Cow::Borrowed("BLOB"),
            DataType::Enum => Cow::Borrowed("ENUM"),
            DataType::Array(inner) => match inner {
                Some(inner) => Cow::Owned(format!("{}[]", inner.name())),
                None => Cow::Borrowed("ARRAY"),
            },
            DataType::Null => Cow::Borrowed("NULL"),
            DataType::Custom(name) => Cow::Borrowed(name),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
