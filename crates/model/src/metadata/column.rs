use crate::core::data_type::DataType;
use serde::{Deserialize, Serialize};

/// Mapping of one entity property onto a physical column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub property: String,
    pub column: String,
    pub data_type: DataType,
}

impl ColumnMeta {
    pub fn new(property: impl Into<String>, column: impl Into<String>, data_type: DataType) -> Self {
        Self {
            property: property.into(),
            column: column.into(),
            data_type,
        }
    }
}

/// Full column mapping of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub name: String,
    pub table: String,
    pub columns: Vec<ColumnMeta>,
}

impl EntityMeta {
    pub fn column(&self, property: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.property == property)
    }

    pub fn by_column(&self, column: &str) -> Option<&ColumnMeta> {
        self.columns
            .iter()
            .find(|c| c.column.eq_ignore_ascii_case(column))
    }
}
