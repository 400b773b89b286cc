//! Column and table metadata consumed by the file layout.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::DataType;

/// Name, type and nullability of one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    #[serde(rename = "column_name")]
    pub name: String,
    /// Logical type.
    pub data_type: DataType,
    /// Whether NULLs may occur.
    pub nullable: bool,
}

impl ColumnDefinition {
    /// Creates a column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

impl fmt::Display for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name,
            self.data_type,
            if self.nullable {
                "nullable"
            } else {
                "not nullable"
            }
        )
    }
}

/// Ordered column definitions of a table.
pub type ColumnDefinitions = Vec<ColumnDefinition>;

/// Anything that can describe the columns of a table.
pub trait TableSchema {
    /// Returns the ordered column definitions.
    fn column_definitions(&self) -> &[ColumnDefinition];

    /// Returns the number of columns.
    fn column_count(&self) -> usize {
        self.column_definitions().len()
    }

    /// Returns the column data types in column order.
    fn data_types(&self) -> Vec<DataType> {
        self.column_definitions()
            .iter()
            .map(|c| c.data_type)
            .collect()
    }
}

impl TableSchema for [ColumnDefinition] {
    fn column_definitions(&self) -> &[ColumnDefinition] {
        self
    }
}

impl TableSchema for Vec<ColumnDefinition> {
    fn column_definitions(&self) -> &[ColumnDefinition] {
        self
    }
}
