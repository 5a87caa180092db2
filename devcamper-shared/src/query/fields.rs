//! Per-resource field tables.
//!
//! Each listable resource maps its public (camelCase) field names onto
//! columns. Only fields listed here can be filtered or sorted on.

use super::params::Operator;

/// How a field's values are parsed and compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Timestamp,
    Uuid,
    /// Postgres enum, compared as text against the allowed values
    Enum(&'static [&'static str]),
    /// `TEXT[]` column; equality means "contains", `in` means "overlaps"
    TextArray,
}

impl FieldKind {
    /// Whether `op` can be applied to fields of this kind
    pub fn supports(&self, op: Operator) -> bool {
        match op {
            Operator::Eq => true,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                matches!(self, FieldKind::Text | FieldKind::Number | FieldKind::Timestamp)
            }
            Operator::In => !matches!(self, FieldKind::Bool | FieldKind::Timestamp),
        }
    }

    /// Whether results can be ordered by fields of this kind
    pub fn sortable(&self) -> bool {
        !matches!(self, FieldKind::TextArray)
    }
}

/// A filterable/sortable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Public name as it appears in JSON and query strings
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }

    /// SQL expression used in comparisons
    pub fn expr(&self) -> String {
        match self.kind {
            FieldKind::Enum(_) => format!("{}::text", self.column),
            _ => self.column.to_string(),
        }
    }
}

/// A listable table and its fields
#[derive(Debug, Clone, Copy)]
pub struct Resource {
    pub table: &'static str,
    pub fields: &'static [Field],
}

impl Resource {
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}
