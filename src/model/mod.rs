use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One metadata row as returned by a query, keyed by column label.
pub type Row = IndexMap<String, Value>;

/// Column properties captured from `information_schema.COLUMNS`.
///
/// The set and its order are fixed: two snapshots are only comparable when
/// they were captured with the same property list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnProp {
    TableCatalog,
    TableName,
    ColumnName,
    OrdinalPosition,
    ColumnDefault,
    IsNullable,
    DataType,
    CharacterMaximumLength,
    CharacterOctetLength,
    NumericPrecision,
    NumericScale,
    DatetimePrecision,
    CharacterSetName,
    CollationName,
    ColumnType,
    ColumnKey,
    Extra,
    ColumnComment,
}

impl ColumnProp {
    pub const ALL: [ColumnProp; 18] = [
        ColumnProp::TableCatalog,
        ColumnProp::TableName,
        ColumnProp::ColumnName,
        ColumnProp::OrdinalPosition,
        ColumnProp::ColumnDefault,
        ColumnProp::IsNullable,
        ColumnProp::DataType,
        ColumnProp::CharacterMaximumLength,
        ColumnProp::CharacterOctetLength,
        ColumnProp::NumericPrecision,
        ColumnProp::NumericScale,
        ColumnProp::DatetimePrecision,
        ColumnProp::CharacterSetName,
        ColumnProp::CollationName,
        ColumnProp::ColumnType,
        ColumnProp::ColumnKey,
        ColumnProp::Extra,
        ColumnProp::ColumnComment,
    ];

    /// The `information_schema` column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnProp::TableCatalog => "TABLE_CATALOG",
            ColumnProp::TableName => "TABLE_NAME",
            ColumnProp::ColumnName => "COLUMN_NAME",
            ColumnProp::OrdinalPosition => "ORDINAL_POSITION",
            ColumnProp::ColumnDefault => "COLUMN_DEFAULT",
            ColumnProp::IsNullable => "IS_NULLABLE",
            ColumnProp::DataType => "DATA_TYPE",
            ColumnProp::CharacterMaximumLength => "CHARACTER_MAXIMUM_LENGTH",
            ColumnProp::CharacterOctetLength => "CHARACTER_OCTET_LENGTH",
            ColumnProp::NumericPrecision => "NUMERIC_PRECISION",
            ColumnProp::NumericScale => "NUMERIC_SCALE",
            ColumnProp::DatetimePrecision => "DATETIME_PRECISION",
            ColumnProp::CharacterSetName => "CHARACTER_SET_NAME",
            ColumnProp::CollationName => "COLLATION_NAME",
            ColumnProp::ColumnType => "COLUMN_TYPE",
            ColumnProp::ColumnKey => "COLUMN_KEY",
            ColumnProp::Extra => "EXTRA",
            ColumnProp::ColumnComment => "COLUMN_COMMENT",
        }
    }
}

impl fmt::Display for ColumnProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar value read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub properties: IndexMap<ColumnProp, Value>,
}

impl Column {
    /// Value of `prop`, `Null` when it was not captured.
    pub fn get(&self, prop: ColumnProp) -> &Value {
        self.properties.get(&prop).unwrap_or(&Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Table,
    View,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub kind: TableKind,
    /// `SHOW CREATE` output with instance-specific noise removed.
    pub ddl: String,
    pub columns: IndexMap<String, Column>,
}

/// Structural capture of one database, tables in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tables: IndexMap<String, Table>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let json = serde_json::to_string(self).expect("Snapshot must serialize");
        let hash = Sha256::digest(json.as_bytes());
        hex::encode(hash)
    }
}
