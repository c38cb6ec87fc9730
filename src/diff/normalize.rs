//! Value normalization applied before column properties are compared.

use crate::model::{ColumnProp, Value};
use crate::sqlfmt::{escape_param, Param};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static DISPLAY_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(tinyint|smallint|mediumint|int|integer|bigint|year)\(\d+\)").unwrap()
});

/// Drops integer display widths: `int(11) unsigned` becomes `int unsigned`.
/// Lengths and precisions of other types are kept.
pub fn normalize_column_type(column_type: &str) -> Cow<'_, str> {
    DISPLAY_WIDTH.replace_all(column_type, "$1")
}

/// Quotes a default that the engine reported as a bare literal, the way a
/// query parameter would be quoted. Already quoted defaults and NULL are
/// left alone.
pub fn normalize_default(default: &Value) -> Cow<'_, Value> {
    match default {
        Value::Text(s) if !s.starts_with('\'') => {
            Cow::Owned(Value::Text(escape_param(&Param::Text(s.clone()))))
        }
        other => Cow::Borrowed(other),
    }
}

/// Normalized form of `value` as seen by the comparison of `prop`.
pub fn normalize_property(prop: ColumnProp, value: &Value) -> Cow<'_, Value> {
    match (prop, value) {
        (ColumnProp::ColumnType, Value::Text(s)) => match normalize_column_type(s) {
            Cow::Borrowed(_) => Cow::Borrowed(value),
            Cow::Owned(stripped) => Cow::Owned(Value::Text(stripped)),
        },
        (ColumnProp::ColumnDefault, _) => normalize_default(value),
        _ => Cow::Borrowed(value),
    }
}

/// Groups of normalized values that are considered equal even though their
/// forms differ.
///
/// The default registry treats a NULL default and the literal `NULL` (as
/// MariaDB reports it, which normalizes to `'NULL'`) as the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equivalences {
    sets: Vec<Vec<Value>>,
}

impl Default for Equivalences {
    fn default() -> Self {
        Self::empty().with_set(vec![Value::Null, Value::from("'NULL'")])
    }
}

impl Equivalences {
    pub fn empty() -> Self {
        Self { sets: Vec::new() }
    }

    /// Registers a set of already-normalized values.
    pub fn with_set(mut self, values: Vec<Value>) -> Self {
        if values.len() > 1 {
            self.sets.push(values);
        }
        self
    }

    /// Registers a set of defaults as the engine would report them; each
    /// member is normalized like a reported default first.
    pub fn with_reported_defaults<S: AsRef<str>>(self, defaults: &[S]) -> Self {
        let values = defaults
            .iter()
            .map(|d| normalize_default(&Value::from(d.as_ref())).into_owned())
            .collect();
        self.with_set(values)
    }

    pub fn sets(&self) -> &[Vec<Value>] {
        &self.sets
    }

    pub fn equivalent(&self, a: &Value, b: &Value) -> bool {
        a == b
            || self
                .sets
                .iter()
                .any(|set| set.contains(a) && set.contains(b))
    }
}
