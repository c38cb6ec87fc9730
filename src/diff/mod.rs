//! Structural comparison of two snapshots.
//!
//! Tables are compared by their normalized DDL first. Column properties are
//! only compared for tables whose DDL differs, which pins the mismatch down
//! to the columns that caused it.

pub mod normalize;

pub use normalize::{normalize_column_type, normalize_default, Equivalences};

use crate::model::{Column, ColumnProp, Snapshot, Table, Value};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyChange {
    pub base: Value,
    pub target: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ColumnDiff {
    /// Only present in the target.
    Added,
    /// Only present in the base.
    Removed,
    Changed {
        changes: IndexMap<ColumnProp, PropertyChange>,
    },
}

impl ColumnDiff {
    pub fn is_added(&self) -> bool {
        matches!(self, ColumnDiff::Added)
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, ColumnDiff::Removed)
    }

    pub fn changes(&self) -> Option<&IndexMap<ColumnProp, PropertyChange>> {
        match self {
            ColumnDiff::Changed { changes } => Some(changes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableDiff {
    /// Only present in the target.
    Added,
    /// Only present in the base.
    Removed,
    /// Present in both with differing DDL. `columns` may be empty when the
    /// difference lies outside the captured column properties.
    Changed { columns: IndexMap<String, ColumnDiff> },
}

impl TableDiff {
    pub fn is_added(&self) -> bool {
        matches!(self, TableDiff::Added)
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, TableDiff::Removed)
    }

    pub fn syntax_changed(&self) -> bool {
        matches!(self, TableDiff::Changed { .. })
    }

    pub fn changed_columns(&self) -> Option<&IndexMap<String, ColumnDiff>> {
        match self {
            TableDiff::Changed { columns } => Some(columns),
            _ => None,
        }
    }
}

/// Every difference between two snapshots, tables in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    pub tables: IndexMap<String, TableDiff>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

pub fn compute_diff(base: &Snapshot, target: &Snapshot) -> SchemaDiff {
    compute_diff_with(base, target, &Equivalences::default())
}

pub fn compute_diff_with(
    base: &Snapshot,
    target: &Snapshot,
    equivalences: &Equivalences,
) -> SchemaDiff {
    let names: BTreeSet<&str> = base
        .tables
        .keys()
        .chain(target.tables.keys())
        .map(String::as_str)
        .collect();

    let mut diff = SchemaDiff::default();
    for name in names {
        let table_diff = match (base.table(name), target.table(name)) {
            (None, Some(_)) => TableDiff::Added,
            (Some(_), None) => TableDiff::Removed,
            (Some(base_table), Some(target_table)) => {
                if base_table.ddl == target_table.ddl {
                    continue;
                }
                TableDiff::Changed {
                    columns: diff_columns(base_table, target_table, equivalences),
                }
            }
            (None, None) => continue,
        };
        diff.tables.insert(name.to_string(), table_diff);
    }

    debug!(tables = diff.len(), "diff computed");
    diff
}

/// Columns are visited in base order, then target-only columns in target
/// order.
fn diff_columns(
    base: &Table,
    target: &Table,
    equivalences: &Equivalences,
) -> IndexMap<String, ColumnDiff> {
    let names = base.columns.keys().chain(
        target
            .columns
            .keys()
            .filter(|name| !base.columns.contains_key(*name)),
    );

    let mut columns = IndexMap::new();
    for name in names {
        let column_diff = match (base.columns.get(name), target.columns.get(name)) {
            (None, Some(_)) => ColumnDiff::Added,
            (Some(_), None) => ColumnDiff::Removed,
            (Some(base_column), Some(target_column)) => {
                let changes = diff_properties(base_column, target_column, equivalences);
                if changes.is_empty() {
                    continue;
                }
                ColumnDiff::Changed { changes }
            }
            (None, None) => continue,
        };
        columns.insert(name.clone(), column_diff);
    }
    columns
}

fn diff_properties(
    base: &Column,
    target: &Column,
    equivalences: &Equivalences,
) -> IndexMap<ColumnProp, PropertyChange> {
    let mut changes = IndexMap::new();
    for prop in ColumnProp::ALL {
        let base_value = base.get(prop);
        let target_value = target.get(prop);

        let normalized_base = normalize::normalize_property(prop, base_value);
        let normalized_target = normalize::normalize_property(prop, target_value);
        if equivalences.equivalent(&normalized_base, &normalized_target) {
            continue;
        }

        changes.insert(
            prop,
            PropertyChange {
                base: base_value.clone(),
                target: target_value.clone(),
            },
        );
    }
    changes
}
