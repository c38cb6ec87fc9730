//! Narrowing a comparison to part of the catalog.
//!
//! Filters run on both snapshots before diffing, so a table dropped by a
//! filter is neither reported as missing nor as extra.

use glob::Pattern;
use std::fmt;
use std::str::FromStr;

use crate::model::{Snapshot, Table, TableKind};

/// What `--only` can restrict a comparison to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Tables,
    Views,
}

impl ObjectType {
    fn kind(self) -> TableKind {
        match self {
            ObjectType::Tables => TableKind::Table,
            ObjectType::Views => TableKind::View,
        }
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tables" | "table" => Ok(ObjectType::Tables),
            "views" | "view" => Ok(ObjectType::Views),
            other => Err(format!("Unknown object type '{other}', use tables or views")),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectType::Tables => "tables",
            ObjectType::Views => "views",
        })
    }
}

/// Table name globs plus an optional restriction on the kind of object.
///
/// Exclusion wins over inclusion; an empty include list includes every name.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    kinds: Vec<TableKind>,
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, glob::PatternError> {
    patterns.iter().map(|p| Pattern::new(p)).collect()
}

impl Filter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, glob::PatternError> {
        Ok(Filter {
            include: compile(include)?,
            exclude: compile(exclude)?,
            kinds: Vec::new(),
        })
    }

    pub fn with_object_types(mut self, only: Vec<ObjectType>) -> Self {
        self.kinds = only.into_iter().map(ObjectType::kind).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty() && self.kinds.is_empty()
    }

    pub fn should_include(&self, name: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|p| p.matches(name));
        included && !self.exclude.iter().any(|p| p.matches(name))
    }

    pub fn matches(&self, table: &Table) -> bool {
        (self.kinds.is_empty() || self.kinds.contains(&table.kind))
            && self.should_include(&table.name)
    }
}

/// Copy of `snapshot` holding only the tables `filter` matches, in their
/// original order.
pub fn filter_snapshot(snapshot: &Snapshot, filter: &Filter) -> Snapshot {
    if filter.is_empty() {
        return snapshot.clone();
    }
    Snapshot {
        tables: snapshot
            .tables
            .iter()
            .filter(|(_, table)| filter.matches(table))
            .map(|(name, table)| (name.clone(), table.clone()))
            .collect(),
    }
}
