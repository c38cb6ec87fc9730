//! Convenient re-exports for common mysqldiff usage.

pub use crate::api::{compare, compare_blocking, CompareOptions, CompareResult, Error};
pub use crate::diff::{compute_diff, compute_diff_with, ColumnDiff, Equivalences, SchemaDiff, TableDiff};
pub use crate::filter::{Filter, ObjectType};
pub use crate::model::{ColumnProp, Snapshot, Value};
pub use crate::mysql::{build_snapshot, ConnectionConfig, Database, SnapshotOptions};
pub use crate::report::{render_json, render_text, RenderOptions};
pub use crate::sqlfmt::{format_sql, Param};
