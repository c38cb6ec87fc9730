//! mysqldiff - structural schema comparison for MySQL and MariaDB.
//!
//! Captures a snapshot of each database (columns from `information_schema`
//! plus normalized `SHOW CREATE` text), computes a deterministic diff of the
//! target relative to the base, and renders it for humans or automation.
//! Neither database is ever modified.
//!
//! # Quick Start
//!
//! ```no_run
//! use mysqldiff::prelude::*;
//!
//! let result = compare_blocking(CompareOptions::new(
//!     "mysql://root@localhost/app",
//!     "mysql://root@staging/app",
//! ))
//! .unwrap();
//!
//! print!("{}", render_text(&result.diff, &RenderOptions::plain()));
//! ```
//!
//! # Modules
//!
//! - [`sqlfmt`] - Placeholder substitution and literal escaping
//! - [`mysql`] - Connections, the [`mysql::Database`] capability and snapshot building
//! - [`diff`] - Snapshot comparison
//! - [`report`] - Text and JSON rendering
//! - [`api`] - High-level API mirroring the CLI

pub mod api;
pub mod diff;
pub mod filter;
pub mod model;
pub mod mysql;
pub mod prelude;
pub mod report;
pub mod sqlfmt;
pub mod util;
