pub mod connection;
pub mod database;
pub mod introspect;

pub use connection::{ConnectionConfig, MySqlConnection};
pub use database::{Database, StaticDatabase};
pub use introspect::{build_snapshot, SnapshotOptions};
