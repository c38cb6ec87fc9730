use crate::diff::SchemaDiff;
use crate::model::Snapshot;
use crate::mysql::ConnectionConfig;
use crate::report::JsonReport;

/// Result of comparing two databases.
#[derive(Debug, Clone)]
pub struct CompareResult {
    /// Parsed base descriptor (displays with the password masked)
    pub base: ConnectionConfig,
    /// Parsed target descriptor
    pub target: ConnectionConfig,
    /// Filtered snapshot of the base database
    pub base_snapshot: Snapshot,
    /// Filtered snapshot of the target database
    pub target_snapshot: Snapshot,
    /// Differences, target relative to base
    pub diff: SchemaDiff,
}

impl CompareResult {
    pub fn is_identical(&self) -> bool {
        self.diff.is_empty()
    }

    pub fn base_fingerprint(&self) -> String {
        self.base_snapshot.fingerprint()
    }

    pub fn target_fingerprint(&self) -> String {
        self.target_snapshot.fingerprint()
    }

    pub fn json_report(&self) -> JsonReport<'_> {
        JsonReport {
            identical: self.is_identical(),
            base_fingerprint: self.base_fingerprint(),
            target_fingerprint: self.target_fingerprint(),
            diff: &self.diff,
        }
    }
}
