//! Audit log: SQLite-based history of collection changes.
//!
//! Every mutating command appends one row to `<data_dir>/audit.db`, shared
//! by all collections in the data directory.  The log is best-effort: a
//! database that cannot be opened or written never fails the command.
//! Without the `audit-log` feature only `AuditOp` is compiled.

use std::fmt;

#[cfg(feature = "audit-log")]
mod sqlite;

#[cfg(feature = "audit-log")]
pub use sqlite::{log_audit, AuditEntry, AuditLog, AuditQuery};

/// Kind of change recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOp {
    Init,
    Add,
    Remove,
    Delete,
    Import,
    Export,
    Trade,
}

impl AuditOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOp::Init => "init",
            AuditOp::Add => "add",
            AuditOp::Remove => "remove",
            AuditOp::Delete => "delete",
            AuditOp::Import => "import",
            AuditOp::Export => "export",
            AuditOp::Trade => "trade",
        }
    }
}

impl fmt::Display for AuditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
