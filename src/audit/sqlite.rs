//! SQLite storage for the audit log.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use tracing::debug;

use super::AuditOp;
use crate::errors::{CardLogError, Result};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS audit_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    at          INTEGER NOT NULL,
    operation   TEXT NOT NULL,
    collection  TEXT NOT NULL,
    card_id     TEXT,
    details     TEXT
);
CREATE INDEX IF NOT EXISTS audit_log_collection ON audit_log (collection, at);";

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub collection: String,
    pub card_id: Option<String>,
    pub details: Option<String>,
}

/// Which entries `AuditLog::query` returns, newest first.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Maximum number of entries; 0 means no limit.
    pub limit: usize,
    /// Only entries at or after this time.
    pub since: Option<DateTime<Utc>>,
    /// Only entries for this collection.
    pub collection: Option<String>,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) `<data_dir>/audit.db`.
    ///
    /// Returns `None` when the database is unusable; callers carry on
    /// without logging.
    pub fn open(data_dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(data_dir);
        let conn = match Connection::open(&db_path) {
            Ok(conn) => conn,
            Err(e) => {
                debug!(path = %db_path.display(), error = %e, "audit log unavailable");
                return None;
            }
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&db_path, std::fs::Permissions::from_mode(0o600));
        }

        if let Err(e) = conn.execute_batch(SCHEMA) {
            debug!(error = %e, "audit schema setup failed");
            return None;
        }

        Some(Self { conn })
    }

    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join("audit.db")
    }

    /// Append an entry stamped with the current time.  Errors are dropped.
    pub fn record(
        &self,
        op: AuditOp,
        collection: &str,
        card_id: Option<&str>,
        details: Option<&str>,
    ) {
        self.record_at(Utc::now(), op, collection, card_id, details);
    }

    fn record_at(
        &self,
        at: DateTime<Utc>,
        op: AuditOp,
        collection: &str,
        card_id: Option<&str>,
        details: Option<&str>,
    ) {
        if let Err(e) = self.conn.execute(
            "INSERT INTO audit_log (at, operation, collection, card_id, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![at.timestamp(), op.as_str(), collection, card_id, details],
        ) {
            debug!(%op, error = %e, "audit insert failed");
        }
    }

    /// Entries matching `query`, most recent first.
    pub fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let mut sql = String::from(
            "SELECT id, at, operation, collection, card_id, details FROM audit_log",
        );
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(since) = query.since {
            values.push(Value::Integer(since.timestamp()));
            conditions.push(format!("at >= ?{}", values.len()));
        }
        if let Some(collection) = &query.collection {
            values.push(Value::Text(collection.clone()));
            conditions.push(format!("collection = ?{}", values.len()));
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY id DESC");
        if query.limit > 0 {
            values.push(Value::Integer(i64::try_from(query.limit).unwrap_or(i64::MAX)));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| CardLogError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                let at: i64 = row.get(1)?;
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: DateTime::from_timestamp(at, 0).unwrap_or_default(),
                    operation: row.get(2)?,
                    collection: row.get(3)?,
                    card_id: row.get(4)?,
                    details: row.get(5)?,
                })
            })
            .map_err(|e| CardLogError::AuditError(format!("query exec: {e}")))?;

        let entries = rows
            .map(|row| row.map_err(|e| CardLogError::AuditError(format!("row parse: {e}"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }
}

/// Open the audit database and record one entry, ignoring every failure.
pub fn log_audit(
    data_dir: &Path,
    collection: &str,
    op: AuditOp,
    card_id: Option<&str>,
    details: Option<&str>,
) {
    if let Some(audit) = AuditLog::open(data_dir) {
        audit.record(op, collection, card_id, details);
    }
}
