//! SQLite-backed audit log at `<state_dir>/audit.db`.
//!
//! If the database can't be opened or written to, operations continue
//! without logging.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use tracing::{debug, warn};

use super::AuditOp;
use crate::errors::{Result, SyncError};

const DB_FILE_NAME: &str = "audit.db";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS lifecycle_events (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    recorded_at TEXT NOT NULL,
    op          TEXT NOT NULL,
    secret_key  TEXT,
    secret_id   INTEGER,
    details     TEXT
);
CREATE INDEX IF NOT EXISTS lifecycle_events_recorded_at
    ON lifecycle_events (recorded_at);";

/// One recorded lifecycle event.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    /// Manifest key, absent for lease and state events.
    pub secret_key: Option<String>,
    pub secret_id: Option<u64>,
    pub details: Option<String>,
}

/// Handle on `<state_dir>/audit.db`.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database in `state_dir`.
    ///
    /// `None` means audit logging is unavailable; callers carry on.
    pub fn open(state_dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(state_dir);
        let conn = match Connection::open(&db_path) {
            Ok(conn) => conn,
            Err(e) => {
                debug!(path = %db_path.display(), error = %e, "audit log unavailable");
                return None;
            }
        };
        restrict_permissions(&db_path);

        if let Err(e) = conn.execute_batch(SCHEMA) {
            warn!(error = %e, "audit schema setup failed; not logging");
            return None;
        }
        Some(Self { conn })
    }

    /// Record one event.  Failures are logged and swallowed.
    pub fn log(
        &self,
        operation: AuditOp,
        secret_key: Option<&str>,
        secret_id: Option<u64>,
        details: Option<&str>,
    ) {
        let secret_id = secret_id.and_then(|id| i64::try_from(id).ok());
        if let Err(e) = self.conn.execute(
            "INSERT INTO lifecycle_events (recorded_at, op, secret_key, secret_id, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![stamp(Utc::now()), operation.as_str(), secret_key, secret_id, details],
        ) {
            debug!(op = %operation, error = %e, "audit write failed");
        }
    }

    /// Newest events first, at most `limit`, optionally only those at or
    /// after `since`.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let since = since.map(stamp).unwrap_or_default();

        let mut stmt = self
            .conn
            .prepare(
                "SELECT seq, recorded_at, op, secret_key, secret_id, details
                 FROM lifecycle_events
                 WHERE recorded_at >= ?1
                 ORDER BY seq DESC
                 LIMIT ?2",
            )
            .map_err(|e| SyncError::AuditError(format!("prepare: {e}")))?;

        let entries = stmt
            .query_map(params![since, limit], entry_from_row)
            .map_err(|e| SyncError::AuditError(format!("query: {e}")))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| SyncError::AuditError(format!("row: {e}")))?;
        Ok(entries)
    }

    /// `<state_dir>/audit.db`
    pub fn db_path(state_dir: &Path) -> PathBuf {
        state_dir.join(DB_FILE_NAME)
    }
}

/// Open the audit log in `state_dir` and record one event.  Never fails.
pub fn log_audit(
    state_dir: &Path,
    operation: AuditOp,
    secret_key: Option<&str>,
    secret_id: Option<u64>,
    details: Option<&str>,
) {
    if let Some(audit) = AuditLog::open(state_dir) {
        audit.log(operation, secret_key, secret_id, details);
    }
}

/// Fixed-width UTC timestamps, so text order is time order.
fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    let recorded_at: String = row.get(1)?;
    let secret_id: Option<i64> = row.get(4)?;
    Ok(AuditEntry {
        id: row.get(0)?,
        timestamp: DateTime::parse_from_rfc3339(&recorded_at)
            .map_or(DateTime::<Utc>::MIN_UTC, |dt| dt.with_timezone(&Utc)),
        operation: row.get(2)?,
        secret_key: row.get(3)?,
        secret_id: secret_id.and_then(|id| u64::try_from(id).ok()),
        details: row.get(5)?,
    })
}

fn restrict_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    let _ = path;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stamps_sort_chronologically() {
        let a = Utc::now();
        let b = a + chrono::Duration::milliseconds(1);
        assert!(stamp(a) < stamp(b));
        assert_eq!(stamp(a).len(), stamp(b).len());
    }

    #[test]
    fn log_and_query_most_recent_first() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();

        audit.log(AuditOp::Create, Some("db"), Some(7), Some("3 fields"));
        audit.log(AuditOp::Update, Some("db"), Some(7), None);
        audit.log(AuditOp::Delete, Some("db"), Some(7), None);

        let entries = audit.query(10, None).unwrap();
        let ops: Vec<_> = entries.iter().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops, vec!["delete", "update", "create"]);
        assert_eq!(entries[2].secret_id, Some(7));
        assert_eq!(entries[2].details.as_deref(), Some("3 fields"));
    }

    #[test]
    fn limit_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();
        for id in 1..=5 {
            audit.log(AuditOp::Refresh, Some("db"), Some(id), Some("changed"));
        }
        let ids: Vec<_> = audit
            .query(2, None)
            .unwrap()
            .iter()
            .map(|e| e.secret_id)
            .collect();
        assert_eq!(ids, vec![Some(5), Some(4)]);
    }

    #[test]
    fn query_with_since_filter() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();
        audit.log(AuditOp::Import, Some("db"), Some(1), None);

        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(audit.query(10, Some(past)).unwrap().len(), 1);

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(audit.query(10, Some(future)).unwrap().is_empty());
    }

    #[test]
    fn lease_events_have_no_key() {
        let dir = TempDir::new().unwrap();
        log_audit(dir.path(), AuditOp::LeaseOpen, None, None, Some("field=password ids=2"));
        let entries = AuditLog::open(dir.path()).unwrap().query(1, None).unwrap();
        assert_eq!(entries[0].operation, "lease-open");
        assert!(entries[0].secret_key.is_none());
        assert!(entries[0].secret_id.is_none());
    }

    #[test]
    fn missing_state_dir_disables_logging() {
        let dir = TempDir::new().unwrap();
        assert!(AuditLog::open(&dir.path().join("absent")).is_none());
        log_audit(&dir.path().join("absent"), AuditOp::Create, Some("db"), None, None);
    }

    #[cfg(unix)]
    #[test]
    fn audit_db_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let _audit = AuditLog::open(dir.path()).unwrap();
        let mode = std::fs::metadata(AuditLog::db_path(dir.path()))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
