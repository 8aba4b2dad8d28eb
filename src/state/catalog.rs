use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::data::Issue;
use crate::error::{AppError, Result};

/// The Catalog manages the SQLite database of reported issues.
/// It stands in for the remote service that owns the records;
/// cards only ever read from it.
pub struct Catalog {
    conn: Connection,
    db_path: PathBuf,
}

/// What happened to a single record during import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same ID is already in the catalog
    Duplicate,
}

impl Catalog {
    /// Open (or create) the catalog at `db_path` and initialize the schema.
    pub fn open(db_path: PathBuf) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        info!("📁 Catalog opened at: {}", db_path.display());

        let catalog = Catalog { conn, db_path };
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// Open a throwaway catalog that lives only in memory
    pub fn open_in_memory() -> Result<Self> {
        let catalog = Catalog {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// Default location of the catalog file:
    /// - Linux: ~/.local/share/civic-issues/civic_issues.db
    /// - macOS: ~/Library/Application Support/civic-issues/civic_issues.db
    /// - Windows: %APPDATA%\civic-issues\civic_issues.db
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(AppError::NoDataDir)?;

        path.push("civic-issues");
        path.push("civic_issues.db");
        Ok(path)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS issues (
                id              TEXT PRIMARY KEY,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL,
                category        TEXT NOT NULL,
                status          TEXT NOT NULL,
                priority        TEXT NOT NULL,
                location        TEXT NOT NULL,
                user_name       TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                photo_urls      TEXT NOT NULL DEFAULT '[]',
                imported_at     INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_issues_created_at
             ON issues(created_at DESC)",
            [],
        )?;

        debug!("Catalog schema initialized");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn issue_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert one issue. Duplicate IDs are reported, not treated as errors.
    pub fn insert_issue(&self, issue: &Issue) -> Result<InsertOutcome> {
        let photo_urls = serde_json::to_string(&issue.photo_urls)?;

        let result = self.conn.execute(
            "INSERT INTO issues (id, title, description, category, status, priority,
                                 location, user_name, created_at, photo_urls, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                issue.id,
                issue.title,
                issue.description,
                issue.category,
                issue.status,
                issue.priority,
                issue.location,
                issue.user_name,
                issue.created_at,
                photo_urls,
                chrono::Utc::now().timestamp(),
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get all issues, newest first
    pub fn get_all_issues(&self) -> Result<Vec<Issue>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, category, status, priority,
                    location, user_name, created_at, photo_urls
             FROM issues
             ORDER BY created_at DESC",
        )?;

        let issues = stmt
            .query_map([], issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(issues)
    }
}

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let photo_json: String = row.get(9)?;
    let photo_urls = serde_json::from_str(&photo_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

    Ok(Issue {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        location: row.get(6)?,
        user_name: row.get(7)?,
        created_at: row.get(8)?,
        photo_urls,
    })
}

/// Parse an issue export: either one issue object or an array of them.
///
/// Records that do not match the issue shape (unknown status, bad timestamp,
/// missing fields) are dropped and counted; the rest are returned.
pub fn parse_issue_export(json: &str) -> Result<(Vec<Issue>, usize)> {
    let value: serde_json::Value = serde_json::from_str(json)?;

    let records = match value {
        serde_json::Value::Array(records) => records,
        single => vec![single],
    };

    let mut issues = Vec::with_capacity(records.len());
    let mut rejected = 0;
    for record in records {
        match serde_json::from_value::<Issue>(record) {
            Ok(issue) => issues.push(issue),
            Err(e) => {
                warn!("⚠️  Rejected issue record: {}", e);
                rejected += 1;
            }
        }
    }

    Ok((issues, rejected))
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{Category, Priority, Status};
    use chrono::{Duration, TimeZone, Utc};

    fn issue(id: &str, hours_ago: i64) -> Issue {
        Issue {
            id: id.to_string(),
            title: format!("Issue {}", id),
            description: "Streetlight out".to_string(),
            category: Category::Utilities,
            status: Status::Open,
            priority: Priority::Medium,
            location: "Elm St".to_string(),
            user_name: "Riley".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
                - Duration::hours(hours_ago),
            photo_urls: vec!["https://example.org/a.jpg".to_string()],
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let catalog = Catalog::open_in_memory().unwrap();
        let original = issue("x1", 0);

        assert_eq!(catalog.insert_issue(&original).unwrap(), InsertOutcome::Inserted);
        assert_eq!(catalog.issue_count().unwrap(), 1);

        let stored = catalog.get_all_issues().unwrap();
        assert_eq!(stored, vec![original]);
    }

    #[test]
    fn test_duplicate_id_is_reported() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.insert_issue(&issue("dup", 0)).unwrap();

        assert_eq!(catalog.insert_issue(&issue("dup", 5)).unwrap(), InsertOutcome::Duplicate);
        assert_eq!(catalog.issue_count().unwrap(), 1);
    }

    #[test]
    fn test_issues_are_newest_first() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.insert_issue(&issue("old", 48)).unwrap();
        catalog.insert_issue(&issue("new", 1)).unwrap();
        catalog.insert_issue(&issue("mid", 10)).unwrap();

        let ids: Vec<String> = catalog
            .get_all_issues()
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_parse_export_single_and_array() {
        let single = serde_json::to_string(&issue("s", 0)).unwrap();
        let (issues, rejected) = parse_issue_export(&single).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(rejected, 0);

        let array = format!(r#"[{}, {{"id": "broken", "status": "unknown"}}]"#, single);
        let (issues, rejected) = parse_issue_export(&array).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(rejected, 1);
    }

    #[test]
    fn test_parse_export_rejects_invalid_json() {
        assert!(matches!(parse_issue_export("not json"), Err(AppError::Json(_))));
    }
}
