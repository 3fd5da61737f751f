//! SQLite archive of exported sessions
//!
//! Live sessions are never persisted implicitly. The CLI archives a session
//! explicitly (`chat --save`), storing its JSON export, so the one-shot
//! subcommands can load it again.

use crate::config::ClientConfig;
use crate::error::{PalaverError, Result};
use crate::session::SessionExport;
use anyhow::Context;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub mod types;
pub use types::ArchivedSession;

const FULL_ID_LEN: usize = 36;

/// Archive backed by a single SQLite file
#[derive(Debug)]
pub struct SessionArchive {
    db_path: PathBuf,
}

impl SessionArchive {
    /// Open the archive named by the configuration, or the default location
    ///
    /// # Errors
    ///
    /// Returns a storage error if the data directory cannot be determined or
    /// the database cannot be initialized
    pub fn open(config: &ClientConfig) -> Result<Self> {
        match &config.archive_path {
            Some(path) => Self::new_with_path(path),
            None => Self::new_with_path(Self::default_path()?),
        }
    }

    /// Default archive location in the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "palaver", "palaver")
            .ok_or_else(|| PalaverError::Storage("Could not determine data directory".into()))?;
        Ok(proj_dirs.data_dir().join("sessions.db"))
    }

    /// Open an archive at a specific path, creating it if needed
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::storage::SessionArchive;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let archive = SessionArchive::new_with_path(dir.path().join("sessions.db")).unwrap();
    /// assert!(archive.list().unwrap().is_empty());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| PalaverError::Storage(e.to_string()))?;
        }

        let archive = Self { db_path };
        archive.init()?;
        tracing::debug!("Opened session archive at {}", archive.db_path.display());
        Ok(archive)
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| PalaverError::Storage(e.to_string()))?)
    }

    fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                model TEXT NOT NULL,
                created_at TEXT NOT NULL,
                archived_at TEXT NOT NULL,
                message_count INTEGER NOT NULL,
                token_count INTEGER NOT NULL,
                export JSON NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| PalaverError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Save or replace an archived session
    pub fn save(&self, export: &SessionExport) -> Result<()> {
        let conn = self.connect()?;
        let export_json = export.to_json()?;

        conn.execute(
            "INSERT INTO sessions
                (id, user_id, model, created_at, archived_at, message_count, token_count, export)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                model = excluded.model,
                archived_at = excluded.archived_at,
                message_count = excluded.message_count,
                token_count = excluded.token_count,
                export = excluded.export",
            params![
                export.session_id,
                export.user_id,
                export.model,
                export.created_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
                export.messages.len() as i64,
                export.metrics.token_count as i64,
                export_json,
            ],
        )
        .context("Failed to save session")
        .map_err(|e| PalaverError::Storage(e.to_string()))?;

        tracing::info!(
            "Archived session {} ({} messages)",
            export.session_id,
            export.messages.len()
        );
        Ok(())
    }

    /// Load an archived session by full id or unique prefix
    ///
    /// # Errors
    ///
    /// Returns invalid input if a prefix matches more than one session
    pub fn load(&self, id: &str) -> Result<Option<SessionExport>> {
        let Some(full_id) = self.resolve_id(id)? else {
            return Ok(None);
        };

        let conn = self.connect()?;
        let export_json: Option<String> = conn
            .query_row(
                "SELECT export FROM sessions WHERE id = ?",
                params![full_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query session")
            .map_err(|e| PalaverError::Storage(e.to_string()))?;

        export_json
            .map(|json| SessionExport::parse(&json))
            .transpose()
    }

    /// List archived sessions, most recently archived first
    pub fn list(&self) -> Result<Vec<ArchivedSession>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, model, created_at, archived_at, message_count, token_count
                FROM sessions
                ORDER BY archived_at DESC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| PalaverError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let created_at: String = row.get(3)?;
                let archived_at: String = row.get(4)?;
                let message_count: i64 = row.get(5)?;
                let token_count: i64 = row.get(6)?;
                Ok(ArchivedSession {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    model: row.get(2)?,
                    created_at: parse_timestamp(&created_at),
                    archived_at: parse_timestamp(&archived_at),
                    message_count: message_count.max(0) as usize,
                    token_count: token_count.max(0) as u64,
                })
            })
            .context("Failed to query sessions")
            .map_err(|e| PalaverError::Storage(e.to_string()))?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(
                row.context("Failed to read session row")
                    .map_err(|e| PalaverError::Storage(e.to_string()))?,
            );
        }
        Ok(sessions)
    }

    /// Delete an archived session by full id or unique prefix
    ///
    /// Returns false if nothing matched.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let Some(full_id) = self.resolve_id(id)? else {
            return Ok(false);
        };

        let conn = self.connect()?;
        let deleted = conn
            .execute("DELETE FROM sessions WHERE id = ?", params![full_id])
            .context("Failed to delete session")
            .map_err(|e| PalaverError::Storage(e.to_string()))?;
        Ok(deleted > 0)
    }

    fn resolve_id(&self, id: &str) -> Result<Option<String>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(PalaverError::InvalidInput("Session ID cannot be empty".to_string()).into());
        }

        let conn = self.connect()?;
        if id.len() == FULL_ID_LEN {
            return Ok(conn
                .query_row("SELECT id FROM sessions WHERE id = ?", params![id], |row| {
                    row.get(0)
                })
                .optional()
                .context("Failed to query session")
                .map_err(|e| PalaverError::Storage(e.to_string()))?);
        }

        let mut stmt = conn
            .prepare("SELECT id FROM sessions WHERE substr(id, 1, ?2) = ?1 LIMIT 2")
            .context("Failed to prepare statement")
            .map_err(|e| PalaverError::Storage(e.to_string()))?;
        let matches = stmt
            .query_map(params![id, id.chars().count() as i64], |row| {
                row.get::<_, String>(0)
            })
            .context("Failed to query sessions")
            .map_err(|e| PalaverError::Storage(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(PalaverError::Database)?;

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.into_iter().next()),
            _ => Err(PalaverError::InvalidInput(format!(
                "Session prefix {} matches more than one archived session",
                id
            ))
            .into()),
        }
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
