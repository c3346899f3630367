// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! SQLite-backed [`AnalysisStore`].
//!
//! The schema is versioned through `PRAGMA user_version`; migrations run in
//! order when the store is opened. Timestamps are stored as Unix
//! milliseconds, roadmaps and metrics as JSON text.

use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use super::{AnalysisRecord, AnalysisStore, Completion, MAX_HISTORY_LIMIT, expiry, missing};
use crate::{error::Error, metrics::AnalysisMetrics, repo_id::RepoId, snapshot::RepositoryInfo};

const SCHEMA_VERSION: i64 = 1;

const RECORD_COLUMNS: &str = "id, repo_url, owner, name, status, progress, current_step, score, rating, badge, \
                              summary, roadmap, error_message, created_at, updated_at, completed_at";

/// Persistent store in a single SQLite file.
#[derive(Debug,)]
pub struct SqliteStore
{
    conn: Mutex<Connection,>,
}

impl SqliteStore
{
    /// Opens or creates the database at `path` and migrates it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] when the file cannot be opened or migrated.
    pub fn open(path: &Path,) -> Result<Self, Error,>
    {
        let conn = Connection::open(path,)?;
        info!("opened analysis database at {}", path.display());
        Self::with_connection(conn,)
    }

    /// Creates a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] when SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self, Error,>
    {
        Self::with_connection(Connection::open_in_memory()?,)
    }

    fn with_connection(conn: Connection,) -> Result<Self, Error,>
    {
        migrate(&conn,)?;
        Ok(Self {
            conn: Mutex::new(conn,),
        },)
    }

    fn lock(&self,) -> Result<MutexGuard<'_, Connection,>, Error,>
    {
        self.conn.lock().map_err(|_| Error::service("database lock poisoned",),)
    }

    fn update<F,>(&self, id: &str, apply: F,) -> Result<(), Error,>
    where
        F: FnOnce(&mut AnalysisRecord,) -> Result<(), Error,>,
    {
        let conn = self.lock()?;
        let mut record = load(&conn, id,)?.ok_or_else(|| missing(id,),)?;
        apply(&mut record,)?;
        conn.execute(
            "UPDATE analyses
             SET status = ?2, progress = ?3, current_step = ?4, score = ?5, rating = ?6, badge = ?7,
                 summary = ?8, roadmap = ?9, error_message = ?10, updated_at = ?11, completed_at = ?12
             WHERE id = ?1",
            params![
                record.id,
                record.status.as_str(),
                record.progress,
                record.current_step,
                record.score,
                record.rating.map(|rating| rating.to_string()),
                record.badge.map(|badge| badge.to_string()),
                record.summary,
                serde_json::to_string(&record.roadmap)?,
                record.error_message,
                record.updated_at.timestamp_millis(),
                record.completed_at.map(|at| at.timestamp_millis()),
            ],
        )?;
        Ok((),)
    }
}

fn migrate(conn: &Connection,) -> Result<(), Error,>
{
    conn.execute_batch("PRAGMA foreign_keys = ON;",)?;
    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0,),)?;

    if version < 1 {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS analyses (
                id TEXT PRIMARY KEY,
                repo_url TEXT NOT NULL,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                status TEXT NOT NULL CHECK(status IN ('pending', 'processing', 'completed', 'failed')),
                progress INTEGER NOT NULL DEFAULT 0,
                current_step TEXT,
                score INTEGER,
                rating TEXT,
                badge TEXT,
                summary TEXT,
                roadmap TEXT NOT NULL DEFAULT '[]',
                error_message TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                completed_at INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_analyses_created_at ON analyses(created_at);

            CREATE TABLE IF NOT EXISTS metrics (
                analysis_id TEXT PRIMARY KEY REFERENCES analyses(id) ON DELETE CASCADE,
                total_score INTEGER NOT NULL,
                code_quality_score INTEGER NOT NULL,
                structure_score INTEGER NOT NULL,
                documentation_score INTEGER NOT NULL,
                testing_score INTEGER NOT NULL,
                git_practices_score INTEGER NOT NULL,
                security_score INTEGER NOT NULL,
                cicd_score INTEGER NOT NULL,
                dependencies_score INTEGER NOT NULL,
                containerization_score INTEGER NOT NULL,
                data TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS repo_cache (
                cache_key TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                cached_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );
            ",
        )?;
        version = 1;
        conn.pragma_update(None, "user_version", version,)?;
        debug!("database schema migrated to version {}", version);
    }

    if version > SCHEMA_VERSION {
        return Err(Error::service(format!(
            "database schema version {version} is newer than supported version {SCHEMA_VERSION}"
        ),),);
    }

    Ok((),)
}

/// Column values of one `analyses` row before conversion.
struct RecordRow
{
    id:            String,
    repo_url:      String,
    owner:         String,
    name:          String,
    status:        String,
    progress:      u8,
    current_step:  Option<String,>,
    score:         Option<u32,>,
    rating:        Option<String,>,
    badge:         Option<String,>,
    summary:       Option<String,>,
    roadmap:       String,
    error_message: Option<String,>,
    created_at:    i64,
    updated_at:    i64,
    completed_at:  Option<i64,>,
}

impl RecordRow
{
    fn read(row: &Row<'_,>,) -> rusqlite::Result<Self,>
    {
        Ok(Self {
            id:            row.get(0,)?,
            repo_url:      row.get(1,)?,
            owner:         row.get(2,)?,
            name:          row.get(3,)?,
            status:        row.get(4,)?,
            progress:      row.get(5,)?,
            current_step:  row.get(6,)?,
            score:         row.get(7,)?,
            rating:        row.get(8,)?,
            badge:         row.get(9,)?,
            summary:       row.get(10,)?,
            roadmap:       row.get(11,)?,
            error_message: row.get(12,)?,
            created_at:    row.get(13,)?,
            updated_at:    row.get(14,)?,
            completed_at:  row.get(15,)?,
        },)
    }

    fn into_record(self,) -> Result<AnalysisRecord, Error,>
    {
        Ok(AnalysisRecord {
            status: self.status.parse()?,
            rating: self.rating.as_deref().map(str::parse,).transpose()?,
            badge: self.badge.as_deref().map(str::parse,).transpose()?,
            roadmap: serde_json::from_str(&self.roadmap,)?,
            created_at: timestamp(self.created_at,)?,
            updated_at: timestamp(self.updated_at,)?,
            completed_at: self.completed_at.map(timestamp,).transpose()?,
            id: self.id,
            repo_url: self.repo_url,
            owner: self.owner,
            name: self.name,
            progress: self.progress,
            current_step: self.current_step,
            score: self.score,
            summary: self.summary,
            error_message: self.error_message,
        },)
    }
}

fn timestamp(millis: i64,) -> Result<DateTime<Utc,>, Error,>
{
    DateTime::from_timestamp_millis(millis,).ok_or_else(|| Error::service(format!("invalid stored timestamp {millis}"),),)
}

fn load(conn: &Connection, id: &str,) -> Result<Option<AnalysisRecord,>, Error,>
{
    let row = conn
        .query_row(&format!("SELECT {RECORD_COLUMNS} FROM analyses WHERE id = ?1"), [id], RecordRow::read,)
        .optional()?;
    row.map(RecordRow::into_record,).transpose()
}

impl AnalysisStore for SqliteStore
{
    fn create_analysis(&self, repo: &RepoId, repo_url: &str,) -> Result<AnalysisRecord, Error,>
    {
        let record = AnalysisRecord::pending(repo, repo_url,);
        self.lock()?.execute(
            "INSERT INTO analyses (id, repo_url, owner, name, status, progress, roadmap, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, '[]', ?6, ?6)",
            params![
                record.id,
                record.repo_url,
                record.owner,
                record.name,
                record.status.as_str(),
                record.created_at.timestamp_millis(),
            ],
        )?;
        debug!("created analysis {} for {}", record.id, repo);
        Ok(record,)
    }

    fn update_progress(&self, id: &str, progress: u8, step: &str,) -> Result<(), Error,>
    {
        self.update(id, |record| record.advance(progress, step,),)
    }

    fn complete_analysis(&self, id: &str, completion: &Completion,) -> Result<(), Error,>
    {
        self.update(id, |record| record.complete(completion,),)
    }

    fn fail_analysis(&self, id: &str, message: &str,) -> Result<(), Error,>
    {
        self.update(id, |record| record.fail(message,),)?;
        self.lock()?.execute("DELETE FROM metrics WHERE analysis_id = ?1", [id],)?;
        Ok((),)
    }

    fn save_metrics(&self, id: &str, metrics: &AnalysisMetrics,) -> Result<(), Error,>
    {
        let conn = self.lock()?;
        if load(&conn, id,)?.is_none() {
            return Err(missing(id,),);
        }
        conn.execute(
            "INSERT OR REPLACE INTO metrics (
                analysis_id, total_score, code_quality_score, structure_score, documentation_score,
                testing_score, git_practices_score, security_score, cicd_score, dependencies_score,
                containerization_score, data
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id,
                metrics.total_score,
                metrics.code_quality_score,
                metrics.structure_score,
                metrics.documentation_score,
                metrics.testing_score,
                metrics.git_practices_score,
                metrics.security_score,
                metrics.cicd_score,
                metrics.dependencies_score,
                metrics.containerization_score,
                serde_json::to_string(metrics)?,
            ],
        )?;
        Ok((),)
    }

    fn analysis(&self, id: &str,) -> Result<Option<AnalysisRecord,>, Error,>
    {
        load(&*self.lock()?, id,)
    }

    fn metrics(&self, id: &str,) -> Result<Option<AnalysisMetrics,>, Error,>
    {
        let data: Option<String,> = self
            .lock()?
            .query_row("SELECT data FROM metrics WHERE analysis_id = ?1", [id], |row| row.get(0,),)
            .optional()?;
        Ok(data.map(|json| serde_json::from_str(&json,),).transpose()?,)
    }

    fn history(&self, limit: usize, offset: usize,) -> Result<Vec<AnalysisRecord,>, Error,>
    {
        let conn = self.lock()?;
        let mut statement = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM analyses ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        ),)?;
        let limit = limit.min(MAX_HISTORY_LIMIT,) as i64;
        let offset = i64::try_from(offset,).unwrap_or(i64::MAX,);
        let rows = statement.query_map(params![limit, offset], RecordRow::read,)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?,);
        }
        Ok(records,)
    }

    fn cached_repository(&self, key: &str,) -> Result<Option<RepositoryInfo,>, Error,>
    {
        let data: Option<String,> = self
            .lock()?
            .query_row(
                "SELECT data FROM repo_cache WHERE cache_key = ?1 AND expires_at > ?2",
                params![key, Utc::now().timestamp_millis()],
                |row| row.get(0,),
            )
            .optional()?;
        Ok(data.map(|json| serde_json::from_str(&json,),).transpose()?,)
    }

    fn cache_repository(&self, key: &str, info: &RepositoryInfo, ttl_secs: u64,) -> Result<(), Error,>
    {
        let now = Utc::now();
        let expires_at = expiry(now, ttl_secs,)?;
        self.lock()?.execute(
            "INSERT INTO repo_cache (cache_key, data, cached_at, expires_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(cache_key) DO UPDATE SET data = ?2, cached_at = ?3, expires_at = ?4",
            params![key, serde_json::to_string(info)?, now.timestamp_millis(), expires_at.timestamp_millis()],
        )?;
        Ok((),)
    }

    fn purge_expired_cache(&self,) -> Result<usize, Error,>
    {
        let removed = self
            .lock()?
            .execute("DELETE FROM repo_cache WHERE expires_at <= ?1", [Utc::now().timestamp_millis()],)?;
        if removed > 0 {
            debug!("purged {} expired cache entries", removed);
        }
        Ok(removed,)
    }
}
