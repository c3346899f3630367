// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Persistence of analysis records, metrics and cached repository metadata.
//!
//! An analysis moves `pending -> processing -> completed | failed`. Both
//! implementations enforce that a record in a terminal state is never
//! modified again: progress updates, completion and failure on a finished
//! record are rejected with [`Error::Validation`].

mod memory;
mod sqlite;

use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub use self::{memory::MemoryStore, sqlite::SqliteStore};
use crate::{
    error::Error,
    metrics::AnalysisMetrics,
    narrative::RoadmapItem,
    repo_id::RepoId,
    score::{Badge, CompositeScore, Rating},
    snapshot::RepositoryInfo,
};

/// Largest page size accepted by [`AnalysisStore::history`].
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Lifecycle state of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus
{
    /// Created but not yet started.
    Pending,
    /// Pipeline running.
    Processing,
    /// Scores and narrative recorded.
    Completed,
    /// Terminated with an error message.
    Failed,
}

impl AnalysisStatus
{
    /// Lowercase name used in storage and output.
    pub const fn as_str(self,) -> &'static str
    {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Completed and failed records are immutable.
    pub const fn is_terminal(self,) -> bool
    {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for AnalysisStatus
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

impl FromStr for AnalysisStatus
{
    type Err = Error;

    fn from_str(value: &str,) -> Result<Self, Self::Err,>
    {
        match value {
            "pending" => Ok(Self::Pending,),
            "processing" => Ok(Self::Processing,),
            "completed" => Ok(Self::Completed,),
            "failed" => Ok(Self::Failed,),
            other => Err(Error::validation(format!("unknown analysis status {other:?}"),),),
        }
    }
}

/// Persisted state of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct AnalysisRecord
{
    /// Random identifier.
    pub id:            String,
    /// Canonical repository URL.
    pub repo_url:      String,
    /// Repository owner.
    pub owner:         String,
    /// Repository name.
    pub name:          String,
    /// Lifecycle state.
    pub status:        AnalysisStatus,
    /// Last recorded progress percentage.
    pub progress:      u8,
    /// Label of the last recorded stage.
    pub current_step:  Option<String,>,
    /// Composite total, set on completion.
    pub score:         Option<u32,>,
    /// Rating tier, set on completion.
    pub rating:        Option<Rating,>,
    /// Badge tier, set on completion.
    pub badge:         Option<Badge,>,
    /// Narrative summary, set on completion.
    pub summary:       Option<String,>,
    /// Improvement roadmap, empty until completion.
    pub roadmap:       Vec<RoadmapItem,>,
    /// Failure reason, set only for failed records.
    pub error_message: Option<String,>,
    /// Creation time.
    pub created_at:    DateTime<Utc,>,
    /// Time of the last transition or progress update.
    pub updated_at:    DateTime<Utc,>,
    /// Time the record reached a terminal state.
    pub completed_at:  Option<DateTime<Utc,>,>,
}

impl AnalysisRecord
{
    /// Fresh pending record with a random identifier.
    pub fn pending(repo: &RepoId, repo_url: &str,) -> Self
    {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            repo_url: repo_url.to_owned(),
            owner: repo.owner.clone(),
            name: repo.repo.clone(),
            status: AnalysisStatus::Pending,
            progress: 0,
            current_step: None,
            score: None,
            rating: None,
            badge: None,
            summary: None,
            roadmap: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Composite score of a completed record.
    pub fn composite(&self,) -> Option<CompositeScore,>
    {
        Some(CompositeScore {
            total: self.score?, rating: self.rating?, badge: self.badge?,
        },)
    }

    fn ensure_mutable(&self,) -> Result<(), Error,>
    {
        if self.status.is_terminal() {
            return Err(Error::validation(format!("analysis {} is already {}", self.id, self.status),),);
        }
        Ok((),)
    }

    /// Applies a progress update in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the record is terminal.
    pub fn advance(&mut self, progress: u8, step: &str,) -> Result<(), Error,>
    {
        self.ensure_mutable()?;
        self.status = AnalysisStatus::Processing;
        self.progress = progress.min(100,);
        self.current_step = Some(step.to_owned(),);
        self.updated_at = Utc::now();
        Ok((),)
    }

    /// Finalizes the record as completed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the record is terminal.
    pub fn complete(&mut self, completion: &Completion,) -> Result<(), Error,>
    {
        self.ensure_mutable()?;
        let now = Utc::now();
        self.status = AnalysisStatus::Completed;
        self.progress = 100;
        self.score = Some(completion.score.total,);
        self.rating = Some(completion.score.rating,);
        self.badge = Some(completion.score.badge,);
        self.summary = Some(completion.summary.clone(),);
        self.roadmap = completion.roadmap.clone();
        self.updated_at = now;
        self.completed_at = Some(now,);
        Ok((),)
    }

    /// Finalizes the record as failed, keeping the last progress value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the record is terminal.
    pub fn fail(&mut self, message: &str,) -> Result<(), Error,>
    {
        self.ensure_mutable()?;
        self.status = AnalysisStatus::Failed;
        self.error_message = Some(message.to_owned(),);
        self.updated_at = Utc::now();
        Ok((),)
    }
}

/// Final results written when an analysis completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct Completion
{
    pub score:   CompositeScore,
    pub summary: String,
    pub roadmap: Vec<RoadmapItem,>,
}

/// Storage backend for analyses and the repository metadata cache.
///
/// Methods are synchronous; callers on an async runtime keep each call short
/// and never hold a result across an await point.
pub trait AnalysisStore: Send + Sync
{
    /// Inserts a pending record.
    fn create_analysis(&self, repo: &RepoId, repo_url: &str,) -> Result<AnalysisRecord, Error,>;

    /// Moves a record to `processing` with the given progress and step.
    fn update_progress(&self, id: &str, progress: u8, step: &str,) -> Result<(), Error,>;

    /// Marks a record completed with its final results.
    fn complete_analysis(&self, id: &str, completion: &Completion,) -> Result<(), Error,>;

    /// Marks a record failed with a human readable reason.
    ///
    /// Metrics saved earlier for the record are discarded, so a failed
    /// analysis never exposes sub-scores.
    fn fail_analysis(&self, id: &str, message: &str,) -> Result<(), Error,>;

    /// Stores the derived metrics of an analysis, replacing earlier ones.
    fn save_metrics(&self, id: &str, metrics: &AnalysisMetrics,) -> Result<(), Error,>;

    /// Looks up a record.
    fn analysis(&self, id: &str,) -> Result<Option<AnalysisRecord,>, Error,>;

    /// Looks up the metrics of a record.
    fn metrics(&self, id: &str,) -> Result<Option<AnalysisMetrics,>, Error,>;

    /// Records ordered newest first; `limit` is capped at
    /// [`MAX_HISTORY_LIMIT`].
    fn history(&self, limit: usize, offset: usize,) -> Result<Vec<AnalysisRecord,>, Error,>;

    /// Unexpired cached metadata for `key`.
    fn cached_repository(&self, key: &str,) -> Result<Option<RepositoryInfo,>, Error,>;

    /// Caches metadata for `ttl_secs` seconds, replacing any earlier entry.
    fn cache_repository(&self, key: &str, info: &RepositoryInfo, ttl_secs: u64,) -> Result<(), Error,>;

    /// Deletes expired cache entries and reports how many were removed.
    fn purge_expired_cache(&self,) -> Result<usize, Error,>;
}

pub(crate) fn expiry(now: DateTime<Utc,>, ttl_secs: u64,) -> Result<DateTime<Utc,>, Error,>
{
    i64::try_from(ttl_secs,)
        .ok()
        .and_then(TimeDelta::try_seconds,)
        .and_then(|ttl| now.checked_add_signed(ttl,),)
        .ok_or_else(|| Error::validation(format!("cache ttl of {ttl_secs}s is out of range"),),)
}

pub(crate) fn missing(id: &str,) -> Error
{
    Error::not_found(format!("Analysis {id}"),)
}
