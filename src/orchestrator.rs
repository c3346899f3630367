// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! End-to-end analysis pipeline.
//!
//! [`Orchestrator::analyze`] validates the repository identifier, creates a
//! pending record and walks the stages below, recording progress after each
//! one. Any error moves the record to `failed` with the error text and is
//! returned to the caller; narrative problems never get that far because the
//! [`Narrator`] recovers them itself.
//!
//! | Progress | Stage |
//! |---|---|
//! | 10 | repository metadata (served from the cache when fresh) |
//! | 20 | file tree of the default branch |
//! | 30 | README |
//! | 40 | commit history |
//! | 50 | branches, pull requests, languages and contributors, concurrently |
//! | 60 | the nine analyzers, concurrently |
//! | 85 | composite score and metrics |
//! | 90 | summary |
//! | 95 | roadmap |
//! | 100 | metrics and results persisted |

use std::{fmt, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    analyzers::AnalyzerRegistry,
    config::AnalysisConfig,
    error::Error,
    github::RepositorySource,
    metrics::AnalysisMetrics,
    narrative::{Narrator, RoadmapItem},
    repo_id::RepoId,
    score::{CompositeScore, ScoreCard},
    snapshot::{RepoSnapshot, RepositoryInfo},
    store::{AnalysisStore, Completion},
};

/// Progress notification emitted after each recorded stage.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ProgressEvent
{
    /// Analysis the event belongs to.
    pub analysis_id: String,
    /// Percentage recorded for the stage.
    pub progress:    u8,
    /// Human readable stage label.
    pub step:        &'static str,
}

/// Observer of [`ProgressEvent`]s.
pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent,) + Send + Sync,>;

/// Scores, metrics and narrative derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct Evaluation
{
    /// Composite total with its rating and badge.
    pub score:   CompositeScore,
    /// Narrative summary, generated or templated.
    pub summary: String,
    /// Prioritized improvement items.
    pub roadmap: Vec<RoadmapItem,>,
    /// One result per dimension with typed details.
    pub scores:  ScoreCard,
    /// Flattened metrics row.
    pub metrics: AnalysisMetrics,
}

/// Result of a completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct AnalysisReport
{
    /// Analysis identifier.
    pub id:         String,
    /// Canonical repository URL.
    pub repo_url:   String,
    /// Repository metadata at fetch time.
    pub repository: RepositoryInfo,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

/// Runs the analyzer battery on a blocking thread so the rayon fan-out
/// never stalls the async runtime.
///
/// # Errors
///
/// Returns [`Error::Service`] when the blocking task cannot be joined.
pub async fn run_analyzers(registry: &AnalyzerRegistry, snapshot: Arc<RepoSnapshot,>,) -> Result<ScoreCard, Error,>
{
    let registry = registry.clone();
    let results = tokio::task::spawn_blocking(move || registry.run(&snapshot,),)
        .await
        .map_err(|e| Error::service(format!("analyzer task failed: {e}"),),)?;
    Ok(ScoreCard::from_results(results,),)
}

/// Scores a snapshot without touching the network or a store.
///
/// # Errors
///
/// Returns [`Error::Service`] when the analyzer task cannot be joined.
pub async fn evaluate(
    registry: &AnalyzerRegistry,
    narrator: &Narrator,
    info: &RepositoryInfo,
    snapshot: RepoSnapshot,
) -> Result<Evaluation, Error,>
{
    let snapshot = Arc::new(snapshot,);
    let scores = run_analyzers(registry, Arc::clone(&snapshot,),).await?;
    let metrics = AnalysisMetrics::derive(info, &snapshot, &scores,);
    let summary = narrator.summarize(info, &metrics,).await;
    let roadmap = narrator.roadmap(info, &metrics, &summary,).await;
    Ok(Evaluation {
        score: scores.composite(),
        summary,
        roadmap,
        scores,
        metrics,
    },)
}

/// Sequences fetching, scoring, narration and persistence.
#[derive(Clone,)]
pub struct Orchestrator
{
    source:   Arc<dyn RepositorySource,>,
    store:    Arc<dyn AnalysisStore,>,
    narrator: Narrator,
    registry: AnalyzerRegistry,
    limits:   AnalysisConfig,
    progress: Option<ProgressCallback,>,
}

impl fmt::Debug for Orchestrator
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.debug_struct("Orchestrator",)
            .field("narrator", &self.narrator,)
            .field("registry", &self.registry,)
            .field("limits", &self.limits,)
            .finish_non_exhaustive()
    }
}

impl Orchestrator
{
    /// Creates an orchestrator running the standard analyzer battery.
    pub fn new(
        source: Arc<dyn RepositorySource,>,
        store: Arc<dyn AnalysisStore,>,
        narrator: Narrator,
        limits: AnalysisConfig,
    ) -> Self
    {
        Self {
            source,
            store,
            narrator,
            registry: AnalyzerRegistry::standard(),
            limits,
            progress: None,
        }
    }

    /// Replaces the analyzer battery.
    pub fn with_registry(mut self, registry: AnalyzerRegistry,) -> Self
    {
        self.registry = registry;
        self
    }

    /// Registers a progress observer.
    pub fn with_progress(mut self, callback: ProgressCallback,) -> Self
    {
        self.progress = Some(callback,);
        self
    }

    /// Store the orchestrator writes to.
    pub fn store(&self,) -> &Arc<dyn AnalysisStore,>
    {
        &self.store
    }

    /// Analyses the repository at `repo_url`.
    ///
    /// The pipeline runs under the configured overall timeout; when it
    /// elapses the pipeline is dropped and the record is marked failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed identifier (no record is
    /// created), otherwise the error that stopped the pipeline after the
    /// record has been marked failed.
    pub async fn analyze(&self, repo_url: &str,) -> Result<AnalysisReport, Error,>
    {
        let repo = RepoId::parse(repo_url,)?;
        let record = self.store.create_analysis(&repo, repo_url,)?;
        let id = record.id.as_str();
        info!(analysis_id = %id, repository = %repo, "analysis started");

        let deadline = Duration::from_millis(self.limits.timeout_ms,);
        let outcome = match tokio::time::timeout(deadline, self.run(id, &repo, repo_url,),).await {
            Ok(outcome,) => outcome,
            Err(_,) => Err(Error::Timeout {
                millis: self.limits.timeout_ms,
            },),
        };

        match outcome {
            Ok(report,) => {
                info!(
                    analysis_id = %id,
                    score = report.evaluation.score.total,
                    rating = %report.evaluation.score.rating,
                    "analysis completed"
                );
                Ok(report,)
            }
            Err(failure,) => {
                error!(analysis_id = %id, repository = %repo, "analysis failed: {}", failure);
                if let Err(store_error,) = self.store.fail_analysis(id, &failure.to_display_string(),) {
                    warn!(analysis_id = %id, "could not record failure: {}", store_error);
                }
                Err(failure,)
            }
        }
    }

    fn step(&self, id: &str, progress: u8, step: &'static str,) -> Result<(), Error,>
    {
        self.store.update_progress(id, progress, step,)?;
        debug!(analysis_id = %id, progress, "{}", step);
        if let Some(callback,) = &self.progress {
            callback(&ProgressEvent {
                analysis_id: id.to_owned(),
                progress,
                step,
            },);
        }
        Ok((),)
    }

    async fn repository_info(&self, repo: &RepoId,) -> Result<RepositoryInfo, Error,>
    {
        let key = repo.cache_key();
        match self.store.cached_repository(&key,) {
            Ok(Some(info,),) => {
                debug!("cache hit for {}", key);
                return Ok(info,);
            }
            Ok(None,) => {}
            Err(e,) => warn!("cache lookup for {} failed: {}", key, e),
        }

        let info = self.source.repository(repo,).await?;
        if let Err(e,) = self.store.cache_repository(&key, &info, self.limits.cache_ttl_secs,) {
            warn!("could not cache metadata for {}: {}", key, e);
        }
        Ok(info,)
    }

    async fn run(&self, id: &str, repo: &RepoId, repo_url: &str,) -> Result<AnalysisReport, Error,>
    {
        self.step(id, 10, "Fetching repository metadata...",)?;
        let info = self.repository_info(repo,).await?;

        self.step(id, 20, "Fetching file structure...",)?;
        let files = self.source.file_tree(repo, &info.default_branch,).await?;

        self.step(id, 30, "Analyzing documentation...",)?;
        let readme = self.source.readme(repo,).await?;

        self.step(id, 40, "Analyzing Git practices...",)?;
        let commits = self.source.commits(repo, self.limits.max_commits,).await?;

        self.step(id, 50, "Analyzing branch strategy...",)?;
        let (branches, pull_requests, languages, contributors,) = tokio::try_join!(
            self.source.branches(repo),
            self.source.pull_requests(repo),
            self.source.languages(repo),
            self.source.contributors(repo),
        )?;

        let snapshot = Arc::new(RepoSnapshot {
            files,
            readme,
            commits: Some(commits,),
            branches,
            pull_requests: Some(pull_requests,),
            languages,
            contributors,
        },);

        self.step(id, 60, "Running code quality analysis...",)?;
        let scores = run_analyzers(&self.registry, Arc::clone(&snapshot,),).await?;

        self.step(id, 85, "Calculating final score...",)?;
        let score = scores.composite();
        let metrics = AnalysisMetrics::derive(&info, &snapshot, &scores,);

        self.step(id, 90, "Generating AI summary...",)?;
        let summary = self.narrator.summarize(&info, &metrics,).await;

        self.step(id, 95, "Creating personalized roadmap...",)?;
        let roadmap = self.narrator.roadmap(&info, &metrics, &summary,).await;

        self.step(id, 100, "Finalizing results...",)?;
        self.store.save_metrics(id, &metrics,)?;
        self.store.complete_analysis(
            id,
            &Completion {
                score,
                summary: summary.clone(),
                roadmap: roadmap.clone(),
            },
        )?;

        Ok(AnalysisReport {
            id: id.to_owned(),
            repo_url: repo_url.to_owned(),
            repository: info,
            evaluation: Evaluation {
                score,
                summary,
                roadmap,
                scores,
                metrics,
            },
        },)
    }
}
