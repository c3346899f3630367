//! Heuristic quality grading for GitHub repositories.
//!
//! The library gathers a read-only [`snapshot::RepoSnapshot`] of a repository
//! through a [`github::RepositorySource`], runs nine independent analyzers
//! over it, sums their bounded sub-scores into a 0-100 composite with a
//! rating and badge, narrates the outcome and persists everything through an
//! [`store::AnalysisStore`]. [`Orchestrator`] sequences those stages and
//! reports progress; [`orchestrator::evaluate`] scores a snapshot offline.
//!
//! Configuration is an explicit [`Config`] value handed to each component when
//! it is constructed.

mod config;
mod error;
mod patterns;
mod repo_id;

pub mod analyzers;
pub mod badge;
pub mod github;
pub mod metrics;
pub mod narrative;
pub mod orchestrator;
pub mod retry;
pub mod score;
pub mod snapshot;
pub mod store;

pub use badge::{BadgeAssets, generate_badge_assets};
pub use config::{AnalysisConfig, Config, DatabaseConfig, GeneratorConfig, GitHubConfig};
pub use error::{Error, badge_io_error, io_error};
pub use orchestrator::{AnalysisReport, Orchestrator, ProgressEvent};
pub use repo_id::RepoId;
pub use score::{Badge, CompositeScore, Rating};
