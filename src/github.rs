// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository data source backed by the GitHub REST API.
//!
//! [`RepositorySource`] is the seam the orchestrator depends on; the
//! production implementation [`GitHubSource`] talks to GitHub through
//! `octocrab` and wraps every request in [`retry_with_backoff`]. Upstream
//! failures are classified into [`Error::NotFound`], [`Error::RateLimited`]
//! and [`Error::Network`] so callers can tell them apart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::{
    config::{AnalysisConfig, GitHubConfig},
    error::Error,
    repo_id::RepoId,
    retry::{RetryConfig, retry_with_backoff},
    snapshot::{
        BranchInfo, CommitInfo, Contributor, EntryKind, FileEntry, PullRequestStats, Readme, RepositoryInfo,
    },
};

const PER_PAGE: u32 = 100;

/// Source of everything the analyzers need to know about a repository.
#[async_trait]
pub trait RepositorySource: Send + Sync
{
    /// Repository metadata.
    async fn repository(&self, id: &RepoId,) -> Result<RepositoryInfo, Error,>;

    /// Flattened recursive tree of `branch`, truncated to the configured
    /// maximum entry count.
    async fn file_tree(&self, id: &RepoId, branch: &str,) -> Result<Vec<FileEntry,>, Error,>;

    /// README content, or `None` when the repository has none.
    async fn readme(&self, id: &RepoId,) -> Result<Option<Readme,>, Error,>;

    /// Up to `max_commits` commits, newest first.
    async fn commits(&self, id: &RepoId, max_commits: usize,) -> Result<Vec<CommitInfo,>, Error,>;

    /// Branches with protection flags.
    async fn branches(&self, id: &RepoId,) -> Result<Vec<BranchInfo,>, Error,>;

    /// Aggregate pull request counts across all states.
    async fn pull_requests(&self, id: &RepoId,) -> Result<PullRequestStats, Error,>;

    /// Contributors with contribution counts.
    async fn contributors(&self, id: &RepoId,) -> Result<Vec<Contributor,>, Error,>;

    /// Language name to percentage of bytes, rounded to two decimals.
    async fn languages(&self, id: &RepoId,) -> Result<BTreeMap<String, f64,>, Error,>;
}

#[derive(Debug, Deserialize,)]
struct RepoResponse
{
    name:              String,
    full_name:         String,
    owner:             OwnerResponse,
    description:       Option<String,>,
    language:          Option<String,>,
    #[serde(default)]
    stargazers_count:  u32,
    #[serde(default)]
    forks_count:       u32,
    #[serde(default)]
    open_issues_count: u32,
    default_branch:    Option<String,>,
    license:           Option<LicenseResponse,>,
}

#[derive(Debug, Deserialize,)]
struct OwnerResponse
{
    login: String,
}

#[derive(Debug, Deserialize,)]
struct LicenseResponse
{
    name: String,
}

#[derive(Debug, Deserialize,)]
struct TreeResponse
{
    tree:      Vec<TreeItem,>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize,)]
struct TreeItem
{
    path: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    size: Option<u64,>,
}

#[derive(Debug, Deserialize,)]
struct ReadmeResponse
{
    content: String,
    #[serde(default)]
    size:    u64,
}

#[derive(Debug, Deserialize,)]
struct CommitResponse
{
    commit: CommitBody,
}

#[derive(Debug, Deserialize,)]
struct CommitBody
{
    message: String,
    author:  Option<CommitAuthor,>,
}

#[derive(Debug, Deserialize,)]
struct CommitAuthor
{
    name: Option<String,>,
    date: Option<String,>,
}

#[derive(Debug, Deserialize,)]
struct BranchResponse
{
    name:      String,
    #[serde(default)]
    protected: bool,
}

#[derive(Debug, Deserialize,)]
struct PullResponse
{
    state:     String,
    merged_at: Option<String,>,
}

#[derive(Debug, Deserialize,)]
struct ContributorResponse
{
    login:         Option<String,>,
    #[serde(default)]
    contributions: u32,
}

#[derive(Debug, Serialize,)]
struct PageQuery<'a,>
{
    per_page: u32,
    page:     u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    state:    Option<&'a str,>,
}

impl PageQuery<'_,>
{
    fn first() -> Self
    {
        Self {
            per_page: PER_PAGE, page: 1, state: None,
        }
    }
}

/// GitHub REST implementation of [`RepositorySource`].
#[derive(Clone,)]
pub struct GitHubSource
{
    client:            Octocrab,
    retry:             RetryConfig,
    max_files:         usize,
    max_readme_length: usize,
}

impl std::fmt::Debug for GitHubSource
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        f.debug_struct("GitHubSource",)
            .field("retry", &self.retry,)
            .field("max_files", &self.max_files,)
            .field("max_readme_length", &self.max_readme_length,)
            .finish_non_exhaustive()
    }
}

impl GitHubSource
{
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] when the API root is not a valid URI or the
    /// HTTP client cannot be initialized.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use repograde::{Config, github::GitHubSource};
    ///
    /// # fn example() -> Result<(), repograde::Error> {
    /// let config = Config::load(None,)?;
    /// let source = GitHubSource::new(&config.github, &config.analysis, config.retry.clone(),)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(github: &GitHubConfig, analysis: &AnalysisConfig, retry: RetryConfig,) -> Result<Self, Error,>
    {
        let mut builder = Octocrab::builder()
            .base_uri(github.api_url.as_str(),)
            .map_err(|e| Error::service(format!("invalid GitHub API url: {e}"),),)?;
        if let Some(token,) = github.token.as_ref() {
            builder = builder.personal_token(token.clone(),);
        } else {
            warn!("no GitHub token configured, requests are subject to anonymous rate limits");
        }
        let client = builder.build().map_err(|e| Error::service(format!("failed to initialize GitHub client: {e}"),),)?;

        Ok(Self {
            client,
            retry,
            max_files: analysis.max_files,
            max_readme_length: analysis.max_readme_length,
        },)
    }

    async fn get<R, P,>(&self, route: String, query: Option<&P,>, resource: &str,) -> Result<R, Error,>
    where
        R: DeserializeOwned,
        P: Serialize + Sync + ?Sized,
    {
        let client = &self.client;
        let route = &route;
        retry_with_backoff(&self.retry, route, move || async move {
            client.get::<R, _, _,>(route, query,).await.map_err(|e| classify(e, resource,),)
        },)
        .await
    }
}

/// Maps an `octocrab` failure onto the crate taxonomy.
fn classify(error: octocrab::Error, resource: &str,) -> Error
{
    match &error {
        octocrab::Error::GitHub {
            source, ..
        } => classify_status(source.status_code.as_u16(), source.message.clone(), resource,),
        _ => Error::network(error.to_string(),),
    }
}

/// Maps an upstream HTTP status and message onto the crate taxonomy.
fn classify_status(status: u16, message: String, resource: &str,) -> Error
{
    match status {
        404 => Error::not_found(resource,),
        // an empty repository answers 409 for history endpoints
        409 => Error::not_found(resource,),
        429 => Error::RateLimited {
            message,
        },
        403 if message.to_lowercase().contains("rate limit",) => Error::RateLimited {
            message,
        },
        status => Error::network(format!("GitHub responded {status}: {message}"),),
    }
}

/// Whether a failed tree lookup should be retried against `master`.
fn falls_back_to_master(error: &Error, branch: &str,) -> bool
{
    branch == "main"
        && matches!(
            error,
            Error::NotFound {
                ..
            }
        )
}

/// Converts byte counts into percentages rounded to two decimals.
pub fn language_percentages(bytes: &BTreeMap<String, u64,>,) -> BTreeMap<String, f64,>
{
    let total: u64 = bytes.values().sum();
    if total == 0 {
        return bytes.keys().map(|name| (name.clone(), 0.0,),).collect();
    }
    bytes
        .iter()
        .map(|(name, count,)| {
            let percentage = (*count as f64 / total as f64 * 100.0 * 100.0).round() / 100.0;
            (name.clone(), percentage,)
        },)
        .collect()
}

fn decode_readme(encoded: &str, max_length: usize,) -> Result<String, Error,>
{
    let compact: String = encoded.split_whitespace().collect();
    let bytes = STANDARD.decode(compact.as_bytes(),).map_err(|e| Error::network(format!("invalid README encoding: {e}"),),)?;
    Ok(String::from_utf8_lossy(&bytes,).chars().take(max_length,).collect(),)
}

#[async_trait]
impl RepositorySource for GitHubSource
{
    async fn repository(&self, id: &RepoId,) -> Result<RepositoryInfo, Error,>
    {
        info!("Fetching repository {}", id);
        let data: RepoResponse = self.get(format!("/repos/{}/{}", id.owner, id.repo), None::<&()>, "Repository",).await?;

        Ok(RepositoryInfo {
            name:           data.name,
            full_name:      data.full_name,
            owner:          data.owner.login,
            description:    data.description,
            language:       data.language,
            stars:          data.stargazers_count,
            forks:          data.forks_count,
            open_issues:    data.open_issues_count,
            default_branch: data.default_branch.unwrap_or_else(|| "main".to_owned(),),
            license:        data.license.map(|license| license.name,),
        },)
    }

    async fn file_tree(&self, id: &RepoId, branch: &str,) -> Result<Vec<FileEntry,>, Error,>
    {
        info!("Fetching file tree for {}@{}", id, branch);
        let route = format!("/repos/{}/{}/git/trees/{}", id.owner, id.repo, branch);
        let response: Result<TreeResponse, Error,> = self.get(route, Some(&[("recursive", "1",)],), "Branch",).await;

        let response = match response {
            Ok(response,) => response,
            Err(error,) if falls_back_to_master(&error, branch,) => {
                warn!("Branch \"main\" not found for {}, trying \"master\"", id);
                let route = format!("/repos/{}/{}/git/trees/master", id.owner, id.repo);
                self.get(route, Some(&[("recursive", "1",)],), "Branch",).await?
            }
            Err(error,) => return Err(error,),
        };

        let available = response.tree.len();
        let files: Vec<FileEntry,> = response
            .tree
            .into_iter()
            .take(self.max_files,)
            .map(|item| FileEntry {
                path: item.path, kind: item.kind, size: item.size,
            },)
            .collect();

        info!(
            "Fetched {} files (truncated: {})",
            files.len(),
            response.truncated || available > self.max_files
        );
        Ok(files,)
    }

    async fn readme(&self, id: &RepoId,) -> Result<Option<Readme,>, Error,>
    {
        debug!("Fetching README for {}", id);
        let route = format!("/repos/{}/{}/readme", id.owner, id.repo);
        match self.get::<ReadmeResponse, (),>(route, None, "README",).await {
            Ok(data,) => {
                let content = decode_readme(&data.content, self.max_readme_length,)?;
                Ok(Some(Readme {
                    content, size: data.size,
                },),)
            }
            Err(Error::NotFound {
                ..
            },) => {
                warn!("README not found for {}", id);
                Ok(None,)
            }
            Err(error,) => Err(error,),
        }
    }

    async fn commits(&self, id: &RepoId, max_commits: usize,) -> Result<Vec<CommitInfo,>, Error,>
    {
        debug!("Fetching up to {} commits for {}", max_commits, id);
        let route = format!("/repos/{}/{}/commits", id.owner, id.repo);
        let mut commits = Vec::with_capacity(max_commits.min(PER_PAGE as usize,),);
        let mut query = PageQuery::first();

        while commits.len() < max_commits {
            let page: Vec<CommitResponse,> = match self.get(route.clone(), Some(&query,), "Commit history",).await {
                Ok(page,) => page,
                Err(Error::NotFound {
                    ..
                },) => {
                    debug!("No commit history for {}", id);
                    break;
                }
                Err(error,) => return Err(error,),
            };
            let received = page.len();
            if received == 0 {
                break;
            }

            let remaining = max_commits - commits.len();
            commits.extend(page.into_iter().take(remaining,).map(|item| {
                let (author, date,) = item.commit.author.map_or((None, None,), |author| (author.name, author.date,),);
                CommitInfo {
                    message: item.commit.message,
                    author,
                    date,
                }
            },),);

            if received < PER_PAGE as usize {
                break;
            }
            query.page += 1;
        }

        Ok(commits,)
    }

    async fn branches(&self, id: &RepoId,) -> Result<Vec<BranchInfo,>, Error,>
    {
        let route = format!("/repos/{}/{}/branches", id.owner, id.repo);
        let branches: Vec<BranchResponse,> = self.get(route, Some(&PageQuery::first(),), "Branches",).await?;
        Ok(branches
            .into_iter()
            .map(|branch| BranchInfo {
                name: branch.name, protected: branch.protected,
            },)
            .collect(),)
    }

    async fn pull_requests(&self, id: &RepoId,) -> Result<PullRequestStats, Error,>
    {
        let route = format!("/repos/{}/{}/pulls", id.owner, id.repo);
        let query = PageQuery {
            state: Some("all",), ..PageQuery::first()
        };
        let pulls: Vec<PullResponse,> = self.get(route, Some(&query,), "Pull requests",).await?;

        let mut stats = PullRequestStats {
            total: pulls.len() as u32, ..PullRequestStats::default()
        };
        for pull in &pulls {
            match pull.state.as_str() {
                "open" => stats.open += 1,
                "closed" => stats.closed += 1,
                _ => {}
            }
            if pull.merged_at.is_some() {
                stats.merged += 1;
            }
        }
        Ok(stats,)
    }

    async fn contributors(&self, id: &RepoId,) -> Result<Vec<Contributor,>, Error,>
    {
        let route = format!("/repos/{}/{}/contributors", id.owner, id.repo);
        let contributors: Vec<ContributorResponse,> =
            match self.get(route, Some(&PageQuery::first(),), "Contributors",).await {
                Ok(contributors,) => contributors,
                Err(Error::NotFound {
                    ..
                },) => Vec::new(),
                Err(error,) => return Err(error,),
            };
        Ok(contributors
            .into_iter()
            .filter_map(|contributor| {
                contributor.login.map(|username| Contributor {
                    username,
                    contributions: contributor.contributions,
                },)
            },)
            .collect(),)
    }

    async fn languages(&self, id: &RepoId,) -> Result<BTreeMap<String, f64,>, Error,>
    {
        let route = format!("/repos/{}/{}/languages", id.owner, id.repo);
        let bytes: BTreeMap<String, u64,> = self.get(route, None::<&()>, "Languages",).await?;
        Ok(language_percentages(&bytes,),)
    }
}
