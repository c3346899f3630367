// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use repograde::{
    AnalysisConfig, Error, Orchestrator, RepoId, generate_badge_assets,
    analyzers::Dimension,
    github::RepositorySource,
    narrative::{Narrator, Priority, TextGenerator, fallback},
    retry::RetryConfig,
    snapshot::{BranchInfo, CommitInfo, Contributor, FileEntry, PullRequestStats, Readme, RepositoryInfo},
    store::{AnalysisStatus, AnalysisStore, MemoryStore, SqliteStore},
};
use tempfile::tempdir;

const README: &str = "# Grader\n\nA small tool.\n\n## Installation\n\ncargo install grader\n\n## Usage\n\nRun `grader \
                      check`.\n\n## Testing\n\ncargo test\n\n## Contributing\n\nPull requests welcome.\n\n## \
                      License\n\nMIT\n";

/// In-process repository source serving a fixed repository.
struct StaticSource
{
    files:          Vec<FileEntry,>,
    readme:         Option<Readme,>,
    metadata_error: Option<fn() -> Error,>,
    delay:          Option<Duration,>,
}

impl StaticSource
{
    fn well_maintained() -> Self
    {
        let files = [
            ("README.md", 1_800,),
            ("LICENSE", 1_070,),
            ("CONTRIBUTING.md", 900,),
            ("SECURITY.md", 400,),
            (".gitignore", 60,),
            (".env.example", 120,),
            ("Cargo.toml", 700,),
            ("Cargo.lock", 40_000,),
            ("Dockerfile", 450,),
            ("docker-compose.yml", 300,),
            (".github/workflows/ci.yml", 1_200,),
            ("src/main.rs", 3_200,),
            ("src/lib.rs", 2_400,),
            ("src/config.rs", 1_900,),
            ("src/report/mod.rs", 2_100,),
            ("tests/cli_test.rs", 1_600,),
            ("tests/report_test.rs", 1_300,),
        ]
        .into_iter()
        .map(|(path, size,)| FileEntry::blob(path, size,),)
        .collect();

        Self {
            files,
            readme: Some(Readme {
                content: README.to_owned(),
                size:    README.len() as u64,
            },),
            metadata_error: None,
            delay: None,
        }
    }

    fn bare() -> Self
    {
        Self {
            files:          vec![FileEntry::blob("index.js", 300,)],
            readme:         None,
            metadata_error: None,
            delay:          None,
        }
    }
}

#[async_trait]
impl RepositorySource for StaticSource
{
    async fn repository(&self, id: &RepoId,) -> Result<RepositoryInfo, Error,>
    {
        if let Some(delay,) = self.delay {
            tokio::time::sleep(delay,).await;
        }
        if let Some(error,) = self.metadata_error {
            return Err(error(),);
        }
        Ok(RepositoryInfo {
            name: id.repo.clone(),
            full_name: format!("{}/{}", id.owner, id.repo),
            owner: id.owner.clone(),
            description: Some("Grades things".to_owned(),),
            language: Some("Rust".to_owned(),),
            stars: 42,
            default_branch: "main".to_owned(),
            license: Some("MIT License".to_owned(),),
            ..RepositoryInfo::default()
        },)
    }

    async fn file_tree(&self, _id: &RepoId, _branch: &str,) -> Result<Vec<FileEntry,>, Error,>
    {
        Ok(self.files.clone(),)
    }

    async fn readme(&self, _id: &RepoId,) -> Result<Option<Readme,>, Error,>
    {
        Ok(self.readme.clone(),)
    }

    async fn commits(&self, _id: &RepoId, max_commits: usize,) -> Result<Vec<CommitInfo,>, Error,>
    {
        let messages = ["feat: add report", "fix: handle empty tree", "docs: usage section", "test: cover cli"];
        Ok(messages
            .iter()
            .cycle()
            .take(max_commits.min(40,),)
            .map(|message| CommitInfo {
                message: (*message).to_owned(),
                author:  Some("octocat".to_owned(),),
                date:    Some("2025-01-01T00:00:00Z".to_owned(),),
            },)
            .collect(),)
    }

    async fn branches(&self, _id: &RepoId,) -> Result<Vec<BranchInfo,>, Error,>
    {
        Ok(vec![
            BranchInfo {
                name: "main".to_owned(), protected: true,
            },
            BranchInfo {
                name: "develop".to_owned(), protected: false,
            },
        ],)
    }

    async fn pull_requests(&self, _id: &RepoId,) -> Result<PullRequestStats, Error,>
    {
        Ok(PullRequestStats {
            total: 10, open: 2, closed: 8, merged: 7,
        },)
    }

    async fn contributors(&self, _id: &RepoId,) -> Result<Vec<Contributor,>, Error,>
    {
        Ok(vec![Contributor {
            username: "octocat".to_owned(), contributions: 40,
        }],)
    }

    async fn languages(&self, _id: &RepoId,) -> Result<BTreeMap<String, f64,>, Error,>
    {
        Ok(BTreeMap::from([("Rust".to_owned(), 97.5,), ("Dockerfile".to_owned(), 2.5,)],),)
    }
}

/// Generator replaying canned responses in call order.
struct Scripted
{
    responses: Mutex<VecDeque<Result<String, Error,>,>,>,
}

impl Scripted
{
    fn new(responses: Vec<Result<String, Error,>,>,) -> Self
    {
        Self {
            responses: Mutex::new(responses.into(),),
        }
    }
}

#[async_trait]
impl TextGenerator for Scripted
{
    async fn generate(&self, _prompt: &str,) -> Result<String, Error,>
    {
        self.responses
            .lock()
            .expect("responses lock",)
            .pop_front()
            .unwrap_or_else(|| Err(Error::generation("script exhausted",),),)
    }
}

fn limits() -> AnalysisConfig
{
    AnalysisConfig {
        timeout_ms: 10_000, ..AnalysisConfig::default()
    }
}

fn rate_limited() -> Error
{
    Error::RateLimited {
        message: "API rate limit exceeded for 127.0.0.1".to_owned(),
    }
}

fn single_attempt() -> RetryConfig
{
    RetryConfig {
        max_attempts: 1, initial_delay_ms: 1, backoff_factor: 1.0,
    }
}

#[tokio::test]
async fn well_maintained_repository_outscores_bare_one()
{
    let store = Arc::new(MemoryStore::new(),);
    let rich = Orchestrator::new(
        Arc::new(StaticSource::well_maintained(),),
        Arc::clone(&store,) as Arc<dyn AnalysisStore,>,
        Narrator::template(),
        limits(),
    );
    let bare = Orchestrator::new(
        Arc::new(StaticSource::bare(),),
        Arc::clone(&store,) as Arc<dyn AnalysisStore,>,
        Narrator::template(),
        limits(),
    );

    let strong = rich.analyze("https://github.com/octocat/grader",).await.expect("rich analysis",);
    let weak = bare.analyze("octocat/scratch",).await.expect("bare analysis",);

    assert!(strong.evaluation.score.total > weak.evaluation.score.total);
    assert!(strong.evaluation.score.total <= 100);
    assert!(strong.evaluation.metrics.has_cicd);
    assert!(strong.evaluation.metrics.has_dockerfile);
    assert!(strong.evaluation.metrics.has_license);
    assert_eq!(weak.evaluation.metrics.readme_length, 0);

    let sum: u32 = Dimension::ALL.iter().map(|dimension| strong.evaluation.scores.score(*dimension,),).sum();
    assert_eq!(strong.evaluation.score.total, sum);
    assert_eq!(strong.evaluation.summary, fallback::summary(&strong.evaluation.metrics));
    assert_eq!(weak.evaluation.roadmap, fallback::roadmap(&weak.evaluation.metrics));

    let history = store.history(10, 0,).expect("history",);
    let ids: Vec<&str,> = history.iter().map(|record| record.id.as_str(),).collect();
    assert_eq!(ids, vec![weak.id.as_str(), strong.id.as_str()]);
    assert!(history.iter().all(|record| record.status == AnalysisStatus::Completed));
}

#[tokio::test]
async fn generated_narrative_is_persisted()
{
    let roadmap = r#"```json
[
  {"priority": "high", "title": "Add fuzzing", "description": "Fuzz the parser.", "estimatedTime": "1-2 days"},
  {"priority": "low", "title": "Polish docs", "description": "Add examples."}
]
```"#;
    let generator = Scripted::new(vec![Ok("A tidy Rust CLI with solid tests.".to_owned(),), Ok(roadmap.to_owned(),)],);
    let store = Arc::new(MemoryStore::new(),);
    let orchestrator = Orchestrator::new(
        Arc::new(StaticSource::well_maintained(),),
        Arc::clone(&store,) as Arc<dyn AnalysisStore,>,
        Narrator::new(Arc::new(generator,),).with_retry(single_attempt(),),
        limits(),
    );

    let report = orchestrator.analyze("octocat/grader",).await.expect("analysis succeeds",);

    assert_eq!(report.evaluation.summary, "A tidy Rust CLI with solid tests.");
    assert_eq!(report.evaluation.roadmap.len(), 2);
    assert_eq!(report.evaluation.roadmap[0].priority, Priority::High);
    assert_eq!(report.evaluation.roadmap[1].estimated_time, "2-4 hours");

    let record = store.analysis(&report.id,).expect("lookup",).expect("record exists",);
    assert_eq!(record.summary.as_deref(), Some("A tidy Rust CLI with solid tests."));
    assert_eq!(record.roadmap, report.evaluation.roadmap);
}

#[tokio::test]
async fn generator_failure_falls_back_to_templates()
{
    let generator = Scripted::new(vec![
        Err(Error::service("quota exhausted",),),
        Ok("I cannot produce JSON today.".to_owned(),),
    ],);
    let store = Arc::new(MemoryStore::new(),);
    let orchestrator = Orchestrator::new(
        Arc::new(StaticSource::bare(),),
        Arc::clone(&store,) as Arc<dyn AnalysisStore,>,
        Narrator::new(Arc::new(generator,),).with_retry(single_attempt(),),
        limits(),
    );

    let report = orchestrator.analyze("octocat/scratch",).await.expect("narrative errors are recovered",);

    assert_eq!(report.evaluation.summary, fallback::summary(&report.evaluation.metrics));
    assert_eq!(report.evaluation.roadmap, fallback::roadmap(&report.evaluation.metrics));
    assert!(!report.evaluation.roadmap.is_empty());
}

#[tokio::test]
async fn rate_limited_metadata_fails_the_analysis()
{
    let source = StaticSource {
        metadata_error: Some(rate_limited,),
        ..StaticSource::bare()
    };
    let store = Arc::new(MemoryStore::new(),);
    let orchestrator =
        Orchestrator::new(Arc::new(source,), Arc::clone(&store,) as Arc<dyn AnalysisStore,>, Narrator::template(), limits(),);

    let error = orchestrator.analyze("octocat/scratch",).await.expect_err("rate limit is fatal",);
    assert!(matches!(error, Error::RateLimited { .. }));

    let record = store.history(1, 0,).expect("history",).remove(0,);
    assert_eq!(record.status, AnalysisStatus::Failed);
    assert!(record.error_message.as_deref().is_some_and(|message| message.contains("rate limit")));
    assert_eq!(record.score, None);
    assert!(store.metrics(&record.id,).expect("metrics lookup",).is_none());
}

#[tokio::test]
async fn slow_source_times_out()
{
    let source = StaticSource {
        delay: Some(Duration::from_millis(500,),),
        ..StaticSource::bare()
    };
    let store = Arc::new(MemoryStore::new(),);
    let orchestrator = Orchestrator::new(
        Arc::new(source,),
        Arc::clone(&store,) as Arc<dyn AnalysisStore,>,
        Narrator::template(),
        AnalysisConfig {
            timeout_ms: 50, ..AnalysisConfig::default()
        },
    );

    let error = orchestrator.analyze("octocat/slow",).await.expect_err("deadline elapses",);
    assert!(matches!(error, Error::Timeout { millis: 50 }));

    let record = store.history(1, 0,).expect("history",).remove(0,);
    assert_eq!(record.status, AnalysisStatus::Failed);
    assert_eq!(record.error_message.as_deref(), Some("analysis timed out after 50ms"));
}

#[tokio::test]
async fn sqlite_results_survive_reopen_and_render_badges()
{
    let directory = tempdir().expect("failed to create temp dir",);
    let database = directory.path().join("grades.db",);

    let id = {
        let store: Arc<dyn AnalysisStore,> = Arc::new(SqliteStore::open(&database,).expect("open database",),);
        let orchestrator =
            Orchestrator::new(Arc::new(StaticSource::well_maintained(),), store, Narrator::template(), limits(),);
        orchestrator.analyze("https://github.com/octocat/grader",).await.expect("analysis succeeds",).id
    };

    let store = SqliteStore::open(&database,).expect("reopen database",);
    let record = store.analysis(&id,).expect("lookup",).expect("record exists",);
    assert_eq!(record.status, AnalysisStatus::Completed);
    assert_eq!(record.progress, 100);
    let metrics = store.metrics(&id,).expect("metrics lookup",).expect("metrics saved",);
    assert_eq!(record.score, Some(metrics.total_score));

    let assets = generate_badge_assets(&record, &directory.path().join("badges",),).expect("badge renders",);
    assert!(assets.svg_path.ends_with("octocat-grader.svg"));
    assert!(assets.manifest_path.exists());
}
