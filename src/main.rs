//! Command-line interface for the repograde binary.
//!
//! The CLI analyzes repositories end to end, scores snapshot documents
//! offline and reads back stored analyses. JSON goes to stdout; logs and the
//! progress bar go to stderr.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process,
    sync::Arc,
    time::Duration,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use repograde::{
    Config, Error, ProgressEvent, generate_badge_assets,
    analyzers::AnalyzerRegistry,
    github::GitHubSource,
    io_error,
    metrics::AnalysisMetrics,
    narrative::Narrator,
    orchestrator::{self, Orchestrator},
    snapshot::{RepoSnapshot, RepositoryInfo},
    store::{AnalysisRecord, AnalysisStore, MAX_HISTORY_LIMIT, SqliteStore},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Command line interface for grading GitHub repositories.
#[derive(Debug, Parser,)]
#[command(name = "repograde", version, about = "Score GitHub repositories across nine quality dimensions")]
struct Cli
{
    /// Optional YAML configuration file; environment variables override it.
    #[arg(long = "config", value_name = "PATH", global = true, env = "REPOGRADE_CONFIG")]
    config: Option<PathBuf,>,

    /// SQLite database path, overriding the configured one.
    #[arg(long = "database", value_name = "PATH", global = true)]
    database: Option<PathBuf,>,

    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// Fetch, score, narrate and persist one repository.
    Analyze(AnalyzeArgs,),
    /// Score a snapshot JSON document without network access.
    Score(ScoreArgs,),
    /// Print a stored analysis with its metrics.
    Show(ShowArgs,),
    /// List stored analyses, newest first.
    History(HistoryArgs,),
    /// Write the badge artifacts of a completed analysis.
    Badge(BadgeArgs,),
}

#[derive(Debug, Args,)]
struct AnalyzeArgs
{
    /// Repository URL or `owner/repo` shorthand.
    #[arg(value_name = "URL")]
    url: String,
}

#[derive(Debug, Args,)]
struct ScoreArgs
{
    /// Snapshot document with an optional `repository` object.
    #[arg(long = "snapshot", value_name = "FILE")]
    snapshot: PathBuf,
}

#[derive(Debug, Args,)]
struct ShowArgs
{
    /// Analysis identifier.
    #[arg(value_name = "ID")]
    id: String,
}

#[derive(Debug, Args,)]
struct HistoryArgs
{
    /// One-based page number.
    #[arg(long = "page", value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// Page size, capped at 100.
    #[arg(long = "limit", value_name = "N", default_value_t = DEFAULT_HISTORY_LIMIT)]
    limit: usize,
}

#[derive(Debug, Args,)]
struct BadgeArgs
{
    /// Analysis identifier.
    #[arg(value_name = "ID")]
    id: String,

    /// Directory that will receive the SVG and manifest artifacts.
    #[arg(long = "output", value_name = "DIR", default_value = "badges")]
    output: PathBuf,
}

/// Snapshot document accepted by `score`.
#[derive(Debug, Deserialize,)]
struct SnapshotDocument
{
    #[serde(default)]
    repository: RepositoryInfo,
    #[serde(flatten)]
    snapshot:   RepoSnapshot,
}

#[derive(Debug, Serialize,)]
struct StoredAnalysis
{
    #[serde(flatten)]
    record:  AnalysisRecord,
    metrics: Option<AnalysisMetrics,>,
}

#[derive(Debug, Serialize,)]
struct HistoryPage
{
    page:     u32,
    limit:    usize,
    analyses: Vec<AnalysisRecord,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    init_tracing();

    if let Err(error,) = run(Cli::parse(),).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("repograde=info",),);
    tracing_subscriber::fmt().with_env_filter(filter,).with_writer(io::stderr,).init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration, pipeline, storage and serialization errors.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match cli.command {
        Command::Analyze(args,) => {
            let config = load_config(cli.config.as_deref(), cli.database,)?;
            run_analyze(&args, &config, &mut handle, cli.pretty,).await
        }
        Command::Score(args,) => run_score(&args, &mut handle, cli.pretty,).await,
        Command::Show(args,) => {
            let config = load_config(cli.config.as_deref(), cli.database,)?;
            let store = SqliteStore::open(&config.database.path,)?;
            run_show(&args, &store, &mut handle, cli.pretty,)
        }
        Command::History(args,) => {
            let config = load_config(cli.config.as_deref(), cli.database,)?;
            let store = SqliteStore::open(&config.database.path,)?;
            run_history(&args, &store, &mut handle, cli.pretty,)
        }
        Command::Badge(args,) => {
            let config = load_config(cli.config.as_deref(), cli.database,)?;
            let store = SqliteStore::open(&config.database.path,)?;
            run_badge(&args, &store, &mut handle, cli.pretty,)
        }
    }
}

fn load_config(path: Option<&Path,>, database: Option<PathBuf,>,) -> Result<Config, Error,>
{
    let mut config = Config::load(path,)?;
    if let Some(database,) = database {
        config.database.path = database;
    }
    Ok(config,)
}

async fn run_analyze<W: io::Write,>(args: &AnalyzeArgs, config: &Config, writer: &mut W, pretty: bool,) -> Result<(), Error,>
{
    let store = Arc::new(SqliteStore::open(&config.database.path,)?,);
    if let Err(error,) = store.purge_expired_cache() {
        warn!("failed to purge repository cache: {error}");
    }

    let source = Arc::new(GitHubSource::new(&config.github, &config.analysis, config.retry.clone(),)?,);
    let narrator = Narrator::from_config(&config.generator,)?;
    let bar = progress_bar()?;
    let observer = bar.clone();
    let orchestrator = Orchestrator::new(source, store, narrator, config.analysis.clone(),).with_progress(Arc::new(
        move |event: &ProgressEvent| {
            observer.set_position(u64::from(event.progress,),);
            observer.set_message(event.step,);
        },
    ),);

    let outcome = orchestrator.analyze(&args.url,).await;
    bar.finish_and_clear();

    write_json(writer, &outcome?, pretty,)
}

fn progress_bar() -> Result<ProgressBar, Error,>
{
    let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {bar:30.cyan/blue} {pos:>3}% {msg}",)
        .map_err(|e| Error::service(format!("invalid progress template: {e}"),),)?
        .progress_chars("=> ",);
    let bar = ProgressBar::new(100,).with_style(style,);
    bar.enable_steady_tick(Duration::from_millis(120,),);
    Ok(bar,)
}

async fn run_score<W: io::Write,>(args: &ScoreArgs, writer: &mut W, pretty: bool,) -> Result<(), Error,>
{
    let contents = fs::read_to_string(&args.snapshot,).map_err(|source| io_error(&args.snapshot, source,),)?;
    let document: SnapshotDocument = serde_json::from_str(&contents,)?;
    debug!("scoring snapshot with {} files", document.snapshot.files.len());

    let evaluation = orchestrator::evaluate(
        &AnalyzerRegistry::standard(),
        &Narrator::template(),
        &document.repository,
        document.snapshot,
    )
    .await?;

    write_json(writer, &evaluation, pretty,)
}

fn run_show<W: io::Write,>(args: &ShowArgs, store: &dyn AnalysisStore, writer: &mut W, pretty: bool,) -> Result<(), Error,>
{
    let record = find_analysis(store, &args.id,)?;
    let metrics = store.metrics(&args.id,)?;
    write_json(writer, &StoredAnalysis { record, metrics, }, pretty,)
}

fn run_history<W: io::Write,>(args: &HistoryArgs, store: &dyn AnalysisStore, writer: &mut W, pretty: bool,) -> Result<(), Error,>
{
    let (limit, offset,) = page_window(args.page, args.limit,);
    let analyses = store.history(limit, offset,)?;
    write_json(
        writer,
        &HistoryPage {
            page: args.page,
            limit,
            analyses,
        },
        pretty,
    )
}

fn run_badge<W: io::Write,>(args: &BadgeArgs, store: &dyn AnalysisStore, writer: &mut W, pretty: bool,) -> Result<(), Error,>
{
    let record = find_analysis(store, &args.id,)?;
    let assets = generate_badge_assets(&record, &args.output,)?;
    write_json(writer, &assets, pretty,)
}

fn find_analysis(store: &dyn AnalysisStore, id: &str,) -> Result<AnalysisRecord, Error,>
{
    store.analysis(id,)?.ok_or_else(|| Error::not_found(format!("Analysis {id}"),),)
}

/// Converts a one-based page into `(limit, offset)`, capping the limit.
fn page_window(page: u32, limit: usize,) -> (usize, usize,)
{
    let limit = limit.clamp(1, MAX_HISTORY_LIMIT,);
    let offset = (page.max(1,) as usize - 1) * limit;
    (limit, offset,)
}

fn write_json<W: io::Write, T: Serialize,>(writer: &mut W, value: &T, pretty: bool,) -> Result<(), Error,>
{
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value,)?;
    } else {
        serde_json::to_writer(&mut *writer, value,)?;
    }
    writeln!(writer).map_err(|e| Error::service(format!("failed to write output: {e}"),),)
}

#[cfg(test)]
mod tests
{
    use std::{fs, io::Cursor};

    use clap::Parser;
    use repograde::{
        CompositeScore, RepoId,
        store::{Completion, MemoryStore},
    };
    use serde_json::Value;
    use tempfile::tempdir;

    use super::*;

    fn output(buffer: Cursor<Vec<u8,>,>,) -> Value
    {
        let text = String::from_utf8(buffer.into_inner(),).expect("invalid UTF-8",);
        serde_json::from_str(&text,).expect("output is JSON",)
    }

    fn completed(store: &MemoryStore, repo: &str,) -> String
    {
        let repo = RepoId::parse(repo,).expect("valid id",);
        let record = store.create_analysis(&repo, &repo.url(),).expect("create",);
        store
            .complete_analysis(
                &record.id,
                &Completion {
                    score:   CompositeScore::from_total(64,),
                    summary: "Good foundation.".to_owned(),
                    roadmap: Vec::new(),
                },
            )
            .expect("complete",);
        record.id
    }

    #[test]
    fn analyze_accepts_global_flags_after_the_url()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "analyze",
            "https://github.com/octocat/Hello-World",
            "--database",
            "grades.db",
            "--pretty",
        ],)
        .expect("failed to parse CLI",);

        assert!(cli.pretty);
        assert_eq!(cli.database.as_deref(), Some(Path::new("grades.db")));
        match cli.command {
            Command::Analyze(args,) => assert_eq!(args.url, "https://github.com/octocat/Hello-World"),
            other => panic!("unexpected command variant: {other:?}"),
        }
    }

    #[test]
    fn history_rejects_page_zero()
    {
        let result = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "history", "--page", "0",],);
        assert!(result.is_err());
    }

    #[test]
    fn page_window_caps_limit_and_computes_offset()
    {
        assert_eq!(page_window(1, 10,), (10, 0,));
        assert_eq!(page_window(3, 20,), (20, 40,));
        assert_eq!(page_window(2, 500,), (100, 100,));
        assert_eq!(page_window(1, 0,), (1, 0,));
    }

    #[tokio::test]
    async fn score_reads_snapshot_document()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("snapshot.json",);
        let document = r#"{
            "repository": {"name": "demo", "full_name": "octocat/demo", "owner": "octocat"},
            "files": [
                {"path": "src/main.rs", "type": "blob", "size": 2048},
                {"path": "tests/cli.rs", "type": "blob", "size": 512},
                {"path": ".gitignore", "type": "blob", "size": 20}
            ]
        }"#;
        fs::write(&path, document,).expect("failed to write snapshot",);

        let mut buffer = Cursor::new(Vec::new(),);
        run_score(&ScoreArgs { snapshot: path, }, &mut buffer, false,).await.expect("scoring succeeds",);

        let value = output(buffer,);
        let total = value["score"]["total"].as_u64().expect("total is numeric",);
        assert!(total <= 100);
        assert!(value["summary"].as_str().is_some_and(|summary| !summary.is_empty()));
        assert_eq!(value["metrics"]["total_files"], 3);
    }

    #[tokio::test]
    async fn score_reports_missing_snapshot()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let missing = temp.path().join("absent.json",);
        let mut buffer = Cursor::new(Vec::new(),);

        let error = run_score(&ScoreArgs { snapshot: missing.clone(), }, &mut buffer, false,)
            .await
            .expect_err("expected io error",);
        match error {
            Error::Io {
                path, ..
            } => assert_eq!(path, missing),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn show_prints_record_and_metrics()
    {
        let store = MemoryStore::new();
        let id = completed(&store, "octocat/demo",);

        let mut buffer = Cursor::new(Vec::new(),);
        run_show(&ShowArgs { id: id.clone(), }, &store, &mut buffer, true,).expect("show succeeds",);

        let value = output(buffer,);
        assert_eq!(value["id"], id.as_str());
        assert_eq!(value["status"], "completed");
        assert!(value["metrics"].is_null());
    }

    #[test]
    fn show_reports_unknown_id()
    {
        let store = MemoryStore::new();
        let mut buffer = Cursor::new(Vec::new(),);
        let error = run_show(&ShowArgs { id: "nope".to_owned(), }, &store, &mut buffer, false,)
            .expect_err("expected not found",);
        assert!(matches!(error, Error::NotFound { .. }));
    }

    #[test]
    fn history_lists_newest_first()
    {
        let store = MemoryStore::new();
        completed(&store, "octocat/first",);
        let newest = completed(&store, "octocat/second",);

        let mut buffer = Cursor::new(Vec::new(),);
        run_history(&HistoryArgs { page: 1, limit: 1, }, &store, &mut buffer, false,).expect("history succeeds",);

        let value = output(buffer,);
        assert_eq!(value["limit"], 1);
        assert_eq!(value["analyses"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["analyses"][0]["id"], newest.as_str());
    }

    #[test]
    fn badge_writes_assets_for_completed_analysis()
    {
        let store = MemoryStore::new();
        let id = completed(&store, "octocat/demo",);
        let temp = tempdir().expect("failed to create tempdir",);
        let output_dir = temp.path().join("badges",);

        let mut buffer = Cursor::new(Vec::new(),);
        run_badge(
            &BadgeArgs {
                id,
                output: output_dir.clone(),
            },
            &store,
            &mut buffer,
            false,
        )
        .expect("badge generation failed",);

        assert!(output_dir.join("octocat-demo.svg").exists());
        assert!(output_dir.join("octocat-demo.json").exists());
        let value = output(buffer,);
        assert!(value["svg_path"].as_str().is_some_and(|path| path.ends_with("octocat-demo.svg")));
    }
}
