//! Runtime configuration for analyses.
//!
//! Configuration is an explicit value: it is loaded once (from an optional
//! YAML document, then overlaid by environment variables), validated, and
//! handed to the GitHub source, narrator, store and orchestrator when they are
//! constructed. Every field has a default so an empty document is valid.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, io_error},
    retry::RetryConfig,
};

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use repograde::Config;
///
/// let yaml = r#"
/// analysis:
///   max_files: 250
/// generator:
///   model: gemini-1.5-flash
/// "#;
/// let config = Config::from_yaml(yaml,)?;
/// assert_eq!(config.analysis.max_files, 250);
/// assert_eq!(config.analysis.max_commits, 500);
/// assert_eq!(config.generator.model, "gemini-1.5-flash");
/// # Ok::<(), repograde::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct Config
{
    /// GitHub API access.
    pub github:    GitHubConfig,
    /// Text generation backend.
    pub generator: GeneratorConfig,
    /// Limits applied while collecting repository data.
    pub analysis:  AnalysisConfig,
    /// Retry policy for repository API calls.
    pub retry:     RetryConfig,
    /// Persistence settings.
    pub database:  DatabaseConfig,
}

/// GitHub API settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig
{
    /// Personal access token; unauthenticated requests are heavily rate
    /// limited.
    pub token:   Option<String,>,
    /// API root.
    pub api_url: String,
}

impl Default for GitHubConfig
{
    fn default() -> Self
    {
        Self {
            token:   None,
            api_url: "https://api.github.com".to_owned(),
        }
    }
}

/// Generative model settings.
///
/// Without an API key the narrator always uses the template fallback.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig
{
    /// API key for the generative language endpoint.
    pub api_key:           Option<String,>,
    /// Model identifier.
    pub model:             String,
    /// Sampling temperature, `0.0..=2.0`.
    pub temperature:       f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Endpoint root, without the `/models/...` suffix.
    pub base_url:          String,
}

impl Default for GeneratorConfig
{
    fn default() -> Self
    {
        Self {
            api_key:           None,
            model:             "gemini-2.0-flash-exp".to_owned(),
            temperature:       0.7,
            max_output_tokens: 2048,
            base_url:          "https://generativelanguage.googleapis.com/v1beta".to_owned(),
        }
    }
}

/// Limits applied during data collection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig
{
    /// Maximum number of tree entries kept.
    pub max_files:         usize,
    /// Maximum README length in characters.
    pub max_readme_length: usize,
    /// Maximum number of commits fetched.
    pub max_commits:       usize,
    /// Overall deadline for one analysis in milliseconds.
    pub timeout_ms:        u64,
    /// Lifetime of cached repository metadata in seconds.
    pub cache_ttl_secs:    u64,
}

impl Default for AnalysisConfig
{
    fn default() -> Self
    {
        Self {
            max_files:         1000,
            max_readme_length: 50_000,
            max_commits:       500,
            timeout_ms:        180_000,
            cache_ttl_secs:    3600,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig
{
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig
{
    fn default() -> Self
    {
        Self {
            path: PathBuf::from("repograde.db",),
        }
    }
}

impl Config
{
    /// Loads configuration from an optional YAML file and the process
    /// environment, then validates it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, [`Error::Parse`]
    /// when it is not valid YAML, and [`Error::Validation`] when an
    /// environment override cannot be parsed or a limit is out of range.
    pub fn load(path: Option<&Path,>,) -> Result<Self, Error,>
    {
        let mut config = match path {
            Some(path,) => {
                let contents = fs::read_to_string(path,).map_err(|source| io_error(path, source,),)?;
                debug!("loaded configuration from {}", path.display());
                serde_yaml::from_str(&contents,)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key,).ok(),)?;
        config.validate()?;
        Ok(config,)
    }

    /// Parses and validates a YAML document without consulting the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed YAML and [`Error::Validation`]
    /// for out-of-range values.
    pub fn from_yaml(yaml: &str,) -> Result<Self, Error,>
    {
        let config: Self = serde_yaml::from_str(yaml,)?;
        config.validate()?;
        Ok(config,)
    }

    /// Applies environment-style overrides supplied by `lookup`.
    ///
    /// Recognized keys: `GITHUB_TOKEN`, `GEMINI_API_KEY`, `GEMINI_MODEL`,
    /// `MAX_FILES`, `MAX_COMMITS`, `MAX_README_LENGTH`, `ANALYSIS_TIMEOUT`
    /// (milliseconds), `CACHE_TTL` (seconds) and `DATABASE_PATH`. Empty
    /// values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a numeric override does not parse.
    pub fn apply_overrides<F,>(&mut self, lookup: F,) -> Result<(), Error,>
    where
        F: Fn(&str,) -> Option<String,>,
    {
        let get = |key: &str| lookup(key,).filter(|value| !value.trim().is_empty(),);

        if let Some(token,) = get("GITHUB_TOKEN",) {
            self.github.token = Some(token,);
        }
        if let Some(key,) = get("GEMINI_API_KEY",) {
            self.generator.api_key = Some(key,);
        }
        if let Some(model,) = get("GEMINI_MODEL",) {
            self.generator.model = model;
        }
        if let Some(value,) = get("MAX_FILES",) {
            self.analysis.max_files = parse_number("MAX_FILES", &value,)?;
        }
        if let Some(value,) = get("MAX_COMMITS",) {
            self.analysis.max_commits = parse_number("MAX_COMMITS", &value,)?;
        }
        if let Some(value,) = get("MAX_README_LENGTH",) {
            self.analysis.max_readme_length = parse_number("MAX_README_LENGTH", &value,)?;
        }
        if let Some(value,) = get("ANALYSIS_TIMEOUT",) {
            self.analysis.timeout_ms = parse_number("ANALYSIS_TIMEOUT", &value,)?;
        }
        if let Some(value,) = get("CACHE_TTL",) {
            self.analysis.cache_ttl_secs = parse_number("CACHE_TTL", &value,)?;
        }
        if let Some(path,) = get("DATABASE_PATH",) {
            self.database.path = PathBuf::from(path,);
        }

        Ok((),)
    }

    /// Checks the invariants every consumer relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        let limits = [
            ("analysis.max_files", self.analysis.max_files as u64,),
            ("analysis.max_readme_length", self.analysis.max_readme_length as u64,),
            ("analysis.max_commits", self.analysis.max_commits as u64,),
            ("analysis.timeout_ms", self.analysis.timeout_ms,),
            ("retry.max_attempts", u64::from(self.retry.max_attempts,),),
            ("generator.max_output_tokens", u64::from(self.generator.max_output_tokens,),),
        ];
        if let Some((name, _,),) = limits.iter().find(|(_, value,)| *value == 0,) {
            return Err(Error::validation(format!("{name} must be greater than zero"),),);
        }

        if !(self.retry.backoff_factor.is_finite() && self.retry.backoff_factor > 0.0) {
            return Err(Error::validation("retry.backoff_factor must be positive",),);
        }
        if !(0.0..=2.0).contains(&self.generator.temperature,) {
            return Err(Error::validation("generator.temperature must be between 0.0 and 2.0",),);
        }
        if self.github.api_url.trim().is_empty() || self.generator.base_url.trim().is_empty() {
            return Err(Error::validation("api endpoints must not be empty",),);
        }

        Ok((),)
    }
}

fn parse_number<T: FromStr,>(key: &str, value: &str,) -> Result<T, Error,>
{
    value
        .trim()
        .parse()
        .map_err(|_| Error::validation(format!("{key} must be a non-negative integer, got {value:?}"),),)
}

#[cfg(test)]
mod tests
{
    use std::{collections::HashMap, io::Write};

    use super::*;

    fn lookup(pairs: &[(&str, &str,)],) -> impl Fn(&str,) -> Option<String,>
    {
        let map: HashMap<String, String,> =
            pairs.iter().map(|(key, value,)| ((*key).to_owned(), (*value).to_owned(),),).collect();
        move |key| map.get(key,).cloned()
    }

    #[test]
    fn defaults_match_documented_values()
    {
        let config = Config::default();
        assert_eq!(config.analysis.max_files, 1000);
        assert_eq!(config.analysis.max_readme_length, 50_000);
        assert_eq!(config.analysis.max_commits, 500);
        assert_eq!(config.analysis.timeout_ms, 180_000);
        assert_eq!(config.analysis.cache_ttl_secs, 3600);
        assert_eq!(config.generator.model, "gemini-2.0-flash-exp");
        assert_eq!(config.generator.max_output_tokens, 2048);
        assert_eq!(config.retry, RetryConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_overrides_take_precedence()
    {
        let mut config = Config::from_yaml("analysis:\n  max_files: 10\n",).expect("valid yaml",);
        config
            .apply_overrides(lookup(&[
                ("MAX_FILES", "20",),
                ("GITHUB_TOKEN", "ghp_test",),
                ("GEMINI_MODEL", "",),
                ("DATABASE_PATH", "/tmp/grades.db",),
            ],),)
            .expect("valid overrides",);

        assert_eq!(config.analysis.max_files, 20);
        assert_eq!(config.github.token.as_deref(), Some("ghp_test"));
        assert_eq!(config.generator.model, "gemini-2.0-flash-exp");
        assert_eq!(config.database.path, PathBuf::from("/tmp/grades.db"));
    }

    #[test]
    fn malformed_numeric_override_is_rejected()
    {
        let mut config = Config::default();
        let error = config.apply_overrides(lookup(&[("ANALYSIS_TIMEOUT", "soon",)],),).unwrap_err();
        assert!(error.to_string().contains("ANALYSIS_TIMEOUT"));
    }

    #[test]
    fn zero_limits_are_rejected()
    {
        let error = Config::from_yaml("analysis:\n  max_commits: 0\n",).unwrap_err();
        assert!(error.to_string().contains("analysis.max_commits"));
    }

    #[test]
    fn temperature_and_backoff_are_bounded()
    {
        assert!(Config::from_yaml("generator:\n  temperature: 2.5\n").is_err());
        assert!(Config::from_yaml("retry:\n  backoff_factor: 0\n").is_err());
        assert!(Config::from_yaml("generator:\n  temperature: 0.0\n").is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected()
    {
        let error = Config::from_yaml("analysis:\n  max_filez: 3\n",).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn load_reads_yaml_file()
    {
        let mut file = tempfile::NamedTempFile::new().expect("temp file",);
        writeln!(file, "retry:\n  max_attempts: 5\n  initial_delay_ms: 10").expect("write config",);
        let config = Config::load(Some(file.path(),),).expect("valid config file",);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, 10);
        assert_eq!(config.retry.backoff_factor, 2.0);
    }

    #[test]
    fn load_reports_missing_file()
    {
        let error = Config::load(Some(Path::new("/definitely/missing/repograde.yaml",),),).unwrap_err();
        assert!(matches!(error, Error::Io { .. }));
    }
}
