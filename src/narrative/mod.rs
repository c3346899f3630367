// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Prose summary and improvement roadmap for an analysed repository.
//!
//! [`Narrator`] has two paths. With a [`TextGenerator`] configured it builds
//! a prompt from the metrics, calls the generator under a short retry policy
//! and parses the reply. Without one, or whenever generation or parsing
//! fails, it falls back to deterministic templates. Narrative failures are
//! logged and never returned to the caller.

pub mod fallback;
mod gemini;
pub mod prompts;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use self::gemini::GeminiGenerator;
use crate::{
    config::GeneratorConfig,
    error::Error,
    metrics::AnalysisMetrics,
    retry::{RetryConfig, retry_with_backoff},
    snapshot::RepositoryInfo,
};

/// Upper bound on roadmap length.
pub const MAX_ROADMAP_ITEMS: usize = 7;

/// Urgency of a roadmap item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum Priority
{
    /// Address first.
    High,
    /// Default when unspecified.
    Medium,
    /// Nice to have.
    Low,
}

impl Priority
{
    /// Parses a priority label; anything unrecognised is [`Priority::Medium`].
    pub fn from_label(label: &str,) -> Self
    {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for Priority
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        },)
    }
}

/// One actionable improvement step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct RoadmapItem
{
    /// Urgency.
    pub priority:       Priority,
    /// Short imperative title.
    pub title:          String,
    /// What to do and why it raises the score.
    pub description:    String,
    /// Rough effort estimate such as "1 day".
    #[serde(alias = "estimatedTime")]
    pub estimated_time: String,
}

/// Backend that turns a prompt into free text.
#[async_trait]
pub trait TextGenerator: Send + Sync
{
    /// Generates a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] for transient backend failures and
    /// [`Error::Service`] for rejected requests.
    async fn generate(&self, prompt: &str,) -> Result<String, Error,>;
}

/// Entry as returned by the model before defaults are applied.
#[derive(Debug, Default, Deserialize,)]
#[serde(default)]
struct RawRoadmapItem
{
    priority:       Option<String,>,
    title:          Option<String,>,
    description:    Option<String,>,
    #[serde(alias = "estimated_time", rename = "estimatedTime")]
    estimated_time: Option<String,>,
}

fn non_empty(value: Option<String,>,) -> Option<String,>
{
    value.filter(|text| !text.trim().is_empty(),)
}

/// Parses a generated roadmap.
///
/// Code fences are stripped and the first JSON array in the text is read.
/// Missing fields get defaults, unknown priorities become medium and the list
/// is capped at [`MAX_ROADMAP_ITEMS`].
///
/// # Errors
///
/// Returns [`Error::Generation`] when no JSON array can be read.
///
/// # Example
///
/// ```
/// use repograde::narrative::{Priority, parse_roadmap};
///
/// let items = parse_roadmap("```json\n[{\"priority\":\"urgent\",\"title\":\"Add tests\"}]\n```",)?;
/// assert_eq!(items[0].priority, Priority::Medium);
/// assert_eq!(items[0].estimated_time, "2-4 hours");
/// # Ok::<(), repograde::Error>(())
/// ```
pub fn parse_roadmap(text: &str,) -> Result<Vec<RoadmapItem,>, Error,>
{
    let cleaned = text.replace("```json", "",).replace("```", "",);
    let cleaned = cleaned.trim();
    let start = cleaned.find('[',).ok_or_else(|| Error::generation("roadmap response contains no JSON array",),)?;
    let end = cleaned.rfind(']',).filter(|end| *end > start,).ok_or_else(|| {
        Error::generation("roadmap response contains an unterminated JSON array",)
    },)?;

    let raw: Vec<RawRoadmapItem,> = serde_json::from_str(&cleaned[start..=end],)
        .map_err(|e| Error::generation(format!("roadmap response is not valid JSON: {e}"),),)?;

    Ok(raw
        .into_iter()
        .take(MAX_ROADMAP_ITEMS,)
        .enumerate()
        .map(|(index, item,)| RoadmapItem {
            priority:       non_empty(item.priority,).map_or(Priority::Medium, |label| Priority::from_label(&label,),),
            title:          non_empty(item.title,).unwrap_or_else(|| format!("Improvement {}", index + 1),),
            description:    non_empty(item.description,).unwrap_or_else(|| "No description provided".to_owned(),),
            estimated_time: non_empty(item.estimated_time,).unwrap_or_else(|| "2-4 hours".to_owned(),),
        },)
        .collect(),)
}

/// Produces summaries and roadmaps, generative when possible.
#[derive(Clone,)]
pub struct Narrator
{
    generator: Option<Arc<dyn TextGenerator,>,>,
    retry:     RetryConfig,
}

impl fmt::Debug for Narrator
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.debug_struct("Narrator",)
            .field("generative", &self.is_generative(),)
            .field("retry", &self.retry,)
            .finish()
    }
}

impl Default for Narrator
{
    fn default() -> Self
    {
        Self::template()
    }
}

impl Narrator
{
    /// Narrator backed by `generator`.
    pub fn new(generator: Arc<dyn TextGenerator,>,) -> Self
    {
        Self {
            generator: Some(generator,), retry: RetryConfig::for_generation(),
        }
    }

    /// Narrator that only uses the templates.
    pub fn template() -> Self
    {
        Self {
            generator: None, retry: RetryConfig::for_generation(),
        }
    }

    /// Chooses the generative path when an API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] when the HTTP client cannot be built.
    pub fn from_config(config: &GeneratorConfig,) -> Result<Self, Error,>
    {
        if config.api_key.is_none() {
            warn!("No generator API key configured, using template narrative");
            return Ok(Self::template(),);
        }
        let generator = GeminiGenerator::new(config,)?;
        info!("Text generation enabled with model {}", config.model);
        Ok(Self::new(Arc::new(generator,),),)
    }

    /// Overrides the retry policy used for generation calls.
    pub fn with_retry(mut self, retry: RetryConfig,) -> Self
    {
        self.retry = retry;
        self
    }

    /// Reports whether a generator is configured.
    pub fn is_generative(&self,) -> bool
    {
        self.generator.is_some()
    }

    async fn generate(&self, generator: &Arc<dyn TextGenerator,>, operation: &str, prompt: &str,) -> Result<String, Error,>
    {
        let text = retry_with_backoff(&self.retry, operation, move || async move {
            generator.generate(prompt,).await
        },)
        .await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::generation("empty response",),);
        }
        Ok(text.to_owned(),)
    }

    /// Two to three sentence summary of the repository.
    pub async fn summarize(&self, info: &RepositoryInfo, metrics: &AnalysisMetrics,) -> String
    {
        let Some(generator,) = self.generator.as_ref() else {
            return fallback::summary(metrics,);
        };

        let prompt = prompts::summary_prompt(info, metrics,);
        match self.generate(generator, "summary generation", &prompt,).await {
            Ok(summary,) => {
                info!("Generated summary for {}", info.full_name);
                summary
            }
            Err(error,) => {
                warn!("Summary generation failed, using template: {}", error);
                fallback::summary(metrics,)
            }
        }
    }

    /// Prioritised improvement steps, at most [`MAX_ROADMAP_ITEMS`].
    pub async fn roadmap(&self, info: &RepositoryInfo, metrics: &AnalysisMetrics, summary: &str,) -> Vec<RoadmapItem,>
    {
        let Some(generator,) = self.generator.as_ref() else {
            return fallback::roadmap(metrics,);
        };

        let prompt = prompts::roadmap_prompt(info, metrics, summary,);
        let parsed = match self.generate(generator, "roadmap generation", &prompt,).await {
            Ok(text,) => parse_roadmap(&text,),
            Err(error,) => Err(error,),
        };

        match parsed {
            Ok(items,) if !items.is_empty() => {
                info!("Generated roadmap with {} items for {}", items.len(), info.full_name);
                items
            }
            Ok(_,) => {
                warn!("Generated roadmap was empty, using template");
                fallback::roadmap(metrics,)
            }
            Err(error,) => {
                warn!("Roadmap generation failed, using template: {}", error);
                fallback::roadmap(metrics,)
            }
        }
    }
}
