// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Per-dimension repository analyzers.
//!
//! Every analyzer is a stateless implementation of [`Analyzer`] that inspects
//! a shared [`RepoSnapshot`] and produces an [`AnalyzerResult`] whose score is
//! bounded by the dimension maximum. The maxima double as the scoring weights
//! and sum to exactly 100, so the composite is a plain sum.
//!
//! [`AnalyzerRegistry`] runs the battery concurrently on the rayon pool and
//! substitutes a zero-score placeholder for any analyzer that panics.

mod cicd;
mod code_quality;
mod containerization;
mod dependencies;
mod documentation;
mod git_practices;
mod security;
mod structure;
mod testing;

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub use self::{
    cicd::{CicdAnalyzer, CicdDetails},
    code_quality::{CodeQualityAnalyzer, CodeQualityDetails},
    containerization::{ContainerizationAnalyzer, ContainerizationDetails},
    dependencies::{DependenciesAnalyzer, DependenciesDetails},
    documentation::{DocumentationAnalyzer, DocumentationDetails},
    git_practices::{GitPracticesAnalyzer, GitPracticesDetails},
    security::{SecurityAnalyzer, SecurityDetails, SecurityIssue, Severity},
    structure::{ProjectStructureAnalyzer, StructureDetails},
    testing::{TestingAnalyzer, TestingDetails},
};
use crate::snapshot::RepoSnapshot;

/// Quality dimension scored by one analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,)]
#[serde(rename_all = "snake_case")]
pub enum Dimension
{
    /// Complexity, file sizes, duplication and naming.
    CodeQuality,
    /// Folder layout, configuration files and separation of concerns.
    ProjectStructure,
    /// README, code documentation proxies and auxiliary documents.
    Documentation,
    /// Test presence, estimated coverage, organization and frameworks.
    Testing,
    /// Commits, branches and pull requests.
    GitPractices,
    /// Committed secrets, `.gitignore` and security policy.
    Security,
    /// Continuous integration platforms.
    Cicd,
    /// Package managers and build tooling.
    Dependencies,
    /// Dockerfile and compose files.
    Containerization,
}

impl Dimension
{
    /// All dimensions in reporting order.
    pub const ALL: [Dimension; 9] = [
        Dimension::CodeQuality,
        Dimension::ProjectStructure,
        Dimension::Documentation,
        Dimension::Testing,
        Dimension::GitPractices,
        Dimension::Security,
        Dimension::Cicd,
        Dimension::Dependencies,
        Dimension::Containerization,
    ];

    /// Maximum score, which is also the dimension's weight in the composite.
    pub const fn max_score(self,) -> u32
    {
        match self {
            Dimension::CodeQuality => 20,
            Dimension::ProjectStructure => 15,
            Dimension::Documentation => 15,
            Dimension::Testing => 12,
            Dimension::GitPractices => 12,
            Dimension::Security => 10,
            Dimension::Cicd => 8,
            Dimension::Dependencies => 5,
            Dimension::Containerization => 3,
        }
    }

    /// Human readable label.
    pub const fn label(self,) -> &'static str
    {
        match self {
            Dimension::CodeQuality => "Code Quality",
            Dimension::ProjectStructure => "Project Structure",
            Dimension::Documentation => "Documentation",
            Dimension::Testing => "Testing",
            Dimension::GitPractices => "Git Practices",
            Dimension::Security => "Security",
            Dimension::Cicd => "CI/CD",
            Dimension::Dependencies => "Dependencies",
            Dimension::Containerization => "Containerization",
        }
    }

    /// Rounds a raw score half-up and clamps it to `[0, max_score]`.
    pub fn clamp(self, raw: f64,) -> u32
    {
        if !raw.is_finite() {
            return 0;
        }
        let rounded = (raw + 0.5).floor().max(0.0,);
        (rounded as u32).min(self.max_score(),)
    }
}

impl fmt::Display for Dimension
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.label(),)
    }
}

/// Typed supporting detail attached to an analyzer result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Details
{
    /// Code quality sub-scores.
    CodeQuality(CodeQualityDetails,),
    /// Project structure sub-scores.
    ProjectStructure(StructureDetails,),
    /// Documentation sub-scores and README facts.
    Documentation(DocumentationDetails,),
    /// Testing sub-scores and detected frameworks.
    Testing(TestingDetails,),
    /// Git practice sub-scores.
    GitPractices(GitPracticesDetails,),
    /// Security sub-scores and discrete issues.
    Security(SecurityDetails,),
    /// Detected CI platforms.
    Cicd(CicdDetails,),
    /// Detected package managers and frameworks.
    Dependencies(DependenciesDetails,),
    /// Container file presence.
    Containerization(ContainerizationDetails,),
    /// The analyzer produced nothing to report (for example no code files).
    Empty,
    /// The analyzer failed and a zero-score placeholder was substituted.
    Unavailable
    {
        /// Description of the failure.
        reason: String,
    },
}

/// Bounded sub-score and detail for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct AnalyzerResult
{
    /// Dimension this result belongs to.
    pub dimension: Dimension,
    /// Score in `[0, dimension.max_score()]`.
    pub score:     u32,
    /// Supporting detail.
    pub details:   Details,
}

impl AnalyzerResult
{
    /// Builds a result from a raw weighted score, rounding and clamping last.
    pub fn new(dimension: Dimension, raw_score: f64, details: Details,) -> Self
    {
        Self {
            dimension,
            score: dimension.clamp(raw_score,),
            details,
        }
    }

    /// Zero-score result with empty detail.
    pub fn empty(dimension: Dimension,) -> Self
    {
        Self {
            dimension, score: 0, details: Details::Empty,
        }
    }

    /// Zero-score placeholder standing in for a failed analyzer.
    pub fn unavailable(dimension: Dimension, reason: impl Into<String,>,) -> Self
    {
        Self {
            dimension,
            score: 0,
            details: Details::Unavailable {
                reason: reason.into(),
            },
        }
    }
}

/// A single quality dimension scorer.
///
/// Implementations must be pure: the same snapshot always yields the same
/// result, and absence of signal produces the documented minimum rather than
/// a panic.
pub trait Analyzer: Send + Sync
{
    /// Dimension scored by this analyzer.
    fn dimension(&self,) -> Dimension;

    /// Scores the snapshot.
    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult;
}

/// Ordered collection of analyzers executed together.
#[derive(Clone,)]
pub struct AnalyzerRegistry
{
    analyzers: Vec<Arc<dyn Analyzer,>,>,
}

impl fmt::Debug for AnalyzerRegistry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.debug_list().entries(self.analyzers.iter().map(|analyzer| analyzer.dimension(),),).finish()
    }
}

impl Default for AnalyzerRegistry
{
    fn default() -> Self
    {
        Self::standard()
    }
}

impl AnalyzerRegistry
{
    /// Registry containing the nine built-in analyzers.
    pub fn standard() -> Self
    {
        Self::with_analyzers(vec![
            Arc::new(CodeQualityAnalyzer,),
            Arc::new(ProjectStructureAnalyzer,),
            Arc::new(DocumentationAnalyzer,),
            Arc::new(TestingAnalyzer,),
            Arc::new(GitPracticesAnalyzer,),
            Arc::new(SecurityAnalyzer,),
            Arc::new(CicdAnalyzer,),
            Arc::new(DependenciesAnalyzer,),
            Arc::new(ContainerizationAnalyzer,),
        ],)
    }

    /// Registry with a custom analyzer set.
    pub fn with_analyzers(analyzers: Vec<Arc<dyn Analyzer,>,>,) -> Self
    {
        Self {
            analyzers,
        }
    }

    /// Number of registered analyzers.
    pub fn len(&self,) -> usize
    {
        self.analyzers.len()
    }

    /// Reports whether the registry is empty.
    pub fn is_empty(&self,) -> bool
    {
        self.analyzers.is_empty()
    }

    /// Runs every analyzer concurrently, in registration order.
    ///
    /// A panicking analyzer is logged and replaced by
    /// [`AnalyzerResult::unavailable`]; the others are unaffected.
    pub fn run(&self, snapshot: &RepoSnapshot,) -> Vec<AnalyzerResult,>
    {
        self.analyzers.par_iter().map(|analyzer| run_isolated(analyzer.as_ref(), snapshot,),).collect()
    }
}

fn run_isolated(analyzer: &dyn Analyzer, snapshot: &RepoSnapshot,) -> AnalyzerResult
{
    let dimension = analyzer.dimension();
    match panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(snapshot,),),) {
        Ok(mut result,) => {
            if result.dimension != dimension {
                error!(expected = %dimension, actual = %result.dimension, "analyzer reported a foreign dimension");
                return AnalyzerResult::unavailable(dimension, "analyzer reported a foreign dimension",);
            }
            result.score = result.score.min(dimension.max_score(),);
            debug!(dimension = %dimension, score = result.score, "analyzer finished");
            result
        }
        Err(payload,) => {
            let reason = panic_message(payload.as_ref(),);
            error!(dimension = %dimension, %reason, "analyzer panicked, substituting zero score");
            AnalyzerResult::unavailable(dimension, reason,)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send),) -> String
{
    if let Some(message,) = payload.downcast_ref::<&str,>() {
        (*message).to_owned()
    } else if let Some(message,) = payload.downcast_ref::<String,>() {
        message.clone()
    } else {
        "analyzer panicked".to_owned()
    }
}

/// Ratio guarded against empty denominators.
pub(crate) fn ratio(numerator: usize, denominator: usize,) -> f64
{
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::*;
    use crate::snapshot::{BranchInfo, CommitInfo, FileEntry, PullRequestStats, Readme};

    struct Exploding;

    impl Analyzer for Exploding
    {
        fn dimension(&self,) -> Dimension
        {
            Dimension::Security
        }

        fn analyze(&self, _snapshot: &RepoSnapshot,) -> AnalyzerResult
        {
            panic!("boom")
        }
    }

    #[test]
    fn maxima_sum_to_one_hundred()
    {
        let total: u32 = Dimension::ALL.iter().map(|dimension| dimension.max_score(),).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn clamp_rounds_half_up_and_bounds()
    {
        assert_eq!(Dimension::Testing.clamp(4.5,), 5);
        assert_eq!(Dimension::Testing.clamp(4.49,), 4);
        assert_eq!(Dimension::Testing.clamp(30.0,), 12);
        assert_eq!(Dimension::Testing.clamp(-3.0,), 0);
        assert_eq!(Dimension::Testing.clamp(f64::NAN,), 0);
    }

    #[test]
    fn standard_registry_covers_every_dimension_once()
    {
        let registry = AnalyzerRegistry::standard();
        let results = registry.run(&RepoSnapshot::default(),);
        let dimensions: Vec<Dimension,> = results.iter().map(|result| result.dimension,).collect();
        assert_eq!(dimensions, Dimension::ALL.to_vec());
    }

    #[test]
    fn panicking_analyzer_is_replaced_by_placeholder()
    {
        let registry = AnalyzerRegistry::with_analyzers(vec![
            Arc::new(Exploding,),
            Arc::new(CicdAnalyzer,),
        ],);
        let snapshot = RepoSnapshot::from_files(vec![FileEntry::blob(".travis.yml", 10,)],);
        let results = registry.run(&snapshot,);

        assert_eq!(results[0].score, 0);
        assert!(matches!(
            &results[0].details,
            Details::Unavailable { reason } if reason == "boom"
        ));
        assert_eq!(results[1].score, 8);
    }

    #[test]
    fn rerunning_on_identical_snapshot_is_idempotent()
    {
        let snapshot = RepoSnapshot {
            files: vec![
                FileEntry::blob("src/index.js", 2_400,),
                FileEntry::blob("src/index.test.js", 800,),
                FileEntry::blob(".gitignore", 20,),
                FileEntry::blob("Dockerfile", 200,),
            ],
            readme: Some(Readme {
                content: "# Demo\n## Usage\nrun it".to_owned(), size: 22,
            },),
            commits: Some(vec![CommitInfo {
                message: "feat: start".to_owned(), author: None, date: None,
            }],),
            branches: vec![BranchInfo {
                name: "main".to_owned(), protected: true,
            }],
            pull_requests: Some(PullRequestStats {
                total: 4, open: 1, closed: 3, merged: 3,
            },),
            ..RepoSnapshot::default()
        };
        let registry = AnalyzerRegistry::standard();
        assert_eq!(registry.run(&snapshot,), registry.run(&snapshot,));
    }

    fn arbitrary_entry() -> impl Strategy<Value = FileEntry,>
    {
        let segment = prop_oneof![
            Just("src".to_owned()),
            Just("test".to_owned()),
            Just("tests".to_owned()),
            Just("docs".to_owned()),
            Just("components".to_owned()),
            Just(".github/workflows".to_owned()),
            "[a-zA-Z_]{1,8}",
        ];
        let name = prop_oneof![
            Just(".gitignore".to_owned()),
            Just(".env".to_owned()),
            Just("Dockerfile".to_owned()),
            Just("package.json".to_owned()),
            Just("README.md".to_owned()),
            "[a-zA-Z0-9_]{1,10}(\\.test)?\\.(js|ts|py|rs|md|go|java)",
        ];
        (prop::collection::vec(segment, 0..4,), name, prop::option::of(0u64..200_000,),).prop_map(
            |(segments, name, size,)| {
                let mut path = segments.join("/",);
                if !path.is_empty() {
                    path.push('/',);
                }
                path.push_str(&name,);
                FileEntry {
                    path, kind: crate::snapshot::EntryKind::Blob, size,
                }
            },
        )
    }

    proptest! {
        #[test]
        fn every_score_stays_within_its_dimension(
            files in prop::collection::vec(arbitrary_entry(), 0..60),
            readme in prop::option::of("(# [A-Za-z ]{0,20}\n[ -~]{0,200}\n){0,6}"),
            messages in prop::option::of(prop::collection::vec("[a-z: ]{0,20}", 0..120)),
            branch_count in 0usize..15,
            merged in 0u32..20,
        ) {
            let snapshot = RepoSnapshot {
                files,
                readme: readme.map(|content| Readme { size: content.len() as u64, content }),
                commits: messages.map(|messages| messages.into_iter().map(|message| CommitInfo { message, author: None, date: None }).collect()),
                branches: (0..branch_count).map(|index| BranchInfo { name: format!("b{index}"), protected: index == 0 }).collect(),
                pull_requests: Some(PullRequestStats { total: merged * 2, open: 0, closed: merged * 2, merged }),
                ..RepoSnapshot::default()
            };
            let results = AnalyzerRegistry::standard().run(&snapshot);
            let mut total = 0;
            for result in &results {
                prop_assert!(result.score <= result.dimension.max_score());
                total += result.score;
            }
            prop_assert!(total <= 100);
        }
    }
}
