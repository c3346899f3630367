// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerResult, Details, Dimension, ratio};
use crate::snapshot::{BranchInfo, CommitInfo, PullRequestStats, RepoSnapshot};

static CONVENTIONAL: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"^(feat|fix|docs|style|refactor|test|chore|perf):",).expect("valid conventional commit pattern",)
},);

static IMPERATIVE: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"^(add|update|fix|remove|refactor|improve)",).expect("valid imperative commit pattern",)
},);

/// Sub-scores reported by [`GitPracticesAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct GitPracticesDetails
{
    /// Commit volume and message quality (0-12).
    pub commit_quality:  f64,
    /// Branch usage and protection (0-12).
    pub branch_strategy: f64,
    /// Pull request usage (0-12).
    pub pull_requests:   f64,
}

/// Scores the [`Dimension::GitPractices`] dimension.
#[derive(Debug, Clone, Copy, Default,)]
pub struct GitPracticesAnalyzer;

impl Analyzer for GitPracticesAnalyzer
{
    fn dimension(&self,) -> Dimension
    {
        Dimension::GitPractices
    }

    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult
    {
        let commit_quality = commit_score(snapshot.commits.as_deref().unwrap_or_default(),);
        let branch_strategy = branch_score(&snapshot.branches,);
        let pull_requests = pull_request_score(snapshot.pull_requests.as_ref(),);

        let raw = commit_quality * 0.5 + branch_strategy * 0.25 + pull_requests * 0.25;
        AnalyzerResult::new(
            self.dimension(),
            raw,
            Details::GitPractices(GitPracticesDetails {
                commit_quality,
                branch_strategy,
                pull_requests,
            },),
        )
    }
}

/// Reports whether a commit message follows a recognized convention.
pub fn is_well_formed(message: &str,) -> bool
{
    let message = message.to_lowercase();
    CONVENTIONAL.is_match(&message,) || IMPERATIVE.is_match(&message,)
}

fn commit_score(commits: &[CommitInfo],) -> f64
{
    if commits.is_empty() {
        return 0.0;
    }

    let mut score = 5.0;
    for (threshold, bonus,) in [(10, 2.0,), (50, 2.0,), (100, 1.0,),] {
        if commits.len() >= threshold {
            score += bonus;
        }
    }

    let good = commits.iter().filter(|commit| is_well_formed(&commit.message,),).count();
    let quality = ratio(good, commits.len(),);
    for (threshold, bonus,) in [(0.3, 2.0,), (0.5, 2.0,), (0.7, 1.0,),] {
        if quality >= threshold {
            score += bonus;
        }
    }

    f64::clamp(score, 0.0, 12.0,)
}

fn branch_score(branches: &[BranchInfo],) -> f64
{
    let mut score = 5.0;
    if branches.is_empty() {
        return score;
    }

    for (threshold, bonus,) in [(2, 3.0,), (5, 2.0,), (10, 2.0,),] {
        if branches.len() >= threshold {
            score += bonus;
        }
    }
    if branches.iter().any(|branch| branch.protected,) {
        score += 2.0;
    }

    f64::clamp(score, 0.0, 12.0,)
}

fn pull_request_score(stats: Option<&PullRequestStats,>,) -> f64
{
    let mut score = 3.0;
    let Some(stats,) = stats else {
        return score;
    };

    if stats.total > 0 {
        score += 3.0;
    }
    if stats.total >= 5 {
        score += 2.0;
    }
    if stats.total >= 10 {
        score += 2.0;
    }
    if stats.merged > 0 && stats.total > 0 && f64::from(stats.merged,) / f64::from(stats.total,) >= 0.5 {
        score += 2.0;
    }

    f64::clamp(score, 0.0, 12.0,)
}
