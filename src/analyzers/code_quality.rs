// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Code quality estimated from file metadata alone.
//!
//! Four sub-scores, each on a 0-20 scale, are blended with weights
//! 0.40 (complexity), 0.25 (file sizes), 0.20 (duplication) and 0.15
//! (naming). Only files with a recognized source extension participate.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerResult, Details, Dimension, ratio};
use crate::{
    patterns::CODE_EXTENSIONS,
    snapshot::{FileEntry, RepoSnapshot},
};

static SUSPICIOUS_NAME: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"(?i)test|temp|old|backup|copy|new|tmp",).expect("valid suspicious name pattern",)
},);

static NUMBERED_NAME: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"(?i)\d{1,2}\.(js|py|java|ts)$",).expect("valid numbered name pattern",)
},);

static CAMEL_CASE: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-zA-Z0-9]*\.(js|py|ts|java)$",).expect("valid camel case pattern",)
},);

static KEBAB_CASE: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9-]*\.(js|py|ts|java)$",).expect("valid kebab case pattern",)
},);

/// Sub-scores reported by [`CodeQualityAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct CodeQualityDetails
{
    /// Complexity sub-score (0-20).
    pub complexity:       f64,
    /// File size distribution sub-score (0-20).
    pub file_size:        f64,
    /// Naming convention sub-score (0-20).
    pub naming:           f64,
    /// Duplicate basename sub-score (0-20).
    pub duplication:      f64,
    /// Number of source files considered.
    pub total_code_files: usize,
}

/// Scores the [`Dimension::CodeQuality`] dimension.
#[derive(Debug, Clone, Copy, Default,)]
pub struct CodeQualityAnalyzer;

impl Analyzer for CodeQualityAnalyzer
{
    fn dimension(&self,) -> Dimension
    {
        Dimension::CodeQuality
    }

    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult
    {
        let code_files: Vec<&FileEntry,> = snapshot.files.iter().filter(|file| is_code_file(file,),).collect();
        if code_files.is_empty() {
            return AnalyzerResult::empty(self.dimension(),);
        }

        let complexity = complexity_score(&code_files,);
        let file_size = file_size_score(&code_files,);
        let naming = naming_score(&code_files,);
        let duplication = duplication_score(&code_files,);

        let raw = complexity * 0.4 + file_size * 0.25 + duplication * 0.2 + naming * 0.15;
        AnalyzerResult::new(
            self.dimension(),
            raw,
            Details::CodeQuality(CodeQualityDetails {
                complexity,
                file_size,
                naming,
                duplication,
                total_code_files: code_files.len(),
            },),
        )
    }
}

pub(crate) fn is_code_file(file: &FileEntry,) -> bool
{
    file.extension().is_some_and(|extension| CODE_EXTENSIONS.contains(&extension.as_str(),),)
}

fn complexity_score(files: &[&FileEntry],) -> f64
{
    let mut score = 20.0;

    let total: u64 = files.iter().map(|file| file.size_or_zero(),).sum();
    let average = total as f64 / files.len() as f64;
    for threshold in [1_000.0, 2_000.0, 5_000.0] {
        if average > threshold {
            score -= 5.0;
        }
    }

    let large = files.iter().filter(|file| file.size_or_zero() > 10_000,).count();
    if ratio(large, files.len(),) > 0.3 {
        score -= 5.0;
    }

    let max_depth = files.iter().map(|file| file.depth(),).max().unwrap_or(0,);
    if max_depth > 8 {
        score -= 3.0;
    }
    if max_depth > 12 {
        score -= 2.0;
    }

    f64::max(score, 0.0,)
}

fn file_size_score(files: &[&FileEntry],) -> f64
{
    let sizes: Vec<u64,> = files.iter().map(|file| file.size_or_zero(),).filter(|size| *size > 0,).collect();
    if sizes.is_empty() {
        return 10.0;
    }

    let mut score = 20.0;
    let average = sizes.iter().sum::<u64>() as f64 / sizes.len() as f64;
    let max = sizes.iter().copied().max().unwrap_or(0,);

    if max > 50_000 {
        score -= 5.0;
    }
    if max > 100_000 {
        score -= 5.0;
    }
    if average > 5_000.0 {
        score -= 3.0;
    }
    if average > 10_000.0 {
        score -= 3.0;
    }

    let tiny = sizes.iter().filter(|size| **size < 100,).count();
    if ratio(tiny, sizes.len(),) > 0.5 {
        score -= 4.0;
    }

    f64::max(score, 0.0,)
}

fn naming_score(files: &[&FileEntry],) -> f64
{
    let mut score: f64 = 20.0;
    let mut conventional = 0;

    for file in files {
        let name = file.file_name();
        if SUSPICIOUS_NAME.is_match(name,) {
            score -= 0.5;
        }
        if NUMBERED_NAME.is_match(name,) {
            score -= 0.5;
        }
        if CAMEL_CASE.is_match(name,) || KEBAB_CASE.is_match(name,) {
            conventional += 1;
        }
    }

    if ratio(conventional, files.len(),) > 0.8 {
        score += 2.0;
    }

    f64::clamp(score, 0.0, 20.0,)
}

fn duplication_score(files: &[&FileEntry],) -> f64
{
    let unique: HashSet<&str,> = files.iter().map(|file| file.file_name(),).collect();
    if unique.len() == files.len() {
        return 20.0;
    }
    let duplicate_ratio = 1.0 - ratio(unique.len(), files.len(),);
    f64::max(20.0 - f64::min(duplicate_ratio * 20.0, 10.0,), 0.0,)
}
