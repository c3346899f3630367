// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! README quality, code documentation proxies and auxiliary documents.
//!
//! The README sub-score dominates (weight 0.75); the comment proxy and the
//! auxiliary document sub-score contribute 0.15 and 0.10. Every sub-score is
//! bounded to 0-15.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerResult, Details, Dimension};
use crate::{
    patterns::README_SECTIONS,
    snapshot::{FileEntry, Readme, RepoSnapshot},
};

static HEADER: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r"(?m)^#+\s+(.+)$",).expect("valid markdown header pattern",),);

static IMAGE: LazyLock<Regex,> = LazyLock::new(|| Regex::new(r"!\[.*?\]",).expect("valid image pattern",),);

static LINK: LazyLock<Regex,> = LazyLock::new(|| Regex::new(r"\[.*?\]\(.*?\)",).expect("valid link pattern",),);

static SOURCE_PATH: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"\.(js|jsx|ts|tsx|py|java|cpp|c|cs|rb|go|rs|php|swift|kt)$",).expect("valid source path pattern",)
},);

static LICENSE_PATH: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"(?i)^LICEN[CS]E(\.(md|txt|rst))?$",).expect("valid license path pattern",)
},);

/// Sub-scores and README facts reported by [`DocumentationAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct DocumentationDetails
{
    /// README sub-score (0-15).
    pub readme:           f64,
    /// Code documentation proxy sub-score (0-15).
    pub code_comments:    f64,
    /// Auxiliary document sub-score (0-15).
    pub additional_docs:  f64,
    /// README length in characters.
    pub readme_length:    usize,
    /// Recognized README sections, lowercased and de-duplicated.
    pub readme_sections:  Vec<String,>,
    /// Whether a root license file exists.
    pub has_license:      bool,
    /// Whether a contributing guide exists.
    pub has_contributing: bool,
}

/// Scores the [`Dimension::Documentation`] dimension.
#[derive(Debug, Clone, Copy, Default,)]
pub struct DocumentationAnalyzer;

impl Analyzer for DocumentationAnalyzer
{
    fn dimension(&self,) -> Dimension
    {
        Dimension::Documentation
    }

    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult
    {
        let readme = snapshot.readme.as_ref().filter(|readme| !readme.is_empty(),);
        let sections = readme.map(readme_sections,).unwrap_or_default();

        let readme_score = readme.map_or(0.0, |readme| readme_score(readme, &sections,),);
        let code_comments = code_comment_score(&snapshot.files,);
        let additional_docs = additional_docs_score(&snapshot.files,);

        let raw = readme_score * 0.75 + code_comments * 0.15 + additional_docs * 0.1;
        AnalyzerResult::new(
            self.dimension(),
            raw,
            Details::Documentation(DocumentationDetails {
                readme: readme_score,
                code_comments,
                additional_docs,
                readme_length: readme.map_or(0, Readme::len,),
                readme_sections: sections,
                has_license: has_license(&snapshot.files,),
                has_contributing: has_contributing(&snapshot.files,),
            },),
        )
    }
}

/// Extracts recognized section names from markdown headers.
///
/// A header contributes every known section whose lowercased name occurs in
/// its text, so `## Installation and Usage` yields both.
pub fn readme_sections(readme: &Readme,) -> Vec<String,>
{
    let content = readme.content.to_lowercase();
    let mut found: Vec<String,> = Vec::new();
    for captures in HEADER.captures_iter(&content,) {
        let text = captures[1].trim();
        for section in README_SECTIONS {
            let section = section.to_lowercase();
            if text.contains(&section,) && !found.contains(&section,) {
                found.push(section,);
            }
        }
    }
    found
}

fn readme_score(readme: &Readme, sections: &[String],) -> f64
{
    let mut score = 5.0;
    let content = readme.content.to_lowercase();
    let length = readme.len();

    match length {
        0..100 => score -= 2.0,
        300..1_000 => score += 2.0,
        1_000..5_000 => score += 4.0,
        5_000.. => score += 3.0,
        _ => {}
    }

    let has = |name: &str| sections.iter().any(|section| section == name,);
    if has("installation",) || has("setup",) || has("getting started",) {
        score += 2.0;
    }
    if has("usage",) || has("examples",) {
        score += 2.0;
    }
    if has("features",) {
        score += 1.0;
    }
    if has("documentation",) || has("api",) {
        score += 1.0;
    }
    if has("contributing",) {
        score += 1.0;
    }
    if has("license",) {
        score += 1.0;
    }
    if has("tests",) || has("testing",) {
        score += 1.0;
    }

    let code_blocks = content.matches("```",).count() as f64 / 2.0;
    if code_blocks >= 2.0 {
        score += 2.0;
    }
    if code_blocks >= 4.0 {
        score += 1.0;
    }

    if IMAGE.is_match(&content,) {
        score += 1.0;
    }
    if LINK.find_iter(&content,).count() >= 3 {
        score += 1.0;
    }
    if content.contains("table of contents",) || content.contains("toc",) {
        score += 1.0;
    }

    if length < 200 && sections.len() < 3 {
        score -= 3.0;
    }

    f64::clamp(score, 0.0, 15.0,)
}

fn code_comment_score(files: &[FileEntry],) -> f64
{
    if !files.iter().any(|file| SOURCE_PATH.is_match(&file.path,),) {
        return 5.0;
    }

    let mut score = 10.0;
    if files.iter().any(|file| {
        file.path.contains("docs/api",) || file.path.contains("api.md",) || file.path.contains("API.md",)
    },) {
        score += 3.0;
    }
    if files.iter().any(|file| {
        file.path.contains("jsdoc",) || file.path.contains("typedoc",) || file.path.contains("sphinx",)
    },) {
        score += 2.0;
    }
    // well organized projects are assumed to carry reasonable comment density
    if score >= 10.0 {
        score += 3.0;
    }

    f64::clamp(score, 0.0, 15.0,)
}

fn additional_docs_score(files: &[FileEntry],) -> f64
{
    let mut score = 10.0;

    if files.iter().any(|file| file.path.starts_with("docs/",),) {
        score += 3.0;
    }
    if has_license(files,) {
        score += 2.0;
    }
    if has_contributing(files,) {
        score += 2.0;
    }
    for marker in ["CHANGELOG", "CODE_OF_CONDUCT", "SECURITY",] {
        if files.iter().any(|file| file.path.to_uppercase().contains(marker,),) {
            score += 1.0;
        }
    }

    let markdown = files.iter().filter(|file| file.path.ends_with(".md",),).count();
    if markdown >= 3 {
        score += 1.0;
    }
    if markdown >= 5 {
        score += 1.0;
    }

    f64::clamp(score, 0.0, 15.0,)
}

fn has_license(files: &[FileEntry],) -> bool
{
    files.iter().any(|file| LICENSE_PATH.is_match(&file.path,),)
}

fn has_contributing(files: &[FileEntry],) -> bool
{
    files.iter().any(|file| file.path.to_uppercase().contains("CONTRIBUTING",),)
}
