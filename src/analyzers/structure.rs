// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerResult, Details, Dimension, ratio};
use crate::{
    patterns::{CONCERN_DIRECTORIES, CONFIG_FILES},
    snapshot::{FileEntry, RepoSnapshot},
};

static JS_TEST_FILE: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r"\.(test|spec)\.[jt]sx?$",).expect("valid test file pattern",),);

const TEST_DIR_FRAGMENTS: [&str; 3] = ["test/", "tests/", "__tests__/",];

/// Sub-scores reported by [`ProjectStructureAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct StructureDetails
{
    /// Folder organization sub-score (0-15).
    pub folder_organization:    f64,
    /// Configuration file sub-score (0-15).
    pub config_files:           f64,
    /// Separation of concerns sub-score (0-15).
    pub separation_of_concerns: f64,
}

/// Scores the [`Dimension::ProjectStructure`] dimension from layout alone.
#[derive(Debug, Clone, Copy, Default,)]
pub struct ProjectStructureAnalyzer;

impl Analyzer for ProjectStructureAnalyzer
{
    fn dimension(&self,) -> Dimension
    {
        Dimension::ProjectStructure
    }

    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult
    {
        let files = &snapshot.files;
        if files.is_empty() {
            return AnalyzerResult::empty(self.dimension(),);
        }

        let folder_organization = folder_score(files,);
        let config_files = config_score(files,);
        let separation_of_concerns = separation_score(files,);

        let raw = folder_organization * 0.6 + config_files * 0.25 + separation_of_concerns * 0.15;
        AnalyzerResult::new(
            self.dimension(),
            raw,
            Details::ProjectStructure(StructureDetails {
                folder_organization,
                config_files,
                separation_of_concerns,
            },),
        )
    }
}

fn in_test_dir(path: &str,) -> bool
{
    TEST_DIR_FRAGMENTS.iter().any(|fragment| path.contains(fragment,),)
}

fn folder_score(files: &[FileEntry],) -> f64
{
    let mut score = 15.0;
    let count = files.len();

    if files.iter().any(|file| file.path.starts_with("src/",),) {
        score += 2.0;
    }
    if files.iter().any(|file| in_test_dir(&file.path,),) {
        score += 1.0;
    }
    if files.iter().any(|file| file.path.starts_with("docs/",),) {
        score += 1.0;
    }

    let depths: Vec<usize,> = files.iter().map(FileEntry::depth,).collect();
    let average_depth = depths.iter().sum::<usize>() as f64 / count as f64;
    let max_depth = depths.iter().copied().max().unwrap_or(0,);

    if max_depth > 10 {
        score -= 3.0;
    }
    if average_depth < 2.0 && count > 10 {
        score -= 3.0;
    }
    if average_depth > 6.0 {
        score -= 2.0;
    }

    let root_files = files.iter().filter(|file| !file.path.contains('/',),).count();
    if ratio(root_files, count,) > 0.5 && count > 20 {
        score -= 4.0;
    }

    let directories: HashSet<&str,> = files.iter().map(FileEntry::parent,).collect();
    if directories.len() == 1 && count > 10 {
        score -= 5.0;
    }

    let has_manifest = files.iter().any(|file| file.path == "package.json",);
    let vendored = files.iter().any(|file| file.path.starts_with("node_modules/",),);
    if has_manifest && !vendored {
        score += 1.0;
    }

    f64::clamp(score, 0.0, 15.0,)
}

fn config_score(files: &[FileEntry],) -> f64
{
    let mut score = 10.0;

    let found = files
        .iter()
        .filter(|file| {
            CONFIG_FILES.contains(&file.file_name(),)
                || CONFIG_FILES.iter().any(|config| file.path.ends_with(config,),)
        },)
        .count();
    if found >= 3 {
        score += 3.0;
    }
    if found >= 5 {
        score += 2.0;
    }
    if found >= 8 {
        score += 2.0;
    }

    if files.iter().any(|file| file.path.ends_with(".gitignore",),) {
        score += 2.0;
    } else {
        score -= 3.0;
    }

    if files
        .iter()
        .any(|file| file.path.contains(".env.example",) || file.path.contains(".env.template",),)
    {
        score += 2.0;
    }
    if files.iter().any(|file| file.path == ".editorconfig",) {
        score += 1.0;
    }

    f64::clamp(score, 0.0, 15.0,)
}

fn separation_score(files: &[FileEntry],) -> f64
{
    let mut score = 15.0;

    let families = CONCERN_DIRECTORIES
        .iter()
        .filter(|(_, fragments,)| {
            files.iter().any(|file| fragments.iter().any(|fragment| file.path.contains(fragment,),),)
        },)
        .count();
    if families >= 4 {
        score += 3.0;
    }
    if families >= 6 {
        score += 2.0;
    }

    let tests: Vec<&FileEntry,> = files.iter().filter(|file| JS_TEST_FILE.is_match(&file.path,),).collect();
    let organized = tests.iter().filter(|file| in_test_dir(&file.path,),).count();
    if !tests.is_empty() && ratio(organized, tests.len(),) < 0.5 {
        score -= 3.0;
    }

    f64::clamp(score, 0.0, 15.0,)
}
