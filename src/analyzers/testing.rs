// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Test presence, estimated coverage, organization and tooling.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerResult, Details, Dimension, code_quality::is_code_file, ratio};
use crate::{
    patterns::{TEST_DIRECTORIES, TESTING_TOOLS},
    snapshot::{FileEntry, RepoSnapshot},
};

const TEST_MARKERS: [&str; 9] =
    [".test.", ".spec.", "_test.", "_spec.", "/test/", "/tests/", "/__tests__/", "/spec/", "test_",];

const TEST_UTILITY_MARKERS: [&str; 4] = ["test/utils", "test/helpers", "testUtils", "setupTests",];

/// Sub-scores and facts reported by [`TestingAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct TestingDetails
{
    /// Test presence sub-score (0-12).
    pub test_presence:      f64,
    /// Estimated coverage sub-score (0-12).
    pub test_coverage:      f64,
    /// Organization sub-score (0-12).
    pub test_organization:  f64,
    /// Tooling sub-score (0-12).
    pub test_framework:     f64,
    /// Number of files recognized as tests.
    pub total_test_files:   usize,
    /// Test files per hundred code files, rounded to two decimals.
    pub test_to_code_ratio: f64,
    /// Detected testing tools in detection order.
    pub frameworks:         Vec<String,>,
}

/// Scores the [`Dimension::Testing`] dimension.
#[derive(Debug, Clone, Copy, Default,)]
pub struct TestingAnalyzer;

impl Analyzer for TestingAnalyzer
{
    fn dimension(&self,) -> Dimension
    {
        Dimension::Testing
    }

    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult
    {
        let tests: Vec<&FileEntry,> = snapshot.files.iter().filter(|file| is_test_file(&file.path,),).collect();
        let test_paths: HashSet<&str,> = tests.iter().map(|file| file.path.as_str(),).collect();
        let code: Vec<&FileEntry,> = snapshot
            .files
            .iter()
            .filter(|file| is_code_file(file,) && !test_paths.contains(file.path.as_str(),),)
            .collect();

        if code.is_empty() {
            return AnalyzerResult::empty(self.dimension(),);
        }

        let frameworks = detect_frameworks(&snapshot.files,);
        let test_presence = presence_score(&tests,);
        let test_coverage = coverage_score(&tests, &code,);
        let test_organization = organization_score(&tests,);
        let test_framework = framework_score(frameworks.len(),);

        let raw = test_presence * 0.35 + test_coverage * 0.35 + test_organization * 0.15 + test_framework * 0.15;
        let test_to_code_ratio = (ratio(tests.len(), code.len(),) * 100.0 * 100.0).round() / 100.0;

        AnalyzerResult::new(
            self.dimension(),
            raw,
            Details::Testing(TestingDetails {
                test_presence,
                test_coverage,
                test_organization,
                test_framework,
                total_test_files: tests.len(),
                test_to_code_ratio,
                frameworks,
            },),
        )
    }
}

/// Reports whether a path looks like a test file.
///
/// Matching is case-insensitive for the generic markers; the Java and C#
/// class suffixes are matched on the original casing.
pub fn is_test_file(path: &str,) -> bool
{
    let lower = path.to_lowercase();
    TEST_MARKERS.iter().any(|marker| lower.contains(marker,),)
        || path.ends_with("Test.java",)
        || path.ends_with("Tests.cs",)
}

fn in_test_directory(path: &str,) -> bool
{
    TEST_DIRECTORIES.iter().any(|directory| path.contains(directory,),)
}

fn presence_score(tests: &[&FileEntry],) -> f64
{
    if tests.is_empty() {
        return 0.0;
    }

    let mut score = 5.0;
    for threshold in [1, 5, 10, 20,] {
        if tests.len() >= threshold {
            score += 2.0;
        }
    }
    if tests.iter().any(|file| in_test_directory(&file.path,),) {
        score += 2.0;
    }

    f64::clamp(score, 0.0, 12.0,)
}

fn coverage_score(tests: &[&FileEntry], code: &[&FileEntry],) -> f64
{
    if tests.is_empty() || code.is_empty() {
        return 0.0;
    }

    let mut score = 0.0;
    let file_ratio = ratio(tests.len(), code.len(),);
    for (threshold, bonus,) in [(0.1, 2.0,), (0.2, 2.0,), (0.3, 2.0,), (0.5, 3.0,), (0.8, 3.0,),] {
        if file_ratio >= threshold {
            score += bonus;
        }
    }

    let test_size: u64 = tests.iter().map(|file| file.size_or_zero(),).sum();
    let code_size: u64 = code.iter().map(|file| file.size_or_zero(),).sum();
    if code_size > 0 {
        let size_ratio = test_size as f64 / code_size as f64;
        for threshold in [0.2, 0.5, 1.0,] {
            if size_ratio >= threshold {
                score += 1.0;
            }
        }
    }

    f64::clamp(score, 0.0, 12.0,)
}

fn organization_score(tests: &[&FileEntry],) -> f64
{
    if tests.is_empty() {
        return 0.0;
    }

    let mut score = 8.0;
    let organized = tests.iter().filter(|file| in_test_directory(&file.path,),).count();
    let organized_ratio = ratio(organized, tests.len(),);
    if organized_ratio >= 0.8 {
        score += 4.0;
    } else if organized_ratio >= 0.5 {
        score += 2.0;
    } else if organized_ratio < 0.3 {
        score -= 3.0;
    }

    if tests
        .iter()
        .any(|file| TEST_UTILITY_MARKERS.iter().any(|marker| file.path.contains(marker,),),)
    {
        score += 2.0;
    }
    for kind in ["unit", "integration", "e2e",] {
        if tests.iter().any(|file| file.path.contains(kind,),) {
            score += 1.0;
        }
    }

    f64::clamp(score, 0.0, 12.0,)
}

fn framework_score(detected: usize,) -> f64
{
    match detected {
        0 => 0.0,
        1 => 8.0,
        2 => 10.0,
        _ => 12.0,
    }
}

/// Detects testing tools from path tokens.
pub fn detect_frameworks(files: &[FileEntry],) -> Vec<String,>
{
    let paths: Vec<String,> = files.iter().map(|file| file.path.to_lowercase(),).collect();
    let joined = paths.join(" ",);
    let mut found: Vec<String,> = Vec::new();

    let has_js_manifest = paths.iter().any(|path| path.contains("jest.config",) || path.contains("package.json",),);
    if has_js_manifest && joined.contains("jest",) {
        found.push("Jest".to_owned(),);
    }
    if paths.iter().any(|path| path.contains("vitest.config",),) {
        found.push("Vitest".to_owned(),);
    }
    for (name, token,) in TESTING_TOOLS {
        if joined.contains(token,) && !found.iter().any(|existing| existing == name,) {
            found.push((*name).to_owned(),);
        }
    }

    found
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn details(files: Vec<FileEntry,>,) -> (u32, TestingDetails,)
    {
        let result = TestingAnalyzer.analyze(&RepoSnapshot::from_files(files,),);
        match result.details {
            Details::Testing(details,) => (result.score, details,),
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn zero_code_files_scores_zero_regardless_of_tests()
    {
        let files = vec![
            FileEntry::blob("tests/test_a.md", 10,),
            FileEntry::blob("spec/b.spec.js", 10,),
            FileEntry::blob("jest.config.json", 10,),
        ];
        let result = TestingAnalyzer.analyze(&RepoSnapshot::from_files(files,),);
        assert_eq!(result.score, 0);
        assert_eq!(result.details, Details::Empty);
    }

    #[test]
    fn recognizes_common_test_layouts()
    {
        assert!(is_test_file("src/app.test.ts"));
        assert!(is_test_file("pkg/server_test.go"));
        assert!(is_test_file("lib/__tests__/a.js"));
        assert!(is_test_file("test_utils.py"));
        assert!(is_test_file("src/main/java/UserServiceTest.java"));
        assert!(is_test_file("Api/ControllerTests.cs"));
        assert!(!is_test_file("src/main.rs"));
        assert!(!is_test_file("src/contest.rs"));
    }

    #[test]
    fn untested_code_scores_zero()
    {
        let (score, details,) = details(vec![FileEntry::blob("src/main.rs", 1_000,)],);
        assert_eq!(details.test_presence, 0.0);
        assert_eq!(details.test_coverage, 0.0);
        assert_eq!(details.test_organization, 0.0);
        assert_eq!(details.test_framework, 0.0);
        assert_eq!(details.test_to_code_ratio, 0.0);
        assert_eq!(score, 0);
    }

    #[test]
    fn organized_jest_project()
    {
        let (score, details,) = details(vec![
            FileEntry::blob("package.json", 500,),
            FileEntry::blob("jest.config.js", 100,),
            FileEntry::blob("src/a.js", 1_000,),
            FileEntry::blob("src/b.js", 1_000,),
            FileEntry::blob("src/tests/unit/a.test.js", 600,),
            FileEntry::blob("src/tests/integration/b.test.js", 600,),
        ],);
        assert_eq!(details.total_test_files, 2);
        // jest.config.js is code, so three code files
        assert_eq!(details.test_to_code_ratio, 66.67);
        // 5 + 2 (>= 1) + 2 (test dir)
        assert_eq!(details.test_presence, 9.0);
        // ratio 0.67: 2 + 2 + 2 + 3; size ratio 0.57: 1 + 1
        assert_eq!(details.test_coverage, 11.0);
        // 8 + 4 + unit + integration
        assert_eq!(details.test_organization, 12.0);
        assert_eq!(details.frameworks, vec!["Jest".to_owned()]);
        assert_eq!(details.test_framework, 8.0);
        // 3.15 + 3.85 + 1.8 + 1.2 = 10.0
        assert_eq!(score, 10);
    }

    #[test]
    fn scattered_tests_are_poorly_organized()
    {
        let tests: Vec<&FileEntry,> = Vec::new();
        assert_eq!(organization_score(&tests), 0.0);

        let files = [FileEntry::blob("a.test.js", 1,), FileEntry::blob("b.test.js", 1,)];
        let refs: Vec<&FileEntry,> = files.iter().collect();
        assert_eq!(organization_score(&refs), 5.0);
    }

    #[test]
    fn framework_detection_deduplicates_and_orders()
    {
        let files = vec![
            FileEntry::blob("vitest.config.ts", 1,),
            FileEntry::blob("cypress/e2e/login.cy.ts", 1,),
            FileEntry::blob(".mocharc.json", 1,),
            FileEntry::blob("tests/pytest.ini", 1,),
        ];
        assert_eq!(detect_frameworks(&files), vec!["Vitest", "Mocha", "Cypress", "PyTest"]);
        assert_eq!(framework_score(4), 12.0);
    }

    #[test]
    fn jest_requires_a_manifest()
    {
        let files = vec![FileEntry::blob("jest/readme.md", 1,)];
        assert!(detect_frameworks(&files).is_empty());
    }
}
