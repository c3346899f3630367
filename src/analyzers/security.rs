// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository hygiene checks that do not require file contents.
//!
//! Path matching is substring based, so `config/.env.example` is treated as a
//! sensitive file for the secrets sub-score while being exempt from the
//! committed-env check.

use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerResult, Details, Dimension};
use crate::{
    patterns::SENSITIVE_FILES,
    snapshot::{FileEntry, RepoSnapshot},
};

/// Severity of a discrete security finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum Severity
{
    /// Informational.
    Low,
    /// Should be addressed.
    Medium,
    /// Exposes the repository to avoidable risk.
    High,
    /// Likely leaks credentials.
    Critical,
}

/// Discrete security finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct SecurityIssue
{
    /// Machine readable identifier such as `missing_gitignore`.
    #[serde(rename = "type")]
    pub kind:     String,
    /// Finding severity.
    pub severity: Severity,
}

impl SecurityIssue
{
    fn new(kind: &str, severity: Severity,) -> Self
    {
        Self {
            kind: kind.to_owned(),
            severity,
        }
    }
}

/// Sub-scores and findings reported by [`SecurityAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct SecurityDetails
{
    /// Sensitive file sub-score (0-10).
    pub secrets:      f64,
    /// Root `.gitignore` sub-score, either 0 or 10.
    pub gitignore:    f64,
    /// Security policy proxy sub-score, either 7 or 10.
    pub dependencies: f64,
    /// Discrete findings.
    pub issues:       Vec<SecurityIssue,>,
}

/// Scores the [`Dimension::Security`] dimension.
#[derive(Debug, Clone, Copy, Default,)]
pub struct SecurityAnalyzer;

impl Analyzer for SecurityAnalyzer
{
    fn dimension(&self,) -> Dimension
    {
        Dimension::Security
    }

    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult
    {
        let files = &snapshot.files;
        let has_gitignore = snapshot.has_path(".gitignore",);
        let env_committed = has_committed_env(files,);

        let mut secrets: f64 = 10.0;
        if files.iter().any(|file| SENSITIVE_FILES.iter().any(|name| file.path.contains(name,),),) {
            secrets -= 5.0;
        }
        if env_committed {
            secrets -= 3.0;
        }
        let secrets = secrets.max(0.0,);

        let gitignore = if has_gitignore { 10.0 } else { 0.0 };
        let dependencies = if files.iter().any(|file| file.path.to_uppercase().contains("SECURITY",),) {
            10.0
        } else {
            7.0
        };

        let mut issues = Vec::new();
        if !has_gitignore {
            issues.push(SecurityIssue::new("missing_gitignore", Severity::High,),);
        }
        if env_committed {
            issues.push(SecurityIssue::new("env_file_committed", Severity::Critical,),);
        }

        let raw = secrets * 0.4 + gitignore * 0.35 + dependencies * 0.25;
        AnalyzerResult::new(
            self.dimension(),
            raw,
            Details::Security(SecurityDetails {
                secrets,
                gitignore,
                dependencies,
                issues,
            },),
        )
    }
}

fn has_committed_env(files: &[FileEntry],) -> bool
{
    files.iter().any(|file| file.path.contains(".env",) && !file.path.contains(".example",),)
}
