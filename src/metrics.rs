// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Flattened per-analysis metrics consumed by the narrative and the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    analyzers::{Details, Dimension, SecurityIssue},
    patterns::CONFIG_FILES,
    score::ScoreCard,
    snapshot::{RepoSnapshot, RepositoryInfo},
};

/// Everything known about one analysed repository, derived purely from the
/// snapshot, the repository info and the analyzer results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize,)]
pub struct AnalysisMetrics
{
    pub total_score:            u32,
    pub code_quality_score:     u32,
    pub structure_score:        u32,
    pub documentation_score:    u32,
    pub testing_score:          u32,
    pub git_practices_score:    u32,
    pub security_score:         u32,
    pub cicd_score:             u32,
    pub dependencies_score:     u32,
    pub containerization_score: u32,

    pub total_files:        usize,
    /// Sum of blob sizes in bytes.
    pub total_size:         u64,
    pub code_files:         usize,
    pub test_files:         usize,
    pub config_files:       usize,
    pub languages:          BTreeMap<String, f64,>,
    pub frameworks:         Vec<String,>,
    pub package_managers:   Vec<String,>,
    pub testing_frameworks: Vec<String,>,

    pub commit_count:      usize,
    pub branch_count:      usize,
    pub contributor_count: usize,
    pub stars:             u32,
    pub forks:             u32,
    pub open_issues:       u32,

    pub test_to_code_ratio: f64,
    pub readme_length:      usize,
    pub readme_sections:    Vec<String,>,
    pub has_license:        bool,
    pub has_contributing:   bool,
    pub security_issues:    Vec<SecurityIssue,>,
    pub has_cicd:           bool,
    pub cicd_platforms:     Vec<String,>,
    pub has_dockerfile:     bool,
    pub has_docker_compose: bool,
}

impl AnalysisMetrics
{
    /// Collects metrics from a scored snapshot.
    pub fn derive(info: &RepositoryInfo, snapshot: &RepoSnapshot, card: &ScoreCard,) -> Self
    {
        let mut metrics = Self {
            total_score: card.composite().total,
            code_quality_score: card.score(Dimension::CodeQuality,),
            structure_score: card.score(Dimension::ProjectStructure,),
            documentation_score: card.score(Dimension::Documentation,),
            testing_score: card.score(Dimension::Testing,),
            git_practices_score: card.score(Dimension::GitPractices,),
            security_score: card.score(Dimension::Security,),
            cicd_score: card.score(Dimension::Cicd,),
            dependencies_score: card.score(Dimension::Dependencies,),
            containerization_score: card.score(Dimension::Containerization,),
            total_files: snapshot.files.len(),
            total_size: snapshot.total_size(),
            config_files: snapshot
                .files
                .iter()
                .filter(|file| CONFIG_FILES.contains(&file.file_name(),),)
                .count(),
            languages: snapshot.languages.clone(),
            commit_count: snapshot.commit_count(),
            branch_count: snapshot.branches.len(),
            contributor_count: snapshot.contributors.len(),
            stars: info.stars,
            forks: info.forks,
            open_issues: info.open_issues,
            ..Self::default()
        };

        for result in card.results() {
            match &result.details {
                Details::CodeQuality(details,) => metrics.code_files = details.total_code_files,
                Details::Documentation(details,) => {
                    metrics.readme_length = details.readme_length;
                    metrics.readme_sections = details.readme_sections.clone();
                    metrics.has_license = details.has_license;
                    metrics.has_contributing = details.has_contributing;
                }
                Details::Testing(details,) => {
                    metrics.test_files = details.total_test_files;
                    metrics.test_to_code_ratio = details.test_to_code_ratio;
                    metrics.testing_frameworks = details.frameworks.clone();
                }
                Details::Security(details,) => metrics.security_issues = details.issues.clone(),
                Details::Cicd(details,) => {
                    metrics.has_cicd = details.has_cicd;
                    metrics.cicd_platforms = details.platforms.clone();
                }
                Details::Dependencies(details,) => {
                    metrics.frameworks = details.frameworks.clone();
                    metrics.package_managers = details.package_managers.clone();
                }
                Details::Containerization(details,) => {
                    metrics.has_dockerfile = details.has_dockerfile;
                    metrics.has_docker_compose = details.has_docker_compose;
                }
                Details::ProjectStructure(_,)
                | Details::GitPractices(_,)
                | Details::Empty
                | Details::Unavailable {
                    ..
                } => {}
            }
        }

        metrics
    }

    /// Score recorded for a dimension.
    pub fn score(&self, dimension: Dimension,) -> u32
    {
        match dimension {
            Dimension::CodeQuality => self.code_quality_score,
            Dimension::ProjectStructure => self.structure_score,
            Dimension::Documentation => self.documentation_score,
            Dimension::Testing => self.testing_score,
            Dimension::GitPractices => self.git_practices_score,
            Dimension::Security => self.security_score,
            Dimension::Cicd => self.cicd_score,
            Dimension::Dependencies => self.dependencies_score,
            Dimension::Containerization => self.containerization_score,
        }
    }
}
