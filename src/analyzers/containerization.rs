// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerResult, Details, Dimension};
use crate::{
    patterns::{COMPOSE_FILES, DOCKERFILE_PATTERNS},
    snapshot::RepoSnapshot,
};

/// Container file presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
pub struct ContainerizationDetails
{
    /// Any path mentions a Dockerfile.
    pub has_dockerfile:     bool,
    /// A compose file exists at the repository root.
    pub has_docker_compose: bool,
}

/// Scores the [`Dimension::Containerization`] dimension.
#[derive(Debug, Clone, Copy, Default,)]
pub struct ContainerizationAnalyzer;

impl Analyzer for ContainerizationAnalyzer
{
    fn dimension(&self,) -> Dimension
    {
        Dimension::Containerization
    }

    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult
    {
        let has_dockerfile = DOCKERFILE_PATTERNS.iter().any(|pattern| snapshot.any_path_contains(pattern,),);
        let has_docker_compose = COMPOSE_FILES.iter().any(|name| snapshot.has_path(name,),);

        let mut raw = 0.0;
        if has_dockerfile {
            raw += 2.0;
        }
        if has_docker_compose {
            raw += 1.0;
        }

        AnalyzerResult::new(
            self.dimension(),
            raw,
            Details::Containerization(ContainerizationDetails {
                has_dockerfile,
                has_docker_compose,
            },),
        )
    }
}
