// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerResult, Details, Dimension};
use crate::{
    patterns::{FRAMEWORK_CONFIGS, PACKAGE_MANAGERS},
    snapshot::RepoSnapshot,
};

/// Package managers and build frameworks found in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct DependenciesDetails
{
    /// Package managers implied by root manifests.
    pub package_managers:        Vec<String,>,
    /// Build frameworks implied by config files.
    pub frameworks:              Vec<String,>,
    /// Known vulnerable dependencies; always zero without a vulnerability feed.
    pub vulnerable_dependencies: u32,
}

/// Scores the [`Dimension::Dependencies`] dimension.
#[derive(Debug, Clone, Copy, Default,)]
pub struct DependenciesAnalyzer;

impl Analyzer for DependenciesAnalyzer
{
    fn dimension(&self,) -> Dimension
    {
        Dimension::Dependencies
    }

    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult
    {
        let package_managers: Vec<String,> = PACKAGE_MANAGERS
            .iter()
            .filter(|(manifest, _,)| snapshot.has_path(manifest,),)
            .map(|(_, manager,)| (*manager).to_owned(),)
            .collect();

        let frameworks: Vec<String,> = if snapshot.any_path_contains("package.json",) {
            FRAMEWORK_CONFIGS
                .iter()
                .filter(|(fragment, _,)| snapshot.any_path_contains(fragment,),)
                .map(|(_, framework,)| (*framework).to_owned(),)
                .collect()
        } else {
            Vec::new()
        };

        let mut raw = 0.0;
        if !package_managers.is_empty() {
            raw += 3.0;
        }
        if !frameworks.is_empty() {
            raw += 2.0;
        }

        AnalyzerResult::new(
            self.dimension(),
            raw,
            Details::Dependencies(DependenciesDetails {
                package_managers,
                frameworks,
                vulnerable_dependencies: 0,
            },),
        )
    }
}
