// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use super::{Analyzer, AnalyzerResult, Details, Dimension};
use crate::{patterns::CICD_PLATFORMS, snapshot::RepoSnapshot};

/// Continuous integration platforms found in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct CicdDetails
{
    /// Whether at least one platform was detected.
    pub has_cicd:  bool,
    /// Detected platform names in table order.
    pub platforms: Vec<String,>,
}

/// Scores the [`Dimension::Cicd`] dimension: 8 with any platform, else 0.
#[derive(Debug, Clone, Copy, Default,)]
pub struct CicdAnalyzer;

impl Analyzer for CicdAnalyzer
{
    fn dimension(&self,) -> Dimension
    {
        Dimension::Cicd
    }

    fn analyze(&self, snapshot: &RepoSnapshot,) -> AnalyzerResult
    {
        let platforms: Vec<String,> = CICD_PLATFORMS
            .iter()
            .filter(|(_, fragments,)| fragments.iter().any(|fragment| snapshot.any_path_contains(fragment,),),)
            .map(|(name, _,)| (*name).to_owned(),)
            .collect();

        let raw = if platforms.is_empty() { 0.0 } else { 5.0 + 3.0 };
        AnalyzerResult::new(
            self.dimension(),
            raw,
            Details::Cicd(CicdDetails {
                has_cicd: !platforms.is_empty(),
                platforms,
            },),
        )
    }
}
