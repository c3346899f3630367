// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Aggregation of analyzer results into the composite score.
//!
//! The composite is the plain sum of the nine bounded sub-scores. Dimension
//! maxima already encode the weighting, so nothing is re-weighted here.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    analyzers::{AnalyzerResult, Dimension},
    error::Error,
};

/// Experience tier derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,)]
pub enum Rating
{
    /// Composite below 41.
    Beginner,
    /// Composite from 41 through 75.
    Intermediate,
    /// Composite of 76 or more.
    Advanced,
}

/// Badge tier paired with a [`Rating`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,)]
pub enum Badge
{
    /// Paired with [`Rating::Beginner`].
    Bronze,
    /// Paired with [`Rating::Intermediate`].
    Silver,
    /// Paired with [`Rating::Advanced`].
    Gold,
}

impl fmt::Display for Rating
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        fmt::Debug::fmt(self, f,)
    }
}

impl fmt::Display for Badge
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        fmt::Debug::fmt(self, f,)
    }
}

impl FromStr for Rating
{
    type Err = Error;

    fn from_str(value: &str,) -> Result<Self, Self::Err,>
    {
        match value {
            "Beginner" => Ok(Self::Beginner,),
            "Intermediate" => Ok(Self::Intermediate,),
            "Advanced" => Ok(Self::Advanced,),
            other => Err(Error::validation(format!("unknown rating {other:?}"),),),
        }
    }
}

impl FromStr for Badge
{
    type Err = Error;

    fn from_str(value: &str,) -> Result<Self, Self::Err,>
    {
        match value {
            "Bronze" => Ok(Self::Bronze,),
            "Silver" => Ok(Self::Silver,),
            "Gold" => Ok(Self::Gold,),
            other => Err(Error::validation(format!("unknown badge {other:?}"),),),
        }
    }
}

/// Composite score with its rating and badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
pub struct CompositeScore
{
    /// Sum of the nine sub-scores, `0..=100`.
    pub total:  u32,
    /// Rating tier.
    pub rating: Rating,
    /// Badge tier.
    pub badge:  Badge,
}

impl CompositeScore
{
    /// Maps a total to its rating and badge.
    ///
    /// # Examples
    ///
    /// ```
    /// use repograde::score::{Badge, CompositeScore, Rating};
    ///
    /// let score = CompositeScore::from_total(76,);
    /// assert_eq!(score.rating, Rating::Advanced);
    /// assert_eq!(score.badge, Badge::Gold);
    /// ```
    pub fn from_total(total: u32,) -> Self
    {
        let total = total.min(100,);
        let (rating, badge,) = match total {
            76.. => (Rating::Advanced, Badge::Gold,),
            41..=75 => (Rating::Intermediate, Badge::Silver,),
            _ => (Rating::Beginner, Badge::Bronze,),
        };
        Self {
            total,
            rating,
            badge,
        }
    }
}

/// Sums already-bounded analyzer scores into a [`CompositeScore`].
///
/// Each score is clamped to its dimension maximum once more, so a custom
/// analyzer that violates its bound cannot push the composite past 100.
pub fn aggregate(results: &[AnalyzerResult],) -> CompositeScore
{
    let total = results.iter().map(|result| result.score.min(result.dimension.max_score(),),).sum();
    CompositeScore::from_total(total,)
}

/// Exactly one result per dimension, in [`Dimension::ALL`] order.
///
/// Deserialization goes through [`ScoreCard::from_results`], so a stored
/// card with missing or repeated dimensions is normalized on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
#[serde(from = "Vec<AnalyzerResult>", into = "Vec<AnalyzerResult>")]
pub struct ScoreCard
{
    results: Vec<AnalyzerResult,>,
}

impl ScoreCard
{
    /// Builds a card from analyzer output.
    ///
    /// Dimensions without a result get a zero-score placeholder; when a
    /// dimension is reported twice the first result wins.
    pub fn from_results(results: Vec<AnalyzerResult,>,) -> Self
    {
        let mut ordered = Vec::with_capacity(Dimension::ALL.len(),);
        for dimension in Dimension::ALL {
            let mut matching = results.iter().filter(|result| result.dimension == dimension,);
            let result = match matching.next() {
                Some(result,) => {
                    if matching.next().is_some() {
                        warn!(%dimension, "duplicate analyzer result ignored");
                    }
                    let mut result = result.clone();
                    result.score = result.score.min(dimension.max_score(),);
                    result
                }
                None => {
                    warn!(%dimension, "no analyzer result, substituting zero score");
                    AnalyzerResult::unavailable(dimension, "analyzer did not run",)
                }
            };
            ordered.push(result,);
        }
        Self {
            results: ordered,
        }
    }

    /// Result for one dimension.
    pub fn get(&self, dimension: Dimension,) -> &AnalyzerResult
    {
        let index = Dimension::ALL.iter().position(|candidate| *candidate == dimension,).unwrap_or_default();
        &self.results[index]
    }

    /// Score for one dimension.
    pub fn score(&self, dimension: Dimension,) -> u32
    {
        self.get(dimension,).score
    }

    /// All results in reporting order.
    pub fn results(&self,) -> &[AnalyzerResult]
    {
        &self.results
    }

    /// Composite score of the card.
    pub fn composite(&self,) -> CompositeScore
    {
        aggregate(&self.results,)
    }
}

impl From<Vec<AnalyzerResult,>,> for ScoreCard
{
    fn from(results: Vec<AnalyzerResult,>,) -> Self
    {
        Self::from_results(results,)
    }
}

impl From<ScoreCard,> for Vec<AnalyzerResult,>
{
    fn from(card: ScoreCard,) -> Self
    {
        card.results
    }
}
