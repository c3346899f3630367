// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Parsing of user-supplied repository identifiers.
//!
//! Two shapes are accepted: a full `https://github.com/<owner>/<repo>` URL
//! (optionally with `www.`, a trailing slash, or a `.git` suffix) and the
//! `owner/repo` shorthand. Everything else is rejected before an analysis
//! record is created.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

static GITHUB_URL: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?github\.com/([A-Za-z0-9_-]+)/([A-Za-z0-9_.-]+)/?$",)
        .expect("valid repository url pattern",)
},);

static SHORTHAND: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]+)/([A-Za-z0-9_.-]+)$",).expect("valid shorthand pattern",)
},);

/// Owner and repository name identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,)]
pub struct RepoId
{
    /// Account or organization owning the repository.
    pub owner: String,
    /// Repository name without a `.git` suffix.
    pub repo:  String,
}

impl RepoId
{
    /// Parses a repository URL or `owner/repo` shorthand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the input matches neither shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use repograde::RepoId;
    ///
    /// let id = RepoId::parse("https://github.com/octocat/Hello-World.git",)?;
    /// assert_eq!(id.owner, "octocat");
    /// assert_eq!(id.repo, "Hello-World");
    /// # Ok::<(), repograde::Error>(())
    /// ```
    pub fn parse(input: &str,) -> Result<Self, Error,>
    {
        let trimmed = input.trim();
        let captures = GITHUB_URL
            .captures(trimmed,)
            .or_else(|| SHORTHAND.captures(trimmed,),)
            .ok_or_else(|| Error::validation("Invalid GitHub repository URL format",),)?;

        let owner = captures[1].to_owned();
        let raw_repo = &captures[2];
        let repo = raw_repo.strip_suffix(".git",).unwrap_or(raw_repo,).to_owned();

        if repo.is_empty() || repo == "." || repo == ".." {
            return Err(Error::validation("Invalid GitHub repository URL format",),);
        }

        Ok(Self {
            owner,
            repo,
        },)
    }

    /// Key under which repository metadata is cached.
    pub fn cache_key(&self,) -> String
    {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Canonical web URL for the repository.
    pub fn url(&self,) -> String
    {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
