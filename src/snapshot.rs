// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Immutable repository data gathered once per analysis.
//!
//! A [`RepoSnapshot`] is assembled by the orchestrator from the repository
//! source and then shared read-only with every analyzer. The types double as
//! the JSON format accepted by `repograde score --snapshot`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of an entry in the repository tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind
{
    /// Regular file.
    #[default]
    Blob,
    /// Directory.
    Tree,
    /// Submodule reference.
    Commit,
}

/// Single entry of the flattened repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct FileEntry
{
    /// Slash-separated path relative to the repository root.
    pub path: String,
    /// Entry kind as reported by the tree API.
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    /// Size in bytes; directories carry none.
    #[serde(default)]
    pub size: Option<u64,>,
}

impl FileEntry
{
    /// Creates a blob entry with a known size.
    pub fn blob(path: impl Into<String,>, size: u64,) -> Self
    {
        Self {
            path: path.into(), kind: EntryKind::Blob, size: Some(size,),
        }
    }

    /// Creates a directory entry.
    pub fn tree(path: impl Into<String,>,) -> Self
    {
        Self {
            path: path.into(), kind: EntryKind::Tree, size: None,
        }
    }

    /// Size in bytes, treating a missing size as zero.
    pub fn size_or_zero(&self,) -> u64
    {
        self.size.unwrap_or(0,)
    }

    /// Final path component.
    pub fn file_name(&self,) -> &str
    {
        self.path.rsplit('/',).next().unwrap_or(&self.path,)
    }

    /// Parent directory, `"."` for root entries.
    pub fn parent(&self,) -> &str
    {
        match self.path.rfind('/',) {
            Some(index,) if index > 0 => &self.path[..index],
            Some(_,) => "/",
            None => ".",
        }
    }

    /// Number of slash-separated segments in the path.
    pub fn depth(&self,) -> usize
    {
        self.path.split('/',).count()
    }

    /// Lowercased extension including the leading dot, if any.
    ///
    /// Dotfiles such as `.gitignore` have no extension.
    pub fn extension(&self,) -> Option<String,>
    {
        let name = self.file_name();
        let index = name.rfind('.',)?;
        if index == 0 {
            return None;
        }
        Some(name[index..].to_ascii_lowercase(),)
    }
}

/// README document fetched from the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct Readme
{
    /// Decoded markdown content, possibly truncated.
    pub content: String,
    /// Size in bytes reported by the API.
    #[serde(default)]
    pub size:    u64,
}

impl Readme
{
    /// Length of the content in UTF-16 code units.
    ///
    /// Length tiers were calibrated against this measure, so a character
    /// outside the basic multilingual plane counts twice.
    pub fn len(&self,) -> usize
    {
        self.content.encode_utf16().count()
    }

    /// Reports whether the README has no content.
    pub fn is_empty(&self,) -> bool
    {
        self.content.is_empty()
    }
}

/// Commit summary used by the git practices analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct CommitInfo
{
    /// Full commit message.
    pub message: String,
    /// Author name, when known.
    #[serde(default)]
    pub author:  Option<String,>,
    /// Author date as reported by the API.
    #[serde(default)]
    pub date:    Option<String,>,
}

/// Branch name and protection flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct BranchInfo
{
    /// Branch name.
    pub name:      String,
    /// Whether branch protection is enabled.
    #[serde(default)]
    pub protected: bool,
}

/// Aggregate pull request counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,)]
pub struct PullRequestStats
{
    /// All pull requests inspected.
    pub total:  u32,
    /// Currently open.
    pub open:   u32,
    /// Closed, merged or not.
    pub closed: u32,
    /// Merged.
    pub merged: u32,
}

/// Contributor login and contribution count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct Contributor
{
    /// GitHub login.
    pub username:      String,
    /// Number of contributions attributed to the login.
    pub contributions: u32,
}

/// Repository metadata, consumed by the narrative and persistence layers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize,)]
pub struct RepositoryInfo
{
    /// Repository name.
    pub name:           String,
    /// `owner/name`.
    pub full_name:      String,
    /// Owner login.
    pub owner:          String,
    /// Free-form description.
    #[serde(default)]
    pub description:    Option<String,>,
    /// Primary language detected by GitHub.
    #[serde(default)]
    pub language:       Option<String,>,
    /// Stargazer count.
    #[serde(default)]
    pub stars:          u32,
    /// Fork count.
    #[serde(default)]
    pub forks:          u32,
    /// Open issue count.
    #[serde(default)]
    pub open_issues:    u32,
    /// Default branch used to fetch the tree.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// License name, when detected.
    #[serde(default)]
    pub license:        Option<String,>,
}

fn default_branch() -> String
{
    "main".to_owned()
}

/// Everything the analyzers look at for one repository.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize,)]
pub struct RepoSnapshot
{
    /// Flattened tree in API order.
    #[serde(default)]
    pub files:         Vec<FileEntry,>,
    /// README, when the repository has one.
    #[serde(default)]
    pub readme:        Option<Readme,>,
    /// Commit history, when it could be fetched.
    #[serde(default)]
    pub commits:       Option<Vec<CommitInfo,>,>,
    /// Branches with protection flags.
    #[serde(default)]
    pub branches:      Vec<BranchInfo,>,
    /// Pull request counts, when known.
    #[serde(default)]
    pub pull_requests: Option<PullRequestStats,>,
    /// Language name to percentage of bytes.
    #[serde(default)]
    pub languages:     BTreeMap<String, f64,>,
    /// Contributors ordered as reported.
    #[serde(default)]
    pub contributors:  Vec<Contributor,>,
}

impl RepoSnapshot
{
    /// Creates a snapshot containing only a file list.
    pub fn from_files(files: Vec<FileEntry,>,) -> Self
    {
        Self {
            files, ..Self::default()
        }
    }

    /// Reports whether any entry has exactly the given path.
    pub fn has_path(&self, path: &str,) -> bool
    {
        self.files.iter().any(|file| file.path == path,)
    }

    /// Reports whether any entry path contains `needle`.
    pub fn any_path_contains(&self, needle: &str,) -> bool
    {
        self.files.iter().any(|file| file.path.contains(needle,),)
    }

    /// Number of commits, zero when history is unavailable.
    pub fn commit_count(&self,) -> usize
    {
        self.commits.as_ref().map_or(0, Vec::len,)
    }

    /// Sum of all known entry sizes in bytes.
    pub fn total_size(&self,) -> u64
    {
        self.files.iter().map(FileEntry::size_or_zero,).sum()
    }
}
