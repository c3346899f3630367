// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{AnalysisRecord, AnalysisStore, Completion, MAX_HISTORY_LIMIT, expiry, missing};
use crate::{error::Error, metrics::AnalysisMetrics, repo_id::RepoId, snapshot::RepositoryInfo};

#[derive(Debug, Default,)]
struct State
{
    /// Insertion order doubles as creation order.
    analyses: Vec<AnalysisRecord,>,
    metrics:  HashMap<String, AnalysisMetrics,>,
    cache:    HashMap<String, (RepositoryInfo, DateTime<Utc,>,),>,
}

/// Process-local store for tests and one-shot runs.
#[derive(Debug, Default,)]
pub struct MemoryStore
{
    state: Mutex<State,>,
}

impl MemoryStore
{
    pub fn new() -> Self
    {
        Self::default()
    }

    fn lock(&self,) -> Result<MutexGuard<'_, State,>, Error,>
    {
        self.state.lock().map_err(|_| Error::service("memory store lock poisoned",),)
    }

    fn update<F,>(&self, id: &str, apply: F,) -> Result<(), Error,>
    where
        F: FnOnce(&mut AnalysisRecord,) -> Result<(), Error,>,
    {
        let mut state = self.lock()?;
        let record = state.analyses.iter_mut().find(|record| record.id == id,).ok_or_else(|| missing(id,),)?;
        apply(record,)
    }
}

impl AnalysisStore for MemoryStore
{
    fn create_analysis(&self, repo: &RepoId, repo_url: &str,) -> Result<AnalysisRecord, Error,>
    {
        let record = AnalysisRecord::pending(repo, repo_url,);
        self.lock()?.analyses.push(record.clone(),);
        debug!("created analysis {} for {}", record.id, repo);
        Ok(record,)
    }

    fn update_progress(&self, id: &str, progress: u8, step: &str,) -> Result<(), Error,>
    {
        self.update(id, |record| record.advance(progress, step,),)
    }

    fn complete_analysis(&self, id: &str, completion: &Completion,) -> Result<(), Error,>
    {
        self.update(id, |record| record.complete(completion,),)
    }

    fn fail_analysis(&self, id: &str, message: &str,) -> Result<(), Error,>
    {
        self.update(id, |record| record.fail(message,),)?;
        self.lock()?.metrics.remove(id,);
        Ok((),)
    }

    fn save_metrics(&self, id: &str, metrics: &AnalysisMetrics,) -> Result<(), Error,>
    {
        let mut state = self.lock()?;
        if !state.analyses.iter().any(|record| record.id == id,) {
            return Err(missing(id,),);
        }
        state.metrics.insert(id.to_owned(), metrics.clone(),);
        Ok((),)
    }

    fn analysis(&self, id: &str,) -> Result<Option<AnalysisRecord,>, Error,>
    {
        Ok(self.lock()?.analyses.iter().find(|record| record.id == id,).cloned(),)
    }

    fn metrics(&self, id: &str,) -> Result<Option<AnalysisMetrics,>, Error,>
    {
        Ok(self.lock()?.metrics.get(id,).cloned(),)
    }

    fn history(&self, limit: usize, offset: usize,) -> Result<Vec<AnalysisRecord,>, Error,>
    {
        let state = self.lock()?;
        Ok(state.analyses.iter().rev().skip(offset,).take(limit.min(MAX_HISTORY_LIMIT,),).cloned().collect(),)
    }

    fn cached_repository(&self, key: &str,) -> Result<Option<RepositoryInfo,>, Error,>
    {
        let now = Utc::now();
        Ok(self
            .lock()?
            .cache
            .get(key,)
            .filter(|(_, expires_at,)| *expires_at > now,)
            .map(|(info, _,)| info.clone(),),)
    }

    fn cache_repository(&self, key: &str, info: &RepositoryInfo, ttl_secs: u64,) -> Result<(), Error,>
    {
        let expires_at = expiry(Utc::now(), ttl_secs,)?;
        self.lock()?.cache.insert(key.to_owned(), (info.clone(), expires_at,),);
        Ok((),)
    }

    fn purge_expired_cache(&self,) -> Result<usize, Error,>
    {
        let now = Utc::now();
        let mut state = self.lock()?;
        let before = state.cache.len();
        state.cache.retain(|_, (_, expires_at,)| *expires_at > now,);
        Ok(before - state.cache.len(),)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::store::contract;

    #[test]
    fn lifecycle()
    {
        contract::lifecycle(&MemoryStore::new(),);
    }

    #[test]
    fn terminal_records_are_immutable()
    {
        contract::terminal_records_are_immutable(&MemoryStore::new(),);
    }

    #[test]
    fn failure_discards_metrics()
    {
        contract::failure_discards_metrics(&MemoryStore::new(),);
    }

    #[test]
    fn unknown_ids()
    {
        contract::unknown_ids(&MemoryStore::new(),);
    }

    #[test]
    fn history_is_newest_first()
    {
        contract::history_is_newest_first(&MemoryStore::new(),);
    }

    #[test]
    fn cache_expires()
    {
        contract::cache_expires(&MemoryStore::new(),);
    }
}
