//! In-memory id sets used to tag arbitrary TMDB results as Globo content.
//!
//! Each set is `None` until populated. Sets are replaced wholesale, never
//! merged, and the lock is never held across an await: concurrent writers
//! race last-write-wins.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdSet {
    Movies,
    Series,
    Soaps,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationSnapshot {
    pub movies: Option<HashSet<i32>>,
    pub series: Option<HashSet<i32>>,
    pub soaps: Option<HashSet<i32>>,
}

fn contains(set: &Option<HashSet<i32>>, id: i32) -> bool {
    set.as_ref().is_some_and(|s| s.contains(&id))
}

impl ClassificationSnapshot {
    pub fn is_globo_movie(&self, id: i32) -> bool {
        contains(&self.movies, id)
    }

    pub fn is_soap(&self, id: i32) -> bool {
        contains(&self.soaps, id)
    }

    pub fn is_globo_series(&self, id: i32) -> bool {
        contains(&self.series, id)
    }

    /// Series or soap opera from the Globo network.
    pub fn is_globo_tv(&self, id: i32) -> bool {
        self.is_globo_series(id) || self.is_soap(id)
    }
}

#[derive(Debug, Default)]
pub struct ClassificationCache {
    inner: RwLock<ClassificationSnapshot>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, set: IdSet) -> Option<HashSet<i32>> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        match set {
            IdSet::Movies => guard.movies.clone(),
            IdSet::Series => guard.series.clone(),
            IdSet::Soaps => guard.soaps.clone(),
        }
    }

    pub fn is_populated(&self, set: IdSet) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        match set {
            IdSet::Movies => guard.movies.is_some(),
            IdSet::Series => guard.series.is_some(),
            IdSet::Soaps => guard.soaps.is_some(),
        }
    }

    pub fn set(&self, set: IdSet, ids: HashSet<i32>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match set {
            IdSet::Movies => guard.movies = Some(ids),
            IdSet::Series => guard.series = Some(ids),
            IdSet::Soaps => guard.soaps = Some(ids),
        }
    }

    /// Series and soap ids come from mutually exclusive genre filters and are
    /// always written together.
    pub fn set_tv(&self, series: HashSet<i32>, soaps: HashSet<i32>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.series = Some(series);
        guard.soaps = Some(soaps);
    }

    /// Overwrites all three sets in one write.
    pub fn replace_all(&self, snapshot: ClassificationSnapshot) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }

    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = ClassificationSnapshot::default();
    }

    pub fn snapshot(&self) -> ClassificationSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
