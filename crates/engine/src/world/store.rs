use std::collections::BTreeMap;

use thiserror::Error;

use super::cache::{Cache, CacheMemento};

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("failed to encode cache ({i},{j}): {source}")]
    EncodeMemento {
        i: i32,
        j: i32,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed memento for cache ({i},{j}): {source}")]
    MalformedMemento {
        i: i32,
        j: i32,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid cache key '{key}': expected \"i,j\"")]
    InvalidKey { key: String },
}

/// Authoritative per-cell cache state, held only in serialized form.
#[derive(Debug, Default, Clone)]
pub struct CacheStore {
    mementos: BTreeMap<(i32, i32), CacheMemento>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cache(&mut self, i: i32, j: i32, cache: &Cache) -> Result<(), CacheStoreError> {
        let memento = cache
            .to_memento()
            .map_err(|source| CacheStoreError::EncodeMemento { i, j, source })?;
        self.mementos.insert((i, j), memento);
        Ok(())
    }

    /// Returns a fresh `Cache` decoded from the stored memento, or `None` when
    /// nothing has been decided for this cell yet.
    pub fn get_cache(&self, i: i32, j: i32) -> Result<Option<Cache>, CacheStoreError> {
        let Some(memento) = self.mementos.get(&(i, j)) else {
            return Ok(None);
        };
        Cache::from_memento(memento)
            .map(Some)
            .map_err(|source| CacheStoreError::MalformedMemento { i, j, source })
    }

    pub fn contains(&self, i: i32, j: i32) -> bool {
        self.mementos.contains_key(&(i, j))
    }

    /// `("i,j", memento)` pairs in ascending `(i, j)` order.
    pub fn entries(&self) -> impl Iterator<Item = (String, &CacheMemento)> + '_ {
        self.mementos
            .iter()
            .map(|((i, j), memento)| (format!("{i},{j}"), memento))
    }

    pub fn install(&mut self, key: &str, memento: CacheMemento) -> Result<(), CacheStoreError> {
        let (i, j) = parse_cache_key(key)?;
        self.mementos.insert((i, j), memento);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.mementos.clear();
    }

    pub fn len(&self) -> usize {
        self.mementos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mementos.is_empty()
    }

    pub fn total_coins(&self) -> Result<usize, CacheStoreError> {
        let mut total = 0usize;
        for &(i, j) in self.mementos.keys() {
            if let Some(cache) = self.get_cache(i, j)? {
                total += cache.len();
            }
        }
        Ok(total)
    }
}

pub fn parse_cache_key(key: &str) -> Result<(i32, i32), CacheStoreError> {
    let invalid = || CacheStoreError::InvalidKey {
        key: key.to_string(),
    };
    let (raw_i, raw_j) = key.split_once(',').ok_or_else(invalid)?;
    let i = raw_i.trim().parse::<i32>().map_err(|_| invalid())?;
    let j = raw_j.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok((i, j))
}
