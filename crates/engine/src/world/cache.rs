use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub i: i32,
    pub j: i32,
    pub serial: u32,
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.i, self.j, self.serial)
    }
}

/// Materialized view of one cell's coins. Changes only become durable once the
/// cache is written back with `CacheStore::set_cache`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    pub i: i32,
    pub j: i32,
    pub coins: Vec<Coin>,
}

impl Cache {
    pub fn new(i: i32, j: i32) -> Self {
        Self {
            i,
            j,
            coins: Vec::new(),
        }
    }

    /// Cache minted at `(i, j)` holding serials `0..count`.
    pub fn minted(i: i32, j: i32, count: u32) -> Self {
        Self {
            i,
            j,
            coins: (0..count).map(|serial| Coin { i, j, serial }).collect(),
        }
    }

    /// Removes the first coin matching the full `(i, j, serial)` identity.
    pub fn take_coin(&mut self, coin: &Coin) -> Option<Coin> {
        let index = self.coins.iter().position(|held| held == coin)?;
        Some(self.coins.remove(index))
    }

    pub fn push_coin(&mut self, coin: Coin) {
        self.coins.push(coin);
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn to_memento(&self) -> Result<CacheMemento, serde_json::Error> {
        serde_json::to_string(self).map(CacheMemento)
    }

    pub fn from_memento(memento: &CacheMemento) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&memento.0)
    }
}

/// Serialized `{i, j, coins}` snapshot of a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMemento(String);

impl CacheMemento {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
