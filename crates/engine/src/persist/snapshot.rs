use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::{CacheMemento, CacheStore, CacheStoreError, Coin, LatLng, PlayerState};

pub const GAME_STATE_KEY: &str = "geocoin.game_state";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("encode game state json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("parse game state json: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("parse game state json at {path}: {source}")]
    ParseAt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("restore caches[{index}]: {source}")]
    InstallCache {
        index: usize,
        #[source]
        source: CacheStoreError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlayer {
    pub location: LatLng,
    pub inventory: Vec<Coin>,
    pub move_history: Vec<LatLng>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCache {
    pub key: String,
    pub momento: String,
}

/// The single persisted record: player plus every known cache memento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub player: SavedPlayer,
    pub caches: Vec<SavedCache>,
}

impl GameStateSnapshot {
    pub fn capture(player: &PlayerState, store: &CacheStore) -> Self {
        Self {
            player: SavedPlayer {
                location: player.location(),
                inventory: player.inventory().to_vec(),
                move_history: player.move_history().to_vec(),
            },
            caches: store
                .entries()
                .map(|(key, memento)| SavedCache {
                    key,
                    momento: memento.as_str().to_string(),
                })
                .collect(),
        }
    }

    pub fn restore_player(&self) -> PlayerState {
        PlayerState::from_parts(
            self.player.location,
            self.player.inventory.clone(),
            self.player.move_history.clone(),
        )
    }

    /// Replaces the contents of `store` with the saved mementos.
    pub fn restore_caches(&self, store: &mut CacheStore) -> Result<(), SnapshotError> {
        store.clear();
        for (index, saved) in self.caches.iter().enumerate() {
            store
                .install(&saved.key, CacheMemento::from_raw(saved.momento.as_str()))
                .map_err(|source| SnapshotError::InstallCache { index, source })?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Encode)
    }

    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        match serde_path_to_error::deserialize::<_, Self>(&mut deserializer) {
            Ok(snapshot) => Ok(snapshot),
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                if path.is_empty() || path == "." {
                    Err(SnapshotError::Parse(source))
                } else {
                    Err(SnapshotError::ParseAt { path, source })
                }
            }
        }
    }
}
