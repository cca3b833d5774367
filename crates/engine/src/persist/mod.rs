mod atomic_io;
mod kv;
mod snapshot;

pub use kv::{FileStore, KeyValueStore, MemoryStore, PersistenceError};
pub use snapshot::{GameStateSnapshot, SavedCache, SavedPlayer, SnapshotError, GAME_STATE_KEY};
