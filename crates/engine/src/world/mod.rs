mod cache;
mod geo;
mod grid;
mod hashing;
mod player;
mod store;
mod worldgen;

pub use cache::{Cache, CacheMemento, Coin};
pub use geo::{CellBounds, LatLng};
pub use grid::{Cell, CellGrid};
pub use hashing::{coins_key, hash_unit, spawn_key};
pub use player::{Direction, PlayerState};
pub use store::{parse_cache_key, CacheStore, CacheStoreError};
pub use worldgen::{WorldGenerator, DEFAULT_MAX_COINS_PER_CACHE};
