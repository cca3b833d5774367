use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod control;
pub mod persist;
pub mod world;

pub use control::{
    ConfigError, ConfirmationProvider, ControllerError, GameConfig, GameState,
    GameStateController, LoadOutcome, PositionSource, ScriptedPositions, SharedController,
    VisibleCache, RESET_PROMPT,
};
pub use persist::{
    FileStore, GameStateSnapshot, KeyValueStore, MemoryStore, PersistenceError, SnapshotError,
    GAME_STATE_KEY,
};
pub use world::{
    hash_unit, Cache, CacheMemento, CacheStore, CacheStoreError, Cell, CellBounds, CellGrid,
    Coin, Direction, LatLng, PlayerState, WorldGenerator,
};

pub const ROOT_ENV_VAR: &str = "GEOCOIN_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub save_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("GEOCOIN_ROOT is set but is not a directory: {path}")]
    InvalidEnvRoot { path: PathBuf },
    #[error("failed to create save directory at {path}: {source}")]
    CreateSaveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let save_dir = root.join("saves");

    fs::create_dir_all(&save_dir).map_err(|source| StartupError::CreateSaveDir {
        path: save_dir.clone(),
        source,
    })?;

    Ok(AppPaths { root, save_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if normalized.is_dir() {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => env::current_dir()
            .map(|dir| normalize_path(&dir))
            .map_err(StartupError::CurrentDir),
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
