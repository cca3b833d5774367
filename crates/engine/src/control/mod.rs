mod capabilities;
mod config;
mod controller;
mod shared;

pub use capabilities::{ConfirmationProvider, PositionSource, ScriptedPositions};
pub use config::{
    ConfigError, GameConfig, ORIGIN_ENV_VAR, SPAWN_PROBABILITY_ENV_VAR, TILE_WIDTH_ENV_VAR,
    VISIBLE_RADIUS_ENV_VAR,
};
pub use controller::{
    ControllerError, GameState, GameStateController, LoadOutcome, VisibleCache, RESET_PROMPT,
};
pub use shared::SharedController;
