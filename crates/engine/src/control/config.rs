use std::env;

use thiserror::Error;

use crate::world::{LatLng, WorldGenerator, DEFAULT_MAX_COINS_PER_CACHE};

pub const TILE_WIDTH_ENV_VAR: &str = "GEOCOIN_TILE_WIDTH";
pub const VISIBLE_RADIUS_ENV_VAR: &str = "GEOCOIN_VISIBLE_RADIUS";
pub const SPAWN_PROBABILITY_ENV_VAR: &str = "GEOCOIN_SPAWN_PROBABILITY";
pub const ORIGIN_ENV_VAR: &str = "GEOCOIN_ORIGIN";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidEnvValue {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("tile_width must be finite and positive, got {0}")]
    TileWidth(f64),
    #[error("spawn_probability must be within [0, 1], got {0}")]
    SpawnProbability(f64),
    #[error("evict_radius {evict_radius} must be at least visible_radius {visible_radius}")]
    EvictRadius {
        evict_radius: u32,
        visible_radius: u32,
    },
    #[error("origin must be finite, got ({lat}, {lng})")]
    Origin { lat: f64, lng: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub tile_width: f64,
    pub visible_radius: u32,
    pub spawn_probability: f64,
    pub max_coins_per_cache: u32,
    pub origin: LatLng,
    /// Interned cells farther than this (in cells) from the player are dropped.
    pub evict_radius: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_width: 1e-4,
            visible_radius: 8,
            spawn_probability: 0.1,
            max_coins_per_cache: DEFAULT_MAX_COINS_PER_CACHE,
            origin: LatLng::new(36.9895, -122.0628),
            evict_radius: 64,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(TILE_WIDTH_ENV_VAR) {
            config.tile_width = parse_number(TILE_WIDTH_ENV_VAR, &raw)?;
        }
        if let Some(raw) = lookup(VISIBLE_RADIUS_ENV_VAR) {
            config.visible_radius = parse_number(VISIBLE_RADIUS_ENV_VAR, &raw)?;
            config.evict_radius = config.evict_radius.max(config.visible_radius);
        }
        if let Some(raw) = lookup(SPAWN_PROBABILITY_ENV_VAR) {
            config.spawn_probability = parse_number(SPAWN_PROBABILITY_ENV_VAR, &raw)?;
        }
        if let Some(raw) = lookup(ORIGIN_ENV_VAR) {
            config.origin = parse_origin(&raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tile_width.is_finite() && self.tile_width > 0.0) {
            return Err(ConfigError::TileWidth(self.tile_width));
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(ConfigError::SpawnProbability(self.spawn_probability));
        }
        if self.evict_radius < self.visible_radius {
            return Err(ConfigError::EvictRadius {
                evict_radius: self.evict_radius,
                visible_radius: self.visible_radius,
            });
        }
        if !self.origin.is_finite() {
            return Err(ConfigError::Origin {
                lat: self.origin.lat,
                lng: self.origin.lng,
            });
        }
        Ok(())
    }

    pub fn generator(&self) -> WorldGenerator {
        WorldGenerator {
            spawn_probability: self.spawn_probability,
            max_coins_per_cache: self.max_coins_per_cache,
        }
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|error| ConfigError::InvalidEnvValue {
            var,
            value: raw.to_string(),
            reason: error.to_string(),
        })
}

fn parse_origin(raw: &str) -> Result<LatLng, ConfigError> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| ConfigError::InvalidEnvValue {
            var: ORIGIN_ENV_VAR,
            value: raw.to_string(),
            reason: "expected 'lat,lng'".to_string(),
        })?;
    Ok(LatLng {
        lat: parse_number(ORIGIN_ENV_VAR, lat)?,
        lng: parse_number(ORIGIN_ENV_VAR, lng)?,
    })
}
