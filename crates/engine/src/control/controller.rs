use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::persist::{
    GameStateSnapshot, KeyValueStore, PersistenceError, SnapshotError, GAME_STATE_KEY,
};
use crate::world::{
    Cache, CacheStore, CacheStoreError, Cell, CellBounds, CellGrid, Coin, Direction, LatLng,
    PlayerState, WorldGenerator,
};

use super::capabilities::{ConfirmationProvider, PositionSource};
use super::config::GameConfig;

pub const RESET_PROMPT: &str = "Reset the game? All coins return to their caches.";

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] CacheStoreError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("no cache at ({i},{j})")]
    NoCache { i: i32, j: i32 },
    #[error("coin {coin} is not in cache ({i},{j})")]
    CoinNotInCache { i: i32, j: i32, coin: Coin },
    #[error("location ({lat}, {lng}) is outside the playable grid")]
    UnaddressableLocation { lat: f64, lng: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Fresh,
    Restored { cache_count: usize },
    Discarded,
}

/// What the map layer needs to draw one cache.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleCache {
    pub cell: Arc<Cell>,
    pub bounds: CellBounds,
    pub cache: Cache,
}

/// Everything a handler may mutate.
#[derive(Debug)]
pub struct GameState {
    pub grid: CellGrid,
    pub store: CacheStore,
    pub player: PlayerState,
}

impl GameState {
    pub fn fresh(config: &GameConfig) -> Self {
        Self {
            grid: CellGrid::new(config.tile_width),
            store: CacheStore::new(),
            player: PlayerState::at(config.origin),
        }
    }

    pub fn total_coins(&self) -> Result<usize, CacheStoreError> {
        Ok(self.store.total_coins()? + self.player.inventory().len())
    }
}

pub struct GameStateController<S> {
    config: GameConfig,
    generator: WorldGenerator,
    state: GameState,
    persistence: S,
}

impl<S: KeyValueStore> GameStateController<S> {
    pub fn new(config: GameConfig, persistence: S) -> Self {
        Self {
            generator: config.generator(),
            state: GameState::fresh(&config),
            config,
            persistence,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn player(&self) -> &PlayerState {
        &self.state.player
    }

    pub fn persistence(&self) -> &S {
        &self.persistence
    }

    pub fn total_coins(&self) -> Result<usize, ControllerError> {
        Ok(self.state.total_coins()?)
    }

    pub fn save(&mut self) -> Result<(), ControllerError> {
        let json = GameStateSnapshot::capture(&self.state.player, &self.state.store).to_json()?;
        self.persistence.set(GAME_STATE_KEY, &json)?;
        debug!(
            cache_count = self.state.store.len(),
            inventory = self.state.player.inventory().len(),
            "game_saved"
        );
        Ok(())
    }

    /// Restores the persisted record. A missing, unreadable or unparsable
    /// record leaves a fresh game instead of failing.
    pub fn load(&mut self) -> LoadOutcome {
        let raw = match self.persistence.get(GAME_STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.start_fresh();
                info!("game_started_fresh");
                return LoadOutcome::Fresh;
            }
            Err(error) => {
                warn!(error = %error, "game_state_unreadable");
                self.start_fresh();
                return LoadOutcome::Discarded;
            }
        };

        let restored = GameStateSnapshot::from_json(&raw).and_then(|snapshot| {
            let mut store = CacheStore::new();
            snapshot.restore_caches(&mut store)?;
            Ok((snapshot.restore_player(), store))
        });
        match restored {
            Ok((player, store)) => {
                let cache_count = store.len();
                self.state.player = player;
                self.state.store = store;
                info!(
                    cache_count,
                    inventory = self.state.player.inventory().len(),
                    "game_loaded"
                );
                LoadOutcome::Restored { cache_count }
            }
            Err(error) => {
                warn!(error = %error, "game_state_discarded");
                self.start_fresh();
                LoadOutcome::Discarded
            }
        }
    }

    /// Returns every held coin to its origin cache, sends the player back to
    /// `origin` and erases the persisted record. Returns how many coins moved.
    /// A coin leaves the inventory only after its cache is stored.
    pub fn reset(&mut self, origin: LatLng) -> Result<usize, ControllerError> {
        let mut returned = 0usize;
        while let Some(coin) = self.state.player.oldest_coin() {
            let mut cache = self
                .state
                .store
                .get_cache(coin.i, coin.j)?
                .unwrap_or_else(|| Cache::new(coin.i, coin.j));
            cache.push_coin(coin);
            self.state.store.set_cache(coin.i, coin.j, &cache)?;
            self.state.player.remove_oldest_coin();
            returned += 1;
        }
        self.state.player.reset_to(origin);
        self.persistence.clear()?;
        info!(
            returned_coins = returned,
            lat = origin.lat,
            lng = origin.lng,
            "game_reset"
        );
        Ok(returned)
    }

    /// Resets to the configured origin only if `confirmation` agrees.
    pub fn reset_confirmed(
        &mut self,
        confirmation: &mut dyn ConfirmationProvider,
    ) -> Result<bool, ControllerError> {
        if !confirmation.confirm(RESET_PROMPT) {
            debug!("game_reset_declined");
            return Ok(false);
        }
        self.reset(self.config.origin)?;
        Ok(true)
    }

    pub fn refresh_visible(&mut self) -> Result<Vec<VisibleCache>, ControllerError> {
        let location = self.state.player.location();
        let cells = self
            .state
            .grid
            .cells_near(location, self.config.visible_radius);
        let mut visible = Vec::new();
        for cell in cells {
            if let Some(cache) = self
                .generator
                .resolve(&mut self.state.store, cell.i, cell.j)?
            {
                visible.push(VisibleCache {
                    bounds: self.state.grid.cell_bounds(&cell),
                    cell,
                    cache,
                });
            }
        }
        Ok(visible)
    }

    /// Position-sensor callback: relocate, regenerate the neighborhood, persist.
    /// Non-finite or off-grid samples are rejected and leave the player put.
    pub fn handle_position(
        &mut self,
        location: LatLng,
    ) -> Result<Vec<VisibleCache>, ControllerError> {
        self.ensure_addressable(location)?;
        self.state.player.move_to(location);
        self.after_move()
    }

    pub fn handle_step(
        &mut self,
        direction: Direction,
    ) -> Result<Vec<VisibleCache>, ControllerError> {
        let target = self
            .state
            .player
            .step_target(direction, self.config.tile_width);
        self.ensure_addressable(target)?;
        self.state
            .player
            .step(direction, self.config.tile_width);
        self.after_move()
    }

    /// Feeds every sample from `source` through `handle_position`, one at a time.
    pub fn drive_positions(
        &mut self,
        source: &mut dyn PositionSource,
    ) -> Result<usize, ControllerError> {
        let mut handled = 0usize;
        while let Some(location) = source.next_position() {
            self.handle_position(location)?;
            handled += 1;
        }
        Ok(handled)
    }

    pub fn collect_coin(&mut self, i: i32, j: i32, coin: Coin) -> Result<Coin, ControllerError> {
        let mut cache = self
            .state
            .store
            .get_cache(i, j)?
            .ok_or(ControllerError::NoCache { i, j })?;
        let taken = cache
            .take_coin(&coin)
            .ok_or(ControllerError::CoinNotInCache { i, j, coin })?;
        self.state.player.collect(taken);
        self.state.store.set_cache(i, j, &cache)?;
        info!(i, j, coin = %taken, remaining = cache.len(), "coin_collected");
        self.save()?;
        Ok(taken)
    }

    /// Moves the most recent inventory coin into the cache at `(i, j)`.
    /// `Ok(None)` when the inventory is empty.
    pub fn deposit_coin(&mut self, i: i32, j: i32) -> Result<Option<Coin>, ControllerError> {
        let mut cache = self
            .state
            .store
            .get_cache(i, j)?
            .ok_or(ControllerError::NoCache { i, j })?;
        let Some(coin) = self.state.player.deposit() else {
            debug!(i, j, "deposit_with_empty_inventory");
            return Ok(None);
        };
        cache.push_coin(coin);
        self.state.store.set_cache(i, j, &cache)?;
        info!(i, j, coin = %coin, held = cache.len(), "coin_deposited");
        self.save()?;
        Ok(Some(coin))
    }

    pub fn cache_at(&self, i: i32, j: i32) -> Result<Option<Cache>, ControllerError> {
        Ok(self.state.store.get_cache(i, j)?)
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut CacheStore {
        &mut self.state.store
    }

    fn ensure_addressable(&self, location: LatLng) -> Result<(), ControllerError> {
        if self.state.grid.is_addressable(location) {
            return Ok(());
        }
        warn!(
            lat = location.lat,
            lng = location.lng,
            "location_rejected"
        );
        Err(ControllerError::UnaddressableLocation {
            lat: location.lat,
            lng: location.lng,
        })
    }

    fn after_move(&mut self) -> Result<Vec<VisibleCache>, ControllerError> {
        let visible = self.refresh_visible()?;
        let center = self.state.grid.cell_for_point(self.state.player.location());
        let evicted = self
            .state
            .grid
            .evict_beyond(&center, self.config.evict_radius);
        if evicted > 0 {
            debug!(evicted, "grid_cells_evicted");
        }
        self.save()?;
        Ok(visible)
    }

    fn start_fresh(&mut self) {
        self.state.player = PlayerState::at(self.config.origin);
        self.state.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::capabilities::ScriptedPositions;
    use crate::persist::MemoryStore;
    use crate::world::CacheMemento;

    fn always_spawn_config() -> GameConfig {
        GameConfig {
            spawn_probability: 1.0,
            visible_radius: 1,
            ..GameConfig::default()
        }
    }

    fn controller_with(config: GameConfig) -> GameStateController<MemoryStore> {
        GameStateController::new(config, MemoryStore::new())
    }

    fn seeded_cache(
        controller: &mut GameStateController<MemoryStore>,
        i: i32,
        j: i32,
        count: u32,
    ) {
        controller
            .state
            .store
            .set_cache(i, j, &Cache::minted(i, j, count))
            .expect("seed cache");
    }

    fn coin(i: i32, j: i32, serial: u32) -> Coin {
        Coin { i, j, serial }
    }

    #[test]
    fn collect_then_deposit_appends_coin_at_end() {
        let mut controller = controller_with(GameConfig::default());
        seeded_cache(&mut controller, 0, 0, 3);

        controller.collect_coin(0, 0, coin(0, 0, 1)).expect("collect");
        assert_eq!(
            controller.cache_at(0, 0).expect("get").expect("cache").coins,
            vec![coin(0, 0, 0), coin(0, 0, 2)]
        );
        assert_eq!(controller.player().inventory(), &[coin(0, 0, 1)]);

        let deposited = controller.deposit_coin(0, 0).expect("deposit");
        assert_eq!(deposited, Some(coin(0, 0, 1)));
        assert_eq!(
            controller.cache_at(0, 0).expect("get").expect("cache").coins,
            vec![coin(0, 0, 0), coin(0, 0, 2), coin(0, 0, 1)]
        );
        assert!(controller.player().inventory().is_empty());
    }

    #[test]
    fn collect_and_deposit_persist_immediately() {
        let mut controller = controller_with(GameConfig::default());
        seeded_cache(&mut controller, 4, 4, 2);
        controller.collect_coin(4, 4, coin(4, 4, 0)).expect("collect");

        let raw = controller
            .persistence()
            .get(GAME_STATE_KEY)
            .expect("get")
            .expect("saved");
        let snapshot = GameStateSnapshot::from_json(&raw).expect("parse");
        assert_eq!(snapshot.player.inventory, vec![coin(4, 4, 0)]);
    }

    #[test]
    fn collect_matches_full_coin_identity() {
        let mut controller = controller_with(GameConfig::default());
        seeded_cache(&mut controller, 0, 0, 2);
        seeded_cache(&mut controller, 5, 5, 2);

        controller.collect_coin(5, 5, coin(5, 5, 1)).expect("collect");
        controller.deposit_coin(0, 0).expect("deposit");

        let error = controller
            .collect_coin(0, 0, coin(0, 0, 9))
            .expect_err("unknown serial");
        assert!(matches!(error, ControllerError::CoinNotInCache { .. }));

        controller.collect_coin(0, 0, coin(5, 5, 1)).expect("collect foreign");
        assert_eq!(
            controller.cache_at(0, 0).expect("get").expect("cache").coins,
            vec![coin(0, 0, 0), coin(0, 0, 1)]
        );
    }

    #[test]
    fn deposit_with_empty_inventory_is_noop() {
        let mut controller = controller_with(GameConfig::default());
        seeded_cache(&mut controller, 1, 1, 1);
        assert_eq!(controller.deposit_coin(1, 1).expect("deposit"), None);
        assert_eq!(controller.cache_at(1, 1).expect("get").expect("cache").len(), 1);
    }

    #[test]
    fn deposit_into_missing_cache_keeps_coin() {
        let mut controller = controller_with(GameConfig::default());
        seeded_cache(&mut controller, 1, 1, 1);
        controller.collect_coin(1, 1, coin(1, 1, 0)).expect("collect");

        let error = controller.deposit_coin(2, 2).expect_err("no cache");
        assert!(matches!(error, ControllerError::NoCache { i: 2, j: 2 }));
        assert_eq!(controller.player().inventory().len(), 1);
    }

    #[test]
    fn reset_conserves_coins_and_clears_record() {
        let mut controller = controller_with(always_spawn_config());
        seeded_cache(&mut controller, 0, 0, 3);
        seeded_cache(&mut controller, 1, 0, 2);
        controller.collect_coin(0, 0, coin(0, 0, 2)).expect("collect");
        controller.collect_coin(1, 0, coin(1, 0, 0)).expect("collect");
        controller.deposit_coin(0, 0).expect("deposit into other cache");
        controller
            .handle_position(LatLng::new(0.01, 0.01))
            .expect("move");

        let before = controller.total_coins().expect("total");
        let origin = LatLng::new(0.0, 0.0);
        let returned = controller.reset(origin).expect("reset");
        let after = controller.total_coins().expect("total");

        assert_eq!(returned, 1);
        assert_eq!(before, after);
        assert!(controller.player().inventory().is_empty());
        assert!(controller.player().move_history().is_empty());
        assert_eq!(controller.player().location(), origin);
        assert_eq!(controller.persistence().get(GAME_STATE_KEY).expect("get"), None);
        assert_eq!(
            controller.cache_at(0, 0).expect("get").expect("cache").coins,
            vec![coin(0, 0, 0), coin(0, 0, 1), coin(1, 0, 0), coin(0, 0, 2)]
        );
    }

    #[test]
    fn reset_recreates_origin_cache_when_missing() {
        let mut controller = controller_with(GameConfig::default());
        controller.state.player.collect(coin(7, 7, 3));
        let before = controller.total_coins().expect("total");

        controller.reset(LatLng::new(0.0, 0.0)).expect("reset");
        assert_eq!(controller.total_coins().expect("total"), before);
        assert_eq!(
            controller.cache_at(7, 7).expect("get").expect("cache").coins,
            vec![coin(7, 7, 3)]
        );
    }

    #[test]
    fn reset_failure_keeps_unreturned_coins_held() {
        let mut controller = controller_with(GameConfig::default());
        seeded_cache(&mut controller, 0, 0, 2);
        controller.state.player.collect(coin(0, 0, 5));
        controller.state.player.collect(coin(7, 7, 0));
        controller
            .store_mut()
            .install("7,7", CacheMemento::from_raw("{not json"))
            .expect("install");

        let error = controller
            .reset(LatLng::new(0.0, 0.0))
            .expect_err("malformed cache");
        assert!(matches!(
            error,
            ControllerError::Store(CacheStoreError::MalformedMemento { .. })
        ));
        assert_eq!(controller.player().inventory(), &[coin(7, 7, 0)]);
        assert_eq!(
            controller.cache_at(0, 0).expect("get").expect("cache").coins,
            vec![coin(0, 0, 0), coin(0, 0, 1), coin(0, 0, 5)]
        );
    }

    #[test]
    fn off_grid_positions_are_rejected_without_moving() {
        let config = GameConfig::default();
        let mut controller = controller_with(config);
        seeded_cache(&mut controller, 0, 0, 1);
        controller.collect_coin(0, 0, coin(0, 0, 0)).expect("collect");
        let saved = controller
            .persistence()
            .get(GAME_STATE_KEY)
            .expect("get")
            .expect("saved");

        for location in [
            LatLng::new(1.0e6, 0.0),
            LatLng::new(f64::NAN, 0.0),
            LatLng::new(0.0, f64::NEG_INFINITY),
        ] {
            let error = controller
                .handle_position(location)
                .expect_err("rejected");
            assert!(matches!(error, ControllerError::UnaddressableLocation { .. }));
        }
        assert_eq!(controller.player().location(), config.origin);
        assert!(controller.player().move_history().is_empty());
        assert_eq!(
            controller.persistence().get(GAME_STATE_KEY).expect("get"),
            Some(saved)
        );

        let mut reloaded = GameStateController::new(config, controller.persistence().clone());
        assert_eq!(reloaded.load(), LoadOutcome::Restored { cache_count: 1 });
        assert_eq!(reloaded.player().inventory(), &[coin(0, 0, 0)]);
    }

    #[test]
    fn step_off_the_grid_edge_is_rejected() {
        let config = GameConfig {
            tile_width: 1.0,
            ..GameConfig::default()
        };
        let mut controller = controller_with(config);
        controller
            .handle_position(LatLng::new(f64::from(i32::MAX) + 0.5, 0.5))
            .expect("edge");
        let error = controller
            .handle_step(Direction::North)
            .expect_err("past edge");
        assert!(matches!(error, ControllerError::UnaddressableLocation { .. }));
        assert_eq!(controller.player().move_history().len(), 1);
    }

    #[test]
    fn reset_requires_confirmation() {
        let mut controller = controller_with(GameConfig::default());
        seeded_cache(&mut controller, 0, 0, 1);
        controller.collect_coin(0, 0, coin(0, 0, 0)).expect("collect");

        let mut decline = |_: &str| false;
        assert!(!controller.reset_confirmed(&mut decline).expect("declined"));
        assert_eq!(controller.player().inventory().len(), 1);

        let mut prompts = Vec::new();
        let mut accept = |prompt: &str| {
            prompts.push(prompt.to_string());
            true
        };
        assert!(controller.reset_confirmed(&mut accept).expect("accepted"));
        assert!(controller.player().inventory().is_empty());
        assert_eq!(prompts, vec![RESET_PROMPT.to_string()]);
    }

    #[test]
    fn save_then_load_restores_player_and_caches() {
        let config = always_spawn_config();
        let mut controller = controller_with(config);
        let visible = controller
            .handle_position(LatLng::new(0.00015, 0.00015))
            .expect("move");
        let target = visible
            .iter()
            .find(|view| !view.cache.is_empty())
            .map(|view| (view.cell.i, view.cell.j, view.cache.coins[0]));

        if let Some((i, j, first)) = target {
            controller.collect_coin(i, j, first).expect("collect");
        }
        let saved_player = controller.player().clone();
        let saved_total = controller.total_coins().expect("total");

        let persisted = controller.persistence().clone();
        let mut reloaded = GameStateController::new(config, persisted);
        let outcome = reloaded.load();

        assert_eq!(outcome, LoadOutcome::Restored { cache_count: 9 });
        assert_eq!(reloaded.player(), &saved_player);
        assert_eq!(reloaded.total_coins().expect("total"), saved_total);
    }

    #[test]
    fn load_without_record_starts_fresh() {
        let config = GameConfig::default();
        let mut controller = controller_with(config);
        assert_eq!(controller.load(), LoadOutcome::Fresh);
        assert_eq!(controller.player(), &PlayerState::at(config.origin));
        assert!(controller.state().store.is_empty());
    }

    #[test]
    fn load_with_garbage_record_starts_fresh() {
        let config = GameConfig::default();
        let mut store = MemoryStore::new();
        store.set(GAME_STATE_KEY, "{\"player\": 12}").expect("seed");
        let mut controller = GameStateController::new(config, store);
        seeded_cache(&mut controller, 3, 3, 3);

        assert_eq!(controller.load(), LoadOutcome::Discarded);
        assert!(controller.state().store.is_empty());
        assert_eq!(controller.player(), &PlayerState::at(config.origin));
    }

    #[test]
    fn visible_caches_replay_identically_across_fresh_runs() {
        let config = GameConfig {
            visible_radius: 6,
            ..GameConfig::default()
        };
        let run = || {
            let mut controller = controller_with(config);
            controller
                .handle_position(config.origin)
                .expect("move")
                .into_iter()
                .map(|view| view.cache)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn step_moves_one_tile_and_records_history() {
        let config = GameConfig::default();
        let mut controller = controller_with(config);
        controller.handle_step(Direction::North).expect("step");
        controller.handle_step(Direction::East).expect("step");
        let location = controller.player().location();
        assert!((location.lat - (config.origin.lat + config.tile_width)).abs() < 1e-12);
        assert!((location.lng - (config.origin.lng + config.tile_width)).abs() < 1e-12);
        assert_eq!(controller.player().move_history().len(), 2);
    }

    #[test]
    fn moving_far_evicts_interned_cells() {
        let config = GameConfig {
            visible_radius: 1,
            evict_radius: 2,
            spawn_probability: 0.0,
            ..GameConfig::default()
        };
        let mut controller = controller_with(config);
        controller.handle_position(LatLng::new(0.0, 0.0)).expect("move");
        controller.handle_position(LatLng::new(1.0, 1.0)).expect("move");
        assert_eq!(controller.state().grid.interned_count(), 9);
    }

    #[test]
    fn drive_positions_handles_every_sample_in_order() {
        let mut controller = controller_with(GameConfig::default());
        let mut source = ScriptedPositions::new([
            LatLng::new(1.0, 1.0),
            LatLng::new(2.0, 2.0),
            LatLng::new(3.0, 3.0),
        ]);
        let handled = controller.drive_positions(&mut source).expect("drive");
        assert_eq!(handled, 3);
        assert_eq!(source.remaining(), 0);
        assert_eq!(controller.player().location(), LatLng::new(3.0, 3.0));
        assert_eq!(controller.player().move_history().len(), 3);
    }
}
