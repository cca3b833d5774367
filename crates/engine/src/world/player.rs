use std::fmt;
use std::str::FromStr;

use super::cache::Coin;
use super::geo::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    fn unit_offset(self) -> (f64, f64) {
        match self {
            Direction::North => (1.0, 0.0),
            Direction::South => (-1.0, 0.0),
            Direction::East => (0.0, 1.0),
            Direction::West => (0.0, -1.0),
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|direction| direction.as_token().eq_ignore_ascii_case(raw))
            .ok_or_else(|| format!("unknown direction '{raw}' (expected north|south|east|west)"))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerState {
    location: LatLng,
    inventory: Vec<Coin>,
    move_history: Vec<LatLng>,
}

impl PlayerState {
    pub fn at(location: LatLng) -> Self {
        Self {
            location,
            inventory: Vec::new(),
            move_history: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        location: LatLng,
        inventory: Vec<Coin>,
        move_history: Vec<LatLng>,
    ) -> Self {
        Self {
            location,
            inventory,
            move_history,
        }
    }

    pub fn location(&self) -> LatLng {
        self.location
    }

    pub fn inventory(&self) -> &[Coin] {
        &self.inventory
    }

    pub fn move_history(&self) -> &[LatLng] {
        &self.move_history
    }

    pub fn move_to(&mut self, location: LatLng) {
        self.location = location;
        self.move_history.push(location);
    }

    /// Where a one-tile step in `direction` would land, without moving.
    pub fn step_target(&self, direction: Direction, tile_width: f64) -> LatLng {
        let (d_lat, d_lng) = direction.unit_offset();
        LatLng {
            lat: self.location.lat + d_lat * tile_width,
            lng: self.location.lng + d_lng * tile_width,
        }
    }

    pub fn step(&mut self, direction: Direction, tile_width: f64) -> LatLng {
        let next = self.step_target(direction, tile_width);
        self.move_to(next);
        next
    }

    pub fn collect(&mut self, coin: Coin) {
        self.inventory.push(coin);
    }

    /// Pops the most recently collected coin; `None` when the inventory is empty.
    pub fn deposit(&mut self) -> Option<Coin> {
        self.inventory.pop()
    }

    pub(crate) fn oldest_coin(&self) -> Option<Coin> {
        self.inventory.first().copied()
    }

    pub(crate) fn remove_oldest_coin(&mut self) -> Option<Coin> {
        if self.inventory.is_empty() {
            return None;
        }
        Some(self.inventory.remove(0))
    }

    pub fn reset_to(&mut self, origin: LatLng) {
        self.location = origin;
        self.inventory.clear();
        self.move_history.clear();
    }
}
