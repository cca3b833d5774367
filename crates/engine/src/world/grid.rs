use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::geo::{CellBounds, LatLng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub i: i32,
    pub j: i32,
}

impl Cell {
    pub fn key(&self) -> String {
        format!("{},{}", self.i, self.j)
    }

    pub fn chebyshev_distance(&self, other: &Cell) -> u32 {
        let di = (i64::from(self.i) - i64::from(other.i)).unsigned_abs();
        let dj = (i64::from(self.j) - i64::from(other.j)).unsigned_abs();
        di.max(dj).min(u64::from(u32::MAX)) as u32
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.i, self.j)
    }
}

/// Interning grid: every `(i, j)` resolves to one shared `Arc<Cell>` until it
/// is evicted.
#[derive(Debug)]
pub struct CellGrid {
    tile_width: f64,
    known_cells: HashMap<(i32, i32), Arc<Cell>>,
}

impl CellGrid {
    pub fn new(tile_width: f64) -> Self {
        Self {
            tile_width,
            known_cells: HashMap::new(),
        }
    }

    pub fn tile_width(&self) -> f64 {
        self.tile_width
    }

    pub fn cell_at(&mut self, i: i32, j: i32) -> Arc<Cell> {
        Arc::clone(
            self.known_cells
                .entry((i, j))
                .or_insert_with(|| Arc::new(Cell { i, j })),
        )
    }

    pub fn cell_for_point(&mut self, point: LatLng) -> Arc<Cell> {
        let (i, j) = self.indices_for_point(point);
        self.cell_at(i, j)
    }

    pub fn cell_bounds(&self, cell: &Cell) -> CellBounds {
        let w = self.tile_width;
        CellBounds {
            south_west: LatLng {
                lat: f64::from(cell.i) * w,
                lng: f64::from(cell.j) * w,
            },
            north_east: LatLng {
                lat: (f64::from(cell.i) + 1.0) * w,
                lng: (f64::from(cell.j) + 1.0) * w,
            },
        }
    }

    /// Square neighborhood of side `2 * radius + 1` around the cell holding
    /// `point`, ordered by `i` then `j`. Cells past the `i32` index range are
    /// left out.
    pub fn cells_near(&mut self, point: LatLng, radius: u32) -> Vec<Arc<Cell>> {
        let (center_i, center_j) = self.indices_for_point(point);
        let radius = i32::try_from(radius).unwrap_or(i32::MAX);
        let side = (2 * radius as usize) + 1;
        let mut cells = Vec::with_capacity(side * side);
        for di in -radius..=radius {
            let Some(i) = center_i.checked_add(di) else {
                continue;
            };
            for dj in -radius..=radius {
                if let Some(j) = center_j.checked_add(dj) {
                    cells.push(self.cell_at(i, j));
                }
            }
        }
        cells
    }

    /// Drops canonical cells farther than `keep_radius` from `center`.
    /// Returns how many were evicted.
    pub fn evict_beyond(&mut self, center: &Cell, keep_radius: u32) -> usize {
        let before = self.known_cells.len();
        self.known_cells
            .retain(|_, cell| cell.chebyshev_distance(center) <= keep_radius);
        before - self.known_cells.len()
    }

    /// Whether `point` is finite and falls in a cell with `i32` indices.
    pub fn is_addressable(&self, point: LatLng) -> bool {
        let in_range = |index: f64| {
            index.is_finite() && index >= f64::from(i32::MIN) && index <= f64::from(i32::MAX)
        };
        in_range((point.lat / self.tile_width).floor())
            && in_range((point.lng / self.tile_width).floor())
    }

    pub fn interned_count(&self) -> usize {
        self.known_cells.len()
    }

    fn indices_for_point(&self, point: LatLng) -> (i32, i32) {
        (
            (point.lat / self.tile_width).floor() as i32,
            (point.lng / self.tile_width).floor() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const TILE_WIDTH: f64 = 1e-4;

    #[test]
    fn resolves_reference_coordinate_with_floor_semantics() {
        let mut grid = CellGrid::new(TILE_WIDTH);
        let cell = grid.cell_for_point(LatLng::new(36.9895, -122.0628));
        assert_eq!(*cell, Cell { i: 369895, j: -1220628 });
    }

    #[test]
    fn negative_coordinates_floor_instead_of_truncating() {
        let mut grid = CellGrid::new(1.0);
        let cell = grid.cell_for_point(LatLng::new(-0.5, -1.25));
        assert_eq!(*cell, Cell { i: -1, j: -2 });
    }

    #[test]
    fn points_in_same_cell_share_canonical_instance() {
        let mut grid = CellGrid::new(TILE_WIDTH);
        let a = grid.cell_for_point(LatLng::new(36.98951, -122.06271));
        let b = grid.cell_for_point(LatLng::new(36.98958, -122.06279));
        let c = grid.cell_at(a.i, a.j);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(grid.interned_count(), 1);
    }

    #[test]
    fn bounds_span_exactly_one_tile() {
        let grid = CellGrid::new(0.5);
        let bounds = grid.cell_bounds(&Cell { i: -2, j: 3 });
        assert_eq!(bounds.south_west, LatLng::new(-1.0, 1.5));
        assert_eq!(bounds.north_east, LatLng::new(-0.5, 2.0));
        assert!(bounds.contains(bounds.center()));
        assert!(!bounds.contains(bounds.north_east));
    }

    #[test]
    fn neighborhood_is_complete_and_distinct() {
        let mut grid = CellGrid::new(TILE_WIDTH);
        let point = LatLng::new(36.9895, -122.0628);
        let origin = *grid.cell_for_point(point);
        for radius in [0u32, 1, 3, 8] {
            let cells = grid.cells_near(point, radius);
            let side = (2 * radius + 1) as usize;
            assert_eq!(cells.len(), side * side);
            let distinct = cells.iter().map(|cell| **cell).collect::<HashSet<_>>();
            assert_eq!(distinct.len(), cells.len());
            assert!(cells
                .iter()
                .all(|cell| cell.chebyshev_distance(&origin) <= radius));
        }
    }

    #[test]
    fn radius_zero_yields_only_the_origin_cell() {
        let mut grid = CellGrid::new(TILE_WIDTH);
        let cells = grid.cells_near(LatLng::new(36.9895, -122.0628), 0);
        assert_eq!(cells.len(), 1);
        assert_eq!(*cells[0], Cell { i: 369895, j: -1220628 });
    }

    #[test]
    fn neighborhood_reuses_canonical_cells() {
        let mut grid = CellGrid::new(1.0);
        let first = grid.cells_near(LatLng::new(0.5, 0.5), 1);
        let second = grid.cells_near(LatLng::new(0.5, 0.5), 1);
        assert!(first
            .iter()
            .zip(second.iter())
            .all(|(a, b)| Arc::ptr_eq(a, b)));
        assert_eq!(grid.interned_count(), 9);
    }

    #[test]
    fn far_and_non_finite_points_are_not_addressable() {
        let grid = CellGrid::new(TILE_WIDTH);
        assert!(grid.is_addressable(LatLng::new(36.9895, -122.0628)));
        assert!(!grid.is_addressable(LatLng::new(1.0e6, 0.0)));
        assert!(!grid.is_addressable(LatLng::new(0.0, -1.0e6)));
        assert!(!grid.is_addressable(LatLng::new(f64::NAN, 0.0)));
        assert!(!grid.is_addressable(LatLng::new(0.0, f64::INFINITY)));
    }

    #[test]
    fn neighborhood_at_index_edge_does_not_overflow() {
        let mut grid = CellGrid::new(1.0);
        let edge = LatLng::new(f64::from(i32::MAX) + 0.5, f64::from(i32::MIN) + 0.5);
        let cells = grid.cells_near(edge, 1);
        assert_eq!(cells.len(), 4);
        assert!(cells
            .iter()
            .all(|cell| cell.i >= i32::MAX - 1 && cell.j <= i32::MIN + 1));

        let bounds = grid.cell_bounds(&Cell { i: i32::MAX, j: 0 });
        assert_eq!(bounds.north_east.lat, f64::from(i32::MAX) + 1.0);
    }

    #[test]
    fn eviction_drops_only_distant_cells() {
        let mut grid = CellGrid::new(1.0);
        grid.cells_near(LatLng::new(0.5, 0.5), 3);
        assert_eq!(grid.interned_count(), 49);
        let center = Cell { i: 0, j: 0 };
        let evicted = grid.evict_beyond(&center, 1);
        assert_eq!(evicted, 40);
        assert_eq!(grid.interned_count(), 9);

        let far = grid.cell_at(3, 3);
        assert_eq!(*far, Cell { i: 3, j: 3 });
        assert_eq!(grid.interned_count(), 10);
    }
}
