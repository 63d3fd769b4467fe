//! Walkability grid built once from the map bundle's blocking layers.
//!
//! A cell is unwalkable when any blocking layer occupies it. The grid is
//! immutable for the lifetime of a run; everything that moves consults it.

use contracts::{MapLayer, TilePoint, WorldPoint, TILE_SIZE};

use crate::rng::SimRng;

/// Desk-neighborhood radius (Manhattan) for biased wander targets.
const NEAR_RADIUS: i32 = 8;

/// Central room region used for conversation meeting points.
const CENTRAL_X: (i32, i32) = (5, 25);
const CENTRAL_Y: (i32, i32) = (6, 16);

/// Error type for grid construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A layer's cell count does not match `width * height`.
    LayerShape {
        layer: String,
        expected: usize,
        actual: usize,
    },
    ZeroSize,
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::LayerShape {
                layer,
                expected,
                actual,
            } => write!(
                f,
                "layer {layer} has {actual} cells, expected {expected}"
            ),
            GridError::ZeroSize => write!(f, "grid dimensions must be non-zero"),
        }
    }
}

impl std::error::Error for GridError {}

/// Immutable walkability grid with a cached walkable-cell list.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: i32,
    height: i32,
    walkable: Vec<bool>,
    /// Row-major (y outer, x inner). This enumeration order is the documented
    /// tie-break for `nearest_walkable`: the first minimal match wins.
    walkable_tiles: Vec<TilePoint>,
}

impl TileGrid {
    /// OR all blocking layers into one occupancy grid.
    pub fn build(width: u32, height: u32, layers: &[MapLayer]) -> Result<TileGrid, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize);
        }
        let expected = width as usize * height as usize;
        for layer in layers.iter().filter(|layer| layer.blocking) {
            if layer.cells.len() != expected {
                return Err(GridError::LayerShape {
                    layer: layer.name.clone(),
                    expected,
                    actual: layer.cells.len(),
                });
            }
        }

        let mut walkable = vec![true; expected];
        for layer in layers.iter().filter(|layer| layer.blocking) {
            for (index, occupied) in layer.cells.iter().enumerate() {
                if *occupied {
                    walkable[index] = false;
                }
            }
        }

        let mut walkable_tiles = Vec::new();
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                if walkable[y as usize * width as usize + x as usize] {
                    walkable_tiles.push(TilePoint::new(x, y));
                }
            }
        }

        Ok(TileGrid {
            width: width as i32,
            height: height as i32,
            walkable,
            walkable_tiles,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Out-of-range tiles are unwalkable.
    pub fn is_walkable(&self, tile: TilePoint) -> bool {
        if tile.x < 0 || tile.y < 0 || tile.x >= self.width || tile.y >= self.height {
            return false;
        }
        self.walkable[tile.y as usize * self.width as usize + tile.x as usize]
    }

    pub fn walkable_tiles(&self) -> &[TilePoint] {
        &self.walkable_tiles
    }

    /// Walkable cell minimizing Manhattan distance to `tile`; ties broken by
    /// the row-major walkable list order. `None` when nothing is walkable.
    pub fn nearest_walkable(&self, tile: TilePoint) -> Option<TilePoint> {
        if self.is_walkable(tile) {
            return Some(tile);
        }
        let mut best: Option<(i32, TilePoint)> = None;
        for candidate in &self.walkable_tiles {
            let distance = candidate.manhattan_distance(tile);
            match best {
                Some((best_distance, _)) if best_distance <= distance => {}
                _ => best = Some((distance, *candidate)),
            }
        }
        best.map(|(_, tile)| tile)
    }

    /// Tile containing a world point, clamped into grid range.
    pub fn world_to_tile(&self, point: WorldPoint) -> TilePoint {
        let x = ((point.x / TILE_SIZE).floor() as i32).clamp(0, self.width - 1);
        let y = ((point.y / TILE_SIZE).floor() as i32).clamp(0, self.height - 1);
        TilePoint::new(x, y)
    }

    /// Clamp a world point into the room interior, 1.5 tiles off each edge.
    /// Approach targets use this so nobody is asked to stand inside a wall.
    pub fn clamp_world(&self, point: WorldPoint) -> WorldPoint {
        let margin = TILE_SIZE * 1.5;
        let max_x = (f64::from(self.width) * TILE_SIZE - margin).max(margin);
        let max_y = (f64::from(self.height) * TILE_SIZE - margin).max(margin);
        WorldPoint {
            x: point.x.clamp(margin, max_x),
            y: point.y.clamp(margin, max_y),
        }
    }

    /// Random walkable tile center; with a `near` anchor, a coin flip biases
    /// the pick into the anchor's Manhattan-8 neighborhood when non-empty.
    pub fn random_walkable(
        &self,
        rng: &mut SimRng,
        near: Option<TilePoint>,
    ) -> Option<WorldPoint> {
        if let Some(anchor) = near {
            if rng.chance(1, 2) {
                let nearby = self
                    .walkable_tiles
                    .iter()
                    .filter(|tile| tile.manhattan_distance(anchor) < NEAR_RADIUS)
                    .copied()
                    .collect::<Vec<_>>();
                if let Some(tile) = rng.pick(&nearby) {
                    return Some(tile.center());
                }
            }
        }
        rng.pick(&self.walkable_tiles).map(TilePoint::center)
    }

    /// Random walkable tile center in the central room region, falling back
    /// to the whole walkable list when the region is empty.
    pub fn conversation_point(&self, rng: &mut SimRng) -> Option<WorldPoint> {
        let central = self
            .walkable_tiles
            .iter()
            .filter(|tile| {
                tile.x >= CENTRAL_X.0
                    && tile.x <= CENTRAL_X.1
                    && tile.y >= CENTRAL_Y.0
                    && tile.y <= CENTRAL_Y.1
            })
            .copied()
            .collect::<Vec<_>>();
        let pool = if central.is_empty() {
            &self.walkable_tiles
        } else {
            &central
        };
        rng.pick(pool).map(TilePoint::center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &str, width: u32, height: u32, occupied: &[(i32, i32)]) -> MapLayer {
        let mut cells = vec![false; width as usize * height as usize];
        for (x, y) in occupied {
            cells[*y as usize * width as usize + *x as usize] = true;
        }
        MapLayer {
            name: name.to_string(),
            blocking: true,
            cells,
        }
    }

    fn open_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::build(width, height, &[layer("Wall", width, height, &[])]).expect("grid")
    }

    #[test]
    fn blocking_layers_are_ored_together() {
        let grid = TileGrid::build(
            4,
            4,
            &[
                layer("Objects", 4, 4, &[(1, 1)]),
                layer("Wall", 4, 4, &[(2, 2)]),
            ],
        )
        .expect("grid");

        assert!(!grid.is_walkable(TilePoint::new(1, 1)));
        assert!(!grid.is_walkable(TilePoint::new(2, 2)));
        assert!(grid.is_walkable(TilePoint::new(0, 0)));
    }

    #[test]
    fn non_blocking_layers_are_ignored() {
        let mut decoration = layer("Floor", 3, 3, &[(1, 1)]);
        decoration.blocking = false;
        let grid = TileGrid::build(3, 3, &[decoration]).expect("grid");
        assert!(grid.is_walkable(TilePoint::new(1, 1)));
    }

    #[test]
    fn out_of_range_is_unwalkable() {
        let grid = open_grid(4, 4);
        assert!(!grid.is_walkable(TilePoint::new(-1, 0)));
        assert!(!grid.is_walkable(TilePoint::new(0, -1)));
        assert!(!grid.is_walkable(TilePoint::new(4, 0)));
        assert!(!grid.is_walkable(TilePoint::new(0, 4)));
    }

    #[test]
    fn layer_shape_mismatch_fails() {
        let bad = MapLayer {
            name: "Wall".to_string(),
            blocking: true,
            cells: vec![false; 5],
        };
        let err = TileGrid::build(4, 4, &[bad]).unwrap_err();
        assert!(matches!(err, GridError::LayerShape { .. }));
    }

    #[test]
    fn nearest_walkable_of_single_blocked_cell_is_adjacent() {
        let grid = TileGrid::build(10, 10, &[layer("Objects", 10, 10, &[(5, 5)])]).expect("grid");
        let nearest = grid.nearest_walkable(TilePoint::new(5, 5)).expect("cell");
        assert_eq!(nearest.manhattan_distance(TilePoint::new(5, 5)), 1);
    }

    #[test]
    fn nearest_walkable_tie_break_is_row_major_first() {
        // (5,4) and (4,5) both sit at distance 1; row-major scan reaches
        // (5,4) first.
        let grid = TileGrid::build(10, 10, &[layer("Objects", 10, 10, &[(5, 5)])]).expect("grid");
        let nearest = grid.nearest_walkable(TilePoint::new(5, 5)).expect("cell");
        assert_eq!(nearest, TilePoint::new(5, 4));
    }

    #[test]
    fn nearest_walkable_on_dead_grid_is_none() {
        let all = (0..3)
            .flat_map(|y| (0..3).map(move |x| (x, y)))
            .collect::<Vec<_>>();
        let grid = TileGrid::build(3, 3, &[layer("Wall", 3, 3, &all)]).expect("grid");
        assert!(grid.nearest_walkable(TilePoint::new(1, 1)).is_none());
        let mut rng = SimRng::new(1);
        assert!(grid.random_walkable(&mut rng, None).is_none());
        assert!(grid.conversation_point(&mut rng).is_none());
    }

    #[test]
    fn world_to_tile_clamps_into_range() {
        let grid = open_grid(4, 4);
        assert_eq!(
            grid.world_to_tile(WorldPoint::new(-10.0, 40.0)),
            TilePoint::new(0, 1)
        );
        assert_eq!(
            grid.world_to_tile(WorldPoint::new(1000.0, 1000.0)),
            TilePoint::new(3, 3)
        );
    }

    #[test]
    fn random_walkable_near_bias_stays_in_neighborhood() {
        let grid = open_grid(30, 30);
        let anchor = TilePoint::new(15, 15);
        let mut rng = SimRng::new(77);
        let mut saw_near = false;
        for _ in 0..64 {
            let point = grid.random_walkable(&mut rng, Some(anchor)).expect("point");
            let tile = grid.world_to_tile(point);
            assert!(grid.is_walkable(tile));
            if tile.manhattan_distance(anchor) < NEAR_RADIUS {
                saw_near = true;
            }
        }
        assert!(saw_near, "desk bias never produced a nearby target");
    }

    #[test]
    fn conversation_point_prefers_central_region() {
        let grid = open_grid(30, 20);
        let mut rng = SimRng::new(3);
        for _ in 0..32 {
            let point = grid.conversation_point(&mut rng).expect("point");
            let tile = grid.world_to_tile(point);
            assert!((CENTRAL_X.0..=CENTRAL_X.1).contains(&tile.x));
            assert!((CENTRAL_Y.0..=CENTRAL_Y.1).contains(&tile.y));
        }
    }
}
