//! Incremental A* pathfinding over the walkability grid.
//!
//! Searches are 8-directional with corner cutting disallowed: a diagonal
//! step is legal only when both orthogonal neighbors are walkable. Requests
//! are registered, advanced by an explicit per-tick `advance` budget, and
//! polled; each request owns its open/closed state so interleaved searches
//! never observe each other's intermediate data.
//!
//! The goal tile is silently retargeted to the nearest walkable cell when
//! blocked. The start tile is *not* required to be walkable: agents seated
//! at a desk stand on a blocked tile and must still be able to path out.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use contracts::{TilePoint, WorldPoint};

use crate::grid::TileGrid;

/// Cost of an orthogonal / diagonal step.
const STRAIGHT_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

/// Node expansions per request per `advance` call.
pub const DEFAULT_ADVANCE_BUDGET: usize = 64;

pub type PathRequestId = u64;

/// Poll result for an in-flight path request.
#[derive(Debug, Clone, PartialEq)]
pub enum PathPoll {
    Pending,
    /// Tile-center waypoints from the start tile to the goal tile.
    Ready(Vec<WorldPoint>),
    /// No route exists. Data, not an error: callers stay put and retry later.
    Unreachable,
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct OpenNode {
    f_score: u32,
    h_score: u32,
    insertion: u64,
    tile: TilePoint,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.h_score.cmp(&other.h_score))
            .then_with(|| self.insertion.cmp(&other.insertion))
    }
}

#[derive(Debug)]
struct SearchState {
    start: TilePoint,
    goal: TilePoint,
    open: BinaryHeap<Reverse<OpenNode>>,
    g_score: BTreeMap<TilePoint, u32>,
    came_from: BTreeMap<TilePoint, TilePoint>,
    closed: BTreeSet<TilePoint>,
    next_insertion: u64,
    outcome: Option<Option<Vec<WorldPoint>>>,
}

impl SearchState {
    fn new(start: TilePoint, goal: TilePoint) -> Self {
        let mut state = Self {
            start,
            goal,
            open: BinaryHeap::new(),
            g_score: BTreeMap::new(),
            came_from: BTreeMap::new(),
            closed: BTreeSet::new(),
            next_insertion: 0,
            outcome: None,
        };
        state.g_score.insert(start, 0);
        state.push_open(start, 0);
        state
    }

    fn settled(start: TilePoint, goal: TilePoint, outcome: Option<Vec<WorldPoint>>) -> Self {
        Self {
            start,
            goal,
            open: BinaryHeap::new(),
            g_score: BTreeMap::new(),
            came_from: BTreeMap::new(),
            closed: BTreeSet::new(),
            next_insertion: 0,
            outcome: Some(outcome),
        }
    }

    fn push_open(&mut self, tile: TilePoint, g_score: u32) {
        let h_score = octile_heuristic(tile, self.goal);
        self.open.push(Reverse(OpenNode {
            f_score: g_score + h_score,
            h_score,
            insertion: self.next_insertion,
            tile,
        }));
        self.next_insertion += 1;
    }

    fn reconstruct(&self) -> Vec<WorldPoint> {
        let mut tiles = vec![self.goal];
        let mut cursor = self.goal;
        while let Some(previous) = self.came_from.get(&cursor) {
            cursor = *previous;
            tiles.push(cursor);
        }
        tiles.reverse();
        tiles.into_iter().map(|tile| tile.center()).collect()
    }
}

/// Octile-distance heuristic matching the 10/14 step costs.
fn octile_heuristic(from: TilePoint, to: TilePoint) -> u32 {
    let dx = (from.x - to.x).unsigned_abs();
    let dy = (from.y - to.y).unsigned_abs();
    STRAIGHT_COST * (dx + dy) - (2 * STRAIGHT_COST - DIAGONAL_COST) * dx.min(dy)
}

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Shared pathfinder: owns the grid and all in-flight search requests.
#[derive(Debug)]
pub struct Pathfinder {
    grid: TileGrid,
    requests: BTreeMap<PathRequestId, SearchState>,
    next_request_id: PathRequestId,
}

impl Pathfinder {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            requests: BTreeMap::new(),
            next_request_id: 1,
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn pending_requests(&self) -> usize {
        self.requests
            .values()
            .filter(|state| state.outcome.is_none())
            .count()
    }

    /// Register a search. Never fails: a blocked destination is retargeted to
    /// the nearest walkable cell, and a hopeless search settles immediately
    /// as unreachable.
    pub fn request(&mut self, from: WorldPoint, to: WorldPoint) -> PathRequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;

        let start = self.grid.world_to_tile(from);
        let requested_goal = self.grid.world_to_tile(to);
        let state = match self.grid.nearest_walkable(requested_goal) {
            // A zero-length path is no path at all; the walk is a no-op.
            Some(goal) if goal == start => SearchState::settled(start, goal, None),
            Some(goal) => SearchState::new(start, goal),
            // Zero walkable cells: every request settles unreachable.
            None => SearchState::settled(start, requested_goal, None),
        };
        self.requests.insert(id, state);
        id
    }

    /// Expand up to `budget` nodes per in-flight request. Called once per
    /// world tick, independent of any rendering cadence.
    pub fn advance(&mut self, budget: usize) {
        for state in self.requests.values_mut() {
            if state.outcome.is_some() {
                continue;
            }
            Self::advance_one(&self.grid, state, budget);
        }
    }

    fn advance_one(grid: &TileGrid, state: &mut SearchState, budget: usize) {
        for _ in 0..budget {
            let Some(Reverse(node)) = state.open.pop() else {
                state.outcome = Some(None);
                return;
            };
            if state.closed.contains(&node.tile) {
                continue;
            }
            if node.tile == state.goal {
                state.outcome = Some(Some(state.reconstruct()));
                return;
            }
            state.closed.insert(node.tile);
            let current_g = state.g_score.get(&node.tile).copied().unwrap_or(u32::MAX);

            for (dx, dy) in NEIGHBOR_OFFSETS {
                let next = TilePoint::new(node.tile.x + dx, node.tile.y + dy);
                if !grid.is_walkable(next) || state.closed.contains(&next) {
                    continue;
                }
                let diagonal = dx != 0 && dy != 0;
                if diagonal {
                    // No corner cutting: both orthogonal neighbors must be open.
                    let across_x = TilePoint::new(node.tile.x + dx, node.tile.y);
                    let across_y = TilePoint::new(node.tile.x, node.tile.y + dy);
                    if !grid.is_walkable(across_x) || !grid.is_walkable(across_y) {
                        continue;
                    }
                }
                let step = if diagonal { DIAGONAL_COST } else { STRAIGHT_COST };
                let tentative = current_g.saturating_add(step);
                if tentative < state.g_score.get(&next).copied().unwrap_or(u32::MAX) {
                    state.g_score.insert(next, tentative);
                    state.came_from.insert(next, node.tile);
                    state.push_open(next, tentative);
                }
            }
        }
    }

    /// Poll a request; a settled request is consumed. Unknown or cancelled
    /// ids report `Unreachable`, which callers already treat as "stay put."
    pub fn poll(&mut self, id: PathRequestId) -> PathPoll {
        match self.requests.get(&id) {
            None => PathPoll::Unreachable,
            Some(state) if state.outcome.is_none() => PathPoll::Pending,
            Some(_) => {
                let state = self.requests.remove(&id).expect("settled request present");
                match state.outcome {
                    Some(Some(path)) => PathPoll::Ready(path),
                    _ => PathPoll::Unreachable,
                }
            }
        }
    }

    /// Drop an in-flight request. Polling the id afterwards is a no-op.
    pub fn cancel(&mut self, id: PathRequestId) {
        self.requests.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MapLayer;

    fn grid_from_rows(rows: &[&str]) -> TileGrid {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let cells = rows
            .iter()
            .flat_map(|row| row.chars().map(|cell| cell == '#'))
            .collect::<Vec<_>>();
        TileGrid::build(
            width,
            height,
            &[MapLayer {
                name: "Wall".to_string(),
                blocking: true,
                cells,
            }],
        )
        .expect("grid")
    }

    fn resolve(pathfinder: &mut Pathfinder, id: PathRequestId) -> PathPoll {
        for _ in 0..1000 {
            match pathfinder.poll(id) {
                PathPoll::Pending => pathfinder.advance(DEFAULT_ADVANCE_BUDGET),
                settled => return settled,
            }
        }
        panic!("request {id} never settled");
    }

    fn tiles_of(grid: &TileGrid, path: &[WorldPoint]) -> Vec<TilePoint> {
        path.iter().map(|point| grid.world_to_tile(*point)).collect()
    }

    #[test]
    fn finds_straight_path() {
        let mut pathfinder = Pathfinder::new(grid_from_rows(&["....", "....", "...."]));
        let id = pathfinder.request(
            TilePoint::new(0, 1).center(),
            TilePoint::new(3, 1).center(),
        );
        let PathPoll::Ready(path) = resolve(&mut pathfinder, id) else {
            panic!("expected path");
        };
        let tiles = tiles_of(pathfinder.grid(), &path);
        assert_eq!(tiles.first(), Some(&TilePoint::new(0, 1)));
        assert_eq!(tiles.last(), Some(&TilePoint::new(3, 1)));
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn path_steps_are_adjacent() {
        let mut pathfinder = Pathfinder::new(grid_from_rows(&[
            "......", "..##..", "..##..", "......",
        ]));
        let id = pathfinder.request(
            TilePoint::new(0, 2).center(),
            TilePoint::new(5, 1).center(),
        );
        let PathPoll::Ready(path) = resolve(&mut pathfinder, id) else {
            panic!("expected path");
        };
        let tiles = tiles_of(pathfinder.grid(), &path);
        for pair in tiles.windows(2) {
            let dx = (pair[1].x - pair[0].x).abs();
            let dy = (pair[1].y - pair[0].y).abs();
            assert!(dx <= 1 && dy <= 1 && (dx + dy) > 0);
        }
    }

    #[test]
    fn diagonal_steps_never_cut_corners() {
        let mut pathfinder = Pathfinder::new(grid_from_rows(&[
            ".....", ".###.", ".....", ".....",
        ]));
        let id = pathfinder.request(
            TilePoint::new(0, 0).center(),
            TilePoint::new(4, 3).center(),
        );
        let PathPoll::Ready(path) = resolve(&mut pathfinder, id) else {
            panic!("expected path");
        };
        let grid = pathfinder.grid();
        let tiles = tiles_of(grid, &path);
        for pair in tiles.windows(2) {
            let dx = pair[1].x - pair[0].x;
            let dy = pair[1].y - pair[0].y;
            if dx != 0 && dy != 0 {
                assert!(grid.is_walkable(TilePoint::new(pair[0].x + dx, pair[0].y)));
                assert!(grid.is_walkable(TilePoint::new(pair[0].x, pair[0].y + dy)));
            }
        }
    }

    #[test]
    fn full_wall_is_unreachable() {
        let mut pathfinder = Pathfinder::new(grid_from_rows(&[
            "..#..", "..#..", "..#..", "..#..",
        ]));
        let id = pathfinder.request(
            TilePoint::new(0, 0).center(),
            TilePoint::new(4, 3).center(),
        );
        assert_eq!(resolve(&mut pathfinder, id), PathPoll::Unreachable);
    }

    #[test]
    fn blocked_goal_is_retargeted_to_nearest_walkable() {
        let mut pathfinder = Pathfinder::new(grid_from_rows(&[
            ".....", "..#..", ".....",
        ]));
        let id = pathfinder.request(
            TilePoint::new(0, 0).center(),
            TilePoint::new(2, 1).center(),
        );
        let PathPoll::Ready(path) = resolve(&mut pathfinder, id) else {
            panic!("expected path");
        };
        let grid = pathfinder.grid();
        let last = grid.world_to_tile(*path.last().expect("waypoint"));
        assert!(grid.is_walkable(last));
        assert_eq!(last.manhattan_distance(TilePoint::new(2, 1)), 1);
    }

    #[test]
    fn blocked_start_tile_can_path_out() {
        // Agents seated at a desk stand on a blocked tile.
        let mut pathfinder = Pathfinder::new(grid_from_rows(&[
            ".....", ".#...", ".....",
        ]));
        let id = pathfinder.request(
            TilePoint::new(1, 1).center(),
            TilePoint::new(4, 2).center(),
        );
        assert!(matches!(resolve(&mut pathfinder, id), PathPoll::Ready(_)));
    }

    #[test]
    fn same_tile_request_is_a_no_op() {
        let mut pathfinder = Pathfinder::new(grid_from_rows(&["...", "..."]));
        let id = pathfinder.request(
            TilePoint::new(1, 1).center(),
            TilePoint::new(1, 1).center(),
        );
        assert_eq!(pathfinder.poll(id), PathPoll::Unreachable);
    }

    #[test]
    fn search_is_incremental_under_a_small_budget() {
        let open_rows = vec![".".repeat(24); 24];
        let rows = open_rows.iter().map(String::as_str).collect::<Vec<_>>();
        let mut pathfinder = Pathfinder::new(grid_from_rows(&rows));
        let id = pathfinder.request(
            TilePoint::new(0, 0).center(),
            TilePoint::new(23, 23).center(),
        );
        pathfinder.advance(1);
        assert_eq!(pathfinder.poll(id), PathPoll::Pending);
        assert!(matches!(resolve(&mut pathfinder, id), PathPoll::Ready(_)));
    }

    #[test]
    fn concurrent_requests_do_not_contaminate_each_other() {
        let mut pathfinder = Pathfinder::new(grid_from_rows(&[
            "......", "......", "......", "......",
        ]));
        let first = pathfinder.request(
            TilePoint::new(0, 0).center(),
            TilePoint::new(5, 3).center(),
        );
        let second = pathfinder.request(
            TilePoint::new(5, 0).center(),
            TilePoint::new(0, 3).center(),
        );
        let PathPoll::Ready(path_a) = resolve(&mut pathfinder, first) else {
            panic!("expected path");
        };
        let PathPoll::Ready(path_b) = resolve(&mut pathfinder, second) else {
            panic!("expected path");
        };
        let grid = pathfinder.grid();
        assert_eq!(tiles_of(grid, &path_a).first(), Some(&TilePoint::new(0, 0)));
        assert_eq!(tiles_of(grid, &path_a).last(), Some(&TilePoint::new(5, 3)));
        assert_eq!(tiles_of(grid, &path_b).first(), Some(&TilePoint::new(5, 0)));
        assert_eq!(tiles_of(grid, &path_b).last(), Some(&TilePoint::new(0, 3)));
    }

    #[test]
    fn cancelled_request_polls_as_unreachable() {
        let mut pathfinder = Pathfinder::new(grid_from_rows(&["....", "...."]));
        let id = pathfinder.request(
            TilePoint::new(0, 0).center(),
            TilePoint::new(3, 1).center(),
        );
        pathfinder.cancel(id);
        assert_eq!(pathfinder.poll(id), PathPoll::Unreachable);
        assert_eq!(pathfinder.pending_requests(), 0);
    }
}
