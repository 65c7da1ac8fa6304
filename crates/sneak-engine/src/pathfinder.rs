//! Grid pursuit: breadth-first search for the first step toward a target.
//!
//! The search runs over the [`LevelGrid`] with 8-connected moves and keeps
//! a clearance of `wall_buffer` cells from every wall, which keeps a large
//! pursuer sprite from clipping corners. Each queued cell remembers the
//! first move taken out of the start cell; when the target is dequeued that
//! move is the answer.
//!
//! When no path exists (or the pursuer already stands on the target) the
//! pathfinder falls back to a random direction from a seeded generator.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use sneak_ecs::prelude::*;

use crate::components::{Facing, Motion, Player, Pursuer, Trappable};
use crate::config::SimConfig;
use crate::level::{cell_at_position, GridCell, LevelGrid};
use crate::math::Vec2;

/// Neighbour offsets `(d_col, d_row)` in expansion order.
pub const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Unit vector for a direction offset.
fn unit(dir: (i32, i32)) -> Vec2 {
    let v = Vec2::new(dir.0 as f32, dir.1 as f32);
    v.try_normalize().unwrap_or(Vec2::ZERO)
}

/// Moves out of `cell` onto cells the search may enter: in bounds, not a
/// wall, and clear of walls by `wall_buffer`.
fn open_moves(
    grid: &LevelGrid,
    cell: GridCell,
    wall_buffer: i32,
) -> impl Iterator<Item = ((i32, i32), GridCell)> + '_ {
    DIRECTIONS.into_iter().filter_map(move |dir| {
        let next = cell.offset(dir.0, dir.1);
        let open = grid.contains(next)
            && !grid.is_wall(next)
            && !grid.has_wall_within(next, wall_buffer);
        open.then_some((dir, next))
    })
}

/// BFS from `start` to `target`, returning the first step of a shortest
/// path.
///
/// Both cells are clamped into the grid first. Returns `None` when the
/// target is unreachable or equal to the start.
pub fn first_step(
    grid: &LevelGrid,
    start: GridCell,
    target: GridCell,
    wall_buffer: i32,
) -> Option<(i32, i32)> {
    let start = grid.clamp(start);
    let target = grid.clamp(target);
    if start == target {
        return None;
    }

    let cols = grid.cols();
    let index = |c: GridCell| c.row as usize * cols + c.col as usize;
    let mut visited = vec![false; cols * grid.rows()];
    let mut queue: VecDeque<(GridCell, Option<(i32, i32)>)> = VecDeque::new();

    visited[index(start)] = true;
    queue.push_back((start, None));

    while let Some((cell, first)) = queue.pop_front() {
        if cell == target {
            return first;
        }
        for (dir, next) in open_moves(grid, cell, wall_buffer) {
            if visited[index(next)] {
                continue;
            }
            visited[index(next)] = true;
            queue.push_back((next, Some(first.unwrap_or(dir))));
        }
    }
    None
}

/// Every cell the search can enter from `start`, in BFS order. The start
/// cell itself is not included.
pub fn reachable(grid: &LevelGrid, start: GridCell, wall_buffer: i32) -> Vec<GridCell> {
    let start = grid.clamp(start);
    let cols = grid.cols();
    let index = |c: GridCell| c.row as usize * cols + c.col as usize;
    let mut visited = vec![false; cols * grid.rows()];
    let mut queue = VecDeque::from([start]);
    let mut reached = Vec::new();
    visited[index(start)] = true;

    while let Some(cell) = queue.pop_front() {
        for (_, next) in open_moves(grid, cell, wall_buffer) {
            if !visited[index(next)] {
                visited[index(next)] = true;
                reached.push(next);
                queue.push_back(next);
            }
        }
    }
    reached
}

// ---------------------------------------------------------------------------
// Pursuit
// ---------------------------------------------------------------------------

/// Rate-limited chase controller for every [`Pursuer`].
#[derive(Debug, Clone)]
pub struct Pursuit {
    enabled: bool,
    /// Seconds left before the next recomputation.
    wait_s: f32,
    interval_s: f32,
    speed: f32,
    wall_buffer: i32,
    wall_size: f32,
    seed: u64,
    rng: Pcg64,
}

impl Pursuit {
    /// Enabled, idle pursuit tuned and seeded from `config`.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            enabled: true,
            wait_s: 0.0,
            interval_s: config.pursuit_interval_s,
            speed: config.pursuit_speed,
            wall_buffer: config.wall_buffer,
            wall_size: config.wall_size,
            seed: config.seed,
            rng: Pcg64::seed_from_u64(config.seed),
        }
    }

    /// Turn chase recomputation on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::debug!(enabled, "pursuit toggled");
        }
        self.enabled = enabled;
    }

    /// Whether chase recomputation is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Back to the freshly constructed state: enabled, due immediately,
    /// RNG reseeded.
    pub fn reset(&mut self) {
        self.enabled = true;
        self.wait_s = 0.0;
        self.rng = Pcg64::seed_from_u64(self.seed);
    }

    /// Unit chase direction from `from` toward `to`.
    pub fn chase_vector(&mut self, grid: &LevelGrid, from: GridCell, to: GridCell) -> Vec2 {
        match first_step(grid, from, to, self.wall_buffer) {
            Some(dir) => unit(dir),
            None => {
                let dir = DIRECTIONS[self.rng.gen_range(0..DIRECTIONS.len())];
                tracing::debug!(?from, ?to, ?dir, "no path, random chase direction");
                unit(dir)
            }
        }
    }

    /// Run one tick of pursuit.
    ///
    /// Does nothing unless enabled and a [`Trappable`] exists. Otherwise,
    /// once per interval, points every pursuer's velocity goal along its
    /// chase vector and updates its [`Facing`]. Returns `true` on the ticks
    /// that recomputed.
    ///
    /// # Panics
    ///
    /// Panics if pursuit is active and the world has no player with a
    /// [`Motion`].
    pub fn step(&mut self, world: &mut World, grid: &LevelGrid, elapsed_ms: f32) -> bool {
        if !self.enabled || world.count::<Trappable>() == 0 {
            return false;
        }
        if self.wait_s > 0.0 {
            self.wait_s -= elapsed_ms / 1000.0;
            return false;
        }

        let player = world
            .first_with::<Player>()
            .expect("pursuit is active but the world has no player");
        let target_pos = world
            .get_component::<Motion>(player)
            .expect("player has no Motion")
            .position;
        let target = cell_at_position(target_pos, self.wall_size);

        for pursuer in world.entities_with::<Pursuer>() {
            let Some(pos) = world.get_component::<Motion>(pursuer).map(|m| m.position) else {
                continue;
            };
            let from = cell_at_position(pos, self.wall_size);
            let chase = self.chase_vector(grid, from, target);
            if let Some(motion) = world.get_component_mut::<Motion>(pursuer) {
                motion.velocity_goal = chase * self.speed;
            }
            world
                .insert_component(pursuer, Facing::from_chase(chase))
                .expect("listed pursuer is alive");
            tracing::trace!(%pursuer, ?from, ?target, ?chase, "chase recomputed");
        }

        self.wait_s = self.interval_s;
        true
    }
}
