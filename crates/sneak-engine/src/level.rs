//! Level grid parsing and entity spawning.
//!
//! A level is a block of equal-width text lines. Each character is one cell
//! of `wall_size` world units; an entity spawned from a cell sits at
//! `(col * wall_size, row * wall_size)`.
//!
//! | Char | Spawns |
//! |------|--------|
//! | `W` | wall |
//! | `S` | player |
//! | `G` | guard |
//! | `T` | trap |
//! | `E` | exit |
//! | `N` | NPC to talk to |
//! | `H` `J` `K` `L` | light, orientation 0..=3 |
//! | `Z` `X` `C` `V` | camera, orientation 0..=3 |
//! | `1` `2` `3` `4` | sandglass, remote control, hammer, bee pickups |

use serde::{Deserialize, Serialize};
use sneak_ecs::prelude::*;

use crate::components::{
    Camera, Conversation, Deadly, Exit, Facing, Light, Motion, Pickup, Player, Pursuer, Stopable,
    ToolKind, Trap,
};
use crate::config::SimConfig;
use crate::math::Vec2;
use crate::turn::TurnTimer;

/// Errors produced while loading a level.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    /// The level text had no rows.
    #[error("level is empty")]
    Empty,

    /// A row's width differs from the first row's.
    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The level has no player spawn.
    #[error("level has no player spawn ('S')")]
    MissingPlayer,
}

// ---------------------------------------------------------------------------
// GridCell
// ---------------------------------------------------------------------------

/// A `(col, row)` cell coordinate. May lie outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub col: i32,
    pub row: i32,
}

impl GridCell {
    /// A cell at `col`, `row`.
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// This cell moved by `(d_col, d_row)`.
    pub fn offset(self, d_col: i32, d_row: i32) -> Self {
        Self::new(self.col + d_col, self.row + d_row)
    }
}

/// The grid cell a wall entity was spawned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallCell(pub GridCell);

// ---------------------------------------------------------------------------
// LevelGrid
// ---------------------------------------------------------------------------

/// Immutable character grid for one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelGrid {
    cells: Vec<char>,
    cols: usize,
    rows: usize,
}

impl LevelGrid {
    /// Parse level text. Trailing blank lines and `\r` line endings are
    /// ignored.
    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let mut lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let Some(first) = lines.first() else {
            return Err(LevelError::Empty);
        };
        let cols = first.chars().count();
        if cols == 0 {
            return Err(LevelError::Empty);
        }

        let mut cells = Vec::with_capacity(cols * lines.len());
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(LevelError::RaggedRow {
                    row,
                    expected: cols,
                    found,
                });
            }
            cells.extend(line.chars());
        }
        Ok(Self {
            cells,
            cols,
            rows: lines.len(),
        })
    }

    /// Width in cells.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Height in cells.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Whether `cell` lies inside the grid.
    pub fn contains(&self, cell: GridCell) -> bool {
        cell.col >= 0
            && cell.row >= 0
            && (cell.col as usize) < self.cols
            && (cell.row as usize) < self.rows
    }

    /// Character at `cell`, or `None` outside the grid.
    pub fn get(&self, cell: GridCell) -> Option<char> {
        if !self.contains(cell) {
            return None;
        }
        Some(self.cells[cell.row as usize * self.cols + cell.col as usize])
    }

    /// Whether `cell` is a `W`. Out-of-grid cells are not walls.
    pub fn is_wall(&self, cell: GridCell) -> bool {
        self.get(cell) == Some('W')
    }

    /// `true` if any wall lies within Chebyshev distance `radius` of `cell`
    /// (inclusive). Cells outside the grid are not walls.
    pub fn has_wall_within(&self, cell: GridCell, radius: i32) -> bool {
        let row_lo = (cell.row - radius).max(0);
        let row_hi = (cell.row + radius).min(self.rows as i32 - 1);
        let col_lo = (cell.col - radius).max(0);
        let col_hi = (cell.col + radius).min(self.cols as i32 - 1);
        (row_lo..=row_hi)
            .any(|row| (col_lo..=col_hi).any(|col| self.is_wall(GridCell::new(col, row))))
    }

    /// Nearest in-bounds cell to `cell`.
    pub fn clamp(&self, cell: GridCell) -> GridCell {
        GridCell::new(
            cell.col.clamp(0, self.cols as i32 - 1),
            cell.row.clamp(0, self.rows as i32 - 1),
        )
    }

    /// Every `(cell, char)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCell, char)> + '_ {
        self.cells.iter().enumerate().map(move |(i, &c)| {
            (
                GridCell::new((i % self.cols) as i32, (i / self.cols) as i32),
                c,
            )
        })
    }
}

/// Cell containing a world position.
pub fn cell_at_position(position: Vec2, wall_size: f32) -> GridCell {
    GridCell::new(
        (position.x / wall_size).floor() as i32,
        (position.y / wall_size).floor() as i32,
    )
}

/// World position of a cell's spawn point.
pub fn cell_origin(cell: GridCell, wall_size: f32) -> Vec2 {
    Vec2::new(cell.col as f32 * wall_size, cell.row as f32 * wall_size)
}

// ---------------------------------------------------------------------------
// Lights and cameras
// ---------------------------------------------------------------------------

/// Whether a [`LightSpawn`] is a sweeping light or a fixed camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Light,
    Camera,
}

/// Everything needed to recreate a light or camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSpawn {
    pub kind: LightKind,
    pub position: Vec2,
    pub orientation: u8,
}

impl LightSpawn {
    /// Spawn record for a level character, if it is a light or camera.
    pub fn from_cell(c: char, cell: GridCell, wall_size: f32) -> Option<Self> {
        let origin = cell_origin(cell, wall_size);
        let (kind, orientation, offset) = match c {
            'H' => (LightKind::Light, 0, Vec2::ZERO),
            'J' => (LightKind::Light, 1, Vec2::ZERO),
            'K' => (LightKind::Light, 2, Vec2::new(40.0, -7.0)),
            'L' => (LightKind::Light, 3, Vec2::ZERO),
            'Z' => (LightKind::Camera, 0, Vec2::ZERO),
            'X' => (LightKind::Camera, 1, Vec2::ZERO),
            'C' => (LightKind::Camera, 2, Vec2::ZERO),
            'V' => (LightKind::Camera, 3, Vec2::ZERO),
            _ => return None,
        };
        Some(Self {
            kind,
            position: origin + offset,
            orientation,
        })
    }
}

/// Light and camera spawn records for a whole grid.
pub fn light_spawns(grid: &LevelGrid, wall_size: f32) -> Vec<LightSpawn> {
    grid.iter()
        .filter_map(|(cell, c)| LightSpawn::from_cell(c, cell, wall_size))
        .collect()
}

/// Create the entity described by `spawn`.
///
/// Lights sweep: they rotate at `light_sweep_speed` and reverse on their own
/// [`TurnTimer`]. Cameras are static. Both are deadly on contact.
pub fn spawn_light(world: &mut World, spawn: &LightSpawn, config: &SimConfig) -> EntityId {
    let angle = f32::from(spawn.orientation) * std::f32::consts::FRAC_PI_2;
    match spawn.kind {
        LightKind::Light => {
            let entity = world.spawn_with(Motion {
                position: spawn.position,
                angle,
                velocity: Vec2::new(config.light_sweep_speed, 0.0),
                velocity_goal: Vec2::ZERO,
                scale: config.sizes.light,
            });
            attach(world, entity, Light { orientation: spawn.orientation });
            attach(world, entity, Deadly);
            attach(world, entity, TurnTimer::new(config.light_sweep_period_ms));
            entity
        }
        LightKind::Camera => {
            let entity = world.spawn_with(Motion {
                angle,
                ..Motion::at(spawn.position, config.sizes.camera)
            });
            attach(world, entity, Camera { orientation: spawn.orientation });
            attach(world, entity, Deadly);
            entity
        }
    }
}

// ---------------------------------------------------------------------------
// Level spawning
// ---------------------------------------------------------------------------

/// Handles to the singleton entities of a spawned level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnedLevel {
    pub player: EntityId,
    pub pursuers: Vec<EntityId>,
    pub exit: Option<EntityId>,
}

/// Create every entity the grid describes.
///
/// Returns [`LevelError::MissingPlayer`] before touching the world if the
/// grid has no `S` cell.
pub fn spawn_level(
    world: &mut World,
    grid: &LevelGrid,
    config: &SimConfig,
) -> Result<SpawnedLevel, LevelError> {
    if !grid.iter().any(|(_, c)| c == 'S') {
        return Err(LevelError::MissingPlayer);
    }

    let size = config.wall_size;
    let sizes = &config.sizes;
    let mut player = None;
    let mut pursuers = Vec::new();
    let mut exit = None;

    for (cell, c) in grid.iter() {
        let origin = cell_origin(cell, size);
        match c {
            'W' => {
                let wall = world.spawn_with(Motion::at(origin, sizes.wall));
                attach(world, wall, Stopable);
                attach(world, wall, WallCell(cell));
            }
            'S' => {
                let e = world.spawn_with(Motion::at(origin, sizes.player));
                attach(world, e, Player);
                attach(world, e, Facing::Right);
                player = Some(e);
            }
            'G' => {
                let patrol = Vec2::new(config.patrol_velocity, 0.0);
                let e = world.spawn_with(Motion {
                    velocity: patrol,
                    velocity_goal: patrol,
                    ..Motion::at(origin, sizes.pursuer)
                });
                attach(world, e, Pursuer);
                attach(world, e, Deadly);
                attach(world, e, Facing::from_velocity(patrol));
                // A zero patrol velocity means the guard stands still.
                if config.patrol_velocity != 0.0 {
                    attach(world, e, TurnTimer::new(config.patrol_period_ms));
                }
                pursuers.push(e);
            }
            'N' => {
                let e = world.spawn_with(Motion::at(origin, sizes.npc));
                attach(world, e, Conversation::default());
            }
            'T' => {
                let e = world.spawn_with(Motion::at(origin, sizes.trap));
                attach(world, e, Trap);
            }
            'E' => {
                let e = world.spawn_with(Motion::at(origin, sizes.exit));
                attach(world, e, Exit);
                exit = Some(e);
            }
            _ => {
                if let Some(spawn) = LightSpawn::from_cell(c, cell, size) {
                    spawn_light(world, &spawn, config);
                } else if let Some(tool) = ToolKind::from_grid_char(c) {
                    let e = world.spawn_with(Motion::at(origin, sizes.pickup));
                    attach(world, e, Pickup(tool));
                }
            }
        }
    }

    let player = player.ok_or(LevelError::MissingPlayer)?;
    tracing::info!(
        cols = grid.cols(),
        rows = grid.rows(),
        entities = world.entity_count(),
        pursuers = pursuers.len(),
        "level spawned"
    );
    Ok(SpawnedLevel {
        player,
        pursuers,
        exit,
    })
}

/// Attach to an entity spawned a moment ago.
fn attach<T: Component>(world: &mut World, entity: EntityId, component: T) {
    world
        .insert_component(entity, component)
        .expect("freshly spawned entity is alive");
}
