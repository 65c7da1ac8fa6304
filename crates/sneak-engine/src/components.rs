//! Component types attached to simulated entities.
//!
//! [`Motion`] is the only data-heavy component; most of the rest are
//! zero-sized role tags whose presence is all that matters.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// Position, orientation and velocity of a simulated entity.
///
/// `scale` doubles as the collision extent and as a facing flip: its sign
/// says which way the sprite faces, its magnitude is the size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub position: Vec2,
    /// Radians. Only rotating entities (lights) integrate this.
    pub angle: f32,
    /// World units per second (radians per second in `x` for lights).
    pub velocity: Vec2,
    /// Target velocity the integrator rate-limits toward.
    pub velocity_goal: Vec2,
    pub scale: Vec2,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            velocity_goal: Vec2::ZERO,
            scale: Vec2::new(10.0, 10.0),
        }
    }
}

impl Motion {
    /// A stationary motion at `position` with the given extent.
    pub fn at(position: Vec2, scale: Vec2) -> Self {
        Self {
            position,
            scale,
            ..Self::default()
        }
    }

    /// Zero both the current and goal velocity.
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.velocity_goal = Vec2::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Role tags
// ---------------------------------------------------------------------------

/// The player-controlled character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player;

/// A patrolling guard that chases the player once a trap is sprung.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pursuer;

/// A sweeping light. Rotates instead of translating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    /// Quarter turns from the level's reference direction (0..=3).
    pub orientation: u8,
}

/// A static security camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    pub orientation: u8,
}

/// Wall-like: stops the player on contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stopable;

/// The player ran into a wall; movement is suppressed until released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Halted;

/// The player reached the exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Victorious;

/// Touching this ends the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadly;

/// The player was caught. Attached once, on first contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caught;

/// An unsprung trap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trap;

/// A sprung trap. Its presence anywhere in the world turns pursuit on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trappable;

/// The level exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit;

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Where an NPC's conversation with the player stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conversation {
    #[default]
    NotStarted,
    /// The player touched the NPC and has not answered yet.
    InProgress,
    NoCrimeDetected,
    CrimeDetected,
}

impl Conversation {
    /// State after the player touches the NPC. Only a fresh NPC changes.
    pub fn on_contact(self) -> Self {
        match self {
            Conversation::NotStarted => Conversation::InProgress,
            other => other,
        }
    }

    /// State after the player answers. Only a running conversation settles.
    pub fn on_answer(self, crime: bool) -> Self {
        match (self, crime) {
            (Conversation::InProgress, true) => Conversation::CrimeDetected,
            (Conversation::InProgress, false) => Conversation::NoCrimeDetected,
            (other, _) => other,
        }
    }

    /// Whether the conversation has reached a verdict.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            Conversation::NoCrimeDetected | Conversation::CrimeDetected
        )
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Scripted tools the player can pick up and use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    /// Freezes guards, lights and pursuit for a while.
    Sandglass,
    /// Switches lights and cameras off for a while.
    RemoteControl,
    /// Breaks walls around a target cell.
    Hammer,
    /// Sends a swarm that stops guards after a delay.
    Bee,
}

impl ToolKind {
    /// Level-grid character for this tool's pickup.
    pub fn grid_char(self) -> char {
        match self {
            ToolKind::Sandglass => '1',
            ToolKind::RemoteControl => '2',
            ToolKind::Hammer => '3',
            ToolKind::Bee => '4',
        }
    }

    /// Tool whose pickup a grid character spawns.
    pub fn from_grid_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(ToolKind::Sandglass),
            '2' => Some(ToolKind::RemoteControl),
            '3' => Some(ToolKind::Hammer),
            '4' => Some(ToolKind::Bee),
            _ => None,
        }
    }
}

/// A tool lying in the level, eaten on contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pickup(pub ToolKind);

// ---------------------------------------------------------------------------
// Facing
// ---------------------------------------------------------------------------

/// Which way a character is drawn. Kept as data; sprite selection belongs to
/// the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Up,
    #[default]
    Left,
    Down,
    Right,
}

impl Facing {
    /// Facing for a velocity. Horizontal wins ties; zero faces right.
    pub fn from_velocity(v: Vec2) -> Self {
        if v.x.abs() >= v.y.abs() {
            if v.x >= 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if v.y >= 0.0 {
            Facing::Down
        } else {
            Facing::Up
        }
    }

    /// Facing for a chase direction. Vertical wins ties.
    pub fn from_chase(v: Vec2) -> Self {
        if v.x.abs() > v.y.abs() {
            if v.x > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if v.y > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_from_velocity_prefers_horizontal_on_tie() {
        assert_eq!(Facing::from_velocity(Vec2::new(-3.0, 3.0)), Facing::Left);
        assert_eq!(Facing::from_velocity(Vec2::new(0.0, -1.0)), Facing::Up);
        assert_eq!(Facing::from_velocity(Vec2::ZERO), Facing::Right);
    }

    #[test]
    fn facing_from_chase_prefers_vertical_on_tie() {
        let diag = Vec2::new(1.0, 1.0);
        assert_eq!(Facing::from_chase(diag), Facing::Down);
        assert_eq!(Facing::from_chase(Vec2::new(-1.0, 0.2)), Facing::Left);
    }

    #[test]
    fn tool_grid_chars_roundtrip() {
        for tool in [
            ToolKind::Sandglass,
            ToolKind::RemoteControl,
            ToolKind::Hammer,
            ToolKind::Bee,
        ] {
            assert_eq!(ToolKind::from_grid_char(tool.grid_char()), Some(tool));
        }
        assert_eq!(ToolKind::from_grid_char('W'), None);
    }

    #[test]
    fn conversation_settles_only_after_contact() {
        let fresh = Conversation::default();
        assert_eq!(fresh.on_answer(true), Conversation::NotStarted);

        let talking = fresh.on_contact();
        assert_eq!(talking, Conversation::InProgress);
        assert_eq!(talking.on_contact(), Conversation::InProgress);

        let verdict = talking.on_answer(false);
        assert_eq!(verdict, Conversation::NoCrimeDetected);
        assert!(verdict.is_settled());
        assert_eq!(verdict.on_answer(true), Conversation::NoCrimeDetected);
        assert_eq!(verdict.on_contact(), Conversation::NoCrimeDetected);
    }
}
