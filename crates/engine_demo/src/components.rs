//! Component definitions for the demo simulation.

use engine_ecs::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// World-space position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position(pub Vec2);

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// Linear velocity in world units per second.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Velocity(pub Vec2);

impl Velocity {
    pub const ZERO: Self = Self(Vec2::ZERO);
}

impl Default for Velocity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// Seconds left before the entity expires.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Count down by `dt`. Returns `true` once expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

impl Component for Lifetime {
    fn type_name() -> &'static str {
        "Lifetime"
    }
}

/// A handle into a [`TextureBank`]. The bank slot is released by a
/// destruction hook, not by `Drop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    pub slot: u32,
}

impl Component for Texture {
    fn type_name() -> &'static str {
        "Texture"
    }
}

/// Stand-in for a GPU texture allocator.
#[derive(Debug, Default)]
pub struct TextureBank {
    next_slot: u32,
    live: Vec<u32>,
}

impl TextureBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self) -> Texture {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.live.push(slot);
        Texture { slot }
    }

    /// Returns `false` if `slot` was not live.
    pub fn release(&mut self, slot: u32) -> bool {
        match self.live.iter().position(|&s| s == slot) {
            Some(index) => {
                self.live.swap_remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn live(&self) -> usize {
        self.live.len()
    }
}
