use std::fmt;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Global resource tracking the simulation timeline.
///
/// Every tick advances `tick`; `turn` advances whenever the accumulated tick
/// fractions reach a whole turn.
#[derive(Resource, Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GameTime {
    pub tick: u64,
    pub turn: u64,
    /// Fraction of the current turn already elapsed, in `[0, 1)`.
    pub carry: f32,
}

impl GameTime {
    pub fn advance(&mut self, fraction: f32) {
        self.tick += 1;
        self.carry += fraction.max(0.0);
        // Tolerate float drift so ten 0.1 heartbeats make a turn.
        while self.carry >= 1.0 - 1e-4 {
            self.turn += 1;
            self.carry = (self.carry - 1.0).max(0.0);
        }
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Turn {}, tick {} (+{:.2})", self.turn, self.tick, self.carry)
    }
}
