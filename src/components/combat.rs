use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Simple health pool for combat resolution.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }
}

/// Transient record of a blocked step, resolved by the combat system in the
/// same pass.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    pub with: crate::components::world::EntityUid,
}
