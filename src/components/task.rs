use bevy_ecs::prelude::*;

/// Transient marker: this entity still owes simulation work this tick.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PendingAction {
    pub fraction: f32,
    /// Set once action points were restored for this tick.
    pub restored: bool,
    /// Points on hand when the current pass cleared action accounting.
    pub budget: i32,
}

impl PendingAction {
    pub fn new(fraction: f32) -> Self {
        Self {
            fraction,
            restored: false,
            budget: 0,
        }
    }
}

/// A single requested step, set by input (player) or the AI system.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveIntent {
    pub dx: i32,
    pub dy: i32,
}
