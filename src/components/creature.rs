use std::collections::BTreeMap;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::world::EntityUid;
use crate::content::ResourceId;

/// Marks an entity as a creature: it acts on the schedule and blocks movement.
#[derive(Component, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub species: ResourceId,
    pub hostile: bool,
}

/// Per-entity action budget. `per_turn` is both the full-turn restore and the cap.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPoints {
    pub current: i32,
    pub per_turn: i32,
}

impl ActionPoints {
    pub fn new(per_turn: i32) -> Self {
        Self {
            current: 0,
            per_turn,
        }
    }

    /// Restore `per_turn * fraction`, rounded, without exceeding the cap.
    pub fn restore(&mut self, fraction: f32) {
        let gain = (self.per_turn as f32 * fraction).round() as i32;
        self.current = (self.current + gain.max(0)).min(self.per_turn);
    }

    pub fn can_afford(&self, cost: i32) -> bool {
        self.current >= cost
    }

    pub fn spend(&mut self, cost: i32) {
        self.current -= cost;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillKind {
    Swim,
    Climb,
    Melee,
}

#[derive(Component, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Skills(pub BTreeMap<SkillKind, i32>);

impl Skills {
    pub fn value(&self, kind: SkillKind) -> i32 {
        self.0.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BehaviorKind {
    Idle,
    Wander,
    Hunter,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    pub kind: BehaviorKind,
}

#[derive(Component, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<EntityUid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_scales_by_fraction_and_caps() {
        let mut ap = ActionPoints::new(100);
        ap.restore(0.25);
        assert_eq!(ap.current, 25);
        ap.restore(1.0);
        assert_eq!(ap.current, 100);
        ap.spend(100);
        assert!(!ap.can_afford(1));
    }

    #[test]
    fn missing_skill_reads_zero() {
        let skills = Skills::default();
        assert_eq!(skills.value(SkillKind::Swim), 0);
    }
}
