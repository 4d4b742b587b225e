use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::content::ResourceId;

#[derive(Component, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ResourceId,
    pub weight: u32,
}
