use std::fmt;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Content module identifier, the high 16 bits of every entity and map uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleUid(pub u16);

impl ModuleUid {
    /// Reserved for the runtime itself (player, runtime-spawned entities).
    pub const RUNTIME: ModuleUid = ModuleUid(0);
}

impl fmt::Display for ModuleUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-wide entity identifier: `(module << 48) | local`.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityUid(pub u64);

impl EntityUid {
    pub const LOCAL_BITS: u32 = 48;
    pub const MAX_LOCAL: u64 = (1 << Self::LOCAL_BITS) - 1;
    pub const PLAYER: EntityUid = EntityUid(0);

    /// `None` when `local` does not fit in the low 48 bits.
    pub fn compose(module: ModuleUid, local: u64) -> Option<Self> {
        if local > Self::MAX_LOCAL {
            return None;
        }
        Some(Self(((module.0 as u64) << Self::LOCAL_BITS) | local))
    }

    pub fn module(self) -> ModuleUid {
        ModuleUid((self.0 >> Self::LOCAL_BITS) as u16)
    }

    pub fn local(self) -> u64 {
        self.0 & Self::MAX_LOCAL
    }
}

impl fmt::Display for EntityUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map identifier: `(module << 16) | local map uid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapUid(pub u32);

impl MapUid {
    pub fn compose(module: ModuleUid, local: u16) -> Self {
        Self(((module.0 as u32) << 16) | local as u32)
    }

    pub fn module(self) -> ModuleUid {
        ModuleUid((self.0 >> 16) as u16)
    }

    pub fn local(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl fmt::Display for MapUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placement of an entity on a map grid.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub map: MapUid,
    pub x: i32,
    pub y: i32,
}

/// Marker component for the human player to distinguish them from NPCs.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player;

/// Display name.
#[derive(Component, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);
