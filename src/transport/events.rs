use serde::{Deserialize, Serialize};

use crate::components::world::{EntityUid, MapUid};

/// Whether the simulation waits for the player or runs on the heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimMode {
    TurnBased,
    RealTime,
}

impl SimMode {
    pub fn toggled(self) -> Self {
        match self {
            SimMode::TurnBased => SimMode::RealTime,
            SimMode::RealTime => SimMode::TurnBased,
        }
    }
}

/// Presentation -> simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToSim {
    MovePlayer { dx: i32, dy: i32 },
    Wait,
    AdvanceTurn,
    Heartbeat,
    TogglePause,
    Save { name: String },
    Load { name: String },
    Quit,
}

/// Simulation -> presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToUi {
    EntityMoved {
        uid: EntityUid,
        map: MapUid,
        from: (i32, i32),
        to: (i32, i32),
    },
    Collision {
        mover: EntityUid,
        obstacle: EntityUid,
    },
    Damaged {
        uid: EntityUid,
        amount: i32,
        remaining: i32,
    },
    Died {
        uid: EntityUid,
    },
    TickCompleted {
        tick: u64,
        turn: u64,
        fraction: f32,
    },
    ModeChanged {
        mode: SimMode,
    },
    Saved {
        name: String,
    },
    Message {
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToSimKind {
    MovePlayer,
    Wait,
    AdvanceTurn,
    Heartbeat,
    TogglePause,
    Save,
    Load,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToUiKind {
    EntityMoved,
    Collision,
    Damaged,
    Died,
    TickCompleted,
    ModeChanged,
    Saved,
    Message,
}

/// An event with a payload-free kind to dispatch on.
pub trait Event {
    type Kind: Copy + Eq + std::hash::Hash + std::fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

impl Event for ToSim {
    type Kind = ToSimKind;

    fn kind(&self) -> ToSimKind {
        match self {
            ToSim::MovePlayer { .. } => ToSimKind::MovePlayer,
            ToSim::Wait => ToSimKind::Wait,
            ToSim::AdvanceTurn => ToSimKind::AdvanceTurn,
            ToSim::Heartbeat => ToSimKind::Heartbeat,
            ToSim::TogglePause => ToSimKind::TogglePause,
            ToSim::Save { .. } => ToSimKind::Save,
            ToSim::Load { .. } => ToSimKind::Load,
            ToSim::Quit => ToSimKind::Quit,
        }
    }
}

impl Event for ToUi {
    type Kind = ToUiKind;

    fn kind(&self) -> ToUiKind {
        match self {
            ToUi::EntityMoved { .. } => ToUiKind::EntityMoved,
            ToUi::Collision { .. } => ToUiKind::Collision,
            ToUi::Damaged { .. } => ToUiKind::Damaged,
            ToUi::Died { .. } => ToUiKind::Died,
            ToUi::TickCompleted { .. } => ToUiKind::TickCompleted,
            ToUi::ModeChanged { .. } => ToUiKind::ModeChanged,
            ToUi::Saved { .. } => ToUiKind::Saved,
            ToUi::Message { .. } => ToUiKind::Message,
        }
    }
}
