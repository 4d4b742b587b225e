// Re-export core modules for use by the binary or other consumers
pub mod components;
pub mod content;
pub mod core;
pub mod persistence;
pub mod simulation;
pub mod spatial;
pub mod systems;
pub mod transport;
pub mod world;

// Expose the simulation wrapper and the types needed to talk to it
pub use crate::core::{SimConfig, SimError, Simulation};
pub use crate::transport::{pair, SimEndpoint, SimMode, ToSim, ToUi, UiEndpoint};
