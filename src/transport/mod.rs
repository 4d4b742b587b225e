pub mod channel;
pub mod dispatch;
pub mod events;

pub use channel::{pair, Endpoint, Outbox, SimEndpoint, UiEndpoint};
pub use dispatch::Dispatcher;
pub use events::{Event, SimMode, ToSim, ToSimKind, ToUi, ToUiKind};
