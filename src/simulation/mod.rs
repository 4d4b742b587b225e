pub mod metronome;
pub mod scheduler;
pub mod time;

pub use metronome::Metronome;
pub use scheduler::{Scheduler, TickReport, WorkQueue};
pub use time::GameTime;
