pub mod error;
pub mod event;
pub mod state;

pub use error::{MeterError, Result};
pub use event::{Message, SessionEndReason};
pub use state::{Sample, StatsSnapshot};
