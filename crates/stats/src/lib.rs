//! Rolling flow statistics: the sliding sample window behind the live display.

pub mod window;

pub use window::{StatsWindow, DEFAULT_CAPACITY};
