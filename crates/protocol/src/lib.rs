//! Wire protocol for the flow sensor.
//!
//! The device streams newline-terminated `FR:<number>` lines over a byte
//! transport that splits them arbitrarily.  [`LineAssembler`] restores line
//! boundaries, [`SampleStream`] turns lines into samples, and [`Session`]
//! runs both for the lifetime of one connection.

pub mod assembler;
pub mod sample;
pub mod session;

pub use assembler::{DecodeError, LineAssembler, DEFAULT_MAX_LINE_LEN};
pub use sample::{parse_sample, LineCounters, Rejection, SampleStream, PREFIX};
pub use session::Session;
