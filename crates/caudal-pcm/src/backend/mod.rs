//! Built-in stream backends.
//!
//! - [`null`]: discarding sink / silent source with a full local state
//!   machine — the backend every literal and config chain can bottom out on
//! - [`file`]: wrapper that captures the frames passing through its slave
//!   into a raw or WAV file
//! - [`plug`]: wrapper that owns the control table while forwarding the
//!   whole fast table to its slave
//! - [`mock`]: deterministic scripted backend for driving the transfer
//!   engine in tests
//!
//! Direct hardware and shared-memory transports live outside this crate;
//! the opener exposes injection slots for them.

pub mod file;
pub mod mock;
pub mod null;
pub mod plug;

pub use file::{FileFormat, FilePcm};
pub use mock::{MockHandle, MockPcm};
pub use null::NullPcm;
pub use plug::PlugPcm;
