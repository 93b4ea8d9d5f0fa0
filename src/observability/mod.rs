//! Observability
//!
//! Logging setup and the structured JSONL event stream.

pub mod events;
pub mod logging;

pub use events::{Event, EventEmitter};
pub use logging::{LogFormat, init_logging};
