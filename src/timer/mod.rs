//! Timer primitives
//!
//! - [`TimerHandle`]: one cancellable one-shot or repeating callback
//! - [`TaskScope`]: owns every timer of one mounted lifetime and releases
//!   them together

pub mod handle;
pub mod scope;

pub use handle::{TimerHandle, TimerId};
pub use scope::TaskScope;
