//! Phase engine
//!
//! Ordered phase sets, the cycle driver that walks them, choreography
//! presets, intra-phase effects and the stage that keeps exactly one phase
//! instance mounted.

pub mod choreography;
pub mod driver;
pub mod effects;
pub mod instance;
pub mod observer;
pub mod set;
pub mod stage;
pub mod state;

pub use choreography::{ChildCue, Choreography, Easing, Keyframe, StaggerDirection};
pub use driver::CycleDriver;
pub use effects::{CounterStyle, Effect, EffectKind, EffectState};
pub use instance::{InstanceSnapshot, MountId, PhaseDef, PhaseInstance};
pub use observer::{NoopObserver, PhaseRef, StageObserver};
pub use set::{PhaseId, PhaseSet};
pub use stage::{ExitingGhost, PhaseStage, StageSnapshot};
pub use state::{CycleState, PhaseTick, PhaseTransition};
