//! Standalone Animator (C8): independent per-fixture scene timers for
//! fixtures outside the reactive path.

mod scenes;
mod standalone;
mod state;

pub use standalone::{AnimatorPatch, StandaloneAnimator, StandaloneFrame};
pub use state::{AnimatorMode, AnimatorRanges, AnimatorScene, AnimatorState, ColorMode, Range, SpeedMode};
