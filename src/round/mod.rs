//! Round lifecycle: controller, pure state machine and advice cache.

mod advice_cache;
mod controller;
mod lifecycle;

pub use advice_cache::{AdviceCache, AdviceSnapshot};
pub use controller::{ControllerSnapshot, RoundController};
pub use lifecycle::{Phase, RevealSchedule, RevealTiming, RoundLifecycle};
