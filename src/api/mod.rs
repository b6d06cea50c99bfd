//! Engine API client and the trait seam the core talks through.

mod engine_client;
mod types;

#[cfg(test)]
pub mod mock;

pub use engine_client::{EngineApi, EngineClient, DEFAULT_ENGINE_URL};
pub use types::*;
