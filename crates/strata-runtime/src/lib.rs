//! Cube provider: the readiness pipeline, eviction, and the periodic sweep.
#![forbid(unsafe_code)]

mod access;
pub mod config;
pub mod error;
pub mod gc;
pub mod pins;
pub mod provider;
pub mod requirement;
mod unload;

pub use config::{ProviderConfig, load_provider_config};
pub use error::ProviderError;
pub use gc::{CubeGc, GcReport};
pub use pins::{ForcedColumns, PinRegistry};
pub use provider::{CubeProvider, SaveReport};
pub use requirement::Requirement;
