use strata_chunk::StoreError;
use strata_world::GenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// An ownership invariant broke: duplicate registration, a failed
    /// removal, or a coordinate that should exist but does not.
    #[error("provider state violation: {0}")]
    State(String),
    #[error(transparent)]
    Generation(#[from] GenError),
    #[error("storage failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for ProviderError {
    fn from(e: StoreError) -> Self {
        ProviderError::State(e.to_string())
    }
}
