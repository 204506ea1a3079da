use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashSet;
use strata_geom::ColumnPos;

/// Host-side persistent pins ("forced" columns). A pinned column and its
/// cubes are never unloaded.
pub trait PinRegistry {
    fn is_persistently_pinned(&self, column: ColumnPos) -> bool;
}

/// Shared set of forced columns. Clones observe the same set, so the host can
/// keep a handle after giving one to the provider.
#[derive(Clone, Debug, Default)]
pub struct ForcedColumns {
    inner: Arc<RwLock<HashSet<ColumnPos>>>,
}

impl ForcedColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the column was already forced.
    pub fn force(&self, column: ColumnPos) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(column)
    }

    /// Returns false if the column was not forced.
    pub fn release(&self, column: ColumnPos) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&column)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PinRegistry for ForcedColumns {
    fn is_persistently_pinned(&self, column: ColumnPos) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&column)
    }
}
