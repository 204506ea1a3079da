use strata_chunk::Cube;

/// Least pipeline stage a caller is willing to wait for. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Requirement {
    /// Only what is already in memory.
    GetCached,
    Load,
    Generate,
    Populate,
    Light,
}

impl Requirement {
    /// Whether a cube already in the store needs no further work for `self`.
    pub fn satisfied_by(self, cube: &Cube) -> bool {
        match self {
            Requirement::GetCached | Requirement::Load | Requirement::Generate => true,
            Requirement::Populate => cube.is_fully_populated(),
            Requirement::Light => cube.is_fully_populated() && cube.is_initial_lighting_done(),
        }
    }

    /// What the containing column has to reach before a cube can be resolved
    /// to `self`.
    pub fn for_column(self) -> Requirement {
        if self <= Requirement::Load {
            Requirement::Load
        } else {
            Requirement::Generate
        }
    }
}
