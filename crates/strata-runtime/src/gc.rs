use strata_geom::CubePos;

use crate::config::ProviderConfig;
use crate::provider::CubeProvider;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcReport {
    pub cubes_unloaded: usize,
    pub columns_unloaded: usize,
    /// Candidates the provider declined (pinned, ticketed, or still loading).
    pub refused: usize,
    pub errors: usize,
}

/// Periodic sweep offering unwatched cubes, then empty columns, to the
/// provider's unload path.
#[derive(Debug)]
pub struct CubeGc {
    interval: u64,
    budget: usize,
    ticks: u64,
}

impl CubeGc {
    pub fn new(interval_ticks: u64, unload_budget: usize) -> Self {
        Self {
            interval: interval_ticks.max(1),
            budget: unload_budget,
            ticks: 0,
        }
    }

    pub fn from_config(cfg: &ProviderConfig) -> Self {
        Self::new(cfg.gc_interval_ticks, cfg.gc_unload_budget)
    }

    /// Counts one tick and sweeps when the interval elapses.
    pub fn tick(&mut self, provider: &mut CubeProvider, is_watched: impl Fn(CubePos) -> bool) -> Option<GcReport> {
        self.ticks += 1;
        if self.ticks < self.interval {
            return None;
        }
        self.ticks = 0;
        Some(self.sweep(provider, is_watched))
    }

    pub fn sweep(&mut self, provider: &mut CubeProvider, is_watched: impl Fn(CubePos) -> bool) -> GcReport {
        let mut report = GcReport::default();
        let mut left = self.budget;

        for pos in provider.cube_positions() {
            if left == 0 {
                break;
            }
            if is_watched(pos) {
                continue;
            }
            match provider.try_unload_cube(pos) {
                Ok(true) => {
                    report.cubes_unloaded += 1;
                    left -= 1;
                }
                Ok(false) => report.refused += 1,
                Err(e) => {
                    log::error!(target: "gc", "unloading cube {pos} failed: {e}");
                    report.errors += 1;
                }
            }
        }

        for pos in provider.column_positions() {
            if left == 0 {
                break;
            }
            if provider.column(pos).is_some_and(|c| c.has_loaded_cubes()) {
                continue;
            }
            match provider.try_unload_column(pos) {
                Ok(true) => {
                    report.columns_unloaded += 1;
                    left -= 1;
                }
                Ok(false) => report.refused += 1,
                Err(e) => {
                    log::error!(target: "gc", "unloading column {pos} failed: {e}");
                    report.errors += 1;
                }
            }
        }

        if report.cubes_unloaded + report.columns_unloaded > 0 {
            log::debug!(
                target: "gc",
                "unloaded {} cubes, {} columns; {}",
                report.cubes_unloaded,
                report.columns_unloaded,
                provider.describe()
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strata_io::MemoryCubeIo;
    use strata_world::FlatGenerator;

    use super::*;
    use crate::requirement::Requirement;

    #[test]
    fn sweeps_only_on_interval_and_respects_budget() {
        let mut p = CubeProvider::new(
            Arc::new(MemoryCubeIo::new()),
            Arc::new(FlatGenerator::new(0)),
            ProviderConfig::default(),
        )
        .unwrap();
        for x in 0..4 {
            p.resolve_cube(CubePos::new(x, 0, 0), Requirement::Generate).unwrap();
        }
        let mut gc = CubeGc::new(3, 2);
        assert!(gc.tick(&mut p, |_| false).is_none());
        assert!(gc.tick(&mut p, |_| false).is_none());
        let r = gc.tick(&mut p, |c| c.x == 0).unwrap();
        assert_eq!(r.cubes_unloaded, 2);
        assert_eq!(r.columns_unloaded, 0);
        assert_eq!(p.loaded_cube_count(), 2);

        let r = gc.sweep(&mut p, |c| c.x == 0);
        assert_eq!(r.cubes_unloaded, 1);
        assert_eq!(r.columns_unloaded, 1);
        let r = gc.sweep(&mut p, |c| c.x == 0);
        assert_eq!(r.columns_unloaded, 2);
        assert_eq!(p.loaded_cube_count(), 1);
        assert_eq!(p.loaded_column_count(), 1);
    }
}
