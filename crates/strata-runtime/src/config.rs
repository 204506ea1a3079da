use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_io_threads")]
    pub io_threads: usize,
    /// Skip skylight diffusion; cubes are marked lit straight away.
    #[serde(default)]
    pub no_sunlight_propagation: bool,
    /// When set to `h`, population of a cube with `0 <= y < h` also requires
    /// cubes `0..h` of its column.
    #[serde(default)]
    pub column_population_span: Option<i32>,
    #[serde(default = "default_gc_interval")]
    pub gc_interval_ticks: u64,
    #[serde(default = "default_gc_budget")]
    pub gc_unload_budget: usize,
}

fn default_io_threads() -> usize {
    2
}
fn default_gc_interval() -> u64 {
    20
}
fn default_gc_budget() -> usize {
    256
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            io_threads: default_io_threads(),
            no_sunlight_propagation: false,
            column_population_span: None,
            gc_interval_ticks: default_gc_interval(),
            gc_unload_budget: default_gc_budget(),
        }
    }
}

pub fn load_provider_config(path: &Path) -> Result<ProviderConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    Ok(toml::from_str(&s)?)
}
