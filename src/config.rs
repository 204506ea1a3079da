use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use strata_runtime::ProviderConfig;
use strata_world::WorldGenConfig;

/// Settings for the headless driver. Every field falls back to a default, so
/// an empty file is a valid config.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_world_dir")]
    pub world_dir: PathBuf,
    /// Horizontal and vertical view distance, in cubes.
    #[serde(default = "default_radius")]
    pub radius: i32,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// The view centre steps one cube along +x this often. 0 keeps it still.
    #[serde(default = "default_walk_every")]
    pub walk_every_ticks: u64,
    #[serde(default)]
    pub save_on_exit: bool,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub worldgen: WorldGenConfig,
}

fn default_world_dir() -> PathBuf {
    PathBuf::from("world")
}
fn default_radius() -> i32 {
    2
}
fn default_ticks() -> u64 {
    200
}
fn default_tick_interval() -> u64 {
    50
}
fn default_walk_every() -> u64 {
    40
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            world_dir: default_world_dir(),
            radius: default_radius(),
            ticks: default_ticks(),
            tick_interval_ms: default_tick_interval(),
            walk_every_ticks: default_walk_every(),
            save_on_exit: false,
            provider: ProviderConfig::default(),
            worldgen: WorldGenConfig::default(),
        }
    }
}

pub fn load_server_config(path: &Path) -> Result<ServerConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    Ok(toml::from_str(&s)?)
}
