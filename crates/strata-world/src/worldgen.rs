use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub seed: i32,
    #[serde(default)]
    pub height: Height,
    #[serde(default)]
    pub surface: Surface,
    #[serde(default)]
    pub trees: Trees,
    #[serde(default)]
    pub ores: Ores,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Height {
    #[serde(default = "default_height_freq")]
    pub frequency: f32,
    #[serde(default = "default_base_y")]
    pub base_y: i32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_sea_level")]
    pub sea_level: i32,
}
fn default_height_freq() -> f32 {
    0.01
}
fn default_base_y() -> i32 {
    64
}
fn default_amplitude() -> f32 {
    24.0
}
fn default_sea_level() -> i32 {
    62
}
impl Default for Height {
    fn default() -> Self {
        Self {
            frequency: default_height_freq(),
            base_y: default_base_y(),
            amplitude: default_amplitude(),
            sea_level: default_sea_level(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Surface {
    #[serde(default = "default_topsoil")]
    pub topsoil_thickness: i32,
}
fn default_topsoil() -> i32 {
    3
}
impl Default for Surface {
    fn default() -> Self {
        Self {
            topsoil_thickness: default_topsoil(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Trees {
    #[serde(default = "default_tree_prob")]
    pub probability: f32,
    #[serde(default = "default_trunk_min")]
    pub trunk_min: i32,
    #[serde(default = "default_trunk_max")]
    pub trunk_max: i32,
    #[serde(default = "default_leaf_radius")]
    pub leaf_radius: i32,
}
fn default_tree_prob() -> f32 {
    0.02
}
fn default_trunk_min() -> i32 {
    4
}
fn default_trunk_max() -> i32 {
    6
}
fn default_leaf_radius() -> i32 {
    2
}
impl Default for Trees {
    fn default() -> Self {
        Self {
            probability: default_tree_prob(),
            trunk_min: default_trunk_min(),
            trunk_max: default_trunk_max(),
            leaf_radius: default_leaf_radius(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Ores {
    #[serde(default = "default_veins")]
    pub veins_per_cube: u32,
    #[serde(default = "default_vein_size")]
    pub vein_size: u32,
    #[serde(default = "default_max_ore_y")]
    pub max_y: i32,
}
fn default_veins() -> u32 {
    4
}
fn default_vein_size() -> u32 {
    6
}
fn default_max_ore_y() -> i32 {
    48
}
impl Default for Ores {
    fn default() -> Self {
        Self {
            veins_per_cube: default_veins(),
            vein_size: default_vein_size(),
            max_y: default_max_ore_y(),
        }
    }
}

/// Flattened runtime parameters derived from a [`WorldGenConfig`].
#[derive(Clone, Debug)]
pub struct WorldGenParams {
    pub seed: i32,
    pub height_frequency: f32,
    pub base_y: i32,
    pub amplitude: f32,
    pub sea_level: i32,
    pub topsoil_thickness: i32,
    pub tree_probability: f32,
    pub trunk_min: i32,
    pub trunk_max: i32,
    pub leaf_radius: i32,
    pub ore_veins_per_cube: u32,
    pub ore_vein_size: u32,
    pub ore_max_y: i32,
}

impl WorldGenParams {
    pub fn from_config(cfg: &WorldGenConfig) -> Self {
        let trunk_min = cfg.trees.trunk_min.max(1);
        Self {
            seed: cfg.seed,
            height_frequency: cfg.height.frequency,
            base_y: cfg.height.base_y,
            amplitude: cfg.height.amplitude.max(0.0),
            sea_level: cfg.height.sea_level,
            topsoil_thickness: cfg.surface.topsoil_thickness.max(0),
            tree_probability: cfg.trees.probability.clamp(0.0, 1.0),
            trunk_min,
            trunk_max: cfg.trees.trunk_max.max(trunk_min),
            // leaves must stay inside the 2x2x2 population footprint
            leaf_radius: cfg.trees.leaf_radius.clamp(0, 7),
            ore_veins_per_cube: cfg.ores.veins_per_cube,
            ore_vein_size: cfg.ores.vein_size,
            ore_max_y: cfg.ores.max_y,
        }
    }
}

impl Default for WorldGenParams {
    fn default() -> Self {
        Self::from_config(&WorldGenConfig::default())
    }
}

pub fn load_params_from_path(path: &Path) -> Result<WorldGenParams, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: WorldGenConfig = toml::from_str(&s)?;
    Ok(WorldGenParams::from_config(&cfg))
}
