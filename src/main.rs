#![forbid(unsafe_code)]

mod config;

use std::cell::Cell;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use hashbrown::HashSet;
use strata_geom::{CUBE_SIZE, CubePos};
use strata_io::DirCubeIo;
use strata_runtime::{CubeGc, CubeProvider, ForcedColumns, Requirement};
use strata_world::{TerrainGenerator, WorldGenParams};

use config::{ServerConfig, load_server_config};

#[derive(Parser, Debug)]
#[command(name = "strata", about = "Headless cubic-chunk world driver")]
struct Args {
    /// TOML file with `ServerConfig`; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    world_dir: Option<PathBuf>,
    #[arg(long)]
    ticks: Option<u64>,
    /// View radius in cubes
    #[arg(long)]
    radius: Option<i32>,
    /// env_logger filter, e.g. `debug` or `info,provider=trace`
    #[arg(long)]
    log_level: Option<String>,
    #[arg(long, default_value_t = false)]
    save_on_exit: bool,
}

fn init_logging(level: Option<&str>) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info).parse_env("RUST_LOG");
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.init();
}

fn view_centre(cfg: &ServerConfig, tick: u64) -> CubePos {
    let step = match cfg.walk_every_ticks {
        0 => 0,
        n => (tick / n) as i32,
    };
    CubePos::new(step, cfg.worldgen.height.base_y.div_euclid(CUBE_SIZE), 0)
}

fn in_view(centre: CubePos, radius: i32, pos: CubePos) -> bool {
    centre.chebyshev(pos) <= radius
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let mut cfg = match &args.config {
        Some(path) => load_server_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(dir) = args.world_dir {
        cfg.world_dir = dir;
    }
    if let Some(ticks) = args.ticks {
        cfg.ticks = ticks;
    }
    if let Some(radius) = args.radius {
        cfg.radius = radius.max(0);
    }
    cfg.save_on_exit |= args.save_on_exit;

    log::info!("opening world at {}", cfg.world_dir.display());
    let io = Arc::new(DirCubeIo::open(cfg.world_dir.clone())?);
    let generator = Arc::new(TerrainGenerator::new(WorldGenParams::from_config(&cfg.worldgen)));
    let spawn = ForcedColumns::new();
    spawn.force(view_centre(&cfg, 0).column());
    let mut provider = CubeProvider::new(io, generator, cfg.provider.clone())?
        .with_pin_registry(Box::new(spawn.clone()));
    let mut gc = CubeGc::from_config(&cfg.provider);

    let ready = Rc::new(Cell::new(0usize));
    let mut requested: HashSet<CubePos> = HashSet::new();
    let r = cfg.radius;
    let mut centre = view_centre(&cfg, 0);

    for tick in 0..cfg.ticks {
        let now = view_centre(&cfg, tick);
        if now != centre {
            log::debug!("view centre moved to {now}");
            centre = now;
            requested.retain(|p| in_view(centre, r, *p));
        }

        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    let pos = CubePos::new(centre.x + dx, centre.y + dy, centre.z + dz);
                    if !requested.insert(pos) {
                        continue;
                    }
                    let ready = Rc::clone(&ready);
                    provider.resolve_cube_async(pos, Requirement::Light, move |_, found| {
                        if found.is_some() {
                            ready.set(ready.get() + 1);
                        }
                    });
                }
            }
        }

        provider.drive_pending_completions();
        if let Some(report) = gc.tick(&mut provider, |p| in_view(centre, r + 1, p)) {
            if report.errors > 0 {
                log::warn!(target: "gc", "{} unload errors this sweep", report.errors);
            }
        }
        provider.advance_time(1);

        if tick % 20 == 0 {
            log::info!(
                "tick {tick}: {}, {} cubes ready, {} reads pending",
                provider.describe(),
                ready.get(),
                provider.pending_io()
            );
        }
        thread::sleep(Duration::from_millis(cfg.tick_interval_ms));
    }

    // let in-flight reads land before saving
    while provider.pending_io() > 0 {
        provider.drive_pending_completions();
        thread::sleep(Duration::from_millis(1));
    }
    log::debug!("loaded cubes:\n{}", provider.dump_loaded_cubes());

    if cfg.save_on_exit {
        let report = provider.save_all();
        if report.failed > 0 {
            return Err(format!("{} records failed to save", report.failed).into());
        }
    }
    log::info!("done: {}", provider.describe());
    Ok(())
}
