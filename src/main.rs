//! Headless terrain tool: editor-style previews and a simulated streaming session.
#![forbid(unsafe_code)]

mod watch;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use horizon_chunk::ChunkEvent;
use horizon_geom::Vec2;
use horizon_runtime::{DrawMode, GenerationScheduler, Preview, Streamer, parse_seed, preview};
use horizon_world::{TerrainParams, load_params_from_path};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

#[derive(Parser, Debug)]
#[command(name = "horizon", about = "Procedural chunked terrain generator")]
struct Args {
    /// Terrain config (TOML). Missing file means built-in defaults.
    #[arg(long, default_value = "assets/terrain.toml")]
    config: PathBuf,
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
    /// Seed override, 0..=10000000000
    #[arg(long)]
    seed: Option<String>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the origin chunk once and write it out.
    Preview {
        #[arg(long, value_enum, default_value_t = Mode::Color)]
        mode: Mode,
        /// Output image (PNG)
        #[arg(long, default_value = "preview.png")]
        out: PathBuf,
    },
    /// Walk a viewer across the terrain and stream chunks around it.
    Stream {
        #[arg(long, default_value_t = 240)]
        ticks: u32,
        /// World units moved along +X per tick
        #[arg(long, default_value_t = 12.0)]
        speed: f32,
        #[arg(long, default_value_t = 16)]
        tick_ms: u64,
        /// Reload the config file when it changes
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    Noise,
    Color,
    Mesh,
}

impl From<Mode> for DrawMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Noise => DrawMode::NoiseMap,
            Mode::Color => DrawMode::ColorMap,
            Mode::Mesh => DrawMode::Mesh,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn load_params(path: &Path, seed: Option<i32>) -> Result<TerrainParams, Box<dyn Error>> {
    let params = if path.exists() {
        load_params_from_path(path)?
    } else {
        log::warn!("terrain config missing: {}; using defaults", path.display());
        TerrainParams::default()
    };
    Ok(match seed {
        Some(s) => params.with_seed(s),
        None => params,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let _ = TermLogger::init(
        args.log_level.into(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    let seed = match &args.seed {
        Some(text) => Some(parse_seed(text).ok_or_else(|| format!("invalid seed '{text}'"))?),
        None => None,
    };
    let params = load_params(&args.config, seed)?;

    match args.cmd {
        Command::Preview { mode, out } => run_preview(&params, mode.into(), &out),
        Command::Stream {
            ticks,
            speed,
            tick_ms,
            watch: watch_config,
        } => run_stream(params, &args.config, seed, ticks, speed, tick_ms, watch_config),
    }
}

fn run_preview(params: &TerrainParams, mode: DrawMode, out: &Path) -> Result<(), Box<dyn Error>> {
    match preview(params, mode) {
        Preview::NoiseMap(img) | Preview::ColorMap(img) => {
            img.write_png(out)?;
            println!("{} {}x{} -> {}", mode, img.width, img.height, out.display());
        }
        Preview::Mesh { lod, mesh, texture } => {
            texture.write_png(out)?;
            println!(
                "mesh lod {}: {} vertices, {} triangles, {} shading; texture {}x{} -> {}",
                lod,
                mesh.vertex_count(),
                mesh.triangle_count(),
                if mesh.is_flat_shaded() { "flat" } else { "smooth" },
                texture.width,
                texture.height,
                out.display()
            );
        }
    }
    Ok(())
}

#[derive(Default)]
struct SessionCounters {
    data_ready: usize,
    meshes_activated: usize,
    shown: usize,
    hidden: usize,
    removed: usize,
}

impl SessionCounters {
    fn record(&mut self, events: Vec<ChunkEvent>) {
        for ev in events {
            match ev {
                ChunkEvent::DataReady { .. } => self.data_ready += 1,
                ChunkEvent::MeshActivated { .. } => self.meshes_activated += 1,
                ChunkEvent::VisibilityChanged { visible: true, .. } => self.shown += 1,
                ChunkEvent::VisibilityChanged { visible: false, .. } => self.hidden += 1,
                ChunkEvent::Removed { .. } => self.removed += 1,
            }
        }
    }
}

fn run_stream(
    params: TerrainParams,
    config: &Path,
    seed: Option<i32>,
    ticks: u32,
    speed: f32,
    tick_ms: u64,
    watch_config: bool,
) -> Result<(), Box<dyn Error>> {
    let scheduler = GenerationScheduler::with_default_workers();
    log::info!(
        target: "streaming",
        "streaming with {} workers, chunk size {}, view distance {}",
        scheduler.workers,
        params.chunk_size,
        params.max_view_distance()
    );
    let mut streamer = Streamer::new(Arc::new(params), scheduler);
    let reload_rx = watch_config.then(|| watch::spawn_config_watcher(config.to_path_buf()));
    let mut counters = SessionCounters::default();

    let mut viewer = Vec2::ZERO;
    for tick in 0..ticks {
        if let Some(rx) = &reload_rx {
            if rx.try_iter().count() > 0 {
                match load_params(config, seed) {
                    Ok(p) => {
                        let rev = streamer.reconfigure(Arc::new(p));
                        log::info!("config reloaded from {} (rev {})", config.display(), rev);
                    }
                    Err(e) => log::warn!("config reload failed ({}): {}", config.display(), e),
                }
            }
        }
        let stats = streamer.tick(viewer);
        if stats.pass_ran {
            let c = streamer.store().current_chunk();
            log::info!(
                target: "streaming",
                "[tick {}] viewer ({:.0}, {:.0}) chunk ({}, {}): {} chunks, {} in flight",
                tick,
                viewer.x,
                viewer.y,
                c.cx,
                c.cz,
                streamer.store().len(),
                streamer.scheduler().inflight()
            );
        }
        counters.record(streamer.drain_events());
        viewer = viewer + Vec2::new(speed, 0.0);
        std::thread::sleep(Duration::from_millis(tick_ms));
    }

    if !streamer.wait_idle(Duration::from_secs(120)) {
        log::warn!("generation still running after timeout");
    }
    counters.record(streamer.drain_events());
    println!(
        "chunks {} visible {} | data {} meshes {} shown {} hidden {} removed {}",
        streamer.store().len(),
        streamer.store().visible_chunks().count(),
        counters.data_ready,
        counters.meshes_activated,
        counters.shown,
        counters.hidden,
        counters.removed
    );
    Ok(())
}
