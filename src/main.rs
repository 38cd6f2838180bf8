//! Demo controller: drives a renderer with a small two-tank scene.
//!
//! The first tank starts drifting right after two seconds and wraps back to
//! the left edge; the second tank disappears after five seconds. Close the
//! renderer window (or pass `--duration-secs`) to end the run.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use renderlink::{
    BridgeConfig, Hooks, Point, Size, Snapshot, Sprite, StateSource, Supervisor, WindowConfig,
};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;
const SCENE_FPS: u32 = 60;
const DRIFT_AFTER: Duration = Duration::from_secs(2);
const REMOVE_AFTER: Duration = Duration::from_secs(5);
const WRAP_TO_X: i32 = 10;

#[derive(Debug, Parser)]
#[command(name = "renderlink", version, about = "Drive an external renderer with a demo scene")]
struct Cli {
    /// Renderer binary to launch.
    #[arg(long)]
    renderer: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame rate used when the scene asks for 0 fps.
    #[arg(long)]
    fps: Option<u32>,

    /// Kill the renderer if it has not exited this long after shutdown starts.
    #[arg(long)]
    shutdown_timeout_ms: Option<u64>,

    /// Stop on our own after this many seconds.
    #[arg(long)]
    duration_secs: Option<u64>,
}

impl Cli {
    fn bridge_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => BridgeConfig::default(),
        };
        if let Some(path) = &self.renderer {
            config = config.with_renderer_path(path);
        }
        if let Some(fps) = self.fps {
            config = config.with_default_fps(fps);
        }
        if let Some(ms) = self.shutdown_timeout_ms {
            config = config.with_shutdown_timeout(Some(Duration::from_millis(ms)));
        }
        Ok(config)
    }
}

/// The demo scene. Owns its sprites and mutates them between ticks.
struct TankScene {
    window: WindowConfig,
    sprites: Vec<Sprite>,
    started: Instant,
    removed: bool,
}

impl TankScene {
    fn new() -> Self {
        let images = ["tank-1.png", "tank-2.png"];
        Self {
            window: WindowConfig::new(
                WINDOW_WIDTH,
                WINDOW_HEIGHT,
                "My Game",
                "background.jpeg",
                "cute-bunny.png",
            ),
            sprites: vec![
                Sprite::new("tank1", images, Point::new(100, 100), Size::new(64, 64)),
                Sprite::new("tank2", images, Point::new(200, 150), Size::new(128, 128)),
            ],
            started: Instant::now(),
            removed: false,
        }
    }

    fn advance(&mut self) {
        let elapsed = self.started.elapsed();

        if elapsed >= DRIFT_AFTER {
            if let Some(tank) = self.sprites.iter_mut().find(|s| s.id == "tank1") {
                let mut x = tank.location.x.saturating_add(1);
                if x > i32::try_from(self.window.width).unwrap_or(i32::MAX) {
                    x = WRAP_TO_X;
                }
                tank.move_to(x, tank.location.y);
            }
        }

        if elapsed >= REMOVE_AFTER && !self.removed {
            self.sprites.retain(|s| s.id != "tank2");
            self.removed = true;
            info!("tank2 removed");
        }
    }
}

impl StateSource for TankScene {
    fn snapshot(&mut self) -> Snapshot {
        self.advance();
        let mut snapshot = Snapshot::new(self.window.clone(), SCENE_FPS).with_default_font("Orbitron-Black.ttf");
        snapshot.sprites.clone_from(&self.sprites);
        snapshot
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.bridge_config()?;
    let renderer = config.renderer_path.clone();

    let mut bridge = Supervisor::launch_with(config, Hooks::new())
        .with_context(|| format!("starting renderer {}", renderer.display()))?;
    info!("Renderer running (pid {})", bridge.pid());

    if let Some(secs) = cli.duration_secs {
        let running = bridge.running_flag();
        thread::Builder::new()
            .name("demo-timer".to_string())
            .spawn(move || {
                thread::sleep(Duration::from_secs(secs));
                if running.stop() {
                    info!("Demo duration elapsed");
                }
            })
            .context("spawning demo timer")?;
    }

    let mut scene = TankScene::new();
    match bridge.run(&mut scene) {
        Ok(summary) => {
            info!(
                "Stopped ({:?}): {} frames sent, renderer exit {:?}",
                summary.reason, summary.frames_sent, summary.exit_status
            );
        }
        Err(e) => error!("Renderer teardown failed: {e}"),
    }
    Ok(())
}
