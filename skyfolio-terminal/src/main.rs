/// Skyfolio Terminal - the star scene in your terminal
///
/// Controls:
///   - Mouse wheel / PgUp / PgDn / j / k: Scroll the virtual page
///   - Left drag: Orbit the camera
///   - Q/ESC: Quit

use anyhow::{Context, Result};
use clap::Parser;
use skyfolio_core::StageConfig;
use skyfolio_terminal::{AppOptions, TerminalApp};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "skyfolio-terminal")]
#[command(about = "Scroll-reactive star scene rendered as ASCII", long_about = None)]
struct Cli {
    /// Stage config file (`key = value` lines)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Seed for star placement, overriding the config file
    #[arg(long)]
    seed: Option<u32>,

    /// Length of the simulated page in pixels
    #[arg(long, default_value_t = 4000.0)]
    page_height: f32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StageConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => StageConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let options = AppOptions {
        fps: cli.fps,
        page_height: cli.page_height,
    };

    let mut app = TerminalApp::new(&config, options).context("failed to query terminal size")?;
    app.run().context("terminal renderer failed")?;

    log::info!("exited cleanly");
    Ok(())
}
