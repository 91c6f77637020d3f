mod app;
mod config;
mod demo;
mod logging;
mod renderer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use crate::config::AppConfig;

/// Terminal viewer for a synthetic genome graph.
#[derive(Debug, Parser)]
#[command(name = "bpview", version, about)]
struct Args {
    /// TOML config file; missing fields keep their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of segments in the demo graph.
    #[arg(long)]
    segments: Option<u32>,

    /// Seed of the demo graph generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Log file; defaults to `bpview.log` in the temp directory.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(segments) = self.segments {
            config.demo.segments = segments;
        }
        if let Some(seed) = self.seed {
            config.demo.seed = seed;
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut config);

    let log_path = config.log_path();
    logging::init(&log_path).context("initializing logging")?;
    info!(?log_path, ?config, "starting bpview");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building the runtime")?;
    let local = tokio::task::LocalSet::new();

    let mut terminal = renderer::init_terminal()?;
    let result = local.block_on(&runtime, app::run(config, &mut terminal));
    renderer::restore_terminal(&mut terminal)?;

    if let Err(err) = &result {
        error!(%err, "bpview exited with an error");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let args = Args::parse_from(["bpview", "--segments", "12", "--seed", "9"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.demo.segments, 12);
        assert_eq!(config.demo.seed, 9);
        assert_eq!(config.log_file, None);
    }
}
