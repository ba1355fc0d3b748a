mod app;
mod color;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use app::MeCanApp;
use clap::Parser;
use eframe::egui;
use mecan::config::{AppConfig, DEFAULT_CONFIG_PATH};
use mecan::state::Resources;

/// MeCan: personalized chemotherapy sensitivity from a gene expression profile
#[derive(Parser, Debug)]
#[command(name = "mecan")]
#[command(version)]
struct Args {
    /// Configuration file (models, gene sets, example patients)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = AppConfig::load(&args.config)?;
    let resources = Resources::load(&config).context("loading drug models")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "MeCan",
        options,
        Box::new(move |_cc| Ok(Box::new(MeCanApp::new(resources)))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
