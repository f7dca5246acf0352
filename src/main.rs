// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod app;
mod config;
mod lookup;
mod map;
mod scene;
mod ui;

use clap::Parser;
use config::AppConfig;
use eframe::egui;
use log::{info, warn};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "station-radius")]
#[command(about = "Show station geofence radii and probe coordinates on a map", long_about = None)]
struct Args {
    /// Skip the station service and use simulated stations only
    #[arg(long)]
    offline: bool,

    /// Station number to look up on startup
    #[arg(long)]
    station: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the configuration file path and exit
    #[arg(long)]
    print_config_path: bool,
}

fn main() -> Result<(), eframe::Error> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if args.print_config_path {
        match AppConfig::get_config_path() {
            Ok(path) => println!("{}", path.display()),
            Err(e) => eprintln!("Could not determine config path: {e}"),
        }
        return Ok(());
    }

    info!("Starting Station Radius...");

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {e}");
        AppConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_title("Station Radius"),
        ..Default::default()
    };

    eframe::run_native(
        "Station Radius",
        options,
        Box::new(move |cc| {
            let app = app::StationApp::new(&cc.egui_ctx, &config, args.offline, args.station)?;
            Ok(Box::new(app))
        }),
    )
}
