// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PowerPlan.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use powerplan_core::{Planner, SnapshotStore, options_table};
use powerplan_types::{InputBundle, SensorSnapshot};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "powerplan",
    about = "Receding-horizon dispatch planner for a PV household with battery and hot-water store",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one planning cycle and print the resulting actuator commands
    Plan {
        /// Input bundle JSON (forecasts, timestamps, initial state)
        #[arg(long)]
        input: PathBuf,

        /// Settings file with option overrides
        #[arg(long, default_value = "powerplan.toml")]
        settings: PathBuf,

        /// Live PV reading [kW]; defaults to the first forecast step
        #[arg(long)]
        pv_now: Option<f64>,

        /// Live load reading [kW]; defaults to the first forecast step
        #[arg(long)]
        load_now: Option<f64>,
    },
    /// Print the declarative option table as JSON
    Options,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Plan {
            input,
            settings,
            pv_now,
            load_now,
        } => plan(&input, &settings, pv_now, load_now),
        Command::Options => {
            println!("{}", serde_json::to_string_pretty(&options_table())?);
            Ok(())
        }
    }
}

fn plan(
    input: &std::path::Path,
    settings: &std::path::Path,
    pv_now: Option<f64>,
    load_now: Option<f64>,
) -> Result<()> {
    let config = AppConfig::load(settings)?;

    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read input bundle {}", input.display()))?;
    let bundle: InputBundle = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse input bundle {}", input.display()))?;

    let sensors = SensorSnapshot {
        pv_kw: pv_now
            .or_else(|| bundle.series.pv_kw.first().copied())
            .unwrap_or(0.0),
        load_kw: load_now
            .or_else(|| bundle.series.load_kw.first().copied())
            .unwrap_or(0.0),
    };
    let data_dir = config.data_dir();
    info!(
        steps = bundle.times.len(),
        pv_now = sensors.pv_kw,
        load_now = sensors.load_kw,
        data_dir = %data_dir.display(),
        "powerplan starting"
    );

    let planner = Planner::new(config.options, SnapshotStore::new(data_dir));
    let outcome = planner
        .run_cycle(bundle, &sensors, chrono::Utc::now())
        .context("planning cycle failed")?;

    println!("{}", serde_json::to_string_pretty(&outcome.actions)?);
    Ok(())
}
