//! Command-line interface
//!
//! Serving is the default mode; `train` fits a bundle offline from a CSV on
//! disk, writing the same bundle file the server reads.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::data;
use crate::server::{run_server, ServerConfig};
use crate::store::{FileModelStore, ModelStore};
use crate::training::{train_bundle, TrainingOptions};

#[derive(Parser)]
#[command(name = "mpg-predictor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Car fuel-economy prediction service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,

        /// Model bundle file
        #[arg(long)]
        model: Option<PathBuf>,

        /// Prediction history CSV
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Train a model from a CSV file and write the bundle to disk
    Train {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Output bundle file
        #[arg(short, long, default_value = "mpg_model.bin")]
        output: PathBuf,

        /// Number of trees
        #[arg(long, default_value_t = 100)]
        trees: usize,

        /// Random seed for the split and the forest
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    model: Option<PathBuf>,
    history: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(model) = model {
        config.model_path = model.to_string_lossy().into_owned();
    }
    if let Some(history) = history {
        config.history_path = history.to_string_lossy().into_owned();
    }

    run_server(config).await
}

pub fn cmd_train(data: &PathBuf, output: &PathBuf, trees: usize, seed: u64) -> anyhow::Result<()> {
    let df = data::read_csv_path(data)?;
    info!(rows = df.height(), columns = df.width(), "Loaded training data");

    let opts = TrainingOptions::default()
        .with_n_estimators(trees)
        .with_seed(seed);
    let bundle = train_bundle(&df, &opts)?;

    let store = FileModelStore::new(output);
    store.replace(&bundle)?;

    println!("Model trained successfully");
    println!("  features: {}", bundle.features.join(", "));
    println!("  r2:  {}", bundle.metrics.r2);
    println!("  mae: {}", bundle.metrics.mae);
    println!("  bundle written to {}", output.display());

    Ok(())
}
