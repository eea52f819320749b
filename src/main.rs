//! MPG prediction service - main entry point

use clap::Parser;
use mpg_predictor::cli::{cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mpg_predictor=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            model,
            history,
        }) => {
            cmd_serve(host, port, model, history).await?;
        }
        Some(Commands::Train {
            data,
            output,
            trees,
            seed,
        }) => {
            cmd_train(&data, &output, trees, seed)?;
        }
        None => {
            // Default: serve with env/default configuration
            cmd_serve(None, None, None, None).await?;
        }
    }

    Ok(())
}
