use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rainfall::{create_app, PredictionService, RainfallConfig, TrainingDriver};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rainfall")]
#[command(about = "Train and serve a short-horizon rain classifier", long_about = None)]
struct Args {
    /// TOML configuration file (defaults to config/rainfall.toml if present)
    #[arg(long, global = true, env = "RAINFALL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the labelled dataset, train the model and write the artifact
    Train,
    /// Serve predictions over HTTP
    Serve {
        /// Overrides server.port
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rainfall=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = RainfallConfig::load_from(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Command::Train => {
            let outcome = TrainingDriver::new(config).run_blocking().await?;
            println!("Processed dataset saved to {:?}", outcome.dataset_path);
            println!(
                "Trained on {} rows, evaluated on {} of {}",
                outcome.train_rows, outcome.test_rows, outcome.rows
            );
            println!("\nClassification Report on Test Data:\n{}", outcome.report);
            println!("Saved trained model to {:?}", outcome.model_path);
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let predictions = PredictionService::load(&config.model.path);
            let app = create_app(predictions);

            let addr = config.server.address();
            tracing::info!("Listening on {}", addr);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
