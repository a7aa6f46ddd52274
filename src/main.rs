//! Check-in KNN - Main Entry Point
//!
//! Trains and tunes k-nearest-neighbor place predictors from the command line.

use checkin_knn::cli::{cmd_info, cmd_search, cmd_train, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkin_knn=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let outcome = match &cli.command {
        Commands::Train { data, run, neighbors, weights } => {
            cmd_train(data, run, *neighbors, weights.as_deref())
        }
        Commands::Search { data, run, neighbors, weights, cv_folds, jobs } => {
            cmd_search(data, run, neighbors, weights, *cv_folds, *jobs)
        }
        Commands::Info { data } => cmd_info(data),
    };

    if let Err(e) = &outcome {
        tracing::error!("{:#}", e);
    }
    outcome
}
