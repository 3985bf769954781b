//! calraw - main entry point

use calraw_cli::{Cli, Commands};
use calraw_common::logging::{init_logging, LogConfig, LogLevel};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut log_config = LogConfig::default();
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    } else {
        log_config.level = LogLevel::Warn;
    }
    let log_config = log_config
        .with_env_overrides()
        .unwrap_or_else(|_| LogConfig::default());

    // The CLI still works without logging.
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(&cli).await {
        if e.is_cancellation() {
            eprintln!("{}", e);
        } else {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> calraw_cli::Result<()> {
    match &cli.command {
        Commands::Update {
            skip_download,
            skip_clean,
            skip_load,
            keep_files,
            noinput,
            test_mode,
            app,
        } => {
            calraw_cli::commands::update::run(calraw_cli::commands::update::UpdateArgs {
                skip_download: *skip_download,
                skip_clean: *skip_clean,
                skip_load: *skip_load,
                keep_files: *keep_files,
                noinput: *noinput,
                test_mode: *test_mode,
                app: app.clone(),
            })
            .await
        }

        Commands::Download { keep_files } => {
            calraw_cli::commands::download::run(*keep_files).await
        }

        Commands::CleanFile { name, keep_files } => {
            calraw_cli::commands::clean::run(name, *keep_files).await
        }

        Commands::LoadTable {
            model,
            keep_files,
            app,
        } => calraw_cli::commands::load::run(model, *keep_files, app).await,

        Commands::Status => calraw_cli::commands::status::run().await,
    }
}
