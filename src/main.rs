mod app;
mod cli;

use anyhow::Result;
use clap::Parser;
use skyward_core::{AppError, Config, ConfigError};

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    if let Err(e) = run(args).await {
        if let Some(message) = user_message(&e) {
            eprintln!("{}", message);
        }
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: cli::Args) -> Result<()> {
    skyward_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!("Config directory: {}", config.config_dir.display());

    let app = app::App::new(config)?;
    let result = app.run(args.command.unwrap_or_default()).await;
    app.shutdown();

    result
}

fn user_message(e: &anyhow::Error) -> Option<&'static str> {
    e.chain().find_map(|cause| {
        cause
            .downcast_ref::<AppError>()
            .map(AppError::user_message)
            .or_else(|| cause.downcast_ref::<ConfigError>().map(ConfigError::user_message))
    })
}
