use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;

use asset_dispatch::api::{ApiError, AssetApi};
use asset_dispatch::cli::commands::dispatch::{AllocateCommand, RelocateCommand, TransitionCommand};
use asset_dispatch::cli::commands::intake::{AddCommand, DeleteCommand};
use asset_dispatch::cli::commands::inventory::{
    BatchCommand, ListCommand, ShowCommand, StatsCommand,
};
use asset_dispatch::cli::commands::{show_how_to_get_started, Command};
use asset_dispatch::cli::{Cli, Commands};
use asset_dispatch::config::DispatchConfig;
use asset_dispatch::shutdown::ShutdownCoordinator;
use asset_dispatch::store::open_store;
use asset_dispatch::telemetry::init_telemetry;
use asset_dispatch::workflow::{DispatchEngine, EngineConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(&e, json),
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Err(e) = DispatchConfig::load_env_file() {
        eprintln!("⚠️  Ignoring unreadable .env file: {e}");
    }
    let config = DispatchConfig::load(cli.config.as_deref())?;
    init_telemetry(&config.observability)?;

    let Some(command) = cli.command else {
        return show_how_to_get_started();
    };

    let store = open_store(&config.store)
        .await
        .context("Failed to open asset store")?;
    let engine = Arc::new(DispatchEngine::new(
        store,
        EngineConfig::from(&config.engine),
    ));
    let api = AssetApi::new(Arc::clone(&engine));

    let outcome = execute(command, cli.json, &api).await;

    if let Err(e) = ShutdownCoordinator::new().shutdown(&engine).await {
        warn!("Shutdown did not complete cleanly: {}", e);
    }
    outcome
}

async fn execute(command: Commands, json: bool, api: &AssetApi) -> Result<()> {
    match command {
        Commands::List => ListCommand::new().with_json(json).execute(api).await,
        Commands::Stats => StatsCommand::new().with_json(json).execute(api).await,
        Commands::Add {
            description,
            serial,
        } => {
            AddCommand::new(description, serial)
                .with_json(json)
                .execute(api)
                .await
        }
        Commands::Allocate { quantity } => {
            AllocateCommand::new(quantity)
                .with_json(json)
                .execute(api)
                .await
        }
        Commands::Transition { id, action } => {
            TransitionCommand::new(id, action)
                .with_json(json)
                .execute(api)
                .await
        }
        Commands::Relocate { id, location } => {
            RelocateCommand::new(id, location)
                .with_json(json)
                .execute(api)
                .await
        }
        Commands::Batch { batch } => BatchCommand::new(batch).with_json(json).execute(api).await,
        Commands::Show { id } => ShowCommand::new(id).with_json(json).execute(api).await,
        Commands::Delete { id } => DeleteCommand::new(id).with_json(json).execute(api).await,
    }
}

fn report_failure(error: &anyhow::Error, json: bool) -> ExitCode {
    let Some(api_error) = error.downcast_ref::<ApiError>() else {
        eprintln!("❌ {error:#}");
        return ExitCode::FAILURE;
    };

    if json {
        match serde_json::to_string_pretty(api_error) {
            Ok(body) => println!("{body}"),
            Err(_) => eprintln!("❌ {}", api_error.body.error),
        }
    } else {
        eprintln!("❌ {}", api_error.body.error);
    }

    ExitCode::from(match api_error.status {
        400 => 2,
        404 => 3,
        409 => 4,
        503 => 5,
        _ => 1,
    })
}
