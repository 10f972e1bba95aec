use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "asset-dispatch")]
#[command(about = "Warehouse asset intake, FIFO allocation and dispatch workflow")]
#[command(long_about = "asset-dispatch tracks warehouse assets from intake through FIFO \
                       allocation, picking, hold and dispatch. Start with 'asset-dispatch add' \
                       to register stock and 'asset-dispatch allocate <qty>' to stage an order.")]
pub struct Cli {
    /// Configuration file (defaults to ./asset-dispatch.toml when present)
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of formatted text
    #[arg(long, global = true, help = "Emit JSON responses on stdout")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List every asset with stock statistics
    List,
    /// Show stock statistics broken down by status
    Stats,
    /// Register a new asset at the warehouse
    Add {
        /// Asset description
        #[arg(long, help = "Human-readable description of the asset")]
        description: String,
        /// Serial number
        #[arg(long, help = "Manufacturer serial number")]
        serial: String,
    },
    /// Allocate the oldest available assets to a new batch
    Allocate {
        /// Number of assets to allocate
        #[arg(allow_negative_numbers = true, help = "Quantity to allocate (must be positive)")]
        quantity: i64,
    },
    /// Apply a workflow action (pick, hold, approve, return) to an asset
    Transition {
        /// Asset id
        id: String,
        /// Workflow action
        action: String,
    },
    /// Move an asset to a new location
    Relocate {
        /// Asset id
        id: String,
        /// New location
        location: String,
    },
    /// List the assets claimed by an allocation batch
    Batch {
        /// Batch id returned by allocate
        batch: String,
    },
    /// Show a single asset
    Show {
        /// Asset id
        id: String,
    },
    /// Delete an asset regardless of its status
    Delete {
        /// Asset id
        id: String,
    },
}
