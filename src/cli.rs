//! CLI definitions for the `wristlink` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wristlink")]
#[command(author, version, about = "Sync a wrist-worn GPS fitness watch over Bluetooth Low Energy")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Bluetooth address of the watch (e.g. E4:04:39:AA:BB:CC)
    pub address: String,

    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Establish a new pairing code with the watch
    Pair,

    /// Re-authenticate with a previously established pairing code
    #[command(visible_alias = "auth")]
    Connect {
        /// Pairing code, if not already cached from a previous `pair` run
        code: Option<u32>,
    },

    /// Run a full sync: preferences, activities, and GPS assistance data
    Sync {
        /// Pairing code, if not already cached from a previous `pair` run
        #[arg(long)]
        code: Option<u32>,

        /// Directory to save preferences.xml and activity recordings into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Skip fetching and uploading GPS assistance data
        #[arg(long)]
        offline: bool,
    },
}
