//! CLI command definitions.

use clap::{Parser, Subcommand};

/// anx - rate-limited REST API client
#[derive(Parser, Debug)]
#[command(name = "anx")]
#[command(about = "Rate-limited REST API client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the API (overrides configuration)
    #[arg(long, global = true, env = "ANX_TARGET")]
    pub target: Option<String>,

    /// Authorization token (overrides configuration)
    #[arg(long, global = true, env = "ANX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// GET a resource
    Get {
        /// Path relative to the target
        uri: String,
    },

    /// DELETE a resource
    Delete {
        /// Path relative to the target
        uri: String,
    },

    /// POST a JSON body
    Post {
        /// Path relative to the target
        uri: String,

        /// JSON payload
        #[arg(long)]
        body: String,
    },

    /// PUT a JSON body
    Put {
        /// Path relative to the target
        uri: String,

        /// JSON payload
        #[arg(long)]
        body: String,
    },

    /// GET every page of a collection
    GetAll {
        /// Path relative to the target
        uri: String,

        /// Page size
        #[arg(long)]
        num_elements: Option<u64>,
    },
}
