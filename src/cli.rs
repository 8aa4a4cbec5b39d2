// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the wait and init subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imagewait")]
#[command(about = "Wait until a container image tag is available in a registry")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print the result as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the registry until the image tag exists or the timeout elapses
    Wait(WaitArgs),

    /// Write an imagewait.yml template to the current directory
    Init {
        /// Image to put in the template
        #[arg(long)]
        image: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct WaitArgs {
    /// Image to wait for, as repository[:tag]
    pub image: Option<String>,

    /// Registry host (default: registry.hub.docker.com)
    #[arg(short, long)]
    pub registry: Option<String>,

    /// Registry username
    #[arg(short, long, env = "IMAGEWAIT_USERNAME")]
    pub username: Option<String>,

    /// Registry password
    #[arg(short, long, env = "IMAGEWAIT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// How long to wait, in seconds (default: 600)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Whether running out of time is an error
    #[arg(long, value_name = "BOOL")]
    pub fail_after_timeout: Option<bool>,

    /// Use plain HTTP instead of HTTPS
    #[arg(long)]
    pub insecure: bool,

    /// Config file (default: imagewait.yml in the current directory, if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
