// ABOUTME: Entry point for the imagewait CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, WaitArgs};
use imagewait::config::{self, Config, Overrides};
use imagewait::error::{Error, Result};
use imagewait::output::{Output, OutputMode};
use imagewait::registry::HttpConnector;
use imagewait::types::Secret;
use imagewait::wait::{RegistryPoller, WaitError};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    let result = run(cli.command, &mut output).await;

    if let Err(e) = result {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: &mut Output) -> Result<()> {
    match command {
        Commands::Wait(args) => wait(args, output).await,
        Commands::Init { image, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, image.as_deref(), force)?;
            output.progress(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
    }
}

/// Wait for the image and print the result.
async fn wait(args: WaitArgs, output: &mut Output) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(&env::current_dir()?)?.unwrap_or_default(),
    };

    let overrides = Overrides {
        registry: args.registry,
        username: args.username,
        password: args.password.map(Secret::from),
        image: args.image,
        timeout: args.timeout,
        fail_after_timeout: args.fail_after_timeout,
        insecure: args.insecure,
    };
    let (request, backoff) = file_config.into_request(overrides)?;

    let poller = RegistryPoller::new(HttpConnector::new()?).with_backoff(backoff);

    output.progress(&format!(
        "Waiting up to {}s for {} on {}...",
        request.timeout.as_secs(),
        request.image,
        request.registry
    ));
    output.start_timer();

    let result = tokio::select! {
        result = poller.wait(&request) => result,
        _ = tokio::signal::ctrl_c() => Err(WaitError::Interrupted),
    };

    let result = result.map_err(Error::from)?;
    output.result(&result);

    Ok(())
}
