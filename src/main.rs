//! streamhost - provision a GitHub repository that restreams to YouTube Live.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use streamhost::cli::output;
use streamhost::cli::{execute, Cli, Command};
use streamhost::core::constants;
use streamhost::error::{ConfigError, Error, Result};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("STREAMHOST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("streamhost=debug")
        } else {
            EnvFilter::new("streamhost=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = run_interruptible(cli.command) {
        let suggestion = match &e {
            Error::Auth(_) => Some(format!(
                "generate a token with repo and workflow scopes at {}",
                constants::TOKEN_PAGE
            )),
            Error::ToolMissing(_) => Some(format!(
                "install git from {} or pass --skip-git-check",
                constants::GIT_DOWNLOAD
            )),
            Error::Config(ConfigError::TooFewLines { .. }) => Some(
                "one value per line: stream key, video url, quality, aspect ratio, token, repository"
                    .to_string(),
            ),
            Error::Config(ConfigError::MissingFiles(_)) => {
                Some("run from the folder holding the setup files, or pass --dir".to_string())
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(&hint);
        }
        std::process::exit(1);
    }
}

/// Run `command` on a blocking thread and stop early on Ctrl-C.
fn run_interruptible(command: Command) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async move {
        let task = tokio::task::spawn_blocking(move || execute(command));
        tokio::select! {
            joined = task => match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => Err(Error::Cancelled),
            },
            _ = tokio::signal::ctrl_c() => Err(Error::Cancelled),
        }
    });

    // The blocking task may still be inside a request; do not wait for it.
    runtime.shutdown_background();
    result
}
