//! xgo - Go CGO cross compiler
//!
//! Parses Go-style flags, then hands the build to the dockerized
//! toolchain. This is the only place that turns errors into an exit status.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use xgo::cli::Cli;
use xgo::utils::terminal;
use xgo::{CrossBuilder, XgoError};

/// Environment variable holding the log filter
const LOG_ENV: &str = "XGO_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse_go_style(std::env::args_os());
    if cli.no_color {
        terminal::disable_colors();
    }

    let request = cli.into_request();
    tracing::debug!(?request, "parsed build request");

    let result = CrossBuilder::from_env().and_then(|builder| builder.execute(&request));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<XgoError>() {
            Some(xgo_err) => {
                xgo_err.display_with_hints();
                ExitCode::from(xgo_err.exit_code())
            }
            None => {
                terminal::print_error(&format!("{:#}", err));
                ExitCode::FAILURE
            }
        },
    }
}
