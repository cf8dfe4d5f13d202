//! Logging initialization
//!
//! Sets up the tracing subscriber based on the global verbosity flags. Logs go
//! to stderr so rendered HTML on stdout stays clean.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Maps the verbosity flags to a maximum log level
pub fn level_for(verbose: bool, quiet: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Installs the global tracing subscriber
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn initialize_logging(cli: &Cli) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level_for(cli.verbose, cli.quiet))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
