//! docdown - render documentation Markdown to HTML fragments
//!
//! `docdown render` converts a local file or stdin. `docdown fetch` pulls
//! documents from a document store through the TTL cache and prints either the
//! rendered HTML or a link to view each failed document externally.

use std::process::ExitCode;

use clap::Parser;

use docdown::app::{render_file, write_output, App};
use docdown::cli::{Cli, Command, FetchSettings};
use docdown::logging::initialize_logging;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    initialize_logging(&cli)?;

    match &cli.command {
        Command::Render { path, output } => {
            let html = render_file(path)?;
            write_output(output.as_deref(), &html)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Fetch(args) => {
            let settings = FetchSettings::from_args(args)?;
            let app = App::from_settings(&settings)?;
            let report = app.fetch_documents(&settings.ids).await;
            write_output(settings.output.as_deref(), &report.html)?;

            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
