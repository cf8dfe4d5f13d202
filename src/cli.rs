//! Command-line interface parsing for docdown
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! validated settings for the `render` and `fetch` commands.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use url::Url;

use crate::cache::CacheConfig;
use crate::data::DocId;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The base URL could not be parsed or is not http(s)
    #[error("Invalid base URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidBaseUrl(String),

    /// A document identifier contains characters other than letters, digits, '-' and '_'
    #[error("Invalid document identifier: '{0}'. Use letters, digits, '-' and '_' only")]
    InvalidDocId(String),

    /// TTL or timeout of zero seconds
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// docdown - render documentation Markdown to HTML fragments
#[derive(Parser, Debug)]
#[command(name = "docdown")]
#[command(about = "Render documentation Markdown to HTML, fetching pages through a TTL cache")]
#[command(version)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a local Markdown file (or stdin) to HTML
    ///
    /// Examples:
    ///   docdown render README.md
    ///   cat page.md | docdown render -
    Render {
        /// Markdown file to render, '-' for stdin
        #[arg(value_name = "PATH", default_value = "-")]
        path: PathBuf,

        /// Write HTML here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Fetch documents by identifier and render them
    ///
    /// Each identifier maps to '<base-url>/<id>.md'. Documents that cannot be
    /// fetched are replaced by a link to view them externally.
    Fetch(FetchArgs),
}

/// Raw arguments of the `fetch` command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Document identifiers (e.g. 'install', 'faq')
    #[arg(required = true, value_name = "ID")]
    pub ids: Vec<String>,

    /// Base URL of the document store
    #[arg(long, env = "DOCDOWN_BASE_URL", value_name = "URL")]
    pub base_url: String,

    /// Seconds a rendered document stays fresh
    #[arg(long, env = "DOCDOWN_TTL_SECS", default_value_t = 600)]
    pub ttl_secs: u64,

    /// Seconds to wait for a document before giving up
    #[arg(long, env = "DOCDOWN_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Directory for the on-disk cache (defaults to the platform cache dir)
    #[arg(long, env = "DOCDOWN_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep rendered documents in memory only
    #[arg(long)]
    pub no_disk_cache: bool,

    /// Write HTML here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Where the on-disk cache lives, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskCache {
    Disabled,
    PlatformDefault,
    Dir(PathBuf),
}

/// Validated settings for the `fetch` command
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub ids: Vec<DocId>,
    pub base_url: Url,
    pub cache: CacheConfig,
    pub disk_cache: DiskCache,
    pub output: Option<PathBuf>,
}

/// Parses a base URL argument, accepting only http and https
pub fn parse_base_url(s: &str) -> Result<Url, CliError> {
    let url = Url::parse(s).map_err(|_| CliError::InvalidBaseUrl(s.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(CliError::InvalidBaseUrl(s.to_string())),
    }
}

/// Parses a document identifier argument
pub fn parse_doc_id(s: &str) -> Result<DocId, CliError> {
    DocId::parse(s).map_err(|_| CliError::InvalidDocId(s.to_string()))
}

fn seconds(value: u64, name: &'static str) -> Result<Duration, CliError> {
    if value == 0 {
        return Err(CliError::ZeroDuration(name));
    }
    Ok(Duration::from_secs(value))
}

impl FetchSettings {
    /// Validates the `fetch` command's arguments
    ///
    /// # Errors
    /// Returns `CliError` if the URL, an identifier or a duration is invalid.
    pub fn from_args(args: &FetchArgs) -> Result<Self, CliError> {
        let ids = args
            .ids
            .iter()
            .map(|id| parse_doc_id(id))
            .collect::<Result<Vec<_>, _>>()?;

        let disk_cache = match (args.no_disk_cache, &args.cache_dir) {
            (true, _) => DiskCache::Disabled,
            (false, Some(dir)) => DiskCache::Dir(dir.clone()),
            (false, None) => DiskCache::PlatformDefault,
        };

        Ok(FetchSettings {
            ids,
            base_url: parse_base_url(&args.base_url)?,
            cache: CacheConfig {
                ttl: seconds(args.ttl_secs, "--ttl-secs")?,
                fetch_timeout: seconds(args.timeout_secs, "--timeout-secs")?,
            },
            disk_cache,
            output: args.output.clone(),
        })
    }
}
