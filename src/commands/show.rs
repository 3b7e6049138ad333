use super::Host;
use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use crate::metadata::{AggregateProjectMetadata, Client, Orchestrator, RepoRef, Section, StatsComputer};
use crate::reports::{generate_console_header, generate_console_section, generate_json};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use clap::Parser;
use futures_util::StreamExt;
use ohno::IntoAppError;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use strum::IntoEnumIterator;
use url::Url;

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Link to the repository, such as `https://github.com/owner/name`
    #[arg(value_name = "URL")]
    pub url: String,

    /// Path to configuration file (default is `glance.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Base URL of the hosting API, overriding the configured one
    #[arg(long, value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Also write the final metadata to a JSON file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub json: Option<Utf8PathBuf>,
}

/// Load a repository's metadata and print each section as soon as it settles.
///
/// Failures to reach the hosting API are reported inline per section; only local problems
/// such as an invalid configuration or an unwritable JSON path end the command with an error.
pub async fn show_repository<H: Host>(host: &mut H, args: &ShowArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let base_url = match &args.api_base_url {
        Some(url) => {
            let _ = Url::parse(url).into_app_err_with(|| format!("invalid API base URL '{url}'"))?;
            url.as_str()
        }
        None => config.api_base_url.as_str(),
    };

    let client = Client::new(base_url, config.request_timeout())?;
    let orchestrator = Orchestrator::new(client, config.load_settings());

    let reference = RepoRef::from_link(Some(args.url.as_str()));
    if reference.is_none() {
        let _ = writeln!(host.error(), "'{}' does not name a repository", args.url);
    }

    let use_colors = args.color.use_colors();
    let now = Utc::now();
    let mut stats = StatsComputer::new();
    let mut printed: HashSet<Section> = HashSet::new();
    let mut last: Option<AggregateProjectMetadata> = None;

    let mut snapshots = Box::pin(orchestrator.load(reference));
    while let Some(snapshot) = snapshots.next().await {
        let mut text = String::new();

        if last.is_none() {
            generate_console_header(&snapshot, use_colors, &mut text)?;
        }

        if snapshot.reference.is_some() {
            for section in Section::iter() {
                if snapshot.readiness.get(section).is_settled() && printed.insert(section) {
                    generate_console_section(&snapshot, section, &mut stats, now, use_colors, &mut text)?;
                }
            }
        }

        let _ = write!(host.output(), "{text}");
        last = Some(snapshot);
    }

    let aggregate = last.unwrap_or_else(|| orchestrator.current());
    if aggregate.reference.is_some() && aggregate.has_no_data() {
        let _ = writeln!(host.output(), "\nNo repository data available");
    }

    if let Some(path) = &args.json {
        let mut json = String::new();
        generate_json(&aggregate, now, &mut json)?;
        fs::write(path, json).into_app_err_with(|| format!("writing JSON report to '{path}'"))?;
    }

    Ok(())
}
