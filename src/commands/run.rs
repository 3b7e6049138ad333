//! Command dispatch logic for repo-glance

use super::{InitArgs, ShowArgs, init_config, show_repository};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "repo-glance", version, author, long_about = None)]
#[command(about = "Show an at-a-glance summary of a hosted source repository")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: GlanceSubcommand,
}

#[derive(Subcommand, Debug)]
enum GlanceSubcommand {
    /// Fetch and display metadata for a repository
    Show(Box<ShowArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        GlanceSubcommand::Show(show_args) => show_repository(host, show_args).await,
        GlanceSubcommand::Init(init_args) => init_config(host, init_args),
    }
}
