//! Command-line interface for repo-glance
//!
//! # Commands
//!
//! - **show**: Load a repository's metadata and print each section as it settles, optionally
//!   writing the final result to a JSON file
//! - **init**: Generate a default configuration file
//!
//! The `run` function parses command-line arguments using clap and routes to the appropriate
//! command handler. All terminal output goes through the [`Host`] trait so commands can be
//! exercised against in-memory buffers.
//!
//! Configuration is read from a TOML file (`glance.toml` by default) holding the API base URL,
//! request timeout, commit window and contributor pagination limits.

mod common;
mod config;
mod host;
mod init;
mod run;
mod show;

pub use common::{ColorMode, LogLevel};
pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_CONFIG_TOML};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use show::{ShowArgs, show_repository};
