#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for repo-glance
//!
//! This library gathers display-ready metadata about a single hosted source repository:
//! the repository summary, language breakdown, recent commits, contributor roster and
//! rendered README. Every section is fetched independently, so a slow or failing request
//! never blocks the others.
//!
//! # Module Organization
//!
//! - [`metadata`]: Fetching, pagination, derived statistics and orchestration
//! - [`reports`]: Console and JSON renderings of the aggregated metadata
//! - [`commands`]: Command-line interface

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod metadata;
pub mod reports;

pub use crate::commands::{Host, run};
