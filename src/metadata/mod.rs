//! Repository metadata gathering
//!
//! This module fetches everything displayed about a single repository from the hosting API
//! and folds the results into an [`AggregateProjectMetadata`].
//!
//! # Sections
//!
//! - **Summary**: stars, forks, open issues, topics and last push time
//! - **Languages**: bytes of source per language, fetched once the summary names its URL
//! - **Commits**: the most recent commits, newest first
//! - **Contributors**: the full roster, read page by page
//! - **README**: the README rendered to HTML by the hosting API
//!
//! Each section settles independently into ready or unavailable, so one failing request never
//! hides the data gathered by the others.

mod aggregate;
pub mod client;
mod orchestrator;
pub mod paginator;
mod project_data;
mod repo_ref;
pub mod stats;

pub use aggregate::{AggregateProjectMetadata, Completeness, Readiness, Section, SectionReadiness, SectionUpdate, UnavailableReason};
pub use client::{Client, FetchOutcome};
pub use orchestrator::{LoadSettings, LoadTag, Orchestrator};
pub use paginator::{PageLimits, collect_all};
pub use project_data::{CommitRecord, Contributor, LanguageBreakdown, RepositorySummary};
pub use repo_ref::RepoRef;
pub use stats::StatsComputer;
