//! Show an at-a-glance summary of a hosted source repository.
//!
//! # Usage
//!
//! ```bash
//! repo-glance show https://github.com/tokio-rs/tokio
//! ```
//!
//! Sections are printed as soon as they arrive: the repository summary, its language
//! breakdown, recent commits, the contributor roster and the README.
//!
//! Write a starting configuration with `repo-glance init`, then adjust the API base URL,
//! request timeout or pagination limits in `glance.toml`.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use repo_glance::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Default host that writes to the real terminal.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}
