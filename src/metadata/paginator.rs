use super::Completeness;
use super::client::{Client, FetchOutcome};
use serde::de::DeserializeOwned;
use std::collections::HashSet;

const LOG_TARGET: &str = " paginator";

/// Items that carry a unique identity within a collection.
pub trait Identified {
    fn identity(&self) -> &str;
}

impl Identified for super::client::Contributor {
    fn identity(&self) -> &str {
        &self.login
    }
}

/// Hard caps guaranteeing that pagination terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub max_pages: u32,
    pub max_items: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_pages: 100,
            max_items: 10_000,
        }
    }
}

/// Why pagination stopped before reaching the end of the collection.
#[derive(Debug)]
pub enum Interruption {
    NotFound,
    RateLimited,
    TransportError(ohno::AppError),
}

/// Outcome of a pagination run.
#[derive(Debug)]
pub struct PageRun<T> {
    /// Everything collected, deduplicated by identity, in page order
    pub items: Vec<T>,

    /// Number of page requests issued
    pub pages_requested: u32,

    /// Set when a request failed before the end of the collection was reached
    pub interruption: Option<Interruption>,

    /// Set when a page or item cap stopped pagination
    pub truncated: bool,
}

impl<T> PageRun<T> {
    /// Completeness of the collected items.
    #[must_use]
    pub const fn completeness(&self) -> Completeness {
        if self.interruption.is_some() {
            Completeness::Partial
        } else if self.truncated {
            Completeness::Truncated
        } else {
            Completeness::Complete
        }
    }

    /// Whether the very first page failed, leaving nothing at all.
    #[must_use]
    pub const fn failed_outright(&self) -> bool {
        self.interruption.is_some() && self.items.is_empty()
    }
}

/// Read every page of a collection.
///
/// `page_url` builds the URL for a 1-based page number and a page size. Pagination continues
/// while pages come back full and stops on the first short page. A failed request ends the
/// run but keeps everything collected so far.
pub async fn collect_all<T, F>(client: &Client, page_url: F, page_size: u32, limits: PageLimits) -> PageRun<T>
where
    T: DeserializeOwned + Identified,
    F: Fn(u32, u32) -> String,
{
    let page_size = page_size.max(1);
    let mut items: Vec<T> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut page = 1u32;
    let mut interruption = None;
    let mut truncated = false;

    loop {
        let url = page_url(page, page_size);

        let batch: Vec<T> = match client.fetch_json::<Option<Vec<T>>>(&url).await {
            FetchOutcome::Ok(batch) => batch.unwrap_or_default(),
            FetchOutcome::NotFound => {
                interruption = Some(Interruption::NotFound);
                break;
            }
            FetchOutcome::RateLimited(_) => {
                interruption = Some(Interruption::RateLimited);
                break;
            }
            FetchOutcome::TransportError(e) => {
                interruption = Some(Interruption::TransportError(e));
                break;
            }
        };

        let full_page = batch.len() >= page_size as usize;

        for item in batch {
            if items.len() >= limits.max_items {
                truncated = true;
                break;
            }
            if seen.insert(item.identity().to_string()) {
                items.push(item);
            } else {
                log::debug!(target: LOG_TARGET, "Skipping duplicate '{}' on page {page}", item.identity());
            }
        }

        if truncated || !full_page {
            break;
        }

        if items.len() >= limits.max_items || page >= limits.max_pages {
            log::debug!(
                target: LOG_TARGET,
                "Reached pagination limit ({} pages, {} items) at '{url}', stopping with {} items",
                limits.max_pages,
                limits.max_items,
                items.len()
            );
            truncated = true;
            break;
        }

        page += 1;
    }

    match &interruption {
        Some(reason) => log::debug!(target: LOG_TARGET, "Pagination interrupted on page {page} ({reason:?}), keeping {} items", items.len()),
        None => log::debug!(target: LOG_TARGET, "Pagination finished after {page} page(s) with {} items", items.len()),
    }

    PageRun {
        items,
        pages_requested: page,
        interruption,
        truncated,
    }
}
