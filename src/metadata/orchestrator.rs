//! Concurrent loading of every metadata section for one repository.

use super::aggregate::{AggregateProjectMetadata, Completeness, SectionUpdate, UnavailableReason};
use super::client::{self, Client, FetchOutcome, HTML_MEDIA_TYPE};
use super::paginator::{self, Interruption, PageLimits};
use super::{CommitRecord, Contributor, LanguageBreakdown, RepoRef, RepositorySummary};
use futures_util::future::BoxFuture;
use futures_util::stream::{self, FuturesUnordered, Stream, StreamExt};
use futures_util::FutureExt;
use std::sync::{Arc, Mutex, PoisonError};

const LOG_TARGET: &str = "orchestrate";

/// Tuning for a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSettings {
    /// How many recent commits to fetch
    pub commit_window: u32,

    /// Contributors requested per page
    pub contributor_page_size: u32,

    /// Caps on contributor pagination
    pub contributor_limits: PageLimits,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            commit_window: 5,
            contributor_page_size: 100,
            contributor_limits: PageLimits::default(),
        }
    }
}

/// Identifies which load produced a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTag {
    pub generation: u64,
    pub reference: Option<RepoRef>,
}

#[derive(Debug)]
struct ActiveLoad {
    tag: LoadTag,
    aggregate: AggregateProjectMetadata,
}

/// A section fetch that settled, possibly with a dependent fetch to start next.
struct Settled {
    update: SectionUpdate,
    follow_up: Option<SectionFuture>,
}

type SectionFuture = BoxFuture<'static, Settled>;

/// Loads repository metadata, fanning out one request per section.
///
/// Only the most recently started load may write the shared aggregate. Results belonging to
/// an older load are discarded and its stream ends.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    client: Client,
    settings: LoadSettings,
    active: Arc<Mutex<ActiveLoad>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(client: Client, settings: LoadSettings) -> Self {
        Self {
            client,
            settings,
            active: Arc::new(Mutex::new(ActiveLoad {
                tag: LoadTag {
                    generation: 0,
                    reference: None,
                },
                aggregate: AggregateProjectMetadata::without_reference(),
            })),
        }
    }

    /// Snapshot of the aggregate for the active load.
    #[must_use]
    pub fn current(&self) -> AggregateProjectMetadata {
        self.lock().aggregate.clone()
    }

    /// Tag of the active load.
    #[must_use]
    pub fn active_tag(&self) -> LoadTag {
        self.lock().tag.clone()
    }

    /// Start loading `reference`, superseding any load in progress.
    ///
    /// The returned stream first yields the all-pending aggregate, then one snapshot each time
    /// a section settles, and ends once every section has settled. Requests are issued as the
    /// stream is polled. Without a reference no request is made and the single snapshot has
    /// every section unavailable.
    pub fn load(&self, reference: Option<RepoRef>) -> impl Stream<Item = AggregateProjectMetadata> + Send + 'static {
        let initial = reference
            .clone()
            .map_or_else(AggregateProjectMetadata::without_reference, AggregateProjectMetadata::pending);

        let tag = {
            let mut active = self.lock();
            let tag = LoadTag {
                generation: active.tag.generation + 1,
                reference: reference.clone(),
            };
            active.tag = tag.clone();
            active.aggregate = initial;
            tag
        };

        let pending: FuturesUnordered<SectionFuture> = FuturesUnordered::new();
        match &reference {
            Some(reference) => {
                log::info!(target: LOG_TARGET, "Loading metadata for '{reference}' (load {})", tag.generation);
                for future in self.section_futures(reference) {
                    pending.push(future);
                }
            }
            None => log::info!(target: LOG_TARGET, "No repository reference, nothing to load"),
        }

        let state = LoadState {
            tag,
            active: Arc::clone(&self.active),
            pending,
            emitted_initial: false,
        };

        stream::unfold(state, |mut state| async move {
            if !state.emitted_initial {
                state.emitted_initial = true;
                let snapshot = state.snapshot()?;
                return Some((snapshot, state));
            }

            let settled = state.pending.next().await?;
            if let Some(follow_up) = settled.follow_up {
                state.pending.push(follow_up);
            }

            let snapshot = state.publish(settled.update)?;
            Some((snapshot, state))
        })
    }

    fn section_futures(&self, reference: &RepoRef) -> [SectionFuture; 4] {
        let owner = reference.owner();
        let name = reference.name();
        let settings = self.settings;

        let summary = {
            let client = self.client.clone();
            let url = self.client.repo_url(owner, name, "");
            async move {
                let outcome = client.fetch_json::<client::Repository>(&url).await;
                settle_summary(client, outcome)
            }
            .boxed()
        };

        let commits = {
            let client = self.client.clone();
            let url = self.client.repo_url(owner, name, &format!("/commits?per_page={}", settings.commit_window));
            async move {
                let outcome = client.fetch_json::<Vec<client::Commit>>(&url).await;
                Settled {
                    update: SectionUpdate::Commits(unavailable_unless_ok(outcome).map(|c| to_commits(c, settings.commit_window))),
                    follow_up: None,
                }
            }
            .boxed()
        };

        let readme = {
            let client = self.client.clone();
            let url = self.client.repo_url(owner, name, "/readme");
            async move {
                let outcome = client.fetch(&url, Some(HTML_MEDIA_TYPE)).await;
                Settled {
                    update: SectionUpdate::Readme(unavailable_unless_ok(outcome)),
                    follow_up: None,
                }
            }
            .boxed()
        };

        let contributors = {
            let client = self.client.clone();
            let base = self.client.repo_url(owner, name, "/contributors");
            async move {
                let run = paginator::collect_all::<client::Contributor, _>(
                    &client,
                    |page, per_page| format!("{base}?per_page={per_page}&page={page}"),
                    settings.contributor_page_size,
                    settings.contributor_limits,
                )
                .await;
                Settled {
                    update: SectionUpdate::Contributors(settle_contributors(run)),
                    follow_up: None,
                }
            }
            .boxed()
        };

        [summary, commits, readme, contributors]
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ActiveLoad> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct LoadState {
    tag: LoadTag,
    active: Arc<Mutex<ActiveLoad>>,
    pending: FuturesUnordered<SectionFuture>,
    emitted_initial: bool,
}

impl LoadState {
    /// Current aggregate, or `None` when this load has been superseded.
    fn snapshot(&self) -> Option<AggregateProjectMetadata> {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.tag == self.tag {
            Some(active.aggregate.clone())
        } else {
            log::debug!(target: LOG_TARGET, "Load {} was superseded before it started", self.tag.generation);
            None
        }
    }

    /// Apply `update` to the shared aggregate, or discard it when this load has been superseded.
    fn publish(&self, update: SectionUpdate) -> Option<AggregateProjectMetadata> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.tag != self.tag {
            log::debug!(
                target: LOG_TARGET,
                "Discarding stale {} result from load {} (active load is {})",
                update.section(),
                self.tag.generation,
                active.tag.generation
            );
            return None;
        }

        log::debug!(target: LOG_TARGET, "Section '{}' settled for load {}", update.section(), self.tag.generation);
        active.aggregate.apply(update);
        Some(active.aggregate.clone())
    }
}

/// Map a fetch outcome to a section value, collapsing every failure to its reason.
fn unavailable_unless_ok<T>(outcome: FetchOutcome<T>) -> Result<T, UnavailableReason> {
    match outcome {
        FetchOutcome::Ok(value) => Ok(value),
        FetchOutcome::NotFound => Err(UnavailableReason::NotFound),
        FetchOutcome::RateLimited(_) => Err(UnavailableReason::RateLimited),
        FetchOutcome::TransportError(_) => Err(UnavailableReason::TransportError),
    }
}

fn settle_summary(client: Client, outcome: FetchOutcome<client::Repository>) -> Settled {
    let repo = match unavailable_unless_ok(outcome) {
        Ok(repo) => repo,
        Err(reason) => {
            return Settled {
                update: SectionUpdate::Summary(Err(reason)),
                follow_up: None,
            };
        }
    };

    let follow_up = match repo.languages_url.clone() {
        Some(url) => async move {
            let outcome = client.fetch_json::<LanguageBreakdown>(&url).await;
            Settled {
                update: SectionUpdate::Languages(unavailable_unless_ok(outcome)),
                follow_up: None,
            }
        }
        .boxed(),
        None => {
            log::debug!(target: LOG_TARGET, "Repository summary has no languages URL");
            futures_util::future::ready(Settled {
                update: SectionUpdate::Languages(Err(UnavailableReason::NotFound)),
                follow_up: None,
            })
            .boxed()
        }
    };

    Settled {
        update: SectionUpdate::Summary(Ok(to_summary(repo))),
        follow_up: Some(follow_up),
    }
}

fn settle_contributors(run: paginator::PageRun<client::Contributor>) -> Result<(Vec<Contributor>, Completeness), UnavailableReason> {
    if run.failed_outright() {
        return Err(match run.interruption {
            Some(Interruption::NotFound) => UnavailableReason::NotFound,
            Some(Interruption::RateLimited) => UnavailableReason::RateLimited,
            Some(Interruption::TransportError(_)) | None => UnavailableReason::TransportError,
        });
    }

    let completeness = run.completeness();
    let contributors = run
        .items
        .into_iter()
        .filter(|c| c.contributions >= 1)
        .map(|c| Contributor {
            handle: c.login,
            avatar_url: c.avatar_url,
            profile_url: c.html_url,
            contribution_count: c.contributions,
        })
        .collect();

    Ok((contributors, completeness))
}

fn to_summary(repo: client::Repository) -> RepositorySummary {
    RepositorySummary {
        star_count: repo.stargazers_count,
        fork_count: repo.forks_count,
        last_pushed_at: repo.pushed_at,
        open_issue_count: repo.open_issues_count,
        topics: repo.topics,
        web_url: repo.html_url,
        description: repo.description.filter(|d| !d.trim().is_empty()),
    }
}

/// Convert API commits to records, most recent first, bounded to `window`.
fn to_commits(commits: Vec<client::Commit>, window: u32) -> Vec<CommitRecord> {
    let mut records: Vec<CommitRecord> = commits
        .into_iter()
        .filter_map(|c| {
            let Some(author) = c.commit.author else {
                log::debug!(target: LOG_TARGET, "Skipping commit {} without author information", c.sha);
                return None;
            };
            Some(CommitRecord {
                id: c.sha,
                author_name: author.name,
                authored_at: author.date,
                message: c.commit.message,
                web_url: c.html_url,
            })
        })
        .collect();

    records.sort_by(|a, b| b.authored_at.cmp(&a.authored_at));
    records.truncate(window as usize);
    records
}
