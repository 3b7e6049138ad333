use super::{CommitRecord, Contributor, LanguageBreakdown, RepoRef, RepositorySummary};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The independently loaded parts of a project's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
    Summary,
    Languages,
    Commits,
    Readme,
    Contributors,
}

/// Why a section has no usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The resource does not exist; shown as "no data"
    NotFound,

    /// The hosting API refused the request
    RateLimited,

    /// Network failure, unexpected status, or malformed response
    TransportError,

    /// No repository reference was supplied
    NoReference,

    /// A section this one depends on is unavailable
    DependencyUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum Readiness {
    Pending,
    Ready,
    Unavailable(UnavailableReason),
}

impl Readiness {
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// How much of a paged collection was gathered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    /// Every page was read
    #[default]
    Complete,

    /// Pagination was interrupted by a failed request after some pages were read
    Partial,

    /// Pagination stopped at the configured page or item cap
    Truncated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionReadiness {
    pub summary: Readiness,
    pub languages: Readiness,
    pub commits: Readiness,
    pub readme: Readiness,
    pub contributors: Readiness,
}

impl SectionReadiness {
    #[must_use]
    pub const fn all(readiness: Readiness) -> Self {
        Self {
            summary: readiness,
            languages: readiness,
            commits: readiness,
            readme: readiness,
            contributors: readiness,
        }
    }

    #[must_use]
    pub const fn get(&self, section: Section) -> Readiness {
        match section {
            Section::Summary => self.summary,
            Section::Languages => self.languages,
            Section::Commits => self.commits,
            Section::Readme => self.readme,
            Section::Contributors => self.contributors,
        }
    }

    const fn get_mut(&mut self, section: Section) -> &mut Readiness {
        match section {
            Section::Summary => &mut self.summary,
            Section::Languages => &mut self.languages,
            Section::Commits => &mut self.commits,
            Section::Readme => &mut self.readme,
            Section::Contributors => &mut self.contributors,
        }
    }
}

/// The settled result of one section's fetch.
#[derive(Debug, Clone)]
pub enum SectionUpdate {
    Summary(Result<RepositorySummary, UnavailableReason>),
    Languages(Result<LanguageBreakdown, UnavailableReason>),
    Commits(Result<Vec<CommitRecord>, UnavailableReason>),
    Readme(Result<String, UnavailableReason>),
    Contributors(Result<(Vec<Contributor>, Completeness), UnavailableReason>),
}

impl SectionUpdate {
    #[must_use]
    pub const fn section(&self) -> Section {
        match self {
            Self::Summary(_) => Section::Summary,
            Self::Languages(_) => Section::Languages,
            Self::Commits(_) => Section::Commits,
            Self::Readme(_) => Section::Readme,
            Self::Contributors(_) => Section::Contributors,
        }
    }
}

/// Everything known about one repository, with per-section readiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateProjectMetadata {
    pub reference: Option<RepoRef>,
    pub summary: Option<RepositorySummary>,
    pub languages: LanguageBreakdown,
    pub commits: Vec<CommitRecord>,
    pub contributors: Vec<Contributor>,
    pub contributors_completeness: Completeness,
    pub readme_html: Option<String>,
    pub readiness: SectionReadiness,
}

impl AggregateProjectMetadata {
    /// An empty aggregate with every section pending.
    #[must_use]
    pub fn pending(reference: RepoRef) -> Self {
        Self::empty(Some(reference), SectionReadiness::all(Readiness::Pending))
    }

    /// An empty aggregate with every section unavailable because there is nothing to load.
    #[must_use]
    pub fn without_reference() -> Self {
        Self::empty(None, SectionReadiness::all(Readiness::Unavailable(UnavailableReason::NoReference)))
    }

    fn empty(reference: Option<RepoRef>, readiness: SectionReadiness) -> Self {
        Self {
            reference,
            summary: None,
            languages: LanguageBreakdown::new(),
            commits: Vec::new(),
            contributors: Vec::new(),
            contributors_completeness: Completeness::Complete,
            readme_html: None,
            readiness,
        }
    }

    /// Whether every section has left the pending state.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        let r = &self.readiness;
        r.summary.is_settled() && r.languages.is_settled() && r.commits.is_settled() && r.readme.is_settled() && r.contributors.is_settled()
    }

    /// Whether no section produced any data.
    #[must_use]
    pub fn has_no_data(&self) -> bool {
        self.is_settled()
            && [self.readiness.summary, self.readiness.languages, self.readiness.commits, self.readiness.readme, self.readiness.contributors]
                .iter()
                .all(|r| matches!(r, Readiness::Unavailable(_)))
    }

    /// Record a settled section. A section settles once; later updates for it are ignored.
    ///
    /// The language breakdown depends on the summary, so an unavailable summary also
    /// settles the languages section.
    pub fn apply(&mut self, update: SectionUpdate) {
        let section = update.section();
        if self.readiness.get(section).is_settled() {
            return;
        }

        let readiness = match update {
            SectionUpdate::Summary(Ok(summary)) => {
                self.summary = Some(summary);
                Readiness::Ready
            }
            SectionUpdate::Summary(Err(reason)) => {
                if !self.readiness.languages.is_settled() {
                    self.readiness.languages = Readiness::Unavailable(UnavailableReason::DependencyUnavailable);
                }
                Readiness::Unavailable(reason)
            }
            SectionUpdate::Languages(Ok(languages)) => {
                self.languages = languages;
                Readiness::Ready
            }
            SectionUpdate::Commits(Ok(commits)) => {
                self.commits = commits;
                Readiness::Ready
            }
            SectionUpdate::Readme(Ok(html)) => {
                self.readme_html = Some(html);
                Readiness::Ready
            }
            SectionUpdate::Contributors(Ok((contributors, completeness))) => {
                self.contributors = contributors;
                self.contributors_completeness = completeness;
                Readiness::Ready
            }
            SectionUpdate::Languages(Err(reason))
            | SectionUpdate::Commits(Err(reason))
            | SectionUpdate::Readme(Err(reason))
            | SectionUpdate::Contributors(Err(reason)) => Readiness::Unavailable(reason),
        };

        *self.readiness.get_mut(section) = readiness;
    }
}
