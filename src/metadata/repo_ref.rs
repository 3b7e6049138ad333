use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::bail;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

const LOG_TARGET: &str = "  repo_ref";

/// Identifies a hosted repository by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    owner: Arc<str>,
    name: Arc<str>,
}

impl RepoRef {
    #[must_use]
    pub fn new(owner: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            owner: Arc::from(owner.as_ref()),
            name: Arc::from(name.as_ref()),
        }
    }

    /// Parse a repository URL of the form `https://host/owner/name[/...]`.
    ///
    /// Path segments past the repository name are ignored and a trailing `.git` is stripped.
    pub fn parse(url: &Url) -> Result<Self> {
        if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
            bail!("not a repository URL: {url}");
        }

        let path_segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();

        if path_segments.len() < 2 {
            bail!("invalid repository URL format: {url}");
        }

        let owner = path_segments[0];
        let name = path_segments[1].trim_end_matches(".git");

        if owner.is_empty() || name.is_empty() {
            bail!("invalid repository URL: empty owner or repo name: {url}");
        }

        Ok(Self::new(owner, name))
    }

    /// Derive a reference from a project's external link, if it names a repository.
    ///
    /// Missing or malformed links yield `None`.
    #[must_use]
    pub fn from_link(link: Option<&str>) -> Option<Self> {
        let link = link?.trim();
        let url = Url::parse(link).ok()?;
        match Self::parse(&url) {
            Ok(reference) => Some(reference),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Ignoring link '{link}': {e}");
                None
            }
        }
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for RepoRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
