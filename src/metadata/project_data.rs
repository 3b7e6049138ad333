use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub star_count: u64,
    pub fork_count: u64,
    pub last_pushed_at: Option<DateTime<Utc>>,
    pub open_issue_count: u64,
    pub topics: Vec<String>,
    pub web_url: String,
    pub description: Option<String>,
}

/// Bytes of source per language, as reported by the hosting API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageBreakdown(BTreeMap<String, u64>);

impl LanguageBreakdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: impl Into<String>, bytes: u64) {
        let _ = self.0.insert(language.into(), bytes);
    }

    #[must_use]
    pub fn get(&self, language: &str) -> Option<u64> {
        self.0.get(language).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Total bytes across all languages.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.0.values().copied().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, bytes)| (name.as_str(), *bytes))
    }

    /// Languages ordered by descending byte count, ties broken by name.
    #[must_use]
    pub fn by_size(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for LanguageBreakdown {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, bytes)| (name.into(), bytes)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    pub author_name: String,
    pub authored_at: DateTime<Utc>,
    pub message: String,
    pub web_url: String,
}

impl CommitRecord {
    /// First line of the commit message.
    #[must_use]
    pub fn headline(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub handle: String,
    pub avatar_url: String,
    pub profile_url: String,
    pub contribution_count: u64,
}
