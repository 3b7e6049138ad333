use crate::Result;
use crate::metadata::{LoadSettings, PageLimits};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "glance.toml";

/// Largest page size the hosting API honors
const MAX_PAGE_SIZE: u32 = 100;

const LOG_TARGET: &str = "    config";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the hosting API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Upper bound on each individual request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of recent commits to fetch
    #[serde(default = "default_commit_window")]
    pub commit_window: u32,

    /// Contributors requested per page
    #[serde(default = "default_contributor_page_size")]
    pub contributor_page_size: u32,

    /// Maximum number of contributor pages to read
    #[serde(default = "default_max_contributor_pages")]
    pub max_contributor_pages: u32,

    /// Maximum number of contributors to collect
    #[serde(default = "default_max_contributors")]
    pub max_contributors: usize,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_commit_window() -> u32 {
    5
}

const fn default_contributor_page_size() -> u32 {
    MAX_PAGE_SIZE
}

const fn default_max_contributor_pages() -> u32 {
    100
}

const fn default_max_contributors() -> usize {
    10_000
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `glance.toml` in `base_dir` is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds invalid values
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!(target: LOG_TARGET, "No '{path}' found, using default configuration");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config
            .validate()
            .map_err(|e| e.enrich_with(|| format!("validating configuration file '{final_path}'")))?;

        log::debug!(target: LOG_TARGET, "Loaded configuration from '{final_path}'");
        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is zero, the page size exceeds what the API accepts, or the
    /// base URL does not parse
    pub fn validate(&self) -> Result<()> {
        let _ = Url::parse(&self.api_base_url).into_app_err_with(|| format!("api_base_url '{}' is not a valid URL", self.api_base_url))?;

        if self.request_timeout_secs == 0 {
            return Err(app_err!("request_timeout_secs must be greater than 0"));
        }

        if self.commit_window == 0 {
            return Err(app_err!("commit_window must be greater than 0"));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.contributor_page_size) {
            return Err(app_err!(
                "contributor_page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.contributor_page_size
            ));
        }

        if self.max_contributor_pages == 0 {
            return Err(app_err!("max_contributor_pages must be greater than 0"));
        }

        if self.max_contributors == 0 {
            return Err(app_err!("max_contributors must be greater than 0"));
        }

        Ok(())
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn load_settings(&self) -> LoadSettings {
        LoadSettings {
            commit_window: self.commit_window,
            contributor_page_size: self.contributor_page_size,
            contributor_limits: PageLimits {
                max_pages: self.max_contributor_pages,
                max_items: self.max_contributors,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            commit_window: default_commit_window(),
            contributor_page_size: default_contributor_page_size(),
            max_contributor_pages: default_max_contributor_pages(),
            max_contributors: default_max_contributors(),
        }
    }
}
