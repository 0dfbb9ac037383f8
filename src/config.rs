//! Settings and the search configuration handed to each load.
//!
//! Settings come from `newsfeed.toml` (working directory first, then
//! `~/.config/newsfeed/newsfeed.toml`).  A missing file means defaults; a
//! file that exists but cannot be read or parsed is an error.  Command-line
//! flags are layered on top in `main.rs`.
//!
//! ```toml
//! [api]
//! base_url = "https://content.guardianapis.com/search"
//! api_key = "test"
//! timeout_secs = 10
//!
//! [search]
//! term = "climate"
//! default_term = "news"
//! section = "science"
//!
//! [network]
//! probe_timeout_ms = 1500
//!
//! [log]
//! file = "/tmp/newsfeed.log"
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::source::QueryBuilder;

/// File name looked up in the working directory and the config directory.
pub const CONFIG_FILE_NAME: &str = "newsfeed.toml";

/// Section filters offered by the Tab key.  The empty string means "all".
pub const SECTIONS: &[&str] = &[
    "",
    "world",
    "politics",
    "business",
    "technology",
    "science",
    "sport",
    "culture",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid API base url {url:?}: {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },
}

// ---------------------------------------------------------------------------
// SearchConfig / ConfigProvider
// ---------------------------------------------------------------------------

/// What to search for.  Empty `term` means "use the default term"; empty
/// `section` means "no section filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchConfig {
    pub term: String,
    pub section: String,
}

/// Supplies the current [`SearchConfig`] at the moment a load starts.
pub trait ConfigProvider {
    fn search_config(&self) -> SearchConfig;
}

/// The search configuration for this run of the program.
///
/// Seeded from [`Settings`]; the search prompt and section key change it as
/// the user browses.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    current: SearchConfig,
}

impl SessionConfig {
    pub fn new(initial: SearchConfig) -> Self {
        Self { current: initial }
    }

    pub fn term(&self) -> &str {
        &self.current.term
    }

    pub fn section(&self) -> &str {
        &self.current.section
    }

    pub fn set_term(&mut self, term: impl Into<String>) {
        self.current.term = term.into();
    }

    /// Advance to the next entry of [`SECTIONS`], wrapping around.  A
    /// section not in the list (e.g. from the config file) moves to "all".
    pub fn cycle_section(&mut self) {
        let next = SECTIONS
            .iter()
            .position(|s| *s == self.current.section)
            .map(|i| (i + 1) % SECTIONS.len())
            .unwrap_or(0);
        self.current.section = SECTIONS[next].to_string();
    }
}

impl ConfigProvider for SessionConfig {
    fn search_config(&self) -> SearchConfig {
        self.current.clone()
    }
}

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://content.guardianapis.com/search".into(),
            api_key: "test".into(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub term: String,
    pub default_term: String,
    pub section: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            term: String::new(),
            default_term: "news".into(),
            section: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub probe_timeout_ms: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub file: PathBuf,
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: std::env::temp_dir().join("newsfeed.log"),
            level: "info".into(),
        }
    }
}

/// Root of `newsfeed.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub search: SearchSettings,
    pub network: NetworkSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Load from `path` if given, otherwise from the first standard location
    /// that exists, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path.map(Path::to_path_buf).or_else(Self::find_config_file) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut settings: Settings = toml::from_str(content)?;
        if settings.search.default_term.trim().is_empty() {
            settings.search.default_term = SearchSettings::default().default_term;
        }
        Ok(settings)
    }

    fn find_config_file() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("newsfeed").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api.base_url).map_err(|source| ConfigError::BaseUrl {
            url: self.api.base_url.clone(),
            source,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.network.probe_timeout_ms.max(1))
    }

    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(&self.api.api_key, &self.search.default_term)
    }
}

impl ConfigProvider for Settings {
    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            term: self.search.term.clone(),
            section: self.search.section.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
