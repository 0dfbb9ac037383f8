//! Command-line flags.  Anything given here overrides `newsfeed.toml`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;

/// Browse the Guardian's newest articles for a search term and section.
///
/// Keys: `/` search, Tab change section, Enter open, r reload, q quit.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a newsfeed.toml settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Search term (empty uses the configured default term)
    #[arg(short, long)]
    pub term: Option<String>,

    /// Section filter, e.g. "world" or "technology"
    #[arg(short, long)]
    pub section: Option<String>,

    /// Guardian content API key
    #[arg(long, env = "GUARDIAN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Search endpoint URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Where to write the log (the terminal is taken by the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Overlay the flags that were given onto `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(term) = &self.term {
            settings.search.term = term.clone();
        }
        if let Some(section) = &self.section {
            settings.search.section = section.clone();
        }
        if let Some(key) = &self.api_key {
            settings.api.api_key = key.clone();
        }
        if let Some(url) = &self.base_url {
            settings.api.base_url = url.clone();
        }
        if let Some(file) = &self.log_file {
            settings.log.file = file.clone();
        }
    }
}
