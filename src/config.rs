//! Runtime configuration
//!
//! Loaded from `config/scout.yml` under the root directory. Every key is
//! optional; a missing file yields the defaults below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config/scout.yml";

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Root directory every relative path is resolved against
    #[serde(skip)]
    pub root: PathBuf,
    pub data_dir: String,
    pub scrape: ScrapeConfig,
    pub search: SearchConfig,
    pub winners: WinnersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub workers: usize,
    pub batch_size: usize,
    /// Pause between ids in sequential mode
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub start_id: u32,
    pub end_id: u32,
    /// `last_id` assumed when no progress file exists yet
    pub initial_last_id: u32,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub duckduckgo_url: String,
    pub google_url: String,
    pub timeout_secs: u64,
    /// Pause after each search engine query
    pub query_delay_ms: u64,
    /// Pause after each person processed
    pub person_delay_ms: u64,
    /// Pause after each abstract page fetched for a name lookup
    pub page_delay_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WinnersConfig {
    pub save_every: usize,
    pub recent_since_year: u32,
    pub recent_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: PathBuf::from("."),
            data_dir: "data".to_string(),
            scrape: ScrapeConfig::default(),
            search: SearchConfig::default(),
            winners: WinnersConfig::default(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            base_url: "https://abstracts.societyforscience.org".to_string(),
            workers: 10,
            batch_size: 50,
            delay_ms: 500,
            timeout_secs: 30,
            start_id: 1,
            end_id: 30000,
            initial_last_id: 8888,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            duckduckgo_url: "https://html.duckduckgo.com/html/".to_string(),
            google_url: "https://www.google.com/search".to_string(),
            timeout_secs: 10,
            query_delay_ms: 2000,
            person_delay_ms: 3000,
            page_delay_ms: 1000,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl Default for WinnersConfig {
    fn default() -> Self {
        WinnersConfig {
            save_every: 10,
            recent_since_year: 2019,
            recent_limit: 50,
        }
    }
}

impl Config {
    /// Load `config/scout.yml` under `root`, falling back to defaults
    pub fn load(root: &Path) -> Result<Config> {
        let path = root.join(CONFIG_FILE);

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            serde_yaml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse {:?}", path))?
        } else {
            Config::default()
        };

        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Directory holding every JSON data file
    pub fn data_path(&self) -> PathBuf {
        self.root.join(&self.data_dir)
    }

    /// Same configuration with every pause zeroed, for tests and dry runs
    pub fn without_delays(mut self) -> Config {
        self.scrape.delay_ms = 0;
        self.search.query_delay_ms = 0;
        self.search.person_delay_ms = 0;
        self.search.page_delay_ms = 0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.scrape.workers, 10);
        assert_eq!(config.scrape.batch_size, 50);
        assert_eq!(config.scrape.initial_last_id, 8888);
        assert_eq!(config.data_path(), dir.path().join("data"));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "data_dir: out\nscrape:\n  workers: 3\nwinners:\n  recent_limit: 5\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.data_dir, "out");
        assert_eq!(config.scrape.workers, 3);
        assert_eq!(config.scrape.batch_size, 50);
        assert_eq!(config.winners.recent_limit, 5);
        assert_eq!(config.winners.recent_since_year, 2019);
    }

    #[test]
    fn test_without_delays() {
        let config = Config::default().without_delays();
        assert_eq!(config.scrape.delay_ms, 0);
        assert_eq!(config.search.query_delay_ms, 0);
        assert_eq!(config.search.person_delay_ms, 0);
    }
}
