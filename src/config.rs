//! Configuration.
//!
//! Loaded from a TOML file with `CHAINFOLIO_*` environment variables
//! on top. Every field has a default aimed at a local development
//! node, so a missing file is nothing to report.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// WebSocket endpoint of the ledger node.
    pub node_url: Url,
    /// Name under which the dashboard introduces itself to wallets.
    pub app_name: String,
    /// How long a notice stays visible, in milliseconds.
    pub notice_ttl_ms: u64,
    /// How long to wait between transaction status updates before
    /// giving up, in milliseconds.
    pub submit_timeout_ms: u64,
}

impl Config {
    /// Reads configuration from `file`, then applies `CHAINFOLIO_*`
    /// environment overrides. A missing file yields the defaults.
    pub fn load(file: &Path) -> Result<Config, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix("CHAINFOLIO"))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Writes a starter file holding the defaults, creating parent
    /// directories as needed.
    pub async fn write_default(file: &Path) -> Result<(), ConfigError> {
        let rendered = toml::to_string_pretty(&Config::default())?;
        if let Some(dir) = file.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(file, rendered).await?;
        Ok(())
    }

    /// Where the configuration file lives on this platform.
    pub fn default_file() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("com.chainfolio", "", "Chainfolio")?;
        Some(dirs.config_dir().join("chainfolio.toml"))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            node_url: default_node_url(),
            app_name: "chainfolio".to_string(),
            notice_ttl_ms: 3_000,
            submit_timeout_ms: 60_000,
        }
    }
}

// Where a freshly started local development node listens.
fn default_node_url() -> Url {
    Url::parse("ws://127.0.0.1:9944").expect("default node url parses")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("could not render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_a_local_node() {
        let config = Config::default();
        assert_eq!(config.node_url, Url::parse("ws://127.0.0.1:9944").unwrap());
        assert_eq!(config.app_name, "chainfolio");
        assert_eq!(config.notice_ttl(), Duration::from_secs(3));
        assert_eq!(config.submit_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/definitely/not/here/chainfolio.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn starter_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("chainfolio.toml");

        Config::write_default(&file).await.unwrap();
        let loaded = Config::load(&file).unwrap();

        assert_eq!(loaded, Config::default());
    }
}
