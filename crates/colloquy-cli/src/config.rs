use colloquy_core::{ColloquyError, ColloquyResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Contents of `colloquy.toml`. Every field has a default, so an absent
/// file is the same as an empty one.
#[derive(Debug, Deserialize)]
pub struct ColloquyConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Snapshot file; `{data_dir}/conversations.json` when unset.
    #[serde(default)]
    pub snapshot_file: Option<PathBuf>,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct PersistenceConfig {
    /// Write the snapshot back after every mutating command.
    #[serde(default = "default_true")]
    pub autosave: bool,
    /// Restore the snapshot (when present) before running a command.
    #[serde(default = "default_true")]
    pub load_on_start: bool,
}

impl Default for ColloquyConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_file: None,
            prompt: PromptConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            autosave: true,
            load_on_start: true,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_true() -> bool {
    true
}

impl ColloquyConfig {
    /// Reads the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> ColloquyResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ColloquyError::Config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                )))
            }
        };
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> ColloquyResult<Self> {
        toml::from_str(text).map_err(|e| ColloquyError::Config(e.to_string()))
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("conversations.json"))
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt.timeout_secs)
    }
}
