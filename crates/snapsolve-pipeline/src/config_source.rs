//! Where the coordinator re-reads configuration from when it has no client.

use std::path::PathBuf;

use snapsolve_core::config::{load_config, Config};

pub trait ConfigSource: Send + Sync {
    /// Current configuration. Never fails; a broken source yields defaults.
    fn load(&self) -> Config;
}

/// Reads `config.json` (default `~/.snapsolve/config.json`) plus env overrides.
#[derive(Clone, Debug, Default)]
pub struct FileConfigSource {
    path: Option<PathBuf>,
}

impl FileConfigSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Config {
        load_config(self.path.as_deref())
    }
}

/// A fixed config, for embedding and tests.
impl ConfigSource for Config {
    fn load(&self) -> Config {
        self.clone()
    }
}
