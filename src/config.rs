use std::env;
use std::path::PathBuf;

/// Runtime configuration for a cardex instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardexConfig {
    /// Connection URL for the backing store.
    pub store_url: String,
    /// Directory holding one `.lua` source file per named script.
    pub script_dir: PathBuf,
    pub connect_timeout_ms: u64,
}

impl Default for CardexConfig {
    fn default() -> Self {
        Self {
            store_url: "redis://localhost:6379/0".to_string(),
            script_dir: PathBuf::from("lua"),
            connect_timeout_ms: 5_000,
        }
    }
}

impl CardexConfig {
    /// Reads `REDIS_URL` and `CARDEX_SCRIPT_DIR` from the environment,
    /// keeping the defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("REDIS_URL") {
            config.store_url = url;
        }
        if let Ok(dir) = env::var("CARDEX_SCRIPT_DIR") {
            config.script_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn with_store_url(mut self, url: impl Into<String>) -> Self {
        self.store_url = url.into();
        self
    }

    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = dir.into();
        self
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }
}
