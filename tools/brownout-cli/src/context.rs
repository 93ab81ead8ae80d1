//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use brownout_sdk::brownout_cache::{CacheStore, FileCacheStore};
use brownout_sdk::{Engine, EngineBuilder};
use tracing::debug;

use crate::config::CliConfig;
use crate::output::Output;

/// Config file names searched from the working directory upwards.
pub const CONFIG_NAMES: [&str; 3] = ["brownout.toml", ".brownout.toml", "brownout.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// File the configuration was read from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let found = match config_path {
            Some(path) => {
                let path = resolve_against(&cwd, Path::new(path));
                Some((CliConfig::load(&path)?, path))
            }
            None => Self::find_config(&cwd),
        };

        let (mut config, config_path) = match found {
            Some((config, path)) => (config, Some(path)),
            None => (CliConfig::default(), None),
        };

        // Relative cache directories are relative to the config file.
        let base = config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());
        if let Some(dir) = config.engine.cache_dir.take() {
            config.engine.cache_dir = Some(resolve_against(&base, &dir));
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(&config_path) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Engine builder for the loaded configuration.
    pub fn engine_builder(&self) -> EngineBuilder {
        Engine::builder(self.config.engine.clone())
    }

    /// Start an engine with the default HTTP transport.
    pub async fn start_engine(&self) -> Result<Engine> {
        debug!(origin = %self.config.engine.origin, "starting engine");
        self.engine_builder()
            .start()
            .await
            .context("Failed to start engine")
    }

    /// Open the persistent cache store.
    pub async fn open_store(&self) -> Result<Arc<dyn CacheStore>> {
        let Some(dir) = &self.config.engine.cache_dir else {
            bail!("No cache_dir configured; the in-memory store does not outlive a command");
        };
        let store = FileCacheStore::open(dir, self.config.engine.cache_namespace.clone())
            .await
            .with_context(|| format!("Failed to open cache at {}", dir.display()))?;
        Ok(Arc::new(store))
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
