//! Engine configuration.
//!
//! Precedence, lowest first:
//! 1. built-in defaults
//! 2. `engine.json` in the platform config dir (if present)
//! 3. `TANDEM_TIME_BUDGET_MS` / `TANDEM_YIELD_DELAY_MS`

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::event_loop::TokioLoop;

pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(1000);
pub const DEFAULT_YIELD_DELAY: Duration = Duration::from_millis(1);

pub const ENV_TIME_BUDGET: &str = "TANDEM_TIME_BUDGET_MS";
pub const ENV_YIELD_DELAY: &str = "TANDEM_YIELD_DELAY_MS";

const CONFIG_FILE: &str = "engine.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Synchronous work allowed per event-loop turn. Zero means the default.
    pub time_budget_ms: u64,
    /// Delay used when handing control back to the event loop.
    pub yield_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: DEFAULT_TIME_BUDGET.as_millis() as u64,
            yield_delay_ms: DEFAULT_YIELD_DELAY.as_millis() as u64,
        }
    }
}

impl EngineConfig {
    pub fn time_budget(&self) -> Duration {
        match self.time_budget_ms {
            0 => DEFAULT_TIME_BUDGET,
            ms => Duration::from_millis(ms),
        }
    }

    pub fn yield_delay(&self) -> Duration {
        Duration::from_millis(self.yield_delay_ms)
    }

    pub fn event_loop(&self) -> TokioLoop {
        TokioLoop::new(self.yield_delay())
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// `<config dir>/tandem/engine.json` on this platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tandem").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Defaults, then the config file, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(?path, "loading engine config");
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };
        base.with_env()
    }

    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// Applies overrides from any variable source (the process environment
    /// in `with_env`).
    pub fn with_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = parse_millis(ENV_TIME_BUDGET, lookup(ENV_TIME_BUDGET))? {
            self.time_budget_ms = ms;
        }
        if let Some(ms) = parse_millis(ENV_YIELD_DELAY, lookup(ENV_YIELD_DELAY))? {
            self.yield_delay_ms = ms;
        }
        Ok(self)
    }
}

fn parse_millis(var: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::Env { var, value })
}
