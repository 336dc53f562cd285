//! Exploration configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use prober_types::{env_bool, env_string};

/// Per-invocation budget used when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Order in which freshly discovered native types are explored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    /// Explore a discovered type before the next member of its discoverer.
    #[default]
    DepthFirst,
    /// Queue discovered types and explore them after all unit members.
    BreadthFirst,
}

impl FromStr for Traversal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dfs" | "depth-first" | "depth_first" => Ok(Traversal::DepthFirst),
            "bfs" | "breadth-first" | "breadth_first" => Ok(Traversal::BreadthFirst),
            other => Err(format!("unknown traversal '{other}' (expected dfs or bfs)")),
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Traversal::DepthFirst => write!(f, "dfs"),
            Traversal::BreadthFirst => write!(f, "bfs"),
        }
    }
}

/// Where program output printed by invoked code goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Into the execution log, as trace lines.
    #[default]
    Log,
    /// Forwarded to this process's stdout.
    Inherit,
    Discard,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(OutputMode::Log),
            "inherit" => Ok(OutputMode::Inherit),
            "discard" => Ok(OutputMode::Discard),
            other => Err(format!(
                "unknown output mode '{other}' (expected log, inherit or discard)"
            )),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Log => write!(f, "log"),
            OutputMode::Inherit => write!(f, "inherit"),
            OutputMode::Discard => write!(f, "discard"),
        }
    }
}

/// Configuration for one exploration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploreConfig {
    /// Wall-clock budget for each invocation, materialization included.
    pub timeout: Duration,
    pub traversal: Traversal,
    pub output: OutputMode,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            traversal: Traversal::default(),
            output: OutputMode::default(),
        }
    }
}

impl ExploreConfig {
    /// Defaults overlaid with `PROBER_*` environment variables.
    ///
    /// - `PROBER_TIMEOUT_SECS` / `PROBER_TIMEOUT_MS` (milliseconds win)
    /// - `PROBER_TRAVERSAL` (`dfs` or `bfs`)
    /// - `PROBER_BFS=1` as a shorthand for breadth-first
    /// - `PROBER_OUTPUT` (`log`, `inherit` or `discard`)
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env_u64("PROBER_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64("PROBER_TIMEOUT_MS") {
            config.timeout = Duration::from_millis(ms);
        }

        if env_bool("PROBER_BFS") {
            config.traversal = Traversal::BreadthFirst;
        }
        if let Some(raw) = env_string("PROBER_TRAVERSAL") {
            match raw.parse() {
                Ok(traversal) => config.traversal = traversal,
                Err(e) => tracing::warn!("ignoring PROBER_TRAVERSAL: {}", e),
            }
        }

        if let Some(raw) = env_string("PROBER_OUTPUT") {
            match raw.parse() {
                Ok(output) => config.output = output,
                Err(e) => tracing::warn!("ignoring PROBER_OUTPUT: {}", e),
            }
        }

        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = env_string(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
