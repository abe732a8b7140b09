use std::io::Write;
use std::path::Path;

use serde::Deserialize;

const DEFAULT_SYSLOG_ADDR: &str = "127.0.0.1:514";
const DEFAULT_EXIT_DRAIN_SECS: u64 = 2;

fn default_syslog_addr() -> String {
    DEFAULT_SYSLOG_ADDR.to_string()
}

fn default_exit_drain_secs() -> u64 {
    DEFAULT_EXIT_DRAIN_SECS
}

#[derive(Debug, thiserror::Error)]
pub enum RelayConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Where the relay logger writes its own copy of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputDestination {
    #[serde(alias = "stdout", alias = "Stdout", alias = "STDOUT")]
    #[default]
    Stdout,
    #[serde(alias = "stderr", alias = "Stderr", alias = "STDERR")]
    Stderr,
    /// Records only go to the network sink.
    #[serde(alias = "discard", alias = "null", alias = "none")]
    Discard,
}

impl OutputDestination {
    pub fn writer(self) -> Box<dyn Write + Send> {
        match self {
            OutputDestination::Stdout => Box::new(std::io::stdout()),
            OutputDestination::Stderr => Box::new(std::io::stderr()),
            OutputDestination::Discard => Box::new(std::io::sink()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Address of the UDP syslog collector.
    #[serde(default = "default_syslog_addr")]
    pub syslog_addr: String,
    /// Container labels copied onto every relayed record.
    #[serde(default)]
    pub send_docker_labels: Vec<String>,
    #[serde(default)]
    pub output: OutputDestination,
    /// Seconds to keep pumping after the container stops.
    #[serde(default = "default_exit_drain_secs")]
    pub exit_drain_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            syslog_addr: default_syslog_addr(),
            send_docker_labels: Vec::new(),
            output: OutputDestination::default(),
            exit_drain_secs: default_exit_drain_secs(),
        }
    }
}

impl RelayConfig {
    fn try_init_from_string(config: &str) -> Result<Self, RelayConfigError> {
        Ok(toml::from_str(config)?)
    }

    /// Reads the config file at `path`. A missing file yields the defaults.
    pub fn try_init(path: &Path) -> Result<Self, RelayConfigError> {
        match std::fs::read_to_string(path) {
            Ok(config) => Self::try_init_from_string(&config),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config file at {path:?}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Applies `SYSLOG_ADDR` and `SEND_DOCKER_LABELS` from `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("SYSLOG_ADDR") {
            self.syslog_addr = addr;
        }
        if let Some(labels) = lookup("SEND_DOCKER_LABELS") {
            self.send_docker_labels = labels
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(String::from)
                .collect();
        }
    }
}
