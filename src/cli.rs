use std::{path::PathBuf, sync::OnceLock};

use clap::Parser;

/// Relay a container's stdout and stderr to a syslog collector.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Name or id of the container to follow.
    pub container: String,
    /// Path to the config file.
    #[arg(short, long, default_value = "log-relay.toml")]
    pub config: PathBuf,
    /// Address of the UDP syslog collector. Overrides the config file
    /// and the SYSLOG_ADDR environment variable.
    #[arg(long)]
    pub syslog_addr: Option<String>,
}

static ARGS: OnceLock<Args> = OnceLock::new();

pub fn get_cli_args() -> &'static Args {
    ARGS.get_or_init(Args::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["log-relay", "web-1"]).expect("Failed to parse args");
        assert_eq!(args.container, "web-1");
        assert_eq!(args.config, PathBuf::from("log-relay.toml"));
        assert!(args.syslog_addr.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "log-relay",
            "-c",
            "/etc/relay.toml",
            "--syslog-addr",
            "10.0.0.1:514",
            "abc123",
        ])
        .expect("Failed to parse args");
        assert_eq!(args.container, "abc123");
        assert_eq!(args.config, PathBuf::from("/etc/relay.toml"));
        assert_eq!(args.syslog_addr.as_deref(), Some("10.0.0.1:514"));
    }

    #[test]
    fn test_container_is_required() {
        assert!(Args::try_parse_from(["log-relay"]).is_err());
    }
}
