//! Command-line and environment configuration.

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

/// In-memory user directory over HTTP.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "USERBOOK_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Bearer token clients must present in `Authorization`.
    #[arg(long, env = "USERBOOK_TOKEN", default_value = crate::DEFAULT_TOKEN, hide_env_values = true)]
    pub token: String,

    /// Log output format.
    #[arg(long, env = "USERBOOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Auto)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
    /// JSON when stdout is not a terminal, text otherwise.
    Auto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["userbook"]).unwrap();
        assert_eq!(config.listen, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.token, "demo-token");
        assert_eq!(config.log_format, LogFormat::Auto);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "userbook",
            "--listen", "127.0.0.1:8080",
            "--token", "s3cret",
            "--log-format", "json",
        ])
        .unwrap();

        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.token, "s3cret");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_address_is_rejected() {
        assert!(Config::try_parse_from(["userbook", "--listen", "nowhere"]).is_err());
    }

    #[test]
    fn command_is_well_formed() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
