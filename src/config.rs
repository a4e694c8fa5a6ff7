//! Service configuration loaded from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::Result;

/// Service configuration.
///
/// Every field is optional in the environment and falls back to a default:
///
/// | Variable | Default |
/// |---|---|
/// | `PORT` | `3000` |
/// | `LISTEN_HOST` | `0.0.0.0` |
/// | `USERS_FILE` | `data/users.json` |
/// | `ACTIVITIES_FILE` | `data/bankActivities.json` |
/// | `RUST_LOG` | `info` |
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_listen_host")]
    pub listen_host: IpAddr,

    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,

    #[serde(default = "default_activities_file")]
    pub activities_file: PathBuf,

    /// Log filter directive, in `tracing-subscriber` `EnvFilter` syntax.
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_port() -> u16 {
    3000
}

fn default_listen_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_users_file() -> PathBuf {
    PathBuf::from("data/users.json")
}

fn default_activities_file() -> PathBuf {
    PathBuf::from("data/bankActivities.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env::<Config>()?)
    }

    /// Reads configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(vars)?)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            listen_host: default_listen_host(),
            users_file: default_users_file(),
            activities_file: default_activities_file(),
            rust_log: default_log_level(),
        }
    }
}
