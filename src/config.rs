use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{Context, ensure};

use crate::rooms::{DEFAULT_MAIL_ROOM, DEFAULT_MAX_HISTORY};

pub const DEFAULT_PORT: u16 = 5174;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub max_history: usize,
    pub mail_room: String,
    /// Where clients are told to reach the relay. Only used for the readiness log.
    /// Read from `BACKEND_URL`, falling back to the web client's `VITE_BACKEND_URL`.
    pub public_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_history: DEFAULT_MAX_HISTORY,
            mail_room: DEFAULT_MAIL_ROOM.to_owned(),
            public_url: format!("http://localhost:{DEFAULT_PORT}"),
        }
    }
}

impl Config {
    /// Reads `.env` and the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let host = match var("HOST") {
            Some(host) => host.parse().with_context(|| format!("HOST={host} is not an IP address"))?,
            None => defaults.host,
        };
        let port = match var("PORT") {
            Some(port) => port.parse().with_context(|| format!("PORT={port} is not a port number"))?,
            None => defaults.port,
        };
        let max_history = match var("MAX_HISTORY") {
            Some(max) => max.parse().with_context(|| format!("MAX_HISTORY={max} is not a number"))?,
            None => defaults.max_history,
        };
        ensure!(max_history > 0, "MAX_HISTORY must be at least 1");

        Ok(Self {
            host,
            port,
            max_history,
            mail_room: var("MAIL_ROOM").unwrap_or(defaults.mail_room),
            public_url: var("BACKEND_URL")
                .or_else(|| var("VITE_BACKEND_URL"))
                .unwrap_or_else(|| format!("http://localhost:{port}")),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.addr().port(), 5174);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("MAX_HISTORY", "10"),
            ("MAIL_ROOM", "inbox"),
        ]))
        .unwrap();

        assert_eq!(config.addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.max_history, 10);
        assert_eq!(config.mail_room, "inbox");
        assert_eq!(config.public_url, "http://localhost:9000");
    }

    #[test]
    fn public_url_falls_back_to_client_variable() {
        let config = Config::from_lookup(lookup(&[("VITE_BACKEND_URL", "http://relay.lan:5174")])).unwrap();
        assert_eq!(config.public_url, "http://relay.lan:5174");

        let config = Config::from_lookup(lookup(&[
            ("BACKEND_URL", "http://primary:5174"),
            ("VITE_BACKEND_URL", "http://relay.lan:5174"),
        ]))
        .unwrap();
        assert_eq!(config.public_url, "http://primary:5174");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("PORT", "nope")])).is_err());
        assert!(Config::from_lookup(lookup(&[("MAX_HISTORY", "0")])).is_err());
    }
}
