use serde::Deserialize;
use std::net::SocketAddr;

use super::errors::ConfigError;
use super::log::{KafkaConfig, LogConfig, SinkKind};

/// Main configuration, read once at startup and immutable afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// UDP listen port.
    pub port: u16,

    /// Default upstream resolvers, raced for every query without a more
    /// specific rule. Ordered, non-empty.
    pub upstream_addrs: Vec<String>,

    /// Per-domain upstream overrides.
    #[serde(default)]
    pub domain_resolvers: Vec<DomainResolver>,

    /// Static redirects, by address or by name.
    #[serde(default)]
    pub domain_redirect: Vec<DomainRedirect>,

    /// Names answered with NXDOMAIN without upstream contact.
    #[serde(default)]
    pub blocked_domains: Vec<String>,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub kafka: KafkaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainResolver {
    pub domain: String,
    pub resolvers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainRedirect {
    pub domain: String,

    /// Resolve this name instead of `domain`; invisible to the client.
    #[serde(default)]
    pub redirect_domain: Option<String>,

    /// Answer `domain` locally with this IPv4 address. Wins over
    /// `redirect_domain` when both are set.
    #[serde(default)]
    pub ip: Option<String>,
}

impl Config {
    /// Load configuration from `path`, or `./config.yaml` when no path is
    /// given, then apply command-line overrides.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let path = path.unwrap_or("config.yaml");
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        let mut config: Self =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.apply_cli_overrides(overrides);
        Ok(config)
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(level) = overrides.log_level {
            self.log.level = level;
        }
    }

    /// Validate the loaded configuration. Failure here aborts startup.
    ///
    /// Redirect `ip` strings are deliberately not parsed at this point;
    /// a bad address fails the first query that hits the rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Validation("listen port cannot be 0".to_string()));
        }

        if self.upstream_addrs.is_empty() {
            return Err(ConfigError::Validation(
                "at least one upstream address is required".to_string(),
            ));
        }
        for addr in &self.upstream_addrs {
            check_socket_addr(addr, "upstream_addrs")?;
        }

        for entry in &self.domain_resolvers {
            if entry.resolvers.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "domain_resolvers entry '{}' has no resolvers",
                    entry.domain
                )));
            }
            for addr in &entry.resolvers {
                check_socket_addr(addr, &entry.domain)?;
            }
        }

        for entry in &self.domain_redirect {
            if entry.ip.is_none() && entry.redirect_domain.is_none() {
                return Err(ConfigError::Validation(format!(
                    "domain_redirect entry '{}' needs an ip or a redirect_domain",
                    entry.domain
                )));
            }
        }

        match self.log.logger {
            SinkKind::File if self.log.log_path.is_empty() => Err(ConfigError::Validation(
                "file logger requires log.log_path".to_string(),
            )),
            SinkKind::Kafka if self.kafka.servers.is_empty() || self.kafka.log_topic.is_empty() => {
                Err(ConfigError::Validation(
                    "kafka logger requires kafka.servers and kafka.log_topic".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

fn check_socket_addr(addr: &str, context: &str) -> Result<(), ConfigError> {
    addr.parse::<SocketAddr>().map(|_| ()).map_err(|e| {
        ConfigError::Validation(format!("invalid resolver address '{addr}' in {context}: {e}"))
    })
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub log_level: Option<String>,
}
