pub mod audit;
pub mod config;
pub mod errors;
pub mod policy;

pub use audit::{AuditLevel, AuditRecord, RESOLVER_BLOCKED, RESOLVER_REDIRECT};
pub use config::{
    CliOverrides, Config, ConfigError, DomainRedirect, DomainResolver, KafkaConfig, LogConfig,
    SinkKind,
};
pub use errors::ProxyError;
pub use policy::{normalize_fqdn, PolicyTable, RedirectTarget, RouteDecision};
