use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Resolver tag recorded when a query is answered from the blocklist.
pub const RESOLVER_BLOCKED: &str = "blocked-domain";

/// Resolver tag recorded when a query is answered with a configured address.
pub const RESOLVER_REDIRECT: &str = "static-redirect";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Debug => "debug",
        }
    }
}

/// One terminal decision on the audit stream.
///
/// Field names are the stream contract consumed downstream and are
/// serialized verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub time: String,
    pub level: AuditLevel,
    pub domain: String,
    pub client_ip: String,
    pub qtype: String,
    pub resolver: String,
    pub message: String,
}

impl AuditRecord {
    /// Build a record stamped with the current UTC time, RFC3339 with
    /// nanosecond precision.
    pub fn now(
        level: AuditLevel,
        domain: impl Into<String>,
        client_ip: impl Into<String>,
        qtype: impl Into<String>,
        resolver: impl Into<String>,
    ) -> Self {
        Self {
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
            level,
            domain: domain.into(),
            client_ip: client_ip.into(),
            qtype: qtype.into(),
            resolver: resolver.into(),
            message: String::new(),
        }
    }
}
