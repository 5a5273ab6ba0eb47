use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport failure against {server}: {reason}")]
    Transport { server: SocketAddr, reason: String },

    #[error("upstream {server} answered with rcode {rcode}")]
    UpstreamRcode { server: SocketAddr, rcode: u16 },

    #[error("all {attempted} upstream attempts failed")]
    AllUpstreamsFailed { attempted: usize },

    #[error("failed to encode DNS message: {0}")]
    Encode(String),

    #[error("failed to decode DNS message: {0}")]
    Decode(String),

    #[error("audit delivery failed: {0}")]
    AuditDelivery(String),
}
