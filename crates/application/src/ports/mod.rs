mod audit_sink;
mod upstream_exchange;

pub use audit_sink::AuditSink;
pub use upstream_exchange::UpstreamExchange;
