use async_trait::async_trait;
use relay_dns_domain::{AuditRecord, ProxyError};

/// Destination for the structured audit stream.
///
/// Delivery failures are reported to the caller but must never influence
/// the response sent to a client.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn info(&self, record: &AuditRecord) -> Result<(), ProxyError>;
    async fn warn(&self, record: &AuditRecord) -> Result<(), ProxyError>;
    async fn error(&self, record: &AuditRecord) -> Result<(), ProxyError>;
    async fn debug(&self, record: &AuditRecord) -> Result<(), ProxyError>;
}
