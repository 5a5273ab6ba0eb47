use async_trait::async_trait;
use hickory_proto::op::Message;
use relay_dns_domain::ProxyError;
use std::net::SocketAddr;
use std::time::Duration;

/// One question/answer round trip against a single upstream resolver.
#[async_trait]
pub trait UpstreamExchange: Send + Sync {
    /// Send `query` to `upstream` and return the decoded reply.
    ///
    /// A reply that decodes but carries a non-NOERROR rcode must surface as
    /// `ProxyError::UpstreamRcode`; callers count it as a failed attempt.
    async fn exchange(
        &self,
        query: &Message,
        upstream: SocketAddr,
        timeout: Duration,
    ) -> Result<Message, ProxyError>;
}
