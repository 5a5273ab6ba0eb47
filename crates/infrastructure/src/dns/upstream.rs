use async_trait::async_trait;
use hickory_proto::op::{Message, ResponseCode};
use relay_dns_application::ports::UpstreamExchange;
use relay_dns_domain::ProxyError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Maximum UDP reply size accepted from an upstream.
const MAX_REPLY_SIZE: usize = 4096;

/// One-shot DNS-over-UDP exchange: a fresh ephemeral socket per call, one
/// request datagram, one reply datagram, no pooling.
pub struct UdpExchange;

impl UdpExchange {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UdpExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamExchange for UdpExchange {
    async fn exchange(
        &self,
        query: &Message,
        upstream: SocketAddr,
        timeout: Duration,
    ) -> Result<Message, ProxyError> {
        let payload = query.to_vec().map_err(|e| ProxyError::Encode(e.to_string()))?;

        tokio::time::timeout(timeout, one_exchange(payload, query.id(), upstream))
            .await
            .map_err(|_| ProxyError::Transport {
                server: upstream,
                reason: format!("no reply within {}ms", timeout.as_millis()),
            })?
    }
}

async fn one_exchange(
    payload: Vec<u8>,
    query_id: u16,
    upstream: SocketAddr,
) -> Result<Message, ProxyError> {
    let transport = |reason: String| ProxyError::Transport {
        server: upstream,
        reason,
    };

    // Ephemeral port in the upstream's address family.
    let bind_addr: SocketAddr = if upstream.is_ipv4() {
        "0.0.0.0:0".parse().unwrap()
    } else {
        "[::]:0".parse().unwrap()
    };

    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| transport(format!("bind: {e}")))?;
    socket
        .connect(upstream)
        .await
        .map_err(|e| transport(format!("connect: {e}")))?;
    socket
        .send(&payload)
        .await
        .map_err(|e| transport(format!("send: {e}")))?;

    let mut buf = vec![0u8; MAX_REPLY_SIZE];
    let received = socket
        .recv(&mut buf)
        .await
        .map_err(|e| transport(format!("recv: {e}")))?;

    let reply =
        Message::from_vec(&buf[..received]).map_err(|e| ProxyError::Decode(e.to_string()))?;

    if reply.id() != query_id {
        warn!(upstream = %upstream, got = reply.id(), expected = query_id, "reply id mismatch");
        return Err(transport("reply id mismatch".to_string()));
    }

    if reply.response_code() != ResponseCode::NoError {
        // Non-success replies are discarded; the race counts them as failed
        // attempts.
        return Err(ProxyError::UpstreamRcode {
            server: upstream,
            rcode: u16::from(reply.response_code()),
        });
    }

    debug!(upstream = %upstream, bytes = received, "upstream reply received");
    Ok(reply)
}
