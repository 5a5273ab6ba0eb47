use hickory_proto::op::Message;
use relay_dns_application::use_cases::ResolveQueryUseCase;
use relay_dns_domain::ProxyError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Inbound datagram ceiling.
const MAX_QUERY_SIZE: usize = 4096;

/// UDP front end. A stateless dispatcher: every inbound datagram becomes
/// one tracked task running the query pipeline, so a slow upstream never
/// stalls unrelated queries.
pub struct ProxyServer {
    socket: Arc<UdpSocket>,
    pipeline: Arc<ResolveQueryUseCase>,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl ProxyServer {
    pub async fn bind(
        addr: SocketAddr,
        pipeline: Arc<ResolveQueryUseCase>,
    ) -> Result<Self, ProxyError> {
        let socket = create_udp_socket(addr)
            .map_err(|e| ProxyError::Config(format!("failed to bind {addr}: {e}")))?;
        let local = socket
            .local_addr()
            .map_err(|e| ProxyError::Config(e.to_string()))?;
        info!(listen = %local, "DNS proxy listening");

        Ok(Self {
            socket: Arc::new(socket),
            pipeline,
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ProxyError> {
        self.socket
            .local_addr()
            .map_err(|e| ProxyError::Config(e.to_string()))
    }

    /// Accept datagrams until `stop` is called.
    pub async fn serve(&self) {
        let mut buf = [0u8; MAX_QUERY_SIZE];

        loop {
            let (len, peer) = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok(x) => x,
                    Err(e) => {
                        warn!(error = %e, "UDP recv error");
                        continue;
                    }
                },
            };

            let datagram = buf[..len].to_vec();
            let socket = Arc::clone(&self.socket);
            let pipeline = Arc::clone(&self.pipeline);

            self.tasks.spawn(async move {
                handle_datagram(datagram, peer, pipeline, socket).await;
            });
        }

        debug!("accept loop stopped");
    }

    /// Stop accepting and wait for in-flight queries to drain.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        info!("DNS proxy stopped");
    }
}

async fn handle_datagram(
    datagram: Vec<u8>,
    peer: SocketAddr,
    pipeline: Arc<ResolveQueryUseCase>,
    socket: Arc<UdpSocket>,
) {
    let request = match Message::from_vec(&datagram) {
        Ok(message) => message,
        Err(e) => {
            debug!(peer = %peer, error = %e, "undecodable datagram dropped");
            return;
        }
    };

    let Some(reply) = pipeline.execute(&request, peer.ip()).await else {
        return;
    };

    match reply.to_vec() {
        Ok(bytes) => {
            // Best-effort write: the query is considered handled either way.
            if let Err(e) = socket.send_to(&bytes, peer).await {
                warn!(peer = %peer, error = %e, "failed to write response");
            }
        }
        Err(e) => error!(peer = %peer, error = %e, "failed to encode response"),
    }
}

fn create_udp_socket(addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(1024 * 1024)?;
    socket.set_send_buffer_size(1024 * 1024)?;
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}
