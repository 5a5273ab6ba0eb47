use crate::ports::{AuditSink, UpstreamExchange};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use hickory_proto::op::Message;
use relay_dns_domain::{AuditLevel, AuditRecord, ProxyError};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

/// Per-exchange timeout, which also bounds the race as a whole.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(2);

/// Identity of the original question, carried for audit records even when
/// the raced message asks for a rewritten name.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub qname: Arc<str>,
    pub qtype: String,
    pub client_ip: IpAddr,
}

/// The reply that won a race.
#[derive(Debug)]
pub struct RaceWin {
    pub reply: Message,
    pub upstream: SocketAddr,
    pub latency_ms: u64,
}

/// Races one query against a set of upstream resolvers and keeps the first
/// successful reply.
pub struct UpstreamRace {
    exchange: Arc<dyn UpstreamExchange>,
    sink: Arc<dyn AuditSink>,
    timeout: Duration,
}

impl UpstreamRace {
    pub fn new(exchange: Arc<dyn UpstreamExchange>, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            exchange,
            sink,
            timeout: UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issue `query` to every upstream at once. The first successful reply
    /// wins; the remaining exchanges are aborted and their late results
    /// dropped. The race as a whole is bounded by the same deadline as each
    /// exchange, so a single upstream degenerates to one bounded attempt.
    pub async fn run(
        &self,
        query: &Message,
        upstreams: &[SocketAddr],
        ctx: &QueryContext,
    ) -> Result<RaceWin, ProxyError> {
        if upstreams.is_empty() {
            return Err(ProxyError::Config("no upstream resolvers to race".to_string()));
        }

        debug!(
            upstreams = upstreams.len(),
            qname = %ctx.qname,
            "racing upstream resolvers"
        );

        let mut abort_handles = Vec::with_capacity(upstreams.len());
        let mut attempts = FuturesUnordered::new();

        for &upstream in upstreams {
            let exchange = Arc::clone(&self.exchange);
            let sink = Arc::clone(&self.sink);
            let query = query.clone();
            let ctx = ctx.clone();
            let per_exchange = self.timeout;

            let handle = tokio::spawn(async move {
                attempt(exchange, sink, query, upstream, per_exchange, ctx).await
            });
            abort_handles.push(handle.abort_handle());
            attempts.push(handle);
        }

        let total = upstreams.len();
        let started = Instant::now();

        let raced = timeout(self.timeout, async {
            let mut failed = 0usize;

            while let Some(joined) = attempts.next().await {
                match joined {
                    Ok(Ok(win)) => {
                        for handle in &abort_handles {
                            handle.abort();
                        }
                        debug!(
                            upstream = %win.upstream,
                            latency_ms = win.latency_ms,
                            "fastest reply wins, remaining exchanges aborted"
                        );
                        return Ok(win);
                    }
                    Ok(Err(e)) => {
                        failed += 1;
                        debug!(error = %e, failed, total, "upstream attempt failed");
                    }
                    Err(e) => {
                        failed += 1;
                        warn!(error = %e, failed, total, "upstream attempt panicked");
                    }
                }
            }

            Err(ProxyError::AllUpstreamsFailed { attempted: total })
        })
        .await;

        // On a deadline the stragglers are still running; cut them loose.
        for handle in &abort_handles {
            handle.abort();
        }

        match raced {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    total,
                    qname = %ctx.qname,
                    "race deadline expired"
                );
                Err(ProxyError::AllUpstreamsFailed { attempted: total })
            }
        }
    }
}

/// One exchange. Any decoded reply, winning or not, lands on the audit
/// stream before the attempt resolves; transport failures leave no record.
async fn attempt(
    exchange: Arc<dyn UpstreamExchange>,
    sink: Arc<dyn AuditSink>,
    query: Message,
    upstream: SocketAddr,
    timeout: Duration,
    ctx: QueryContext,
) -> Result<RaceWin, ProxyError> {
    let started = Instant::now();
    let result = exchange.exchange(&query, upstream, timeout).await;

    if matches!(&result, Ok(_) | Err(ProxyError::UpstreamRcode { .. })) {
        let record = AuditRecord::now(
            AuditLevel::Info,
            ctx.qname.as_ref(),
            ctx.client_ip.to_string(),
            ctx.qtype,
            upstream.to_string(),
        );
        if let Err(e) = sink.info(&record).await {
            warn!(error = %e, upstream = %upstream, "audit delivery failed");
        }
    }

    result.map(|reply| RaceWin {
        reply,
        upstream,
        latency_ms: started.elapsed().as_millis() as u64,
    })
}
