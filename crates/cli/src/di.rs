use relay_dns_application::services::UpstreamRace;
use relay_dns_application::use_cases::ResolveQueryUseCase;
use relay_dns_domain::{Config, PolicyTable};
use relay_dns_infrastructure::audit::create_sink;
use relay_dns_infrastructure::dns::{ProxyServer, UdpExchange};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::info;

/// Wired query-path dependencies.
pub struct ProxyServices {
    pipeline: Arc<ResolveQueryUseCase>,
}

impl ProxyServices {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        info!("initializing proxy services");

        let policy = Arc::new(PolicyTable::build(config)?);
        let sink = create_sink(config).await?;
        let exchange = Arc::new(UdpExchange::new());
        let race = UpstreamRace::new(exchange, Arc::clone(&sink));
        let pipeline = Arc::new(ResolveQueryUseCase::new(policy, race, sink));

        Ok(Self { pipeline })
    }

    pub async fn bind_server(&self, port: u16) -> anyhow::Result<ProxyServer> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        Ok(ProxyServer::bind(addr, Arc::clone(&self.pipeline)).await?)
    }
}
