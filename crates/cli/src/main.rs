use clap::Parser;
use relay_dns_domain::CliOverrides;
use std::sync::Arc;
use tracing::info;

mod bootstrap;
mod di;

#[derive(Parser)]
#[command(name = "relay-dns")]
#[command(version)]
#[command(about = "DNS forwarding proxy with policy routing and an audit stream")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// UDP listen port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Diagnostics level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        port: cli.port,
        log_level: cli.log_level.clone(),
    };
    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;

    bootstrap::init_logging(&config);
    info!("starting relay-dns v{}", env!("CARGO_PKG_VERSION"));

    let services = di::ProxyServices::new(&config).await?;
    let server = Arc::new(services.bind_server(config.port).await?);

    let accept = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve().await })
    };

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining in-flight queries");

    server.stop().await;
    accept.await?;

    info!("server shutdown complete");
    Ok(())
}
