use relay_dns_domain::{CliOverrides, Config};
use tracing_subscriber::EnvFilter;

/// Load and validate the configuration; any failure here aborts startup.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}

/// Install the diagnostics subscriber. The audit stream is separate and
/// goes through the configured sink.
pub fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
