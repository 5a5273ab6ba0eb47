pub mod file;
#[cfg(feature = "kafka")]
pub mod kafka;

use relay_dns_application::ports::AuditSink;
use relay_dns_domain::{Config, ProxyError, SinkKind};
use std::sync::Arc;

pub use file::FileAuditSink;
#[cfg(feature = "kafka")]
pub use kafka::KafkaAuditSink;

/// Build the audit sink selected by the configuration.
pub async fn create_sink(config: &Config) -> Result<Arc<dyn AuditSink>, ProxyError> {
    match config.log.logger {
        SinkKind::File => Ok(Arc::new(FileAuditSink::open(&config.log.log_path).await?)),

        #[cfg(feature = "kafka")]
        SinkKind::Kafka => Ok(Arc::new(KafkaAuditSink::new(&config.kafka)?)),

        #[cfg(not(feature = "kafka"))]
        SinkKind::Kafka => Err(ProxyError::Config(
            "kafka audit sink selected but this build carries no kafka support \
             (enable the 'kafka' feature)"
                .to_string(),
        )),
    }
}
