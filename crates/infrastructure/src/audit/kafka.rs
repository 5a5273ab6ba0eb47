use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use relay_dns_application::ports::AuditSink;
use relay_dns_domain::{AuditRecord, KafkaConfig, ProxyError};
use std::time::Duration;
use tracing::info;

/// How long to wait for a broker acknowledgement per record.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Audit sink publishing each record as one JSON object and waiting for the
/// broker acknowledgement (`acks=all`) before reporting success.
pub struct KafkaAuditSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaAuditSink {
    pub fn new(config: &KafkaConfig) -> Result<Self, ProxyError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.servers)
            .set("client.id", &config.client_id)
            .set("acks", "all")
            .create()
            .map_err(|e| ProxyError::Config(format!("failed to create kafka producer: {e}")))?;

        info!(servers = %config.servers, topic = %config.log_topic, "kafka audit sink ready");

        Ok(Self {
            producer,
            topic: config.log_topic.clone(),
        })
    }

    async fn publish(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        let payload = serde_json::to_vec(record)
            .map_err(|e| ProxyError::AuditDelivery(format!("serialize: {e}")))?;

        self.producer
            .send(
                FutureRecord::<(), _>::to(&self.topic).payload(&payload),
                Timeout::After(DELIVERY_TIMEOUT),
            )
            .await
            .map_err(|(e, _)| ProxyError::AuditDelivery(format!("kafka delivery: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl AuditSink for KafkaAuditSink {
    async fn info(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.publish(record).await
    }

    async fn warn(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.publish(record).await
    }

    async fn error(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.publish(record).await
    }

    async fn debug(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.publish(record).await
    }
}
