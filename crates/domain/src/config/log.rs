use serde::Deserialize;

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Kafka,
    #[default]
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Which audit sink receives the stream.
    #[serde(default)]
    pub logger: SinkKind,

    /// Target file for the file sink.
    #[serde(default = "default_log_path")]
    pub log_path: String,

    /// Diagnostics level for the tracing stream (trace, debug, info, warn,
    /// error). Independent of the audit sink.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            logger: SinkKind::File,
            log_path: default_log_path(),
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// Bootstrap broker list, `host:port[,host:port...]`.
    #[serde(default)]
    pub servers: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Topic receiving one JSON object per audit record.
    #[serde(default)]
    pub log_topic: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            servers: String::new(),
            client_id: default_client_id(),
            log_topic: String::new(),
        }
    }
}

fn default_log_path() -> String {
    "./relay-dns.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_client_id() -> String {
    "relay-dns".to_string()
}
