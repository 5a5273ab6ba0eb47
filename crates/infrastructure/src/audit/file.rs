use async_trait::async_trait;
use relay_dns_application::ports::AuditSink;
use relay_dns_domain::{AuditLevel, AuditRecord, ProxyError};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only audit sink writing one formatted line per record. The file
/// handle is shared across all request tasks and serialized by the mutex.
pub struct FileAuditSink {
    file: Mutex<File>,
}

impl FileAuditSink {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ProxyError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await
            .map_err(|e| {
                ProxyError::Config(format!(
                    "failed to open audit log {}: {e}",
                    path.as_ref().display()
                ))
            })?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    async fn write(&self, level: AuditLevel, record: &AuditRecord) -> Result<(), ProxyError> {
        let line = format_line(level, record);
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ProxyError::AuditDelivery(format!("file write: {e}")))
    }
}

/// Line layout consumed by downstream log shippers; field order and
/// punctuation are part of the contract.
fn format_line(level: AuditLevel, record: &AuditRecord) -> String {
    format!(
        "[{}] At: {} - ClientIp: {} - Domain: {} , Resolver: {} - Question: {}\n",
        level.as_str(),
        record.time,
        record.client_ip,
        record.domain,
        record.resolver,
        record.qtype
    )
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn info(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.write(AuditLevel::Info, record).await
    }

    async fn warn(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.write(AuditLevel::Warn, record).await
    }

    async fn error(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.write(AuditLevel::Error, record).await
    }

    async fn debug(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.write(AuditLevel::Debug, record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AuditRecord {
        AuditRecord {
            time: "2025-01-02T03:04:05.678901234Z".to_string(),
            level: AuditLevel::Info,
            domain: "example.com.".to_string(),
            client_ip: "192.168.1.5".to_string(),
            qtype: "AAAA".to_string(),
            resolver: "8.8.8.8:53".to_string(),
            message: String::new(),
        }
    }

    #[test]
    fn test_line_format_is_exact() {
        assert_eq!(
            format_line(AuditLevel::Info, &sample_record()),
            "[info] At: 2025-01-02T03:04:05.678901234Z - ClientIp: 192.168.1.5 \
             - Domain: example.com. , Resolver: 8.8.8.8:53 - Question: AAAA\n"
        );
    }

    #[tokio::test]
    async fn test_records_append_one_line_each() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");

        let sink = FileAuditSink::open(&path).await.unwrap();
        sink.info(&sample_record()).await.unwrap();
        sink.warn(&sample_record()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[info] At: "));
        assert!(lines[1].starts_with("[warn] At: "));
    }

    #[tokio::test]
    async fn test_open_reports_unwritable_path() {
        let result = FileAuditSink::open("/nonexistent-dir/audit.log").await;
        assert!(matches!(result, Err(ProxyError::Config(_))));
    }
}
