#![allow(dead_code)]

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use relay_dns_application::ports::{AuditSink, UpstreamExchange};
use relay_dns_domain::{AuditLevel, AuditRecord, Config, ProxyError};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted behavior for one upstream address.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Reply with an A record for the queried name after `delay`.
    Answer { delay: Duration, address: Ipv4Addr },
    /// Fail at the transport layer after `delay`.
    Unreachable { delay: Duration },
    /// Decoded reply carrying a non-success rcode after `delay`.
    Rcode { delay: Duration, rcode: u16 },
}

/// Programmable in-memory `UpstreamExchange`.
pub struct MockExchange {
    behaviors: Mutex<HashMap<SocketAddr, MockBehavior>>,
    calls: Mutex<Vec<SocketAddr>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self {
            behaviors: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(&self, upstream: &str, delay_ms: u64, address: &str) {
        self.set(
            upstream,
            MockBehavior::Answer {
                delay: Duration::from_millis(delay_ms),
                address: address.parse().unwrap(),
            },
        );
    }

    pub fn unreachable(&self, upstream: &str, delay_ms: u64) {
        self.set(
            upstream,
            MockBehavior::Unreachable {
                delay: Duration::from_millis(delay_ms),
            },
        );
    }

    pub fn rcode(&self, upstream: &str, delay_ms: u64, rcode: u16) {
        self.set(
            upstream,
            MockBehavior::Rcode {
                delay: Duration::from_millis(delay_ms),
                rcode,
            },
        );
    }

    fn set(&self, upstream: &str, behavior: MockBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(upstream.parse().unwrap(), behavior);
    }

    /// Upstream addresses contacted, in call order.
    pub fn calls(&self) -> Vec<SocketAddr> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamExchange for MockExchange {
    async fn exchange(
        &self,
        query: &Message,
        upstream: SocketAddr,
        timeout: Duration,
    ) -> Result<Message, ProxyError> {
        self.calls.lock().unwrap().push(upstream);

        let behavior = self.behaviors.lock().unwrap().get(&upstream).cloned();
        let Some(behavior) = behavior else {
            return Err(ProxyError::Transport {
                server: upstream,
                reason: "no scripted behavior".to_string(),
            });
        };

        let delay = match &behavior {
            MockBehavior::Answer { delay, .. }
            | MockBehavior::Unreachable { delay }
            | MockBehavior::Rcode { delay, .. } => *delay,
        };

        if delay >= timeout {
            tokio::time::sleep(timeout).await;
            return Err(ProxyError::Transport {
                server: upstream,
                reason: format!("no reply within {}ms", timeout.as_millis()),
            });
        }
        tokio::time::sleep(delay).await;

        match behavior {
            MockBehavior::Answer { address, .. } => Ok(answer_for(query, address)),
            MockBehavior::Unreachable { .. } => Err(ProxyError::Transport {
                server: upstream,
                reason: "connection refused".to_string(),
            }),
            MockBehavior::Rcode { rcode, .. } => Err(ProxyError::UpstreamRcode {
                server: upstream,
                rcode,
            }),
        }
    }
}

/// Collects everything delivered to the audit stream.
pub struct MockAuditSink {
    records: Mutex<Vec<(AuditLevel, AuditRecord)>>,
    fail: AtomicBool,
}

impl MockAuditSink {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every delivery fail, to prove callers swallow sink errors.
    pub fn fail_deliveries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn deliver(&self, level: AuditLevel, record: &AuditRecord) -> Result<(), ProxyError> {
        self.records.lock().unwrap().push((level, record.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProxyError::AuditDelivery("scripted failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MockAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MockAuditSink {
    async fn info(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.deliver(AuditLevel::Info, record)
    }

    async fn warn(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.deliver(AuditLevel::Warn, record)
    }

    async fn error(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.deliver(AuditLevel::Error, record)
    }

    async fn debug(&self, record: &AuditRecord) -> Result<(), ProxyError> {
        self.deliver(AuditLevel::Debug, record)
    }
}

/// A client-style request with one question.
pub fn make_request(id: u16, name: &str, record_type: RecordType) -> Message {
    let mut request = Message::new();
    request
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);

    let mut question = Query::new();
    question
        .set_name(Name::from_str(name).unwrap())
        .set_query_type(record_type)
        .set_query_class(DNSClass::IN);
    request.add_query(question);
    request
}

/// An upstream-style reply echoing the query with one A answer.
pub fn answer_for(query: &Message, address: Ipv4Addr) -> Message {
    let mut reply = Message::new();
    reply
        .set_id(query.id())
        .set_message_type(MessageType::Response)
        .set_op_code(query.op_code())
        .set_recursion_desired(query.recursion_desired())
        .set_recursion_available(true);
    for question in query.queries() {
        reply.add_query(question.clone());
    }
    if let Some(question) = query.queries().first() {
        reply.add_answer(Record::from_rdata(
            question.name().clone(),
            300,
            RData::A(A(address)),
        ));
    }
    reply
}

/// A minimal valid configuration the tests mutate per scenario.
pub fn base_config(upstreams: &[&str]) -> Config {
    Config {
        port: 5353,
        upstream_addrs: upstreams.iter().map(|s| s.to_string()).collect(),
        domain_resolvers: Vec::new(),
        domain_redirect: Vec::new(),
        blocked_domains: Vec::new(),
        log: Default::default(),
        kafka: Default::default(),
    }
}
