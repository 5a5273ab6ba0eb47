use crate::ports::AuditSink;
use crate::services::{QueryContext, RaceWin, UpstreamRace};
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record};
use relay_dns_domain::{
    normalize_fqdn, AuditLevel, AuditRecord, PolicyTable, ProxyError, RouteDecision,
    RESOLVER_BLOCKED, RESOLVER_REDIRECT,
};
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// TTL of synthesized redirect answers.
const REDIRECT_TTL: u32 = 60;

/// Per-request orchestrator: classifies the question, dispatches on the
/// decision, and produces the reply written back to the client.
pub struct ResolveQueryUseCase {
    policy: Arc<PolicyTable>,
    race: UpstreamRace,
    sink: Arc<dyn AuditSink>,
}

impl ResolveQueryUseCase {
    pub fn new(policy: Arc<PolicyTable>, race: UpstreamRace, sink: Arc<dyn AuditSink>) -> Self {
        Self { policy, race, sink }
    }

    /// Resolve one decoded request. `None` drops the request without a
    /// reply, which is the fate of a request carrying no question. Only
    /// question[0] is inspected; any extra questions ride along untouched.
    pub async fn execute(&self, request: &Message, client_ip: IpAddr) -> Option<Message> {
        let Some(question) = request.queries().first() else {
            debug!(client = %client_ip, "request without a question, dropping");
            return None;
        };

        let qname = normalize_fqdn(&question.name().to_utf8());
        let qtype = question.query_type().to_string();
        info!(qname = %qname, qtype = %qtype, client = %client_ip, "query received");

        let ctx = QueryContext {
            qname: Arc::from(qname.as_str()),
            qtype,
            client_ip,
        };

        let outcome = match self.policy.classify(&qname) {
            RouteDecision::Blocked => self.deny(request, &ctx).await,
            RouteDecision::RedirectIp(ip) => self.answer_static(request, ip, &ctx).await,
            RouteDecision::RedirectName(target) => {
                self.resolve_renamed(request, target, &ctx).await
            }
            RouteDecision::Routed(upstreams) => self
                .race
                .run(request, upstreams, &ctx)
                .await
                .map(|win| win.reply),
            RouteDecision::Default => self
                .race
                .run(request, self.policy.default_upstreams(), &ctx)
                .await
                .map(|win| win.reply),
        };

        match outcome {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!(qname = %qname, error = %e, "query failed, answering SERVFAIL");
                Some(error_reply(request, ResponseCode::ServFail))
            }
        }
    }

    /// Blocklisted name: NXDOMAIN without any upstream contact.
    async fn deny(&self, request: &Message, ctx: &QueryContext) -> Result<Message, ProxyError> {
        let reply = error_reply(request, ResponseCode::NXDomain);
        self.audit_info(ctx, RESOLVER_BLOCKED).await;
        Ok(reply)
    }

    /// Address redirect: synthesize a single A answer for the original name,
    /// whatever the query type asked for.
    async fn answer_static(
        &self,
        request: &Message,
        ip: &str,
        ctx: &QueryContext,
    ) -> Result<Message, ProxyError> {
        let address: Ipv4Addr = ip.parse().map_err(|_| {
            ProxyError::Config(format!("redirect address '{ip}' is not a valid IPv4 address"))
        })?;

        let owner = request.queries()[0].name().clone();
        let mut reply = reply_frame(request);
        reply.add_answer(Record::from_rdata(owner, REDIRECT_TTL, RData::A(A(address))));

        self.audit_info(ctx, RESOLVER_REDIRECT).await;
        Ok(reply)
    }

    /// Name redirect: resolve the configured target, then restore the
    /// original name in the question and every answer so the client never
    /// learns about the swap.
    async fn resolve_renamed(
        &self,
        request: &Message,
        target: &str,
        ctx: &QueryContext,
    ) -> Result<Message, ProxyError> {
        let target_name = Name::from_str(target)
            .map_err(|e| ProxyError::Config(format!("redirect target '{target}': {e}")))?;

        let mut renamed = request.clone();
        if let Some(question) = renamed.queries_mut().first_mut() {
            question.set_name(target_name);
        }

        // Routed upstreams for the target if any, defaults otherwise. Block
        // and redirect rules are not consulted again, so chains stop here.
        let upstreams = self
            .policy
            .route_for(target)
            .unwrap_or_else(|| self.policy.default_upstreams());

        let RaceWin {
            mut reply,
            upstream,
            latency_ms,
        } = self.race.run(&renamed, upstreams, ctx).await?;
        debug!(upstream = %upstream, latency_ms, target = %target, "redirected query resolved");

        let original = request.queries()[0].name().clone();
        if let Some(question) = reply.queries_mut().first_mut() {
            question.set_name(original.clone());
        }
        for answer in reply.answers_mut() {
            answer.set_name(original.clone());
        }
        reply.set_id(request.id());
        Ok(reply)
    }

    async fn audit_info(&self, ctx: &QueryContext, resolver: &str) {
        let record = AuditRecord::now(
            AuditLevel::Info,
            ctx.qname.as_ref(),
            ctx.client_ip.to_string(),
            ctx.qtype.clone(),
            resolver,
        );
        if let Err(e) = self.sink.info(&record).await {
            warn!(error = %e, resolver, "audit delivery failed");
        }
    }
}

/// Start a response that mirrors the request's identity and questions.
fn reply_frame(request: &Message) -> Message {
    let mut reply = Message::new();
    reply
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_recursion_available(true);
    for question in request.queries() {
        reply.add_query(question.clone());
    }
    reply
}

fn error_reply(request: &Message, rcode: ResponseCode) -> Message {
    let mut reply = reply_frame(request);
    reply.set_response_code(rcode);
    reply
}
