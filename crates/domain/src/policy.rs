use crate::config::Config;
use crate::errors::ProxyError;
use rustc_hash::{FxHashMap, FxHashSet};
use std::net::SocketAddr;
use std::sync::Arc;

/// Lowercase a name and leave exactly one trailing dot, matching the QNAME
/// wire form used as the lookup key everywhere.
pub fn normalize_fqdn(name: &str) -> String {
    let trimmed = name.trim_end_matches('.');
    let mut fqdn = String::with_capacity(trimmed.len() + 1);
    fqdn.extend(trimmed.chars().map(|c| c.to_ascii_lowercase()));
    fqdn.push('.');
    fqdn
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Answer locally with this address. Kept as configured text; parsed on
    /// first use so a bad entry fails the query, not startup.
    Address(String),
    /// Resolve this name in place of the queried one.
    Name(String),
}

/// Outcome of classifying one QNAME against the policy snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision<'a> {
    Blocked,
    RedirectIp(&'a str),
    RedirectName(&'a str),
    Routed(&'a [SocketAddr]),
    Default,
}

/// Frozen policy snapshot built once at startup and shared read-only across
/// all requests.
#[derive(Debug)]
pub struct PolicyTable {
    blocked: FxHashSet<String>,
    redirects: FxHashMap<String, RedirectTarget>,
    routes: FxHashMap<String, Arc<[SocketAddr]>>,
    default_upstreams: Arc<[SocketAddr]>,
}

impl PolicyTable {
    pub fn build(config: &Config) -> Result<Self, ProxyError> {
        let default_upstreams = parse_upstreams(&config.upstream_addrs)?;

        let mut routes =
            FxHashMap::with_capacity_and_hasher(config.domain_resolvers.len(), Default::default());
        for entry in &config.domain_resolvers {
            routes.insert(normalize_fqdn(&entry.domain), parse_upstreams(&entry.resolvers)?);
        }

        let mut redirects =
            FxHashMap::with_capacity_and_hasher(config.domain_redirect.len(), Default::default());
        for entry in &config.domain_redirect {
            // An address redirect shadows a name redirect when both are set.
            let target = match (&entry.ip, &entry.redirect_domain) {
                (Some(ip), _) => RedirectTarget::Address(ip.clone()),
                (None, Some(name)) => RedirectTarget::Name(normalize_fqdn(name)),
                (None, None) => {
                    return Err(ProxyError::Config(format!(
                        "redirect for '{}' needs an ip or a redirect_domain",
                        entry.domain
                    )))
                }
            };
            redirects.insert(normalize_fqdn(&entry.domain), target);
        }

        let blocked = config
            .blocked_domains
            .iter()
            .map(|domain| normalize_fqdn(domain))
            .collect();

        Ok(Self {
            blocked,
            redirects,
            routes,
            default_upstreams,
        })
    }

    /// Classify one normalized QNAME. Precedence: blocklist, then redirects,
    /// then per-domain routes, then the default pool.
    pub fn classify(&self, qname: &str) -> RouteDecision<'_> {
        if self.blocked.contains(qname) {
            return RouteDecision::Blocked;
        }
        if let Some(target) = self.redirects.get(qname) {
            return match target {
                RedirectTarget::Address(ip) => RouteDecision::RedirectIp(ip),
                RedirectTarget::Name(name) => RouteDecision::RedirectName(name),
            };
        }
        if let Some(upstreams) = self.routes.get(qname) {
            return RouteDecision::Routed(upstreams);
        }
        RouteDecision::Default
    }

    /// Upstream set for a redirect target. Consults the route map only, so
    /// a target that is itself blocked or redirected is not chased further.
    pub fn route_for(&self, fqdn: &str) -> Option<&[SocketAddr]> {
        self.routes.get(fqdn).map(|upstreams| upstreams.as_ref())
    }

    pub fn default_upstreams(&self) -> &[SocketAddr] {
        &self.default_upstreams
    }
}

fn parse_upstreams(addrs: &[String]) -> Result<Arc<[SocketAddr]>, ProxyError> {
    addrs
        .iter()
        .map(|addr| {
            addr.parse::<SocketAddr>().map_err(|e| {
                ProxyError::Config(format!("invalid upstream address '{addr}': {e}"))
            })
        })
        .collect()
}
