use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
};

use crate::config::CheckConfig;

/// One failed DNS lookup. Always local to a single query; analyzers absorb
/// these into their own "record absent" representation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DnsError {
    #[error("no records found")]
    NotFound,
    #[error("dns query timed out")]
    Timeout,
    #[error("dns server failure: {0}")]
    ServFail(String),
    #[error("malformed dns response: {0}")]
    Malformed(String),
}

impl DnsError {
    /// Worth retrying? NXDOMAIN and protocol garbage are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, DnsError::Timeout | DnsError::ServFail(_))
    }
}

/// An MX answer: preference plus normalized exchange hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxHost {
    pub preference: u16,
    pub exchange: String,
}

/// Resolver trait for real or mock DNS
#[async_trait]
pub trait ResolverTrait: Send + Sync {
    /// TXT records at `name`, one string per record (character-strings
    /// within a record are concatenated).
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError>;

    /// MX records for `domain`.
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxHost>, DnsError>;

    /// A/AAAA addresses for `name`, rendered as strings.
    async fn lookup_ip(&self, name: &str) -> Result<Vec<String>, DnsError>;
}

/// DNS resolver wrapper: per-query timeout plus a small retry budget for
/// transient failures.
#[derive(Clone)]
pub struct DnsResolver {
    inner: Arc<TokioAsyncResolver>,
    timeout: Duration,
    retries: usize,
}

impl DnsResolver {
    pub fn new(cfg: &CheckConfig) -> anyhow::Result<Self> {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Ok(Self {
            inner: Arc::new(resolver),
            timeout: cfg.dns_timeout,
            retries: cfg.dns_retries,
        })
    }

    async fn with_retry<T, F, Fut>(&self, mut op: F) -> Result<T, DnsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DnsError>>,
    {
        let mut attempts = 0;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempts < self.retries => {
                    attempts += 1;
                    log::debug!("transient dns failure (attempt {attempts}): {e}");
                }
                other => return other,
            }
        }
    }

    async fn bounded<T, Fut>(&self, fut: Fut) -> Result<T, DnsError>
    where
        Fut: Future<Output = Result<T, ResolveError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(map_resolve_error),
            Err(_) => Err(DnsError::Timeout),
        }
    }

    async fn txt_once(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let lookup = self.bounded(self.inner.txt_lookup(name.to_string())).await?;
        let mut records = Vec::new();
        for r in lookup.iter() {
            // Character-strings of one TXT record are fragments of a
            // single value (long DKIM keys are split this way).
            let joined = r
                .txt_data()
                .iter()
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect::<Vec<_>>()
                .join("");
            records.push(joined);
        }
        Ok(records)
    }

    async fn mx_once(&self, domain: &str) -> Result<Vec<MxHost>, DnsError> {
        let lookup = self.bounded(self.inner.mx_lookup(domain.to_string())).await?;
        let mut hosts = Vec::new();
        for mx in lookup.iter() {
            hosts.push(MxHost {
                preference: mx.preference(),
                exchange: normalize_exchange(&mx.exchange().to_utf8()),
            });
        }
        Ok(hosts)
    }

    async fn ip_once(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let lookup = self.bounded(self.inner.lookup_ip(name.to_string())).await?;
        Ok(lookup.iter().map(|ip| ip.to_string()).collect())
    }
}

#[async_trait]
impl ResolverTrait for DnsResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.with_retry(|| self.txt_once(name)).await
    }

    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxHost>, DnsError> {
        self.with_retry(|| self.mx_once(domain)).await
    }

    async fn lookup_ip(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.with_retry(|| self.ip_once(name)).await
    }
}

fn map_resolve_error(e: ResolveError) -> DnsError {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => DnsError::NotFound,
        ResolveErrorKind::Timeout => DnsError::Timeout,
        ResolveErrorKind::Proto(p) => DnsError::Malformed(p.to_string()),
        _ => DnsError::ServFail(e.to_string()),
    }
}

/// Lowercase and strip the trailing root dot from an MX exchange.
pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}
