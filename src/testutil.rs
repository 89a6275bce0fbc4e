//! Shared mock resolver for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::dns::{DnsError, MxHost, ResolverTrait};

/// Scripted resolver: unscripted names answer `NotFound`. Counts every
/// invocation so tests can assert that no network was touched.
#[derive(Default)]
pub(crate) struct MockResolver {
    txt: HashMap<String, Result<Vec<String>, DnsError>>,
    mx: HashMap<String, Result<Vec<MxHost>, DnsError>>,
    ip: HashMap<String, Result<Vec<String>, DnsError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_txt(mut self, name: &str, records: Vec<String>) -> Self {
        self.txt.insert(name.to_string(), Ok(records));
        self
    }

    pub fn with_txt_err(mut self, name: &str, err: DnsError) -> Self {
        self.txt.insert(name.to_string(), Err(err));
        self
    }

    pub fn with_mx(mut self, name: &str, hosts: Vec<MxHost>) -> Self {
        self.mx.insert(name.to_string(), Ok(hosts));
        self
    }

    pub fn with_mx_err(mut self, name: &str, err: DnsError) -> Self {
        self.mx.insert(name.to_string(), Err(err));
        self
    }

    pub fn with_ip(mut self, name: &str, addrs: Vec<String>) -> Self {
        self.ip.insert(name.to_string(), Ok(addrs));
        self
    }

    pub fn with_ip_err(mut self, name: &str, err: DnsError) -> Self {
        self.ip.insert(name.to_string(), Err(err));
        self
    }

    /// Every lookup sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn invocations(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn answer<T: Clone>(map: &HashMap<String, Result<T, DnsError>>, name: &str) -> Result<T, DnsError> {
        map.get(name).cloned().unwrap_or(Err(DnsError::NotFound))
    }
}

#[async_trait]
impl ResolverTrait for MockResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.tick().await;
        Self::answer(&self.txt, name)
    }

    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxHost>, DnsError> {
        self.tick().await;
        Self::answer(&self.mx, domain)
    }

    async fn lookup_ip(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.tick().await;
        Self::answer(&self.ip, name)
    }
}
