use std::time::Duration;

/// Tunables for a domain check.
///
/// Everything here is per-process configuration handed to
/// [`DomainChecker`](crate::aggregate::DomainChecker) at construction.
/// The selector and subdomain lists are data, not code: extend them
/// without touching the analyzers.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// DKIM selectors probed at `<selector>._domainkey.<domain>`.
    pub dkim_selectors: Vec<String>,
    /// Subdomain labels examined by the mail-relay check.
    pub relay_subdomains: Vec<String>,
    /// Per-query DNS timeout.
    pub dns_timeout: Duration,
    /// Retries for transient DNS failures (timeout, servfail). NXDOMAIN
    /// is never retried.
    pub dns_retries: usize,
    /// Whole-session timeout for one SMTP probe.
    pub smtp_timeout: Duration,
    /// Probe at most this many MX hosts.
    pub smtp_host_cap: usize,
    /// Deadline for the whole check; overrunning branches degrade to
    /// their empty form instead of discarding completed siblings.
    pub overall_deadline: Duration,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            dkim_selectors: [
                "default",
                "google",
                "selector1",
                "selector2",
                "k1",
                "k2",
                "dkim",
                "mail",
                "smtp",
                "s1",
                "s2",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            relay_subdomains: ["mail", "smtp", "mx", "webmail", "email", "relay"]
                .into_iter()
                .map(String::from)
                .collect(),
            dns_timeout: Duration::from_secs(4),
            dns_retries: 1,
            smtp_timeout: Duration::from_secs(8),
            smtp_host_cap: 3,
            overall_deadline: Duration::from_secs(25),
        }
    }
}
