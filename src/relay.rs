use futures::future::join_all;

use crate::dns::{DnsError, ResolverTrait};
use crate::records::{EmailRelayReport, SubdomainMailStatus};

/// MX and A presence for one hostname, resolved concurrently.
///
/// Returns `Err` only when both lookups failed transiently, i.e. when we
/// learned nothing about the name at all; NXDOMAIN on either side is an
/// answer ("no such record") and produces a normal status.
async fn mail_status<R: ResolverTrait>(
    resolver: &R,
    name: &str,
) -> Result<SubdomainMailStatus, DnsError> {
    let (mx, a) = tokio::join!(resolver.lookup_mx(name), resolver.lookup_ip(name));

    if let (Err(mx_err), Err(a_err)) = (&mx, &a) {
        if mx_err.is_transient() && a_err.is_transient() {
            return Err(mx_err.clone());
        }
    }

    let mx_records = match mx {
        Ok(mut hosts) => {
            hosts.sort_by(|a, b| {
                a.preference
                    .cmp(&b.preference)
                    .then_with(|| a.exchange.cmp(&b.exchange))
            });
            hosts.into_iter().map(|h| h.exchange).collect()
        }
        Err(_) => Vec::new(),
    };
    let a_records = a.unwrap_or_default();

    let mx_exists = !mx_records.is_empty();
    let a_exists = !a_records.is_empty();
    Ok(SubdomainMailStatus {
        configured: mx_exists || a_exists,
        mx_exists,
        a_exists,
        mx_records,
        a_records,
    })
}

/// Evaluates the base domain plus the configured subdomain labels for mail
/// capability. A subdomain that resolves but carries no SPF/DMARC coverage
/// is a common spoofing vector; this surfaces the exposure even when the
/// base-domain records look clean.
///
/// The report-level `error` is set only when every probed name failed
/// transiently (resolver unreachable); individually errored names simply
/// count as unconfigured.
pub async fn check_email_relay<R: ResolverTrait>(
    resolver: &R,
    domain: &str,
    labels: &[String],
) -> EmailRelayReport {
    let base = mail_status(resolver, domain);
    let subs = join_all(labels.iter().map(|label| async move {
        let name = format!("{label}.{domain}");
        (label.clone(), mail_status(resolver, &name).await)
    }));
    let (base, subs) = tokio::join!(base, subs);

    let total = 1 + labels.len();
    let errored = base.is_err() as usize
        + subs.iter().filter(|(_, status)| status.is_err()).count();
    if errored == total {
        let message = match &base {
            Err(e) => format!("DNS resolution failed for every probed name: {e}"),
            Ok(_) => "DNS resolution failed for every probed name".to_string(),
        };
        log::warn!("relay check for {domain} failed entirely: {message}");
        return EmailRelayReport {
            error: Some(message),
            ..EmailRelayReport::default()
        };
    }

    let base_domain = base.unwrap_or_default();
    let subdomains: std::collections::BTreeMap<_, _> = subs
        .into_iter()
        .map(|(label, status)| (label, status.unwrap_or_default()))
        .collect();

    let overall_configured =
        base_domain.configured || subdomains.values().any(|s| s.configured);

    EmailRelayReport {
        overall_configured,
        base_domain,
        subdomains,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{DnsError, MxHost};
    use crate::testutil::MockResolver;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_a_only_subdomain_is_configured() {
        let resolver = MockResolver::new()
            .with_ip("mail.example.com", vec!["192.0.2.10".to_string()]);

        let report =
            check_email_relay(&resolver, "example.com", &labels(&["mail", "smtp"])).await;

        assert!(report.error.is_none());
        let mail = &report.subdomains["mail"];
        assert!(mail.configured);
        assert!(!mail.mx_exists);
        assert!(mail.a_exists);
        assert_eq!(mail.a_records, vec!["192.0.2.10"]);

        let smtp = &report.subdomains["smtp"];
        assert!(!smtp.configured);

        // Base domain has nothing, but one subdomain is enough.
        assert!(!report.base_domain.configured);
        assert!(report.overall_configured);
    }

    #[tokio::test]
    async fn test_base_domain_mx_sets_overall() {
        let resolver = MockResolver::new().with_mx(
            "example.com",
            vec![MxHost {
                preference: 10,
                exchange: "mx.example.com".to_string(),
            }],
        );

        let report = check_email_relay(&resolver, "example.com", &labels(&["mail"])).await;
        assert!(report.base_domain.configured);
        assert!(report.base_domain.mx_exists);
        assert!(report.overall_configured);
    }

    #[tokio::test]
    async fn test_total_transient_failure_yields_error() {
        let resolver = MockResolver::new()
            .with_mx_err("example.com", DnsError::Timeout)
            .with_ip_err("example.com", DnsError::Timeout)
            .with_mx_err("mail.example.com", DnsError::ServFail("refused".into()))
            .with_ip_err("mail.example.com", DnsError::Timeout);

        let report = check_email_relay(&resolver, "example.com", &labels(&["mail"])).await;
        assert!(report.error.is_some());
        assert!(!report.overall_configured);
        assert!(report.subdomains.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_counts_as_unconfigured() {
        let resolver = MockResolver::new()
            .with_mx(
                "example.com",
                vec![MxHost {
                    preference: 10,
                    exchange: "mx.example.com".to_string(),
                }],
            )
            .with_mx_err("mail.example.com", DnsError::Timeout)
            .with_ip_err("mail.example.com", DnsError::Timeout);

        let report = check_email_relay(&resolver, "example.com", &labels(&["mail"])).await;
        assert!(report.error.is_none());
        assert!(!report.subdomains["mail"].configured);
        assert!(report.overall_configured);
    }
}
