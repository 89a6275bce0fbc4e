use futures::future::join_all;

use crate::dns::ResolverTrait;
use crate::records::{DkimFinding, DkimFindings, RecordCheck};

/// TXT records at the domain that carry an SPF policy (`v=spf1` prefix).
/// A compliant domain has at most one, but everything found is reported.
pub async fn check_spf<R: ResolverTrait>(resolver: &R, domain: &str) -> RecordCheck {
    match resolver.lookup_txt(domain).await {
        Ok(records) => RecordCheck::found(
            records
                .into_iter()
                .filter(|r| r.starts_with("v=spf1"))
                .collect(),
        ),
        Err(e) => {
            log::debug!("spf lookup for {domain} failed: {e}");
            RecordCheck::default()
        }
    }
}

/// DMARC policy record at `_dmarc.<domain>` (`v=DMARC1` prefix).
pub async fn check_dmarc<R: ResolverTrait>(resolver: &R, domain: &str) -> RecordCheck {
    let name = format!("_dmarc.{domain}");
    match resolver.lookup_txt(&name).await {
        Ok(records) => RecordCheck::found(
            records
                .into_iter()
                .filter(|r| r.starts_with("v=DMARC1"))
                .collect(),
        ),
        Err(e) => {
            log::debug!("dmarc lookup for {name} failed: {e}");
            RecordCheck::default()
        }
    }
}

/// MX exchanges for the domain, sorted by ascending preference (ties broken
/// by name). Preferences order the list and are then dropped; `records`
/// holds bare exchange hostnames.
pub async fn check_mx<R: ResolverTrait>(resolver: &R, domain: &str) -> RecordCheck {
    match resolver.lookup_mx(domain).await {
        Ok(mut hosts) => {
            hosts.sort_by(|a, b| {
                a.preference
                    .cmp(&b.preference)
                    .then_with(|| a.exchange.cmp(&b.exchange))
            });
            RecordCheck::found(hosts.into_iter().map(|h| h.exchange).collect())
        }
        Err(e) => {
            log::debug!("mx lookup for {domain} failed: {e}");
            RecordCheck::default()
        }
    }
}

/// Probes every candidate selector at `<selector>._domainkey.<domain>` in
/// parallel. Only selectors whose lookup returned records appear in the
/// map; per-selector failures are swallowed so one dead selector never
/// disturbs the others.
pub async fn check_dkim<R: ResolverTrait>(
    resolver: &R,
    domain: &str,
    selectors: &[String],
) -> DkimFindings {
    let probes = selectors.iter().map(|selector| async move {
        let name = format!("{selector}._domainkey.{domain}");
        match resolver.lookup_txt(&name).await {
            Ok(records) if !records.is_empty() => Some((
                selector.clone(),
                DkimFinding {
                    domain: name,
                    records,
                },
            )),
            Ok(_) => None,
            Err(e) => {
                log::debug!("dkim selector {selector} for {domain} failed: {e}");
                None
            }
        }
    });

    join_all(probes).await.into_iter().flatten().collect()
}
