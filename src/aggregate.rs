use std::future::Future;

use tokio::time::Instant;

use crate::checks::{check_dkim, check_dmarc, check_mx, check_spf};
use crate::config::CheckConfig;
use crate::dns::ResolverTrait;
use crate::domain::{InvalidDomain, validate_domain};
use crate::records::{
    DkimFindings, DomainCheckResult, EmailRelayReport, RecordCheck, SmtpProbeResult, Summary,
};
use crate::relay::check_email_relay;
use crate::smtp::probe_smtp;

/// Runs the full check: validation, concurrent DNS analysis, SMTP probing,
/// relay exposure, and the recommendation summary.
///
/// Every branch is clamped to one shared deadline; a branch that overruns
/// degrades to its empty form while completed siblings are kept, so the
/// response is always a best-effort composite.
pub struct DomainChecker<R: ResolverTrait> {
    resolver: R,
    config: CheckConfig,
}

impl<R: ResolverTrait> DomainChecker<R> {
    pub fn new(resolver: R, config: CheckConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// The only request-fatal failure is `InvalidDomain`; it is raised
    /// before any network activity.
    pub async fn check_domain(&self, input: &str) -> Result<DomainCheckResult, InvalidDomain> {
        let domain = validate_domain(input)?;
        let deadline = Instant::now() + self.config.overall_deadline;
        let resolver = &self.resolver;
        let cfg = &self.config;

        let spf = clamp(deadline, check_spf(resolver, &domain));
        let dkim = clamp(deadline, check_dkim(resolver, &domain, &cfg.dkim_selectors));
        let dmarc = clamp(deadline, check_dmarc(resolver, &domain));
        let relay = clamp(
            deadline,
            check_email_relay(resolver, &domain, &cfg.relay_subdomains),
        );
        // SMTP needs the MX answer, so this branch is sequenced MX-then-probe
        // while staying parallel with the others.
        let mx_then_smtp = async {
            let mx = clamp(deadline, check_mx(resolver, &domain)).await;
            let smtp = if mx.exists {
                clamp(deadline, probe_smtp(&mx.records, cfg)).await
            } else {
                Vec::new()
            };
            (mx, smtp)
        };

        let (spf, dkim, dmarc, email_relay, (mx, smtp)) =
            tokio::join!(spf, dkim, dmarc, relay, mx_then_smtp);

        let summary = Summary {
            recommendations: build_recommendations(
                &spf,
                &dkim,
                &dmarc,
                &mx,
                &smtp,
                &email_relay,
            ),
        };

        Ok(DomainCheckResult {
            domain,
            spf,
            dkim,
            dmarc,
            mx,
            smtp,
            email_relay,
            summary,
        })
    }
}

async fn clamp<T: Default>(deadline: Instant, fut: impl Future<Output = T>) -> T {
    tokio::time::timeout_at(deadline, fut)
        .await
        .unwrap_or_default()
}

fn dmarc_policy_is(records: &[String], policy: &str) -> bool {
    records.iter().any(|r| {
        r.split(';')
            .any(|tag| tag.trim().eq_ignore_ascii_case(policy))
    })
}

fn build_recommendations(
    spf: &RecordCheck,
    dkim: &DkimFindings,
    dmarc: &RecordCheck,
    mx: &RecordCheck,
    smtp: &[SmtpProbeResult],
    relay: &EmailRelayReport,
) -> String {
    let mut recs: Vec<String> = Vec::new();

    if !spf.exists {
        recs.push("Add an SPF record (v=spf1) declaring your authorized senders.".to_string());
    } else if !spf
        .records
        .iter()
        .any(|r| r.contains("-all") || r.contains("~all"))
    {
        recs.push("SPF record should end with a '-all' or '~all' mechanism.".to_string());
    }

    if dkim.is_empty() {
        recs.push(
            "No DKIM selectors found; publish DKIM keys and sign outgoing mail.".to_string(),
        );
    }

    if !dmarc.exists {
        recs.push("Add a DMARC record with p=quarantine or p=reject.".to_string());
    } else if dmarc_policy_is(&dmarc.records, "p=none") {
        recs.push(
            "DMARC policy is 'none' (monitoring only); move to p=quarantine or p=reject."
                .to_string(),
        );
    }

    if !mx.exists {
        recs.push("No MX records found; the domain cannot receive mail.".to_string());
    }

    let relaying: Vec<&SmtpProbeResult> = smtp.iter().filter(|p| p.open_relay).collect();
    for probe in &relaying {
        recs.push(format!(
            "Open relay detected on {}; require authentication for relaying.",
            probe.host
        ));
    }
    let connected: Vec<&SmtpProbeResult> = smtp.iter().filter(|p| p.success).collect();
    if !connected.is_empty() && connected.iter().all(|p| !p.supports_starttls) {
        recs.push("Mail hosts do not advertise STARTTLS; enable TLS for inbound mail.".to_string());
    }

    if relay.error.is_none() {
        let dangling: Vec<&str> = relay
            .subdomains
            .iter()
            .filter(|(_, s)| s.configured)
            .map(|(label, _)| label.as_str())
            .collect();
        if !dangling.is_empty() && (!spf.exists || !dmarc.exists) {
            recs.push(format!(
                "Mail-capable subdomains ({}) lack base-domain SPF/DMARC coverage; review them for spoofing exposure.",
                dangling.join(", ")
            ));
        }
    }

    if recs.is_empty() {
        "All email authentication records are properly configured.".to_string()
    } else {
        recs.join(" ")
    }
}
