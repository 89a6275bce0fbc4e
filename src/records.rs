use std::collections::BTreeMap;

/// Outcome of one protocol's record lookup.
///
/// `exists` is true exactly when `records` is non-empty; lookup errors
/// collapse to the empty form so a response is always produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RecordCheck {
    pub exists: bool,
    pub records: Vec<String>,
}

impl RecordCheck {
    pub fn found(records: Vec<String>) -> Self {
        Self {
            exists: !records.is_empty(),
            records,
        }
    }
}

/// A DKIM selector that resolved: the queried name and its TXT records.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DkimFinding {
    /// The queried name, `<selector>._domainkey.<domain>`.
    pub domain: String,
    pub records: Vec<String>,
}

/// Selectors that actually resolved; an absent key means "not found",
/// never an error.
pub type DkimFindings = BTreeMap<String, DkimFinding>;

/// One SMTP session attempt against a mail host.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SmtpProbeResult {
    pub host: String,
    pub port: u16,
    pub success: bool,
    /// Server banner, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub supports_starttls: bool,
    /// The server accepted relaying to an external recipient without
    /// authentication. A vulnerability, not a success.
    pub open_relay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SmtpProbeResult {
    pub fn failed(host: &str, port: u16, error: String) -> Self {
        Self {
            host: host.to_string(),
            port,
            success: false,
            response: None,
            supports_starttls: false,
            open_relay: false,
            error: Some(error),
        }
    }
}

/// Mail capability of one hostname: it is "configured" when it could
/// receive or relay mail at all, i.e. it has MX or A records.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SubdomainMailStatus {
    pub configured: bool,
    pub mx_exists: bool,
    pub a_exists: bool,
    pub mx_records: Vec<String>,
    pub a_records: Vec<String>,
}

/// Relay exposure across the base domain and its configured subdomains.
/// `error` is set only when the whole feature failed (resolver unreachable);
/// per-name failures just count as unconfigured.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct EmailRelayReport {
    pub overall_configured: bool,
    pub base_domain: SubdomainMailStatus,
    pub subdomains: BTreeMap<String, SubdomainMailStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub recommendations: String,
}

/// Root aggregate for one checked domain. Every field is always present;
/// sub-checks that failed are represented by their empty forms.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DomainCheckResult {
    pub domain: String,
    pub spf: RecordCheck,
    pub dkim: DkimFindings,
    pub dmarc: RecordCheck,
    pub mx: RecordCheck,
    pub smtp: Vec<SmtpProbeResult>,
    pub email_relay: EmailRelayReport,
    pub summary: Summary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_check_exists_tracks_records() {
        assert!(!RecordCheck::found(vec![]).exists);
        assert!(RecordCheck::found(vec!["v=spf1 -all".into()]).exists);
    }

    #[test]
    fn test_smtp_failure_shape() {
        let r = SmtpProbeResult::failed("mx.example.com", 25, "connection refused".into());
        assert!(!r.success);
        assert!(!r.open_relay);
        assert_eq!(r.error.as_deref(), Some("connection refused"));
        assert!(r.response.is_none());
    }
}
