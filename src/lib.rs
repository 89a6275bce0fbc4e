pub mod aggregate;
pub mod checks;
pub mod config;
pub mod dns;
pub mod domain;
pub mod records;
pub mod relay;
pub mod smtp;

#[cfg(test)]
mod testutil;

pub use aggregate::DomainChecker;
pub use config::CheckConfig;
pub use dns::{DnsError, DnsResolver, MxHost, ResolverTrait};
pub use domain::{InvalidDomain, validate_domain};
pub use records::{
    DkimFinding, DkimFindings, DomainCheckResult, EmailRelayReport, RecordCheck, SmtpProbeResult,
    SubdomainMailStatus, Summary,
};
