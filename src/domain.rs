use idna::domain_to_ascii;

/// Rejected input. The only request-fatal error in the engine: nothing
/// touches the network until validation has passed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid domain {input:?}: {reason}")]
pub struct InvalidDomain {
    pub input: String,
    pub reason: String,
}

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Validates and normalizes a user-supplied domain: trim, lowercase,
/// IDNA-to-ASCII, then DNS label syntax checks. Requires at least two
/// labels (`example.com`, not `example`).
pub fn validate_domain(input: &str) -> Result<String, InvalidDomain> {
    let fail = |reason: &str| InvalidDomain {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(fail("empty domain"));
    }

    let ascii = domain_to_ascii(&trimmed.to_lowercase())
        .map_err(|_| fail("not convertible to an ASCII hostname"))?;

    if ascii.len() > MAX_DOMAIN_LEN {
        return Err(fail("longer than 253 characters"));
    }

    let labels: Vec<&str> = ascii.split('.').collect();
    if labels.len() < 2 {
        return Err(fail("expected at least two labels"));
    }
    for label in &labels {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(fail("label must be 1-63 characters"));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(fail("label contains invalid characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(fail("label starts or ends with a hyphen"));
        }
    }

    Ok(ascii)
}
