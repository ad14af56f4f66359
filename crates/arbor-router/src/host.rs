//! Host patterns for multi-host routing.

use std::fmt;

use crate::error::RouteError;

/// Which `Host` header values a tree serves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostPattern {
    /// Every host, including requests without a `Host` header.
    Any,
    /// A single host, compared case-insensitively.
    Exact(String),
    /// Exactly one label in front of the parent domain: `*.example.com`
    /// matches `api.example.com` but neither `example.com` nor
    /// `a.b.example.com`.
    Subdomain(String),
}

impl HostPattern {
    /// Parse `""` or `"*"` (any host), `"*.example.com"` or `"example.com"`.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let host = raw.trim().to_ascii_lowercase();
        if host.is_empty() || host == "*" {
            return Ok(Self::Any);
        }

        let invalid = |host: &str| {
            host.is_empty()
                || host.starts_with('.')
                || host.ends_with('.')
                || host.contains(['*', '/', ':', ' '])
        };

        if let Some(parent) = host.strip_prefix("*.") {
            if invalid(parent) {
                return Err(RouteError::InvalidHost(raw.to_string()));
            }
            return Ok(Self::Subdomain(parent.to_string()));
        }
        if invalid(&host) {
            return Err(RouteError::InvalidHost(raw.to_string()));
        }
        Ok(Self::Exact(host))
    }

    /// Whether a request host (port already stripped) is served.
    pub fn matches(&self, host: Option<&str>) -> bool {
        match (self, host) {
            (Self::Any, _) => true,
            (Self::Exact(expected), Some(host)) => host.eq_ignore_ascii_case(expected),
            (Self::Subdomain(parent), Some(host)) => {
                let Some(label_len) = host.len().checked_sub(parent.len() + 1) else {
                    return false;
                };
                let bytes = host.as_bytes();
                label_len > 0
                    && bytes[label_len] == b'.'
                    && bytes[label_len + 1..].eq_ignore_ascii_case(parent.as_bytes())
                    && !bytes[..label_len].contains(&b'.')
            }
            (_, None) => false,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// Length of the textual pattern. Longer patterns are more specific.
    pub fn specificity(&self) -> usize {
        match self {
            Self::Any => 0,
            Self::Exact(host) => host.len(),
            Self::Subdomain(parent) => parent.len() + 2,
        }
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Exact(host) => f.write_str(host),
            Self::Subdomain(parent) => write!(f, "*.{}", parent),
        }
    }
}

/// Drop the port from a `Host` header value, keeping IPv6 brackets.
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
