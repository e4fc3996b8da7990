use thiserror::Error;

use crate::catalog::Module;

/// Top-level error type for the `bigip-api` crate.
///
/// Covers every failure mode of a discovery pass: pre-flight category
/// validation, the login exchange, request failures after the transport
/// retry budget is exhausted, and payload decoding. `bigip-core` maps
/// these into domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Pre-flight ──────────────────────────────────────────────────
    /// The requested object category is not registered for the module.
    /// Raised before any HTTP call is attempted.
    #[error("unknown {module} object category \"{category}\"; valid categories are {valid:?}")]
    UnknownCategory {
        module: Module,
        category: String,
        valid: &'static [&'static str],
    },

    // ── Authentication ──────────────────────────────────────────────
    /// The login exchange was rejected. Fatal to the whole poll; the
    /// token is never refreshed mid-session.
    #[error("authentication failed (HTTP {status}): {body}")]
    Authentication { status: u16, body: String },

    // ── Requests ────────────────────────────────────────────────────
    /// A request returned non-2xx after the retry budget was spent.
    /// This is the single surface for call failures; callers decide
    /// whether to abort the poll or skip the category.
    #[error("failed to call [{url}] (HTTP {status}): {body}")]
    Request {
        status: u16,
        url: String,
        body: String,
    },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Request { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a connection-level failure that a
    /// future poll cycle might not hit again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
