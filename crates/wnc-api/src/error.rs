use std::time::Duration;

use thiserror::Error;

/// Boxed lower-level cause carried by the operation-failure variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for the `wnc-api` crate.
///
/// Every failure the RESTCONF core can produce lands in one of these
/// variants. Message templates are fixed: the same kind of failure renders
/// the same way regardless of which service method produced it.
#[derive(Debug, Error)]
pub enum Error {
    // ── Local validation ────────────────────────────────────────────
    /// An input failed local validation. No request was sent.
    #[error("invalid {parameter}: {value}")]
    Validation { parameter: String, value: String },

    /// A mandatory input was absent.
    #[error("{parameter} is required")]
    RequiredParameter { parameter: String },

    /// A mandatory input was present but blank.
    #[error("{parameter} cannot be empty")]
    EmptyParameter { parameter: String },

    // ── Not found ───────────────────────────────────────────────────
    /// A domain entity the caller asked for does not exist.
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// The controller returned 404, an empty body, or an empty collection.
    #[error("resource not found: {path}")]
    ResourceNotFound { path: String },

    // ── Operation failures ──────────────────────────────────────────
    /// A call reached the controller but the operation failed.
    #[error("failed to {action} {entity_type} {target}: {source}")]
    ServiceOperation {
        action: String,
        entity_type: String,
        target: String,
        #[source]
        source: BoxError,
    },

    /// Same as [`ServiceOperation`](Self::ServiceOperation) without an
    /// entity/target breakdown.
    #[error("failed to {action}: {source}")]
    SimpleService {
        action: String,
        #[source]
        source: BoxError,
    },

    /// Non-success HTTP status, as reported by the controller.
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Controller rejected the credentials (HTTP 401).
    #[error("authentication rejected by controller")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected single-key envelope.
    #[error("malformed response: {message}")]
    Decode { message: String, body: String },

    /// The request payload could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Context ─────────────────────────────────────────────────────
    /// The request deadline or client timeout elapsed.
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// The context deadline had already passed when the call was made.
    #[error("request deadline already passed")]
    DeadlineExceeded,

    /// The caller cancelled the request context.
    #[error("request cancelled")]
    Cancelled,
}

/// Closed classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    MissingParameter,
    NotFound,
    Operation,
    Transport,
    Decode,
    Cancelled,
    Timeout,
    Configuration,
}

impl Error {
    // ── Constructors ────────────────────────────────────────────────

    pub fn validation(parameter: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Validation {
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    pub fn required(parameter: impl Into<String>) -> Self {
        Self::RequiredParameter {
            parameter: parameter.into(),
        }
    }

    pub fn empty(parameter: impl Into<String>) -> Self {
        Self::EmptyParameter {
            parameter: parameter.into(),
        }
    }

    pub fn not_found(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Wrap a lower-level failure as `failed to {action} {entity_type} {target}: {cause}`.
    pub fn service_operation(
        action: impl Into<String>,
        entity_type: impl Into<String>,
        target: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self::ServiceOperation {
            action: action.into(),
            entity_type: entity_type.into(),
            target: target.into(),
            source: cause.into(),
        }
    }

    /// Wrap a lower-level failure as `failed to {action}: {cause}`.
    pub fn simple_service(action: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::SimpleService {
            action: action.into(),
            source: cause.into(),
        }
    }

    // ── Classification ──────────────────────────────────────────────

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::RequiredParameter { .. } | Self::EmptyParameter { .. } => {
                ErrorKind::MissingParameter
            }
            Self::NotFound { .. } | Self::ResourceNotFound { .. } => ErrorKind::NotFound,
            Self::ServiceOperation { .. }
            | Self::SimpleService { .. }
            | Self::HttpStatus { .. }
            | Self::Unauthorized => ErrorKind::Operation,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Decode { .. } | Self::Encode(_) => ErrorKind::Decode,
            Self::InvalidUrl(_) | Self::Tls(_) => ErrorKind::Configuration,
            Self::Timeout { .. } | Self::DeadlineExceeded => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The wrapped cause, if this is one of the wrapping variants and the
    /// cause is itself a crate [`Error`].
    fn inner(&self) -> Option<&Error> {
        match self {
            Self::ServiceOperation { source, .. } | Self::SimpleService { source, .. } => {
                source.downcast_ref::<Error>()
            }
            _ => None,
        }
    }

    /// Returns `true` if the controller has no data at the requested
    /// location. Looks through service-level wrapping.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::ResourceNotFound { .. } => true,
            Self::HttpStatus { status: 404, .. } => true,
            _ => self.inner().is_some_and(Error::is_not_found),
        }
    }

    /// Returns `true` if the failure was detected locally, before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::MissingParameter
        ) || self.inner().is_some_and(Error::is_validation)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled) || self.inner().is_some_and(Error::is_cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::DeadlineExceeded => true,
            Self::Transport(e) => e.is_timeout(),
            _ => self.inner().is_some_and(Error::is_timeout),
        }
    }

    /// Returns `true` if this is a transient error a caller may retry.
    ///
    /// The core itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => matches!(status, 502..=504),
            _ => self.inner().is_some_and(Error::is_transient),
        }
    }

    /// HTTP status reported by the controller, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::ResourceNotFound { .. } => Some(404),
            Self::Unauthorized => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => self.inner().and_then(Error::status),
        }
    }
}
