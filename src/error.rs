//! Error types for thinkchat.
//!
//! One error type covers the whole application: transport and API failures
//! from the Anthropic client, malformed stream events, file-store problems,
//! and validation of user input.  Callers decide how to surface an error by
//! category using the `is_*` predicates.

use std::error;
use std::fmt;
use std::io;
use std::str::Utf8Error;
use std::sync::Arc;

type Source = Arc<dyn error::Error + Send + Sync>;

#[derive(Clone, Debug)]
pub enum Error {
    /// An API failure that maps to no more specific variant.
    Api {
        status_code: u16,
        error_type: Option<String>,
        message: String,
        request_id: Option<String>,
    },
    Authentication {
        message: String,
    },
    Permission {
        message: String,
    },
    /// An API 404, or a conversation, prompt or settings file that does not exist.
    NotFound {
        message: String,
        resource_type: Option<String>,
        resource_id: Option<String>,
    },
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },
    BadRequest {
        message: String,
        param: Option<String>,
    },
    Timeout {
        message: String,
        duration: Option<f64>,
    },
    Connection {
        message: String,
        source: Option<Source>,
    },
    InternalServer {
        message: String,
        request_id: Option<String>,
    },
    /// 502, 503 and 504 responses, or no reply available at all.
    ServiceUnavailable {
        message: String,
        retry_after: Option<u64>,
    },
    /// JSON, YAML or SSE framing that could not be decoded.
    Serialization {
        message: String,
        source: Option<Source>,
    },
    Io {
        message: String,
        source: Arc<io::Error>,
    },
    HttpClient {
        message: String,
        source: Option<Source>,
    },
    /// Rejected user input: a file name, a menu entry or a settings value.
    Validation {
        message: String,
        param: Option<String>,
    },
    Url {
        message: String,
        source: Option<url::ParseError>,
    },
    /// The response stream broke off or never reached `message_stop`.
    Streaming {
        message: String,
        source: Option<Source>,
    },
    Encoding {
        message: String,
        source: Option<Source>,
    },
}

impl Error {
    pub fn api(
        status_code: u16,
        error_type: Option<String>,
        message: String,
        request_id: Option<String>,
    ) -> Self {
        Error::Api {
            status_code,
            error_type,
            message,
            request_id,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Error::Permission {
            message: message.into(),
        }
    }

    pub fn not_found(
        message: impl Into<String>,
        resource_type: Option<String>,
        resource_id: Option<String>,
    ) -> Self {
        Error::NotFound {
            message: message.into(),
            resource_type,
            resource_id,
        }
    }

    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    pub fn bad_request(message: impl Into<String>, param: Option<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
            param,
        }
    }

    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    pub fn internal_server(message: impl Into<String>, request_id: Option<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
            request_id,
        }
    }

    pub fn service_unavailable(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::ServiceUnavailable {
            message: message.into(),
            retry_after,
        }
    }

    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    pub fn streaming(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Streaming {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    pub fn encoding(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Encoding {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimit { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// True when the reply stream failed part way, including bad UTF-8.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Error::Streaming { .. } | Error::Encoding { .. })
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            Error::Api { request_id, .. } | Error::InternalServer { request_id, .. } => {
                request_id.as_deref()
            }
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Writes ` ({label}{value})` when `value` is present.
fn suffix<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    value: &Option<T>,
) -> fmt::Result {
    match value {
        Some(value) => write!(f, " ({label}{value})"),
        None => Ok(()),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                message,
                error_type,
                request_id,
                ..
            } => {
                match error_type {
                    Some(error_type) => write!(f, "{error_type}: {message}")?,
                    None => write!(f, "API error: {message}")?,
                }
                suffix(f, "Request ID: ", request_id)
            }
            Error::Authentication { message } => write!(f, "Authentication error: {message}"),
            Error::Permission { message } => write!(f, "Permission error: {message}"),
            Error::NotFound {
                message,
                resource_type,
                resource_id,
            } => {
                write!(f, "Resource not found")?;
                suffix(f, "", resource_type)?;
                write!(f, ": {message}")?;
                if let Some(resource_id) = resource_id {
                    write!(f, " [ID: {resource_id}]")?;
                }
                Ok(())
            }
            Error::RateLimit {
                message,
                retry_after,
            } => {
                write!(f, "Rate limit exceeded: {message}")?;
                suffix(f, "retry after seconds: ", retry_after)
            }
            Error::BadRequest { message, param } => {
                write!(f, "Bad request: {message}")?;
                suffix(f, "parameter: ", param)
            }
            Error::Timeout { message, duration } => {
                write!(f, "Timeout error: {message}")?;
                suffix(f, "seconds: ", duration)
            }
            Error::Connection { message, .. } => write!(f, "Connection error: {message}"),
            Error::InternalServer {
                message,
                request_id,
            } => {
                write!(f, "Internal server error: {message}")?;
                suffix(f, "Request ID: ", request_id)
            }
            Error::ServiceUnavailable {
                message,
                retry_after,
            } => {
                write!(f, "Service unavailable: {message}")?;
                suffix(f, "retry after seconds: ", retry_after)
            }
            Error::Serialization { message, .. } => write!(f, "Serialization error: {message}"),
            Error::Io { message, .. } => write!(f, "I/O error: {message}"),
            Error::HttpClient { message, .. } => write!(f, "HTTP client error: {message}"),
            Error::Validation { message, param } => {
                write!(f, "Validation error: {message}")?;
                suffix(f, "parameter: ", param)
            }
            Error::Url { message, .. } => write!(f, "URL error: {message}"),
            Error::Streaming { message, .. } => write!(f, "Streaming error: {message}"),
            Error::Encoding { message, .. } => write!(f, "Encoding error: {message}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. }
            | Error::Serialization { source, .. }
            | Error::HttpClient { source, .. }
            | Error::Streaming { source, .. }
            | Error::Encoding { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::serialization(format!("YAML error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Error::encoding(format!("UTF-8 error: {err}"), Some(Box::new(err)))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
