//! Client-level error types shared across the cache, dispatcher, and transports.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonPathError = serde_path_to_error::Error<serde_json::Error>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The platform reported a failure (non-zero code or no usable token).
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (network, deadline abort, IO).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Response(#[from] ResponseError),
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
}
impl Error {
	/// Returns the platform error when this failure came from the platform.
	pub fn as_api(&self) -> Option<&ApiError> {
		match self {
			Self::Api(e) => Some(e),
			_ => None,
		}
	}

	/// Returns `true` when the request was aborted by its deadline.
	pub fn is_aborted(&self) -> bool {
		matches!(self, Self::Transport(TransportError::Aborted { .. }))
	}
}

/// Failure reported by the Feishu platform itself.
///
/// `code` and `msg` mirror the response body when present; `message` is always set and
/// falls back to an endpoint-specific description when the platform sent no `msg`.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ApiError {
	/// Human-readable description.
	pub message: String,
	/// Platform error code, when the body carried one.
	pub code: Option<i64>,
	/// Platform error message, when the body carried one.
	pub msg: Option<String>,
}
impl ApiError {
	/// Builds an error from the raw body fields, preferring a non-empty `msg` as the message.
	pub fn from_body(code: Option<i64>, msg: Option<String>, fallback: impl Into<String>) -> Self {
		let message = match msg.as_deref() {
			Some(m) if !m.is_empty() => m.to_owned(),
			_ => fallback.into(),
		};

		Self { message, code, msg }
	}
}

/// Configuration and request construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client configuration failed validation.
	#[error(transparent)]
	Client(#[from] crate::config::ClientConfigError),
	/// Endpoint could not be joined onto the base URL.
	#[error("Endpoint `{endpoint}` does not form a valid URL.")]
	InvalidEndpoint {
		/// Endpoint path as supplied by the caller.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body for `{endpoint}` could not be serialized.")]
	RequestBody {
		/// Endpoint path the body was destined for.
		endpoint: String,
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, deadline, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a failure; the original error is the source.
	#[error("Network error occurred while calling the Feishu API.")]
	Network {
		/// Request URL, when the transport knows it.
		url: Option<String>,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded its deadline and the in-flight call was dropped.
	#[error("Request to {url} was aborted after {after:?}.")]
	Aborted {
		/// Request URL.
		url: String,
		/// Deadline that elapsed.
		after: StdDuration,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the Feishu API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url: None, source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::Network { url: e.url().map(ToString::to_string), source: Box::new(e) }
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Body was not valid JSON or not a JSON object.
	#[error("Endpoint `{endpoint}` returned malformed JSON (status {status}).")]
	MalformedJson {
		/// Endpoint path.
		endpoint: String,
		/// HTTP status code.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
	/// Payload field did not match the expected type.
	#[error("Endpoint `{endpoint}` returned an unexpected `{field}` payload.")]
	Payload {
		/// Endpoint path.
		endpoint: String,
		/// Field the payload was read from.
		field: &'static str,
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
	/// Reported token lifetime does not fit in a representable expiry instant.
	#[error("Endpoint `{endpoint}` reported an out-of-range lifetime of {lifetime}.")]
	LifetimeOutOfRange {
		/// Endpoint path.
		endpoint: String,
		/// Lifetime derived from the response.
		lifetime: Duration,
	},
}
