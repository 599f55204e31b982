//! Crate-level error types shared across the fetcher, cache, and remote clients.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every variant is cheap to clone so one settled fetch can hand the same failure to all
/// callers attached to it.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Cache backend failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Remote call failed (network, HTTP status, malformed body).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The caller's cancellation signal tripped before the fetch finished.
	#[error("Library fetch was cancelled.")]
	Cancelled,
}
impl Error {
	/// Returns `true` when the error represents an observed cancellation.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

/// Configuration and validation failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// A remote base URL could not be joined with an endpoint path.
	#[error("Base URL `{base}` cannot be joined with `{path}`.")]
	InvalidEndpoint {
		/// Base URL that was configured.
		base: String,
		/// Endpoint path that failed to join.
		path: &'static str,
	},
	/// Credential validation failed.
	#[error(transparent)]
	Credential(#[from] crate::credential::CredentialError),
	/// Service profile validation failed.
	#[error(transparent)]
	Profile(#[from] crate::service::ProfileError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Remote-call failures; never retried by this crate.
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {service} API.")]
	Network {
		/// Service label the call targeted.
		service: &'static str,
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// The remote service answered with a non-success HTTP status.
	#[error("The {service} API responded with HTTP {status}.")]
	Status {
		/// Service label the call targeted.
		service: &'static str,
		/// HTTP status code.
		status: u16,
		/// Response body, when readable.
		body: Option<String>,
	},
	/// The remote service reported an application-level error inside a 2xx body.
	#[error("The {service} API reported an error: {message}.")]
	Upstream {
		/// Service label the call targeted.
		service: &'static str,
		/// Upstream message or error code.
		message: String,
	},
	/// The response body could not be decoded.
	#[error("The {service} API returned a malformed body at `{path}`.")]
	Decode {
		/// Service label the call targeted.
		service: &'static str,
		/// JSON path of the failing field.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_json::Error>,
	},
	/// Caller-supplied transport failure (custom endpoint implementations, tests).
	#[error("{message}")]
	Other {
		/// Human-readable failure summary.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(service: &'static str, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { service, source: Arc::new(src) }
	}

	/// Builds a free-form transport error.
	pub fn other(message: impl Into<String>) -> Self {
		Self::Other { message: message.into() }
	}

	/// Converts a path-aware JSON failure into [`TransportError::Decode`].
	pub fn decode(
		service: &'static str,
		err: serde_path_to_error::Error<serde_json::Error>,
	) -> Self {
		let path = err.path().to_string();

		Self::Decode { service, path, source: Arc::new(err.into_inner()) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn cancelled_is_distinct_from_transport_failures() {
		let cancelled = Error::Cancelled;
		let transport: Error = TransportError::other("boom").into();

		assert!(cancelled.is_cancelled());
		assert!(!transport.is_cancelled());
		assert_eq!(transport.to_string(), "boom");
	}

	#[test]
	fn decode_error_keeps_field_path() {
		let mut de = serde_json::Deserializer::from_str("{\"data\":{\"magnets\":7}}");
		let err = serde_path_to_error::deserialize::<_, HashMap<String, HashMap<String, Vec<u8>>>>(
			&mut de,
		)
		.expect_err("A number is not a list of bytes.");
		let transport = TransportError::decode("alldebrid", err);

		assert!(matches!(&transport, TransportError::Decode { path, .. } if path == "data.magnets"));
		assert!(StdError::source(&transport).is_some());
	}

	#[test]
	fn cloned_errors_share_their_source() {
		let original = TransportError::network("torbox", std::io::Error::other("reset"));
		let cloned = Error::from(original.clone());

		assert_eq!(cloned.to_string(), original.to_string());
	}
}
