//! Client configuration: API base URL, default deadline, and token lifetime policy.

// self
use crate::_prelude::*;

/// Production base URL for the Feishu open platform.
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn/open-apis";
/// Cached tokens are refreshed once they are this close to expiring.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::minutes(5);
/// Lifetime assumed when the token endpoint omits `expire`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::seconds(7200);

/// Errors raised while building or validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL failed to parse.
	#[error("Base URL `{url}` is invalid: {reason}.")]
	InvalidBaseUrl {
		/// Supplied URL text.
		url: String,
		/// Parser message.
		reason: String,
	},
	/// Base URL must be http(s) and able to carry a path.
	#[error("Base URL must be an http or https base URL: {url}.")]
	UnsupportedBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Default timeout must be non-zero.
	#[error("Default timeout must be greater than zero.")]
	ZeroTimeout,
	/// Refresh margin must not be negative.
	#[error("Refresh margin must not be negative.")]
	NegativeRefreshMargin,
	/// Default token lifetime must be positive.
	#[error("Default token lifetime must be positive.")]
	NonPositiveTokenLifetime,
}

/// Validated client settings shared by every operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL every endpoint path is appended to.
	pub base_url: Url,
	/// Deadline applied when a call does not set its own.
	pub timeout: Option<StdDuration>,
	/// Window before expiry inside which cached tokens are treated as stale.
	pub refresh_margin: Duration,
	/// Lifetime used when the token endpoint omits `expire`.
	pub default_token_lifetime: Duration,
}
impl ClientConfig {
	/// Returns a builder seeded with production defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Joins `endpoint` onto the base URL and appends `query` pairs in order.
	///
	/// The base path is kept intact (`/open-apis` + `/im/v1/messages`), unlike
	/// [`Url::join`] which would replace its last segment.
	pub fn endpoint_url(
		&self,
		endpoint: &str,
		query: &[(String, String)],
	) -> Result<Url, crate::error::ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let raw = if endpoint.starts_with('/') {
			format!("{base}{endpoint}")
		} else {
			format!("{base}/{endpoint}")
		};
		let mut url = Url::parse(&raw).map_err(|source| {
			crate::error::ConfigError::InvalidEndpoint { endpoint: endpoint.to_owned(), source }
		})?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		Ok(url)
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: Url::parse(DEFAULT_BASE_URL).expect("Default base URL must parse."),
			timeout: None,
			refresh_margin: DEFAULT_REFRESH_MARGIN,
			default_token_lifetime: DEFAULT_TOKEN_LIFETIME,
		}
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL text, parsed during [`build`](Self::build).
	pub base_url: String,
	/// Optional default deadline.
	pub timeout: Option<StdDuration>,
	/// Refresh margin.
	pub refresh_margin: Duration,
	/// Lifetime fallback for tokens without `expire`.
	pub default_token_lifetime: Duration,
}
impl ClientConfigBuilder {
	/// Overrides the base URL (useful for regional deployments and mock servers).
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();

		self
	}

	/// Sets the default per-call deadline.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Overrides the refresh margin (defaults to five minutes).
	pub fn refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = margin;

		self
	}

	/// Overrides the lifetime assumed when `expire` is absent (defaults to 7200 seconds).
	pub fn default_token_lifetime(mut self, lifetime: Duration) -> Self {
		self.default_token_lifetime = lifetime;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let base_url = Url::parse(&self.base_url).map_err(|e| ClientConfigError::InvalidBaseUrl {
			url: self.base_url.clone(),
			reason: e.to_string(),
		})?;

		if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
			return Err(ClientConfigError::UnsupportedBaseUrl { url: base_url.to_string() });
		}
		if self.timeout.is_some_and(|t| t.is_zero()) {
			return Err(ClientConfigError::ZeroTimeout);
		}
		if self.refresh_margin.is_negative() {
			return Err(ClientConfigError::NegativeRefreshMargin);
		}
		if !self.default_token_lifetime.is_positive() {
			return Err(ClientConfigError::NonPositiveTokenLifetime);
		}

		Ok(ClientConfig {
			base_url,
			timeout: self.timeout,
			refresh_margin: self.refresh_margin,
			default_token_lifetime: self.default_token_lifetime,
		})
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.into(),
			timeout: None,
			refresh_margin: DEFAULT_REFRESH_MARGIN,
			default_token_lifetime: DEFAULT_TOKEN_LIFETIME,
		}
	}
}
