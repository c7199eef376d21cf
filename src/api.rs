//! Feishu API client: tenant token lifecycle, authenticated dispatch, and typed operations.

pub mod bot;
pub mod dispatch;
pub mod envelope;
pub mod message;
pub mod token;

pub use bot::*;
pub use dispatch::*;
pub use envelope::*;
pub use message::*;
pub use token::*;

// self
use crate::{_prelude::*, cache::TokenCache, config::ClientConfig, http::ApiTransport};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestFeishuClient = FeishuClient<ReqwestTransport>;

/// Per-call options accepted by every network-issuing operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
	/// Deadline for each request the operation sends; falls back to
	/// [`ClientConfig::timeout`] when unset.
	pub timeout: Option<StdDuration>,
}
impl RequestOptions {
	/// Options with a deadline.
	pub fn with_timeout(timeout: StdDuration) -> Self {
		Self { timeout: Some(timeout) }
	}
}

/// Entry point for Feishu API calls.
///
/// The client owns the transport, the tenant token cache, and the validated configuration.
/// Clones share the transport and the cache, so one client (or its clones) per process keeps
/// token issuance to the minimum. Deadlines rely on `tokio::time`, so operations with a
/// timeout must run inside a Tokio runtime with the time driver enabled.
pub struct FeishuClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Tenant token cache keyed by app identifier.
	pub cache: TokenCache,
	/// Base URL, default deadline, and token lifetime policy.
	pub config: ClientConfig,
}
impl<T> FeishuClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client around a caller-provided transport.
	pub fn with_transport(config: ClientConfig, transport: impl Into<Arc<T>>) -> Self {
		let cache = TokenCache::new().with_refresh_margin(config.refresh_margin);

		Self { transport: transport.into(), cache, config }
	}

	/// Replaces the token cache, e.g. to share one across clients or inject a clock.
	pub fn with_cache(mut self, cache: TokenCache) -> Self {
		self.cache = cache;

		self
	}

	fn effective_timeout(&self, timeout: Option<StdDuration>) -> Option<StdDuration> {
		timeout.or(self.config.timeout)
	}
}
#[cfg(feature = "reqwest")]
impl FeishuClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ClientConfig) -> Self {
		Self::with_transport(config, ReqwestTransport::default())
	}
}
impl<T> Clone for FeishuClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			cache: self.cache.clone(),
			config: self.config.clone(),
		}
	}
}
impl<T> Debug for FeishuClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FeishuClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("timeout", &self.config.timeout)
			.field("cache", &self.cache)
			.finish()
	}
}
