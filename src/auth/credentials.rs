//! Application credentials and the tenant access token minted from them.

// self
use crate::{
	_prelude::*,
	auth::{AppId, Secret},
};

/// App identifier and secret pair used to mint tenant access tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppCredentials {
	/// Application identifier; doubles as the token cache key.
	pub app_id: AppId,
	/// Application secret sent only to the token endpoint.
	pub app_secret: Secret,
}
impl AppCredentials {
	/// Pairs an identifier with its secret.
	pub fn new(app_id: AppId, app_secret: Secret) -> Self {
		Self { app_id, app_secret }
	}
}

/// Immutable tenant access token plus the instants bounding its lifetime.
///
/// Refreshes replace the whole value; records are never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct TenantToken {
	/// Bearer token; callers must avoid logging it.
	pub token: Secret,
	/// Instant the token was received.
	pub issued_at: OffsetDateTime,
	/// Absolute expiry computed from the reported lifetime.
	pub expires_at: OffsetDateTime,
}
impl TenantToken {
	/// Builds a token valid for `lifetime` starting at `issued_at`.
	///
	/// Lifetimes past the representable range saturate at the latest instant.
	pub fn new(token: Secret, issued_at: OffsetDateTime, lifetime: Duration) -> Self {
		Self { token, issued_at, expires_at: issued_at.saturating_add(lifetime) }
	}

	/// Returns `true` if the token outlives `now + margin` strictly.
	pub fn is_usable_at(&self, now: OffsetDateTime, margin: Duration) -> bool {
		self.expires_at > now + margin
	}

	/// Returns `true` once `now` reached the expiry instant.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}

	/// Time left before expiry, clamped at zero.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - now;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Debug for TenantToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TenantToken")
			.field("token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
