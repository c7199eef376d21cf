//! Tenant token cache keyed by application identifier.
//!
//! [`TokenCache::get_or_issue`] serves a cached token while it outlives the refresh margin
//! and otherwise runs the caller's issuer, storing the fresh token before returning it.
//! Issuance is single-flight per [`AppId`]: concurrent callers for the same app wait on one
//! guard and re-check the cache once they acquire it, so a refresh window produces one
//! token request instead of a stampede. Failed issuance stores nothing.

pub mod clock;

mod metrics;

pub use clock::*;
pub use metrics::*;

// self
use crate::{
	_prelude::*,
	auth::{AppId, TenantToken},
	config::DEFAULT_REFRESH_MARGIN,
	obs,
};

type TokenMap = Arc<RwLock<HashMap<AppId, TenantToken>>>;
type GuardMap = Arc<Mutex<HashMap<AppId, Arc<AsyncMutex<()>>>>>;

/// Shareable tenant token cache with an injectable clock.
///
/// Clones share entries, guards, and counters. Tests construct independent instances for
/// isolation; production code typically keeps one per process.
#[derive(Clone)]
pub struct TokenCache {
	entries: TokenMap,
	guards: GuardMap,
	clock: Arc<dyn Clock>,
	refresh_margin: Duration,
	metrics: Arc<IssueMetrics>,
}
impl TokenCache {
	/// Creates an empty cache driven by the system clock.
	pub fn new() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}

	/// Creates an empty cache driven by `clock`.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self {
			entries: Default::default(),
			guards: Default::default(),
			clock,
			refresh_margin: DEFAULT_REFRESH_MARGIN,
			metrics: Default::default(),
		}
	}

	/// Overrides the refresh margin; negative values are treated as zero.
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Returns the window before expiry inside which entries are considered stale.
	pub fn refresh_margin(&self) -> Duration {
		self.refresh_margin
	}

	/// Reads the injected clock.
	pub fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}

	/// Lookup and issuance counters.
	pub fn metrics(&self) -> &IssueMetrics {
		&self.metrics
	}

	/// Returns the cached token if it outlives `now + refresh_margin`.
	pub fn get(&self, app_id: &str) -> Option<TenantToken> {
		let now = self.now();

		self.entries
			.read()
			.get(app_id)
			.filter(|token| token.is_usable_at(now, self.refresh_margin))
			.cloned()
	}

	/// Stores `token` for `app_id`, replacing any prior entry.
	pub fn insert(&self, app_id: AppId, token: TenantToken) {
		self.entries.write().insert(app_id, token);
	}

	/// Removes the entry for `app_id`, returning it if one existed.
	pub fn invalidate(&self, app_id: &str) -> Option<TenantToken> {
		let removed = self.entries.write().remove(app_id);
		let mut guards = self.guards.lock();

		if guards.get(app_id).is_some_and(|guard| Arc::strong_count(guard) == 1) {
			guards.remove(app_id);
		}

		removed
	}

	/// Removes every entry.
	pub fn clear(&self) {
		self.entries.write().clear();
		// Guards still held by an in-flight issuance stay so waiters keep sharing them.
		self.guards.lock().retain(|_, guard| Arc::strong_count(guard) > 1);
	}

	/// Number of stored entries, stale ones included.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Returns a usable cached token or runs `issue` and caches its result.
	pub async fn get_or_issue<F, Fut>(&self, app_id: &AppId, issue: F) -> Result<TenantToken>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<TenantToken>>,
	{
		if let Some(token) = self.lookup(app_id) {
			return Ok(token);
		}

		let guard = self.guard(app_id);
		let _singleflight = guard.lock().await;

		// Another caller may have refreshed while this one waited.
		if let Some(token) = self.lookup(app_id) {
			return Ok(token);
		}

		self.metrics.record_attempt();

		match issue().await {
			Ok(token) => {
				self.insert(app_id.clone(), token.clone());
				self.metrics.record_success();

				Ok(token)
			},
			Err(e) => {
				self.metrics.record_failure();

				Err(e)
			},
		}
	}

	fn lookup(&self, app_id: &AppId) -> Option<TenantToken> {
		let hit = self.get(app_id);

		obs::record_cache_lookup(hit.is_some());

		if hit.is_some() {
			self.metrics.record_hit();
		}

		hit
	}

	fn guard(&self, app_id: &AppId) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(app_id.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl Default for TokenCache {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("entries", &self.len())
			.field("refresh_margin", &self.refresh_margin)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		future::{Ready, ready},
		sync::atomic::{AtomicUsize, Ordering},
	};
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::{
		auth::Secret,
		error::{ApiError, Error},
	};

	fn app(id: &str) -> AppId {
		AppId::new(id).expect("Fixture app identifier should be valid.")
	}

	fn cache_at(start: OffsetDateTime) -> (TokenCache, ManualClock) {
		let clock = ManualClock::new(start);

		(TokenCache::with_clock(Arc::new(clock.clone())), clock)
	}

	fn issued(cache: &TokenCache, value: &str, lifetime: Duration) -> TenantToken {
		TenantToken::new(Secret::new(value), cache.now(), lifetime)
	}

	#[tokio::test]
	async fn fast_path_skips_issuer_within_validity() {
		let (cache, _clock) = cache_at(datetime!(2025-01-01 00:00 UTC));
		let app = app("cli_fast");
		let calls = AtomicUsize::new(0);
		let first = cache
			.get_or_issue(&app, || {
				calls.fetch_add(1, Ordering::SeqCst);

				ready(Ok(issued(&cache, "t-1", Duration::seconds(7200))))
			})
			.await
			.expect("First issuance should succeed.");
		let second = cache
			.get_or_issue(&app, || -> Ready<Result<TenantToken>> {
				panic!("Issuer must not run on the fast path.")
			})
			.await
			.expect("Cached token should be served.");

		assert_eq!(first, second);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(cache.metrics().attempts(), 1);
		assert_eq!(cache.metrics().hits(), 1);
	}

	#[tokio::test]
	async fn entries_inside_refresh_margin_are_reissued() {
		let (cache, clock) = cache_at(datetime!(2025-01-01 00:00 UTC));
		let app = app("cli_margin");

		cache
			.get_or_issue(&app, || ready(Ok(issued(&cache, "t-1", Duration::seconds(7200)))))
			.await
			.expect("Initial issuance should succeed.");
		clock.advance(Duration::seconds(6899));

		assert!(cache.get(&app).is_some(), "Token with 301s left must still be served.");

		clock.advance(Duration::seconds(1));

		assert!(cache.get(&app).is_none(), "Token with exactly 300s left must be refreshed.");

		let refreshed = cache
			.get_or_issue(&app, || ready(Ok(issued(&cache, "t-2", Duration::seconds(7200)))))
			.await
			.expect("Refresh should succeed.");

		assert_eq!(refreshed.token.expose(), "t-2");
		assert!(refreshed.expires_at > cache.now() + cache.refresh_margin());
		assert_eq!(cache.len(), 1);
	}

	#[tokio::test]
	async fn invalidate_forces_issuance_before_expiry() {
		let (cache, _clock) = cache_at(datetime!(2025-01-01 00:00 UTC));
		let app = app("cli_invalidate");

		cache.insert(app.clone(), issued(&cache, "t-1", Duration::hours(2)));

		assert!(cache.invalidate(&app).is_some());
		assert!(cache.invalidate(&app).is_none(), "Missing keys must not error.");

		let token = cache
			.get_or_issue(&app, || ready(Ok(issued(&cache, "t-2", Duration::hours(2)))))
			.await
			.expect("Issuance after invalidation should succeed.");

		assert_eq!(token.token.expose(), "t-2");
	}

	#[tokio::test]
	async fn failed_issuance_stores_nothing() {
		let (cache, _clock) = cache_at(datetime!(2025-01-01 00:00 UTC));
		let app = app("cli_failure");
		let err = cache
			.get_or_issue(&app, || {
				ready(Err(Error::from(ApiError::from_body(Some(10003), None, "no token"))))
			})
			.await
			.expect_err("Issuer failure should surface.");

		assert_eq!(err.as_api().and_then(|e| e.code), Some(10003));
		assert!(cache.is_empty());
		assert_eq!(cache.metrics().failures(), 1);

		cache
			.get_or_issue(&app, || ready(Ok(issued(&cache, "t-ok", Duration::hours(2)))))
			.await
			.expect("Retry after failure should issue again.");

		assert_eq!(cache.metrics().attempts(), 2);
		assert_eq!(cache.metrics().successes(), 1);
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_issuance() {
		let (cache, _clock) = cache_at(datetime!(2025-01-01 00:00 UTC));
		let app = app("cli_singleflight");
		let calls = AtomicUsize::new(0);
		let (calls_ref, cache_ref) = (&calls, &cache);
		let issue = move || async move {
			calls_ref.fetch_add(1, Ordering::SeqCst);
			tokio::time::sleep(StdDuration::from_millis(20)).await;

			Ok(issued(cache_ref, "t-shared", Duration::hours(2)))
		};
		let (first, second) =
			tokio::join!(cache.get_or_issue(&app, issue), cache.get_or_issue(&app, issue));

		assert_eq!(first.expect("First caller should succeed.").token.expose(), "t-shared");
		assert_eq!(second.expect("Second caller should succeed.").token.expose(), "t-shared");
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn keys_are_isolated() {
		let (cache, _clock) = cache_at(datetime!(2025-01-01 00:00 UTC));

		cache.insert(app("cli_a"), issued(&cache, "t-a", Duration::hours(2)));

		assert!(cache.get("cli_b").is_none());
		assert_eq!(cache.get("cli_a").map(|t| t.token.expose().to_owned()), Some("t-a".into()));

		cache.clear();

		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn idle_guards_are_pruned() {
		let (cache, _clock) = cache_at(datetime!(2025-01-01 00:00 UTC));

		for id in ["cli_prune_a", "cli_prune_b"] {
			cache
				.get_or_issue(&app(id), || ready(Ok(issued(&cache, id, Duration::hours(2)))))
				.await
				.expect("Issuance should succeed.");
		}

		assert_eq!(cache.guards.lock().len(), 2);

		cache.invalidate("cli_prune_a");

		assert_eq!(cache.guards.lock().len(), 1);

		let held = cache.guard(&app("cli_prune_b"));

		cache.clear();

		assert_eq!(cache.guards.lock().len(), 1, "A held guard must survive clearing.");

		drop(held);
		cache.clear();

		assert!(cache.guards.lock().is_empty());
	}
}
