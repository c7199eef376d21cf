//! Tenant access token issuance and cache management.
//!
//! The token endpoint is the one place where the payload is not nested under `data`:
//! `tenant_access_token` and `expire` sit at the top level next to `code` and `msg`.

// self
use crate::{
	_prelude::*,
	api::{FeishuClient, RequestOptions},
	auth::{AppCredentials, AppId, Secret, TenantToken},
	error::{ApiError, ConfigError, ResponseError, TransportError},
	http::{ApiTransport, Method, TransportRequest},
	obs::{self, OpKind},
};

/// Internal-app tenant token endpoint.
pub const TENANT_TOKEN_ENDPOINT: &str = "/auth/v3/tenant_access_token/internal";

#[derive(Serialize)]
struct TenantTokenRequest<'a> {
	app_id: &'a str,
	app_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TenantTokenBody {
	#[serde(default)]
	code: Option<i64>,
	#[serde(default)]
	msg: Option<String>,
	#[serde(default)]
	tenant_access_token: Option<String>,
	#[serde(default)]
	expire: Option<i64>,
}

impl<T> FeishuClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Returns a tenant token for `credentials`, issuing a new one only when the cached token
	/// is missing or within the refresh margin of expiry.
	pub async fn get_tenant_access_token(
		&self,
		credentials: &AppCredentials,
		options: &RequestOptions,
	) -> Result<TenantToken> {
		let timeout = self.effective_timeout(options.timeout);
		let issue = self
			.cache
			.get_or_issue(&credentials.app_id, move || self.issue_tenant_token(credentials, timeout));

		// The deadline also bounds the wait on another caller's in-flight issuance.
		match timeout {
			Some(after) => tokio::time::timeout(after, issue).await.map_err(|_| {
				let url = self
					.config
					.endpoint_url(TENANT_TOKEN_ENDPOINT, &[])
					.map(String::from)
					.unwrap_or_else(|_| TENANT_TOKEN_ENDPOINT.into());

				TransportError::Aborted { url, after }
			})?,
			None => issue.await,
		}
	}

	/// Drops the cached token for `app_id`; the next call issues a fresh one.
	///
	/// Returns `true` when an entry was removed.
	pub fn clear_token_cache(&self, app_id: &AppId) -> bool {
		self.cache.invalidate(app_id).is_some()
	}

	/// Drops every cached token.
	pub fn clear_all_tokens(&self) {
		self.cache.clear();
	}

	async fn issue_tenant_token(
		&self,
		credentials: &AppCredentials,
		timeout: Option<StdDuration>,
	) -> Result<TenantToken> {
		obs::observe(OpKind::IssueToken, "tenant_access_token", async move {
			let url = self.config.endpoint_url(TENANT_TOKEN_ENDPOINT, &[])?;
			let body = serde_json::to_string(&TenantTokenRequest {
				app_id: &credentials.app_id,
				app_secret: credentials.app_secret.expose(),
			})
			.map_err(|source| ConfigError::RequestBody {
				endpoint: TENANT_TOKEN_ENDPOINT.into(),
				source,
			})?;
			let request = TransportRequest::new(Method::Post, url)
				.with_header("Content-Type", "application/json")
				.with_body(Some(body));
			let response = self.send_with_deadline(request, timeout).await?;
			let TenantTokenBody { code, msg, tenant_access_token, expire } =
				response.json::<TenantTokenBody>().map_err(|source| ResponseError::MalformedJson {
					endpoint: TENANT_TOKEN_ENDPOINT.into(),
					status: response.status,
					source,
				})?;
			let token = tenant_access_token.filter(|token| !token.is_empty()).ok_or_else(|| {
				ApiError::from_body(code, msg, "Failed to obtain tenant access token.")
			})?;
			let lifetime = expire
				.map(|secs| Duration::seconds(secs.max(0)))
				.unwrap_or(self.config.default_token_lifetime);
			let issued_at = self.cache.now();
			let expires_at = issued_at.checked_add(lifetime).ok_or(
				ResponseError::LifetimeOutOfRange {
					endpoint: TENANT_TOKEN_ENDPOINT.into(),
					lifetime,
				},
			)?;

			Ok(TenantToken { token: Secret::new(token), issued_at, expires_at })
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		_preludet::{ScriptedStep, build_scripted_client, test_credentials, token_body},
		cache::Clock,
		error::Error,
	};

	#[tokio::test]
	async fn issues_once_then_serves_from_cache() {
		let (client, transport, _clock) =
			build_scripted_client([ScriptedStep::Json(200, token_body("T", 7200))]);
		let credentials = test_credentials("cli_cache");
		let first = client
			.get_tenant_access_token(&credentials, &RequestOptions::default())
			.await
			.expect("First call should issue a token.");
		let second = client
			.get_tenant_access_token(&credentials, &RequestOptions::default())
			.await
			.expect("Second call should hit the cache.");

		assert_eq!(first.token.expose(), "T");
		assert_eq!(first, second);
		assert_eq!(transport.calls_to(TENANT_TOKEN_ENDPOINT), 1);
	}

	#[tokio::test]
	async fn issuance_request_carries_credentials_without_bearer() {
		let (client, transport, _clock) =
			build_scripted_client([ScriptedStep::Json(200, token_body("T", 7200))]);

		client
			.get_tenant_access_token(&test_credentials("cli_body"), &RequestOptions::default())
			.await
			.expect("Issuance should succeed.");

		let sent = transport.requests();

		assert_eq!(sent[0].method, Method::Post);
		assert_eq!(
			sent[0].url.as_str(),
			"https://open.feishu.cn/open-apis/auth/v3/tenant_access_token/internal"
		);
		assert_eq!(sent[0].header("content-type"), Some("application/json"));
		assert_eq!(sent[0].header("authorization"), None);
		assert_eq!(
			sent[0].json_body(),
			Some(json!({"app_id": "cli_body", "app_secret": "fixture-secret"}))
		);
	}

	#[tokio::test]
	async fn expiry_uses_reported_or_default_lifetime() {
		let (client, _transport, clock) = build_scripted_client([
			ScriptedStep::Json(200, token_body("short", 1800)),
			ScriptedStep::Json(200, json!({"code": 0, "tenant_access_token": "default"})),
		]);
		let short = client
			.get_tenant_access_token(&test_credentials("cli_short"), &RequestOptions::default())
			.await
			.expect("Issuance should succeed.");
		let default = client
			.get_tenant_access_token(&test_credentials("cli_default"), &RequestOptions::default())
			.await
			.expect("Issuance should succeed.");

		assert_eq!(short.expires_at, clock.now() + Duration::seconds(1800));
		assert_eq!(default.expires_at, clock.now() + Duration::seconds(7200));
	}

	#[tokio::test]
	async fn refreshes_inside_margin_and_after_invalidation() {
		let (client, transport, clock) = build_scripted_client([
			ScriptedStep::Json(200, token_body("T1", 7200)),
			ScriptedStep::Json(200, token_body("T2", 7200)),
			ScriptedStep::Json(200, token_body("T3", 7200)),
		]);
		let credentials = test_credentials("cli_refresh");
		let options = RequestOptions::default();

		client.get_tenant_access_token(&credentials, &options).await.expect("T1 should issue.");
		clock.advance(Duration::seconds(6900));

		let refreshed =
			client.get_tenant_access_token(&credentials, &options).await.expect("T2 should issue.");

		assert_eq!(refreshed.token.expose(), "T2");
		assert!(refreshed.expires_at > clock.now() + Duration::minutes(5));
		assert!(client.clear_token_cache(&credentials.app_id));
		assert!(!client.clear_token_cache(&credentials.app_id));

		let reissued =
			client.get_tenant_access_token(&credentials, &options).await.expect("T3 should issue.");

		assert_eq!(reissued.token.expose(), "T3");
		assert_eq!(transport.calls_to(TENANT_TOKEN_ENDPOINT), 3);
	}

	#[tokio::test]
	async fn missing_token_is_api_error_and_not_cached() {
		let (client, transport, _clock) = build_scripted_client([
			ScriptedStep::Json(200, json!({"code": 10014, "msg": "app secret invalid"})),
			ScriptedStep::Json(200, json!({"code": 0, "tenant_access_token": ""})),
			ScriptedStep::Json(200, token_body("T", 7200)),
		]);
		let credentials = test_credentials("cli_missing");
		let options = RequestOptions::default();
		let err = client
			.get_tenant_access_token(&credentials, &options)
			.await
			.expect_err("Missing token must fail.");
		let api = err.as_api().expect("Failure should be an API error.");

		assert_eq!(api.code, Some(10014));
		assert_eq!(api.message, "app secret invalid");

		let err = client
			.get_tenant_access_token(&credentials, &options)
			.await
			.expect_err("Empty token must fail.");

		assert_eq!(err.to_string(), "Failed to obtain tenant access token.");
		assert!(client.cache.is_empty());

		client.get_tenant_access_token(&credentials, &options).await.expect("Retry should issue.");

		assert_eq!(transport.calls_to(TENANT_TOKEN_ENDPOINT), 3);
	}

	#[tokio::test]
	async fn issuance_honors_timeout() {
		let (client, transport, _clock) = build_scripted_client([ScriptedStep::Hang]);
		let err = client
			.get_tenant_access_token(
				&test_credentials("cli_timeout"),
				&RequestOptions::with_timeout(StdDuration::from_millis(50)),
			)
			.await
			.expect_err("Hanging issuance must be aborted.");

		assert!(err.is_aborted());
		assert!(matches!(err, Error::Transport(_)));
		assert_eq!(transport.in_flight(), 0);
		assert!(client.cache.is_empty());
	}

	#[tokio::test]
	async fn waiter_deadline_covers_in_flight_issuance() {
		let (client, transport, _clock) = build_scripted_client([ScriptedStep::Hang]);
		let holder = {
			let client = client.clone();

			tokio::spawn(async move {
				client
					.get_tenant_access_token(&test_credentials("cli_shared"), &RequestOptions::default())
					.await
			})
		};

		tokio::time::sleep(StdDuration::from_millis(20)).await;

		assert_eq!(transport.in_flight(), 1, "Holder should be parked on the transport.");

		let started = tokio::time::Instant::now();
		let err = client
			.get_tenant_access_token(
				&test_credentials("cli_shared"),
				&RequestOptions::with_timeout(StdDuration::from_millis(50)),
			)
			.await
			.expect_err("Waiter must give up at its own deadline.");
		let elapsed = started.elapsed();

		assert!(err.is_aborted(), "Unexpected error: {err:?}.");
		assert!(elapsed < StdDuration::from_secs(1), "Waiter took {elapsed:?}.");
		assert_eq!(transport.calls_to(TENANT_TOKEN_ENDPOINT), 1);

		holder.abort();
	}

	#[tokio::test]
	async fn out_of_range_expire_is_response_error() {
		let (client, _transport, _clock) =
			build_scripted_client([ScriptedStep::Json(200, token_body("T", 1_000_000_000_000))]);
		let err = client
			.get_tenant_access_token(&test_credentials("cli_huge_expire"), &RequestOptions::default())
			.await
			.expect_err("Unrepresentable expiry must fail.");

		assert!(matches!(err, Error::Response(ResponseError::LifetimeOutOfRange { .. })));
		assert!(client.cache.is_empty());
	}
}
