//! Feishu open platform client: cached tenant access tokens, deadline-aware authenticated
//! calls, and typed bot and messaging operations over a pluggable transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use crate::{
		api::FeishuClient,
		auth::{AppCredentials, AppId, Secret},
		cache::{ManualClock, TokenCache},
		config::ClientConfig,
		error::TransportError,
		http::{ApiTransport, TransportFuture, TransportRequest, TransportResponse},
	};

	/// Client type alias used by unit tests driven by [`ScriptedTransport`].
	pub type ScriptedClient = FeishuClient<ScriptedTransport>;

	/// Failure injected by [`ScriptedTransport`] when a step asks for a network error.
	#[derive(Debug, ThisError)]
	#[error("Scripted transport failure: {0}.")]
	pub struct ScriptedTransportError(pub String);

	/// One scripted transport outcome.
	#[derive(Clone, Debug)]
	pub enum ScriptedStep {
		/// Respond with the given status and JSON body.
		Json(u16, serde_json::Value),
		/// Respond with the given status and raw body bytes.
		Raw(u16, Vec<u8>),
		/// Fail with a network error carrying the message.
		Fail(String),
		/// Never resolve; the future stays pending until dropped.
		Hang,
	}

	/// Transport stub that replays a queue of [`ScriptedStep`]s and records every request.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		steps: Mutex<VecDeque<ScriptedStep>>,
		requests: Mutex<Vec<TransportRequest>>,
		in_flight: Arc<AtomicUsize>,
	}
	impl ScriptedTransport {
		/// Builds a transport that replays `steps` in order.
		pub fn new(steps: impl IntoIterator<Item = ScriptedStep>) -> Self {
			Self { steps: Mutex::new(steps.into_iter().collect()), ..Default::default() }
		}

		/// Appends another step to the script.
		pub fn push(&self, step: ScriptedStep) {
			self.steps.lock().push_back(step);
		}

		/// Returns a snapshot of every request seen so far.
		pub fn requests(&self) -> Vec<TransportRequest> {
			self.requests.lock().clone()
		}

		/// Counts requests whose URL path ends with `suffix`.
		pub fn calls_to(&self, suffix: &str) -> usize {
			self.requests.lock().iter().filter(|req| req.url.path().ends_with(suffix)).count()
		}

		/// Number of hanging requests whose futures have not been dropped yet.
		pub fn in_flight(&self) -> usize {
			self.in_flight.load(Ordering::SeqCst)
		}
	}
	impl ApiTransport for ScriptedTransport {
		fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
			self.requests.lock().push(request);

			let step = self.steps.lock().pop_front();
			let in_flight = self.in_flight.clone();

			Box::pin(async move {
				match step {
					Some(ScriptedStep::Json(status, body)) => Ok(TransportResponse::new(
						status,
						serde_json::to_vec(&body).expect("Scripted JSON body should serialize."),
					)),
					Some(ScriptedStep::Raw(status, body)) => Ok(TransportResponse::new(status, body)),
					Some(ScriptedStep::Fail(message)) =>
						Err(TransportError::network(ScriptedTransportError(message))),
					Some(ScriptedStep::Hang) => {
						let _guard = InFlightGuard::enter(in_flight);

						std::future::pending().await
					},
					None => Err(TransportError::network(ScriptedTransportError(
						"script exhausted".into(),
					))),
				}
			})
		}
	}

	struct InFlightGuard(Arc<AtomicUsize>);
	impl InFlightGuard {
		fn enter(counter: Arc<AtomicUsize>) -> Self {
			counter.fetch_add(1, Ordering::SeqCst);

			Self(counter)
		}
	}
	impl Drop for InFlightGuard {
		fn drop(&mut self) {
			self.0.fetch_sub(1, Ordering::SeqCst);
		}
	}

	/// Successful token endpoint body issuing `token` for `expire` seconds.
	pub fn token_body(token: &str, expire: i64) -> serde_json::Value {
		serde_json::json!({
			"code": 0,
			"msg": "ok",
			"tenant_access_token": token,
			"expire": expire,
		})
	}

	/// Fixture credentials for `app_id`.
	pub fn test_credentials(app_id: &str) -> AppCredentials {
		AppCredentials::new(
			AppId::new(app_id).expect("Fixture app identifier should be valid."),
			Secret::new("fixture-secret"),
		)
	}

	/// Builds a scripted client with a manual clock pinned to a fixed instant.
	pub fn build_scripted_client(
		steps: impl IntoIterator<Item = ScriptedStep>,
	) -> (ScriptedClient, Arc<ScriptedTransport>, ManualClock) {
		let transport = Arc::new(ScriptedTransport::new(steps));
		let clock = ManualClock::new(time::macros::datetime!(2025-01-01 00:00 UTC));
		let config = ClientConfig::default();
		let cache = TokenCache::with_clock(Arc::new(clock.clone()))
			.with_refresh_margin(config.refresh_margin);
		let client: ScriptedClient =
			FeishuClient::with_transport(config, transport.clone()).with_cache(cache);

		(client, transport, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
