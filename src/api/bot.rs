//! Bot identity lookup.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	api::{ApiRequest, ApiResponse, FeishuClient, PayloadField, RequestOptions},
	auth::AppCredentials,
	http::ApiTransport,
	obs::{self, OpKind},
};

/// Bot identity endpoint; answers `{code, msg, bot}`.
pub const BOT_INFO_ENDPOINT: &str = "/bot/v3/info";

/// Bot identity as reported by `/bot/v3/info`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BotInfo {
	/// Activation status code.
	pub activate_status: Option<i64>,
	/// Display name.
	pub app_name: Option<String>,
	/// Avatar URL.
	pub avatar_url: Option<String>,
	/// Allowed caller IPs.
	#[serde(default)]
	pub ip_white_list: Vec<String>,
	/// Open id of the bot.
	pub open_id: Option<String>,
	/// Fields this crate does not model, kept verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl<T> FeishuClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Fetches the bot identity of the app behind `credentials`.
	///
	/// The payload is read from the body's `bot` field rather than `data`.
	pub async fn get_bot_info(
		&self,
		credentials: &AppCredentials,
		options: &RequestOptions,
	) -> Result<ApiResponse<BotInfo>> {
		obs::observe(OpKind::BotInfo, "bot_info", async move {
			let token = self.get_tenant_access_token(credentials, options).await?;
			let request = ApiRequest::get(BOT_INFO_ENDPOINT).with_timeout(options.timeout);

			self.dispatch(request, &token.token, PayloadField::Bot).await
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
		http::Method,
	};

	#[tokio::test]
	async fn bot_payload_is_remapped_from_bot_field() {
		let (client, transport, _clock) = build_scripted_client([
			ScriptedStep::Json(200, token_body("T", 7200)),
			ScriptedStep::Json(200, json!({"code": 0, "msg": "ok", "bot": {"name": "X"}})),
		]);
		let response = client
			.get_bot_info(&test_credentials("cli_bot"), &RequestOptions::default())
			.await
			.expect("Bot info should succeed.");
		let bot = response.data.expect("Bot payload should be present.");
		let sent = transport.requests();

		assert_eq!(response.code, 0);
		assert_eq!(response.msg, "ok");
		assert_eq!(bot.extra.get("name"), Some(&json!("X")));
		assert_eq!(bot.app_name, None);
		assert_eq!(sent[1].method, Method::Get);
		assert_eq!(sent[1].url.path(), "/open-apis/bot/v3/info");
		assert_eq!(sent[1].body, None);
		assert_eq!(sent[1].header("authorization"), Some("Bearer T"));
	}

	#[tokio::test]
	async fn typed_fields_decode() {
		let (client, _transport, _clock) = build_scripted_client([
			ScriptedStep::Json(200, token_body("T", 7200)),
			ScriptedStep::Json(
				200,
				json!({
					"code": 0,
					"msg": "ok",
					"bot": {
						"activate_status": 2,
						"app_name": "ops-bot",
						"avatar_url": "https://example.com/a.png",
						"ip_white_list": [],
						"open_id": "ou_bot"
					}
				}),
			),
		]);
		let bot = client
			.get_bot_info(&test_credentials("cli_bot_typed"), &RequestOptions::default())
			.await
			.expect("Bot info should succeed.")
			.into_data()
			.expect("Bot payload should be present.");

		assert_eq!(bot.activate_status, Some(2));
		assert_eq!(bot.app_name.as_deref(), Some("ops-bot"));
		assert_eq!(bot.open_id.as_deref(), Some("ou_bot"));
		assert!(bot.extra.is_empty());
	}

	#[tokio::test]
	async fn bot_failure_code_is_api_error() {
		let (client, _transport, _clock) = build_scripted_client([
			ScriptedStep::Json(200, token_body("T", 7200)),
			ScriptedStep::Json(200, json!({"code": 99991672, "msg": "access denied"})),
		]);
		let err = client
			.get_bot_info(&test_credentials("cli_bot_denied"), &RequestOptions::default())
			.await
			.expect_err("Non-zero code must fail.");

		assert_eq!(err.as_api().and_then(|api| api.code), Some(99991672));
		assert_eq!(err.to_string(), "access denied");
	}
}
