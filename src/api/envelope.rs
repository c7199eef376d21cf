//! Response adapters mapping raw bodies into [`ApiResponse`].
//!
//! Most endpoints answer `{code, msg, data}`, but the bot-info endpoint nests its payload
//! under `bot`. Each shape is a [`PayloadField`] variant so the dispatcher stays free of
//! per-endpoint branching and every shape can be exercised on its own.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	error::{ApiError, ResponseError},
	http::TransportResponse,
};

/// Uniform successful call result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
	/// Platform code; always `0` for values produced by this crate.
	pub code: i64,
	/// Platform message (`"success"`, `"ok"`, ...).
	pub msg: String,
	/// Payload, when the endpoint returned one.
	pub data: Option<T>,
}
impl<T> ApiResponse<T> {
	/// Consumes the response, returning only the payload.
	pub fn into_data(self) -> Option<T> {
		self.data
	}

	/// Maps the payload while keeping code and message.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
		ApiResponse { code: self.code, msg: self.msg, data: self.data.map(f) }
	}
}

/// Body fields common to every endpoint plus everything else, unparsed.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawEnvelope {
	/// Platform code; a missing code is treated as failure.
	#[serde(default)]
	pub code: Option<i64>,
	/// Platform message.
	#[serde(default)]
	pub msg: Option<String>,
	/// Remaining top-level fields.
	#[serde(flatten)]
	pub rest: Map<String, Value>,
}
impl RawEnvelope {
	/// Decodes a transport response, reporting malformed bodies with their status.
	pub fn decode(endpoint: &str, response: &TransportResponse) -> Result<Self> {
		response.json().map_err(|source| {
			ResponseError::MalformedJson {
				endpoint: endpoint.to_owned(),
				status: response.status,
				source,
			}
			.into()
		})
	}
}

/// Field that carries an endpoint's payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PayloadField {
	/// Standard `data` field.
	#[default]
	Data,
	/// `bot` field used by `/bot/v3/info`.
	Bot,
}
impl PayloadField {
	/// Name of the JSON field.
	pub const fn as_str(self) -> &'static str {
		match self {
			PayloadField::Data => "data",
			PayloadField::Bot => "bot",
		}
	}

	/// Message used when a failing body carries no `msg`.
	pub fn fallback_message(self, endpoint: &str) -> String {
		match self {
			PayloadField::Data => format!("Feishu API call failed: {endpoint}."),
			PayloadField::Bot => "Failed to fetch bot info.".into(),
		}
	}

	/// Decodes `response` and adapts it.
	pub fn adapt<T>(self, endpoint: &str, response: &TransportResponse) -> Result<ApiResponse<T>>
	where
		T: DeserializeOwned,
	{
		self.adapt_envelope(endpoint, RawEnvelope::decode(endpoint, response)?)
	}

	/// Maps an already decoded body into an [`ApiResponse`].
	///
	/// Any code other than `0`, including a missing one, is an [`ApiError`] regardless of the
	/// HTTP status the body arrived with.
	pub fn adapt_envelope<T>(self, endpoint: &str, raw: RawEnvelope) -> Result<ApiResponse<T>>
	where
		T: DeserializeOwned,
	{
		let RawEnvelope { code, msg, mut rest } = raw;

		if code != Some(0) {
			return Err(ApiError::from_body(code, msg, self.fallback_message(endpoint)).into());
		}

		let data = match rest.remove(self.as_str()) {
			None | Some(Value::Null) => None,
			Some(value) => Some(serde_path_to_error::deserialize(value).map_err(|source| {
				ResponseError::Payload { endpoint: endpoint.to_owned(), field: self.as_str(), source }
			})?),
		};

		Ok(ApiResponse { code: 0, msg: msg.unwrap_or_default(), data })
	}
}
