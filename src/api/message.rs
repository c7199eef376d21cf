//! Message send and reply operations.

// self
use crate::{
	_prelude::*,
	api::{ApiRequest, ApiResponse, FeishuClient, PayloadField, RequestOptions},
	auth::{AppCredentials, MessageId},
	http::ApiTransport,
	obs::{self, OpKind},
};

/// Message creation endpoint; takes `receive_id_type` as a query parameter.
pub const MESSAGES_ENDPOINT: &str = "/im/v1/messages";

/// Kind of identifier carried in [`SendMessageParams::receive_id`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveIdType {
	/// App-scoped user id.
	#[default]
	OpenId,
	/// Developer-scoped user id.
	UnionId,
	/// Tenant-scoped user id.
	UserId,
	/// User email.
	Email,
	/// Group chat id.
	ChatId,
}
impl ReceiveIdType {
	/// Query parameter value.
	pub const fn as_str(self) -> &'static str {
		match self {
			ReceiveIdType::OpenId => "open_id",
			ReceiveIdType::UnionId => "union_id",
			ReceiveIdType::UserId => "user_id",
			ReceiveIdType::Email => "email",
			ReceiveIdType::ChatId => "chat_id",
		}
	}
}
impl Display for ReceiveIdType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Body of a message send.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageParams {
	/// Target identifier, interpreted per [`ReceiveIdType`].
	pub receive_id: String,
	/// Message type (`text`, `post`, `interactive`, ...).
	pub msg_type: String,
	/// JSON-encoded content whose schema depends on `msg_type`.
	pub content: String,
	/// Idempotency key.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uuid: Option<String>,
}
impl SendMessageParams {
	/// Builds params from already encoded content.
	pub fn new(
		receive_id: impl Into<String>,
		msg_type: impl Into<String>,
		content: impl Into<String>,
	) -> Self {
		Self {
			receive_id: receive_id.into(),
			msg_type: msg_type.into(),
			content: content.into(),
			uuid: None,
		}
	}

	/// Plain text message.
	pub fn text(receive_id: impl Into<String>, text: &str) -> Self {
		Self::new(receive_id, "text", text_content(text))
	}

	/// Sets the idempotency key.
	pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
		self.uuid = Some(uuid.into());

		self
	}
}

/// Body of a message reply; the target is the replied-to message, so there is no receive id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMessageParams {
	/// Message type (`text`, `post`, `interactive`, ...).
	pub msg_type: String,
	/// JSON-encoded content whose schema depends on `msg_type`.
	pub content: String,
	/// Reply inside a thread.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reply_in_thread: Option<bool>,
	/// Idempotency key.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uuid: Option<String>,
}
impl ReplyMessageParams {
	/// Builds params from already encoded content.
	pub fn new(msg_type: impl Into<String>, content: impl Into<String>) -> Self {
		Self { msg_type: msg_type.into(), content: content.into(), reply_in_thread: None, uuid: None }
	}

	/// Plain text reply.
	pub fn text(text: &str) -> Self {
		Self::new("text", text_content(text))
	}

	/// Replies in a thread.
	pub fn in_thread(mut self) -> Self {
		self.reply_in_thread = Some(true);

		self
	}

	/// Sets the idempotency key.
	pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
		self.uuid = Some(uuid.into());

		self
	}
}

/// Sender block of a sent message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSender {
	/// Sender id.
	#[serde(default)]
	pub id: String,
	/// Kind of `id`.
	#[serde(default)]
	pub id_type: String,
	/// `app` or `user`.
	#[serde(default)]
	pub sender_type: String,
	/// Tenant of the sender.
	pub tenant_key: Option<String>,
}

/// Body block of a sent message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
	/// JSON-encoded content.
	#[serde(default)]
	pub content: String,
}

/// Message record returned by send and reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageResult {
	/// Id of the created message.
	pub message_id: String,
	/// Root message of the reply chain.
	pub root_id: Option<String>,
	/// Direct parent in the reply chain.
	pub parent_id: Option<String>,
	/// Thread the message belongs to.
	pub thread_id: Option<String>,
	/// Message type.
	pub msg_type: Option<String>,
	/// Creation time in milliseconds, as a string.
	pub create_time: Option<String>,
	/// Update time in milliseconds, as a string.
	pub update_time: Option<String>,
	/// Whether the message was recalled.
	pub deleted: Option<bool>,
	/// Whether the message was edited.
	pub updated: Option<bool>,
	/// Chat the message landed in.
	pub chat_id: Option<String>,
	/// Sender details.
	pub sender: Option<MessageSender>,
	/// Message body.
	pub body: Option<MessageBody>,
	/// Message this one was merged-forwarded from.
	pub upper_message_id: Option<String>,
}

impl<T> FeishuClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Sends a message to the target named by `params.receive_id` and `receive_id_type`.
	pub async fn send_message(
		&self,
		credentials: &AppCredentials,
		params: &SendMessageParams,
		receive_id_type: ReceiveIdType,
		options: &RequestOptions,
	) -> Result<ApiResponse<SendMessageResult>> {
		obs::observe(OpKind::SendMessage, "send_message", async move {
			let token = self.get_tenant_access_token(credentials, options).await?;
			let request = ApiRequest::post(MESSAGES_ENDPOINT)
				.query("receive_id_type", receive_id_type.as_str())
				.json(params)?
				.with_timeout(options.timeout);

			self.dispatch(request, &token.token, PayloadField::Data).await
		})
		.await
	}

	/// Replies to `message_id`.
	pub async fn reply_message(
		&self,
		credentials: &AppCredentials,
		message_id: &MessageId,
		params: &ReplyMessageParams,
		options: &RequestOptions,
	) -> Result<ApiResponse<SendMessageResult>> {
		obs::observe(OpKind::ReplyMessage, "reply_message", async move {
			let token = self.get_tenant_access_token(credentials, options).await?;
			let request = ApiRequest::post(format!("{MESSAGES_ENDPOINT}/{message_id}/reply"))
				.json(params)?
				.with_timeout(options.timeout);

			self.dispatch(request, &token.token, PayloadField::Data).await
		})
		.await
	}
}

fn text_content(text: &str) -> String {
	serde_json::json!({ "text": text }).to_string()
}
