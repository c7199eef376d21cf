//! Authenticated call dispatch with deadline enforcement.

// self
use crate::{
	_prelude::*,
	api::{ApiResponse, FeishuClient, PayloadField, RequestOptions},
	auth::{AppCredentials, Secret},
	error::{ConfigError, TransportError},
	http::{ApiTransport, Method, TransportRequest, TransportResponse},
	obs::{self, OpKind},
};

/// JSON request against an arbitrary Feishu endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// Path relative to the base URL, e.g. `/im/v1/chats`.
	pub endpoint: String,
	/// HTTP method; POST unless stated otherwise.
	pub method: Method,
	/// Query pairs appended in order.
	pub query: Vec<(String, String)>,
	/// JSON body; omitted from the request when `None`.
	pub body: Option<serde_json::Value>,
	/// Deadline for this request; falls back to [`ClientConfig::timeout`](crate::config::ClientConfig::timeout).
	pub timeout: Option<StdDuration>,
}
impl ApiRequest {
	/// POST request without body or query.
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			method: Method::Post,
			query: Vec::new(),
			body: None,
			timeout: None,
		}
	}

	/// POST request.
	pub fn post(endpoint: impl Into<String>) -> Self {
		Self::new(endpoint)
	}

	/// GET request.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(endpoint).with_method(Method::Get)
	}

	/// PUT request.
	pub fn put(endpoint: impl Into<String>) -> Self {
		Self::new(endpoint).with_method(Method::Put)
	}

	/// PATCH request.
	pub fn patch(endpoint: impl Into<String>) -> Self {
		Self::new(endpoint).with_method(Method::Patch)
	}

	/// DELETE request.
	pub fn delete(endpoint: impl Into<String>) -> Self {
		Self::new(endpoint).with_method(Method::Delete)
	}

	/// Overrides the method.
	pub fn with_method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<B>(mut self, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let value = serde_json::to_value(body).map_err(|source| ConfigError::RequestBody {
			endpoint: self.endpoint.clone(),
			source,
		})?;

		self.body = Some(value);

		Ok(self)
	}

	/// Sets or clears the deadline.
	pub fn with_timeout(mut self, timeout: Option<StdDuration>) -> Self {
		self.timeout = timeout;

		self
	}
}

impl<T> FeishuClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Sends `request` with `token` as bearer credential and unwraps the `data` payload.
	///
	/// A body whose `code` is not `0` fails with [`ApiError`](crate::error::ApiError) whatever
	/// the HTTP status was.
	pub async fn call_api<P>(&self, request: ApiRequest, token: &Secret) -> Result<ApiResponse<P>>
	where
		P: DeserializeOwned,
	{
		obs::observe(OpKind::CallApi, "call_api", self.dispatch(request, token, PayloadField::Data))
			.await
	}

	/// Obtains a tenant token for `credentials`, then behaves like [`call_api`](Self::call_api).
	pub async fn call_authorized<P>(
		&self,
		credentials: &AppCredentials,
		request: ApiRequest,
	) -> Result<ApiResponse<P>>
	where
		P: DeserializeOwned,
	{
		let options = RequestOptions { timeout: request.timeout };
		let token = self.get_tenant_access_token(credentials, &options).await?;

		self.call_api(request, &token.token).await
	}

	pub(crate) async fn dispatch<P>(
		&self,
		request: ApiRequest,
		token: &Secret,
		field: PayloadField,
	) -> Result<ApiResponse<P>>
	where
		P: DeserializeOwned,
	{
		let ApiRequest { endpoint, method, query, body, timeout } = request;
		let url = self.config.endpoint_url(&endpoint, &query)?;
		let body = body
			.map(|value| serde_json::to_string(&value))
			.transpose()
			.map_err(|source| ConfigError::RequestBody { endpoint: endpoint.clone(), source })?;
		let request = TransportRequest::new(method, url)
			.with_header("Content-Type", "application/json")
			.with_header("Authorization", format!("Bearer {}", token.expose()))
			.with_body(body);
		let response = self.send_with_deadline(request, self.effective_timeout(timeout)).await?;

		field.adapt(&endpoint, &response)
	}

	/// Runs the transport call, dropping it once `timeout` elapses.
	///
	/// The deadline timer lives inside the returned future, so it is released on every exit
	/// path together with the transport future.
	pub(crate) async fn send_with_deadline(
		&self,
		request: TransportRequest,
		timeout: Option<StdDuration>,
	) -> Result<TransportResponse> {
		let url = request.url.to_string();
		let call = self.transport.send(request);
		let response = match timeout {
			Some(after) => tokio::time::timeout(after, call)
				.await
				.map_err(|_| TransportError::Aborted { url, after })??,
			None => call.await?,
		};

		Ok(response)
	}
}
