//! Transport primitives for Feishu API calls.
//!
//! [`ApiTransport`] is the client's only dependency on an HTTP stack. It receives a fully
//! built [`TransportRequest`] (method, URL, headers, optional JSON body) and resolves to a
//! [`TransportResponse`] carrying the status and raw body bytes. Cancellation is expressed
//! by dropping the returned future: the dispatcher wraps it in a deadline and drops it when
//! the deadline fires, so implementations must release their in-flight work on drop (reqwest
//! does this natively).

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ApiTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing Feishu API requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// every clone of a client, and their futures must be `Send` so operations can hop
/// executors.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Performs `request` and resolves to the raw response.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the Feishu API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	#[default]
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical upper-case method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}

/// Fully built request handed to an [`ApiTransport`].
#[derive(Clone, PartialEq, Eq)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including the query string.
	pub url: Url,
	/// Header names and values; names are lower-case.
	pub headers: BTreeMap<String, String>,
	/// Serialized JSON body, if any.
	pub body: Option<String>,
}
impl TransportRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: BTreeMap::new(), body: None }
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Sets the serialized body.
	pub fn with_body(mut self, body: Option<String>) -> Self {
		self.body = body;

		self
	}

	/// Returns a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Parses the body as JSON, if present and well-formed.
	pub fn json_body(&self) -> Option<serde_json::Value> {
		self.body.as_deref().and_then(|body| serde_json::from_str(body).ok())
	}
}
impl Debug for TransportRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		// Bodies and the authorization header carry secrets.
		f.debug_struct("TransportRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("body_len", &self.body.as_ref().map(String::len))
			.finish()
	}
}

/// Raw response returned by an [`ApiTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Wraps a status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let de = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(de)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let TransportRequest { method, url, headers, body } = request;
			let mut builder = client.request(method.into(), url);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_headers_are_case_insensitive() {
		let request = TransportRequest::new(
			Method::Get,
			Url::parse("https://open.feishu.cn/open-apis/bot/v3/info")
				.expect("Fixture URL should parse."),
		)
		.with_header("Authorization", "Bearer t");

		assert_eq!(request.header("authorization"), Some("Bearer t"));
		assert_eq!(request.header("AUTHORIZATION"), Some("Bearer t"));
		assert_eq!(request.header("content-type"), None);
	}

	#[test]
	fn request_debug_hides_secrets() {
		let request = TransportRequest::new(
			Method::Post,
			Url::parse("https://open.feishu.cn/open-apis/auth/v3/tenant_access_token/internal")
				.expect("Fixture URL should parse."),
		)
		.with_header("Authorization", "Bearer very-secret")
		.with_body(Some("{\"app_secret\":\"very-secret\"}".into()));
		let rendered = format!("{request:?}");

		assert!(!rendered.contains("very-secret"));
		assert!(rendered.contains("authorization"));
	}

	#[test]
	fn response_json_reports_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Body {
			#[allow(dead_code)]
			code: i64,
		}

		let response = TransportResponse::new(200, b"{\"code\":\"zero\"}".to_vec());
		let err = response.json::<Body>().expect_err("String code should be rejected.");

		assert_eq!(err.path().to_string(), "code");
	}

	#[test]
	fn method_labels_are_canonical() {
		assert_eq!(Method::default(), Method::Post);
		assert_eq!(Method::Get.to_string(), "GET");
		assert_eq!(Method::Delete.as_str(), "DELETE");
	}
}
