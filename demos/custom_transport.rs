//! Plugs an in-memory transport into [`FeishuClient`].
//!
//! 1. Implement [`ApiTransport`] and answer each [`TransportRequest`] with a
//!    [`TransportResponse`].
//! 2. Hand the transport to [`FeishuClient::with_transport`].
//! 3. Observe that the tenant token is issued once and reused for later calls.

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
use serde_json::json;
// self
use feishu_client::{
	api::{FeishuClient, ReceiveIdType, RequestOptions, SendMessageParams},
	auth::{AppCredentials, AppId, Secret},
	config::ClientConfig,
	error::TransportError,
	http::{ApiTransport, TransportFuture, TransportRequest, TransportResponse},
};

#[derive(Debug, Default)]
struct EchoTransport {
	token_requests: AtomicUsize,
	sent: AtomicUsize,
}
impl ApiTransport for EchoTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let path = request.url.path();
			let body = if path.ends_with("/tenant_access_token/internal") {
				let issued = self.token_requests.fetch_add(1, Ordering::SeqCst) + 1;

				json!({
					"code": 0,
					"msg": "ok",
					"tenant_access_token": format!("demo-token-{issued}"),
					"expire": 7200
				})
			} else if path.ends_with("/im/v1/messages") {
				let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;

				json!({"code": 0, "msg": "success", "data": {"message_id": format!("om_demo_{n}")}})
			} else {
				json!({"code": 404, "msg": format!("No handler for {path}.")})
			};
			let bytes = serde_json::to_vec(&body).map_err(TransportError::network)?;

			Ok(TransportResponse::new(200, bytes))
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let transport = Arc::new(EchoTransport::default());
	let client: FeishuClient<EchoTransport> = FeishuClient::with_transport(ClientConfig::default(), transport.clone());
	let credentials = AppCredentials::new(AppId::new("cli_demo")?, Secret::new("demo-secret"));
	let options = RequestOptions::default();

	for text in ["first", "second"] {
		let response = client
			.send_message(
				&credentials,
				&SendMessageParams::text("ou_demo", text),
				ReceiveIdType::OpenId,
				&options,
			)
			.await?;

		if let Some(message) = response.data {
			println!("Sent {text:?} as {}.", message.message_id);
		}
	}

	println!(
		"Token requests: {}, messages sent: {}.",
		transport.token_requests.load(Ordering::SeqCst),
		transport.sent.load(Ordering::SeqCst)
	);

	Ok(())
}
