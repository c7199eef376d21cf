//! Sends a text message with app credentials taken from the environment.
//!
//! ```sh
//! FEISHU_APP_ID=cli_xxx FEISHU_APP_SECRET=xxx FEISHU_RECEIVE_ID=ou_xxx \
//! 	cargo run --example send_message
//! ```
//!
//! Set `FEISHU_BASE_URL` to target Lark (`https://open.larksuite.com/open-apis`) or a mock.

// std
use std::{env, time::Duration};
// crates.io
use color_eyre::{Result, eyre::WrapErr};
// self
use feishu_client::{
	api::{FeishuClient, ReceiveIdType, RequestOptions, SendMessageParams},
	auth::{AppCredentials, AppId, Secret},
	config::{ClientConfig, DEFAULT_BASE_URL},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let app_id = AppId::new(env::var("FEISHU_APP_ID").wrap_err("FEISHU_APP_ID is not set")?)?;
	let app_secret = Secret::new(env::var("FEISHU_APP_SECRET").wrap_err("FEISHU_APP_SECRET is not set")?);
	let receive_id = env::var("FEISHU_RECEIVE_ID").wrap_err("FEISHU_RECEIVE_ID is not set")?;
	let base_url = env::var("FEISHU_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
	let config =
		ClientConfig::builder().base_url(base_url).timeout(Duration::from_secs(10)).build()?;
	let client = FeishuClient::new(config);
	let credentials = AppCredentials::new(app_id, app_secret);
	let options = RequestOptions::default();
	let bot = client.get_bot_info(&credentials, &options).await?.into_data().unwrap_or_default();

	println!("Sending as {}.", bot.app_name.as_deref().unwrap_or("<unnamed bot>"));

	let params = SendMessageParams::text(receive_id, "Hello from feishu-client.");
	let sent = client.send_message(&credentials, &params, ReceiveIdType::OpenId, &options).await?;

	match sent.data {
		Some(message) => println!("Sent message {}.", message.message_id),
		None => println!("Message accepted: {}.", sent.msg),
	}

	Ok(())
}
