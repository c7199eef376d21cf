//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `feishu_client.op` with the `op`
//!   (operation) and `stage` (endpoint or call site) fields.
//! - Enable `metrics` to increment the `feishu_client_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and the
//!   `feishu_client_token_cache_total` counter for every cache lookup, labeled by `result`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Tenant access token issuance.
	IssueToken,
	/// Generic authenticated call.
	CallApi,
	/// Bot identity lookup.
	BotInfo,
	/// Message send.
	SendMessage,
	/// Message reply.
	ReplyMessage,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::IssueToken => "issue_token",
			OpKind::CallApi => "call_api",
			OpKind::BotInfo => "bot_info",
			OpKind::SendMessage => "send_message",
			OpKind::ReplyMessage => "reply_message",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an [`OpSpan`] and records attempt plus success/failure outcomes.
pub(crate) async fn observe<T, Fut>(kind: OpKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OpSpan::new(kind, stage);

	record_op_outcome(kind, OpOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_op_outcome(kind, OpOutcome::Success),
		Err(e) => {
			span.record_failure(e);
			record_op_outcome(kind, OpOutcome::Failure);
		},
	}

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ApiError;

	#[test]
	fn labels_are_stable() {
		assert_eq!(OpKind::IssueToken.to_string(), "issue_token");
		assert_eq!(OpKind::ReplyMessage.as_str(), "reply_message");
		assert_eq!(OpOutcome::Failure.to_string(), "failure");
	}

	#[tokio::test]
	async fn observe_passes_results_through() {
		let ok = observe(OpKind::CallApi, "test", async { Ok(7) }).await;
		let err = observe::<(), _>(OpKind::CallApi, "test", async {
			Err(ApiError::from_body(Some(1), None, "boom").into())
		})
		.await;

		assert_eq!(ok.expect("Successful future should pass through."), 7);
		assert_eq!(err.expect_err("Failure should pass through.").to_string(), "boom");
	}
}
