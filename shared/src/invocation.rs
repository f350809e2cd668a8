//! Lambda invocation payloads.

use serde::{Deserialize, Serialize};

/// Message returned by every successful invocation.
pub const SUCCESS_MESSAGE: &str = "Successfully processed matches.";

/// Optional overrides carried by the trigger event.
///
/// The trigger is otherwise opaque: scheduled events, test invocations and
/// empty payloads all deserialize to the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SyncTrigger {
    #[serde(default)]
    pub team_id: Option<u32>,
    #[serde(default)]
    pub season: Option<u32>,
}

impl SyncTrigger {
    pub fn from_payload(payload: serde_json::Value) -> Self {
        serde_json::from_value(payload).unwrap_or_default()
    }
}

/// `{statusCode, body}` response of the function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded message
    pub body: String,
}

impl InvocationResponse {
    pub fn success(message: &str) -> Self {
        Self {
            status_code: 200,
            body: serde_json::Value::from(message).to_string(),
        }
    }
}
