//! Classification of completed API calls
//!
//! The TVDB API answers `200` with a `data` payload, `404` when a resource
//! does not exist, and anything else on error (usually with an `Error`
//! member in the body). Every read call is funnelled through [`classify`]
//! so callers never look at status codes themselves.

use crate::transport::RawResponse;
use serde_json::Value;

/// The classified result of a read call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Status 200, carrying the full response body
    Success(Value),
    /// Status 404: the resource does not exist
    Empty,
    /// Any other status
    Failure { status: u16, message: String },
}

impl Outcome {
    /// The `data` member of a successful payload, if any.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Outcome::Success(body) => body.get("data"),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }
}

/// Maps a raw response to an [`Outcome`].
pub fn classify(response: RawResponse) -> Outcome {
    match response.status {
        200 => Outcome::Success(response.body),
        404 => Outcome::Empty,
        status => Outcome::Failure {
            status,
            message: error_message(status, &response.body),
        },
    }
}

/// Uses the API's `Error` member when present, the HTTP reason phrase otherwise.
pub(crate) fn error_message(status: u16, body: &Value) -> String {
    if let Some(message) = body.get("Error").and_then(Value::as_str) {
        return message.to_string();
    }
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
        .to_string()
}
