//! Error taxonomy of the client.

use thiserror::Error;

/// What can go wrong between the user pressing a button and the page
/// reacting. Network-originated variants keep the server's text verbatim.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client-side validation blocked the submission; nothing was sent.
    #[error("field `{field}` failed validation")]
    Validation { field: String },

    /// 5xx response. The user may retry from the wait modal.
    #[error("{status_text}: {body}")]
    TransientServer {
        status: u16,
        status_text: String,
        body: String,
    },

    /// 409 on create: the identifier already belongs to a member.
    #[error("`{identifier}` is already registered")]
    Conflict { identifier: String },

    /// Any other non-2xx response. Not retryable.
    #[error("{status_text}: {body}")]
    GenericRequest {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The member directory could not be loaded.
    #[error("{status}: {status_text}: {body}")]
    Fetch {
        status: u16,
        status_text: String,
        body: String,
    },

    /// A trigger arrived while the form's submission is still pending.
    #[error("a submission is already pending")]
    Pending,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed client configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid client configuration: {0}")]
    Invalid(String),

    #[error("invalid pattern for field `{field}`: {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// A request that never produced an HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network request failed: {0}")]
    Network(String),

    #[error("could not read response body: {0}")]
    Body(String),
}

impl TransportError {
    /// jQuery reports requests without a response as status 0 / "error".
    pub const STATUS: u16 = 0;
    pub const STATUS_TEXT: &'static str = "error";
}
