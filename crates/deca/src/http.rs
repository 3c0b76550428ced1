//! HTTP seam: the transport trait plus URL encoding helpers.

use std::borrow::Cow;

use crate::error::TransportError;

pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostRequest {
    /// Empty means "the current path", like `$.post('')`.
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Already URL-encoded body.
    pub body: String,
}

impl PostRequest {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: vec![
                (REQUESTED_WITH_HEADER.to_owned(), REQUESTED_WITH_VALUE.to_owned()),
                ("Content-Type".to_owned(), FORM_CONTENT_TYPE.to_owned()),
            ],
            body: body.into(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    /// Same success range jQuery uses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) || self.status == 304
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Synthetic response for a request that never got one.
    pub fn from_transport_error(error: &TransportError) -> Self {
        Self {
            status: TransportError::STATUS,
            status_text: TransportError::STATUS_TEXT.to_owned(),
            body: error.to_string(),
        }
    }
}

/// Async HTTP client used by every component that talks to the server.
///
/// Single-threaded: futures are polled on the browser main thread, hence no
/// `Send` bounds.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn post(&self, request: PostRequest) -> Result<HttpResponse, TransportError>;

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// `encodeURIComponent`: `urlencoding` escapes `!'()*`, which the browser keeps.
pub fn encode_uri_component(text: &str) -> Cow<'_, str> {
    let encoded = urlencoding::encode(text);
    if !encoded.contains('%') {
        return encoded;
    }
    let mut restored = encoded.into_owned();
    for (escape, mark) in [("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")] {
        restored = restored.replace(escape, mark);
    }
    Cow::Owned(restored)
}

/// `decodeURIComponent`, falling back to the raw text on malformed input.
pub fn decode_uri_component(text: &str) -> Cow<'_, str> {
    urlencoding::decode(text).unwrap_or(Cow::Borrowed(text))
}

/// URL-encode pairs the way jQuery's `$.param` does (`%20` becomes `+`).
pub fn encode_form<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(name, value)| {
            format!("{}={}", encode_uri_component(name), encode_uri_component(value))
        })
        .collect::<Vec<_>>()
        .join("&")
        .replace("%20", "+")
}
