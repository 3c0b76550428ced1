use wasm_bindgen_futures::JsFuture;
use zoon::wasm_bindgen::{JsCast, JsValue};
use zoon::web_sys::{self, Request, RequestInit, Response};

use super::dom::js_error;
use crate::error::TransportError;
use crate::http::{HttpResponse, PostRequest, Transport};

/// `window.fetch`, same-origin credentials.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchTransport;

impl FetchTransport {
    async fn send(&self, request: Request) -> Result<HttpResponse, TransportError> {
        let window = web_sys::window().ok_or_else(|| TransportError::Network("no window".into()))?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|error| TransportError::Network(js_error(&error)))?;
        let response: Response = response
            .dyn_into()
            .map_err(|error| TransportError::Network(js_error(&error)))?;
        let text = response.text().map_err(|error| TransportError::Body(js_error(&error)))?;
        let body = JsFuture::from(text)
            .await
            .map_err(|error| TransportError::Body(js_error(&error)))?
            .as_string()
            .unwrap_or_default();
        Ok(HttpResponse {
            status: response.status(),
            status_text: response.status_text(),
            body,
        })
    }
}

fn request(method: &str, url: &str, body: Option<&str>) -> Result<Request, TransportError> {
    let init = RequestInit::new();
    init.set_method(method);
    if let Some(body) = body {
        init.set_body(&JsValue::from_str(body));
    }
    // `fetch("")` resolves to the current document, like `$.post('')`.
    Request::new_with_str_and_init(url, &init).map_err(|error| TransportError::Network(js_error(&error)))
}

impl Transport for FetchTransport {
    async fn post(&self, post: PostRequest) -> Result<HttpResponse, TransportError> {
        let request = request("POST", &post.url, Some(&post.body))?;
        for (name, value) in &post.headers {
            request
                .headers()
                .set(name, value)
                .map_err(|error| TransportError::Network(js_error(&error)))?;
        }
        self.send(request).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let request = request("GET", url, None)?;
        request
            .headers()
            .set(crate::http::REQUESTED_WITH_HEADER, crate::http::REQUESTED_WITH_VALUE)
            .map_err(|error| TransportError::Network(js_error(&error)))?;
        self.send(request).await
    }
}
