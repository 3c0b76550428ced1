//! Sign-in through the identity provider, then exchange its token for a
//! server session.

use std::rc::Rc;

use crate::config::ClientConfig;
use crate::http::{HttpResponse, PostRequest, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE, Transport, encode_form};
use crate::page::Page;

pub const SIGN_IN_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The provider's client-side auth instance.
pub trait IdentityProvider {
    /// Revoke the app's grant for the current user.
    fn disconnect(&self);

    fn sign_out(&self);
}

/// Failure area of the login page.
pub trait SignInView {
    fn hide_failure(&self);

    fn show_failure(&self, reason: &str);
}

pub struct SignInFlow<I, V, T, P> {
    config: Rc<ClientConfig>,
    provider: I,
    view: V,
    transport: T,
    page: P,
}

impl<I, V, T, P> SignInFlow<I, V, T, P>
where
    I: IdentityProvider,
    V: SignInView,
    T: Transport,
    P: Page,
{
    pub fn new(config: Rc<ClientConfig>, provider: I, view: V, transport: T, page: P) -> Self {
        Self {
            config,
            provider,
            view,
            transport,
            page,
        }
    }

    pub fn provider(&self) -> &I {
        &self.provider
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn request(&self, id_token: &str, csrf_token: &str) -> PostRequest {
        PostRequest {
            url: self.config.endpoints.token_sign_in.clone(),
            headers: vec![
                (REQUESTED_WITH_HEADER.to_owned(), REQUESTED_WITH_VALUE.to_owned()),
                ("Content-Type".to_owned(), SIGN_IN_CONTENT_TYPE.to_owned()),
            ],
            body: encode_form([("idtoken", id_token), (self.config.fields.csrf_token.as_str(), csrf_token)]),
        }
    }

    /// Provider reported a signed-in user. Returns whether the server
    /// accepted the token.
    pub async fn on_sign_in(&self, id_token: &str, csrf_token: &str) -> bool {
        self.view.hide_failure();
        let response = match self.transport.post(self.request(id_token, csrf_token)).await {
            Ok(response) => response,
            Err(error) => {
                log::warn!("sign-in request failed: {error}");
                HttpResponse::from_transport_error(&error)
            }
        };

        if response.is_success() {
            log::info!("signed in as {}", response.body);
            self.page.navigate(&self.config.endpoints.home);
            return true;
        }

        log::warn!("sign-in rejected with status {}: {}", response.status, response.body);
        self.view.show_failure(&response.body);
        self.provider.disconnect();
        self.provider.sign_out();
        false
    }

    pub fn on_sign_in_failure(&self, error: &str) {
        log::warn!("identity provider sign-in failed: {error}");
    }

    /// Logout page.
    pub fn sign_out(&self) {
        log::info!("signing out of the identity provider");
        self.provider.sign_out();
    }
}
