//! Google sign-in (`gapi`) bindings for the login and logout pages.

use zoon::wasm_bindgen::{closure::Closure, JsValue};

use super::dom::{self, js_error};
use super::js::{self, call, global, object};
use crate::signin::{IdentityProvider, SignInView};

pub const BUTTON_ID: &str = "my-signin2";
const FAILURE_ID: &str = "signin_failed";
const FAILURE_REASON_ID: &str = "signin_failed_reason";
pub const CSRF_INPUT_ID: &str = "csrf_token";

#[derive(Clone, Copy, Debug, Default)]
pub struct Gapi;

impl Gapi {
    fn auth_instance(&self) -> Result<JsValue, JsValue> {
        let auth2 = global(&["gapi", "auth2"])?;
        call(&auth2, "init", &[])?;
        call(&auth2, "getAuthInstance", &[])
    }

    fn auth_call(&self, method: &str) {
        if let Err(error) = self.auth_instance().and_then(|auth| call(&auth, method, &[])) {
            log::error!("gapi auth2 `{method}` failed: {}", js_error(&error));
        }
    }

    pub fn is_loaded(&self) -> bool {
        global(&["gapi"]).is_ok_and(|gapi| js::is_present(&gapi))
    }

    /// Render the sign-in button; `on_success` gets the user's id token.
    pub fn render_button(&self, on_success: impl Fn(String) + 'static, on_failure: impl Fn(String) + 'static) {
        let success = Closure::wrap(Box::new(move |user: JsValue| {
            match call(&user, "getAuthResponse", &[]) {
                Ok(response) => match js::get(&response, &["id_token"]).ok().and_then(|token| token.as_string()) {
                    Some(token) => on_success(token),
                    None => log::error!("sign-in response carries no id token"),
                },
                Err(error) => log::error!("reading sign-in response failed: {}", js_error(&error)),
            }
        }) as Box<dyn Fn(JsValue)>);
        let failure = Closure::wrap(Box::new(move |error: JsValue| on_failure(js_error(&error))) as Box<dyn Fn(JsValue)>);

        let options = object(&[
            ("scope", "profile email".into()),
            ("width", 240.into()),
            ("height", 50.into()),
            ("longtitle", true.into()),
            ("theme", "dark".into()),
            ("onsuccess", success.as_ref().clone()),
            ("onfailure", failure.as_ref().clone()),
        ]);
        let rendered = global(&["gapi", "signin2"]).and_then(|signin2| call(&signin2, "render", &[BUTTON_ID.into(), options]));
        if let Err(error) = rendered {
            log::error!("rendering the sign-in button failed: {}", js_error(&error));
        }
        // The button calls back for the page's lifetime.
        success.forget();
        failure.forget();
    }

    /// Load the `auth2` module, then run `then`.
    pub fn load_auth2(&self, then: impl FnOnce() + 'static) {
        let callback = Closure::once_into_js(then);
        if let Err(error) = global(&["gapi"]).and_then(|gapi| call(&gapi, "load", &["auth2".into(), callback])) {
            log::error!("loading gapi auth2 failed: {}", js_error(&error));
        }
    }
}

impl IdentityProvider for Gapi {
    fn disconnect(&self) {
        self.auth_call("disconnect");
    }

    fn sign_out(&self) {
        self.auth_call("signOut");
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DomSignInView;

impl SignInView for DomSignInView {
    fn hide_failure(&self) {
        if let Some(failure) = dom::by_id(FAILURE_ID) {
            dom::set_attribute(&failure, "hidden", "");
        }
    }

    fn show_failure(&self, reason: &str) {
        if let Some(failure) = dom::by_id(FAILURE_ID) {
            failure.remove_attribute("hidden").ok();
        }
        if let Some(element) = dom::by_id(FAILURE_REASON_ID) {
            element.set_text_content(Some(reason));
        }
    }
}
