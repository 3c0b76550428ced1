use zoon::web_sys::Element;

use super::dom::{self, query, query_all};
use crate::modal::{ModalState, ModalView, PaymentNotice, SuccessOutcome, WaitModal};

const RENEW_LINK: &str = "#waitModalRenew";
const SERVER_MESSAGE: &str = "#waitModalServerMessage";
const REDIRECT_LINK: &str = "#waitModalRedirectLink";
const DONE_LINK: &str = "#doneBtn";

/// The wait modal's markup: `.<group>-show` / `.<group>-hide` elements are
/// toggled per state.
pub struct DomModal {
    root: Element,
    dialog: Element,
}

impl DomModal {
    pub fn new(root: Element) -> Self {
        let dialog = if root.class_list().contains("modal") {
            root.clone()
        } else {
            query(&root, ".modal").unwrap_or_else(|| root.clone())
        };
        Self { root, dialog }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    fn toggle_group(&self, group: &str, on: bool) {
        for element in query_all(&self.root, &format!(".{group}-show")) {
            dom::set_hidden(&element, !on);
        }
        for element in query_all(&self.root, &format!(".{group}-hide")) {
            dom::set_hidden(&element, on);
        }
    }

    fn set_href(&self, selector: &str, href: &str) {
        if let Some(link) = query(&self.root, selector) {
            dom::set_attribute(&link, "href", href);
        }
    }
}

impl ModalView for DomModal {
    fn renew_href(&self) -> String {
        query(&self.root, RENEW_LINK)
            .and_then(|link| link.get_attribute("href"))
            .unwrap_or_default()
    }

    fn render(&self, modal: &WaitModal) {
        // Reset first: `.reset-show` visible, `.reset-hide` hidden.
        for element in query_all(&self.root, ".reset-hide") {
            dom::set_hidden(&element, true);
        }
        for element in query_all(&self.root, ".reset-show") {
            dom::set_hidden(&element, false);
        }

        match modal.state() {
            ModalState::Idle | ModalState::Pending => {}
            ModalState::Success => self.toggle_group("success", true),
            ModalState::Error | ModalState::ErrorRetryable => {
                self.toggle_group("error", true);
                self.toggle_group("retry", modal.retry_visible());
            }
            ModalState::ErrorConflict => {
                self.toggle_group("error", true);
                self.toggle_group("conflict-email", true);
            }
        }

        if let Some(message) = query(&self.root, SERVER_MESSAGE) {
            message.set_text_content(Some(modal.message()));
        }
        self.set_href(RENEW_LINK, modal.renew_href());

        match modal.outcome() {
            Some(SuccessOutcome::Done { target }) => self.set_href(DONE_LINK, target),
            Some(SuccessOutcome::Redirect { url }) => self.set_href(REDIRECT_LINK, url),
            Some(SuccessOutcome::Demo) => self.toggle_group("demo", true),
            None => {}
        }

        if let Some(payment) = modal.payment_notice() {
            let cheque = payment == PaymentNotice::Cheque;
            for element in query_all(&self.root, ".show-cheque") {
                dom::set_hidden(&element, !cheque);
            }
            for element in query_all(&self.root, ".show-paypal") {
                dom::set_hidden(&element, cheque);
            }
        }

        if let Some(top) = modal.top_offset_css() {
            dom::set_style(&self.dialog, "top", &top);
        }

        dom::set_class(&self.dialog, "in", modal.is_visible());
        dom::set_style(&self.dialog, "display", if modal.is_visible() { "block" } else { "none" });
    }
}
