//! Wait modal: the overlay shown while one submission is in flight.
//!
//! ```text
//! reset ──show()──▶ pending ──success()──▶ success
//!                      │
//!                      └──error()──▶ error | error-retryable | error-conflict
//! ```
//! `reset()` is valid from every state and is what `show()` starts with.

use crate::http::encode_uri_component;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalState {
    Idle,
    Pending,
    Success,
    Error,
    ErrorRetryable,
    ErrorConflict,
}

impl ModalState {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::ErrorRetryable | Self::ErrorConflict)
    }

    pub fn is_resolved(&self) -> bool {
        self.is_error() || *self == Self::Success
    }
}

/// What the success pane offers the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuccessOutcome {
    /// "Done" control navigates to `target`.
    Done { target: String },
    /// The top window is being sent to the payment page.
    Redirect { url: String },
    /// Demo server: payment skipped, show a notice instead of redirecting.
    Demo,
}

/// Which payment instructions the self-serve join modal shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentNotice {
    Paypal,
    Cheque,
}

impl PaymentNotice {
    pub fn from_method(method: &str) -> Self {
        if method == "cheque" { Self::Cheque } else { Self::Paypal }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WaitModal {
    state: ModalState,
    visible: bool,
    message: String,
    renew_href: String,
    original_renew_href: Option<String>,
    outcome: Option<SuccessOutcome>,
    payment: Option<PaymentNotice>,
    top_offset_px: Option<f64>,
}

impl WaitModal {
    /// `renew_href` is the initial target of the "go to renew" link shown on
    /// conflicts.
    pub fn new(renew_href: impl Into<String>) -> Self {
        Self {
            state: ModalState::Idle,
            visible: false,
            message: String::new(),
            renew_href: renew_href.into(),
            original_renew_href: None,
            outcome: None,
            payment: None,
            top_offset_px: None,
        }
    }

    pub fn show(&mut self) {
        self.reset();
        self.state = ModalState::Pending;
        self.visible = true;
    }

    pub fn success(&mut self, outcome: SuccessOutcome) {
        self.state = ModalState::Success;
        self.outcome = Some(outcome);
    }

    pub fn error(&mut self, status_text: &str, body: &str, retryable: bool, conflict_value: Option<&str>) {
        if let Some(conflict_value) = conflict_value {
            let original = self.original_renew_href.get_or_insert_with(|| self.renew_href.clone());
            self.renew_href = format!("{original}#{}", encode_uri_component(conflict_value));
            self.state = ModalState::ErrorConflict;
            return;
        }
        self.message = format!("{status_text}: {body}");
        self.state = if retryable {
            ModalState::ErrorRetryable
        } else {
            ModalState::Error
        };
    }

    /// Clear success/error/conflict output and restore the renew link.
    /// Visibility, payment notice and position are left alone.
    pub fn reset(&mut self) {
        self.state = ModalState::Idle;
        self.message.clear();
        self.outcome = None;
        if let Some(original) = self.original_renew_href.take() {
            self.renew_href = original;
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn set_payment_notice(&mut self, payment: PaymentNotice) {
        self.payment = Some(payment);
    }

    /// Vertical position inside a host frame; negative values clamp to 0.
    pub fn set_top_offset(&mut self, px: f64) {
        self.top_offset_px = Some(if px > 0.0 { px } else { 0.0 });
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_pending(&self) -> bool {
        self.state == ModalState::Pending
    }

    pub fn retry_visible(&self) -> bool {
        self.state == ModalState::ErrorRetryable
    }

    pub fn conflict_visible(&self) -> bool {
        self.state == ModalState::ErrorConflict
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn renew_href(&self) -> &str {
        &self.renew_href
    }

    pub fn outcome(&self) -> Option<&SuccessOutcome> {
        self.outcome.as_ref()
    }

    pub fn payment_notice(&self) -> Option<PaymentNotice> {
        self.payment
    }

    /// CSS `top` value, e.g. `"120px"`.
    pub fn top_offset_css(&self) -> Option<String> {
        self.top_offset_px.map(|px| format!("{px}px"))
    }
}

/// Renders a [`WaitModal`] into its overlay element.
pub trait ModalView {
    /// Initial href of the conflict "renew" link.
    fn renew_href(&self) -> String;

    fn render(&self, modal: &WaitModal);
}
