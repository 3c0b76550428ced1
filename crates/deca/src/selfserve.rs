//! Public join and volunteer pages, usually embedded in a host site.

use crate::form::FormView;
use crate::frame::{FlowStep, FrameBridge, SelfServeFlow};
use crate::http::Transport;
use crate::modal::{ModalView, PaymentNotice};
use crate::page::Page;
use crate::submit::{SubmitController, TriggerEvent};

/// `responseID` of the member-join flow.
pub const JOIN_FLOW_ID: &str = "self-serve-join";
/// `responseID` of the volunteer flow.
pub const VOLUNTEER_FLOW_ID: &str = "self-serve-volunteer";

/// Section picked on the combined join/volunteer page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComboMode {
    Member,
    Volunteer,
}

impl ComboMode {
    /// Chooser button value; anything but `member` means volunteer.
    pub fn from_value(value: &str) -> Self {
        if value == "member" { Self::Member } else { Self::Volunteer }
    }

    /// `(member section shown, volunteer section shown)`.
    pub fn sections_shown(self) -> (bool, bool) {
        match self {
            Self::Member => (true, false),
            Self::Volunteer => (false, true),
        }
    }
}

/// A self-serve form: the submit controller behind a cross-frame round trip.
pub struct SelfServeForm<F, M, T, P, B> {
    controller: SubmitController<F, M, T, P>,
    flow: SelfServeFlow<B>,
}

impl<F, M, T, P, B> SelfServeForm<F, M, T, P, B>
where
    F: FormView,
    M: ModalView,
    T: Transport,
    P: Page,
    B: FrameBridge,
{
    pub fn new(controller: SubmitController<F, M, T, P>, flow: SelfServeFlow<B>) -> Self {
        Self { controller, flow }
    }

    pub fn controller(&self) -> &SubmitController<F, M, T, P> {
        &self.controller
    }

    pub fn flow(&self) -> &SelfServeFlow<B> {
        &self.flow
    }

    /// Write the clicked payment button's value and switch the modal's
    /// payment instructions to match.
    pub fn choose_payment(&self, method: &str) {
        let field = &self.controller.config().fields.payment_method;
        self.controller.form().set_value(field, method);
        self.controller
            .update_modal(|modal| modal.set_payment_notice(PaymentNotice::from_method(method)));
    }

    /// Visible submit button clicked. Submits right away unless the parent
    /// frame first has to tell us where to put the modal.
    pub async fn on_submit_click(&self, event: &dyn TriggerEvent, payment_method: Option<&str>, now_ms: u64) {
        event.prevent_default();
        if let Some(method) = payment_method {
            self.choose_payment(method);
        }
        match self.flow.on_submit_click(now_ms) {
            FlowStep::SubmitNow => {
                self.controller.submit(None).await;
            }
            FlowStep::AwaitParent => log::debug!("asked parent frame for the visible top"),
        }
    }

    /// Window `message` event. A matching answer positions the modal and
    /// runs the deferred submit.
    pub async fn on_message(&self, raw: &str) {
        let Some(top) = self.flow.on_message(raw) else {
            return;
        };
        self.controller.update_modal(|modal| modal.set_top_offset(top));
        self.controller.submit(None).await;
    }

    /// Periodic check of the optional frame timeout.
    pub async fn on_tick(&self, now_ms: u64) {
        if self.flow.on_tick(now_ms) {
            self.controller.submit(None).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;
    use crate::common::{FormKind, FormMode};
    use crate::config::ClientConfig;
    use crate::form::Control;
    use crate::frame::FrameTimeout;
    use crate::page::tests::FakePage;
    use crate::submit::tests::{Click, FakeForm, FakeModalView, ScriptedTransport};

    #[derive(Default)]
    struct Parent {
        sent: RefCell<Vec<String>>,
    }

    impl FrameBridge for Rc<Parent> {
        fn is_available(&self) -> bool {
            true
        }

        fn send_message(&self, payload: &str) {
            self.sent.borrow_mut().push(payload.to_owned());
        }
    }

    type Form = SelfServeForm<FakeForm, FakeModalView, ScriptedTransport, FakePage, Rc<Parent>>;

    fn join_form(framed: bool, timeout: FrameTimeout, parent: Rc<Parent>) -> Form {
        let controller = SubmitController::new(
            FormKind::Member(FormMode::SelfServe),
            Rc::new(ClientConfig::default()),
            FakeForm::new(vec![
                Control::text("first_name", "Ann"),
                Control::new("payment_method", crate::form::ControlKind::Hidden, ""),
            ]),
            FakeModalView::default(),
            ScriptedTransport::replying(200, "OK", "demo"),
            FakePage {
                framed,
                ..FakePage::default()
            },
        )
        .unwrap();
        SelfServeForm::new(controller, SelfServeFlow::new(JOIN_FLOW_ID, framed, parent, timeout))
    }

    fn click() -> Click {
        Click { prevented: Cell::new(false) }
    }

    #[test]
    fn unframed_page_submits_immediately() {
        let parent = Rc::new(Parent::default());
        let form = join_form(false, FrameTimeout::Never, parent.clone());
        block_on(form.on_submit_click(&click(), Some("cheque"), 0));
        assert!(parent.sent.borrow().is_empty());
        let posts = form.controller().form().value("payment_method");
        assert_eq!(posts.as_deref(), Some("cheque"));
        assert_eq!(form.controller().modal().payment_notice(), Some(PaymentNotice::Cheque));
        assert!(form.controller().modal().state().is_resolved());
    }

    #[test]
    fn framed_page_submits_after_parent_answers() {
        let parent = Rc::new(Parent::default());
        let form = join_form(true, FrameTimeout::Never, parent.clone());
        let event = click();
        block_on(form.on_submit_click(&event, Some("paypal"), 0));
        assert!(event.prevented.get());
        assert_eq!(parent.sent.borrow().len(), 1);
        assert!(!form.controller().modal().is_visible());

        block_on(form.on_message(r#"{"responseID":"self-serve-volunteer","message":"get-top-response","value":10}"#));
        assert!(!form.controller().modal().is_visible());

        block_on(form.on_message(r#"{"responseID":"self-serve-join","message":"get-top-response","value":-50}"#));
        let modal = form.controller().modal();
        assert_eq!(modal.top_offset_css().as_deref(), Some("0px"));
        assert_eq!(modal.payment_notice(), Some(PaymentNotice::Paypal));
        assert!(modal.state().is_resolved());
    }

    #[test]
    fn silent_parent_leaves_submission_pending_by_default() {
        let parent = Rc::new(Parent::default());
        let form = join_form(true, FrameTimeout::Never, parent);
        block_on(form.on_submit_click(&click(), None, 0));
        block_on(form.on_tick(60_000));
        assert!(!form.controller().modal().is_visible());
    }

    #[test]
    fn bounded_timeout_submits_without_repositioning() {
        let parent = Rc::new(Parent::default());
        let form = join_form(true, FrameTimeout::AfterMs(2000), parent);
        block_on(form.on_submit_click(&click(), None, 0));
        block_on(form.on_tick(2500));
        let modal = form.controller().modal();
        assert!(modal.state().is_resolved());
        assert_eq!(modal.top_offset_css(), None);
    }

    #[test]
    fn combo_chooser_shows_one_section() {
        assert_eq!(ComboMode::from_value("member").sections_shown(), (true, false));
        assert_eq!(ComboMode::from_value("volunteer").sections_shown(), (false, true));
    }
}
