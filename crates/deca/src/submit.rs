//! Submit lifecycle of member, volunteer and authorization forms:
//! validate → collect → transform → POST → drive the wait modal.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::common::{FormKind, FormMode};
use crate::config::ClientConfig;
use crate::error::{ClientError, ConfigError};
use crate::form::validator::Validator;
use crate::form::{FormSubmission, FormView, postal};
use crate::http::{HttpResponse, PostRequest, Transport};
use crate::modal::{ModalView, SuccessOutcome, WaitModal};
use crate::page::{self, Page};

/// Sentinel body the demo server returns instead of a payment URL.
pub const DEMO_RESPONSE: &str = "demo";

/// One geolocation fix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoReading {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in metres.
    pub accuracy_m: f64,
}

impl GeoReading {
    pub fn to_field_value(&self) -> String {
        format!("{}, {}", self.latitude, self.longitude)
    }
}

/// The DOM event that triggered a submit, if any.
pub trait TriggerEvent {
    fn prevent_default(&self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerError {
    pub status: u16,
    pub status_text: String,
    pub body: String,
    pub retryable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionResult {
    Success(String),
    ServerError(ServerError),
    /// 409 on create; carries the submitted identifier.
    Conflict(String),
}

impl SubmissionResult {
    pub fn classify(kind: FormKind, response: HttpResponse, submitted_identifier: Option<&str>) -> Self {
        if response.is_success() {
            return Self::Success(response.body);
        }
        if kind.detects_conflicts() && response.status == 409 {
            return Self::Conflict(submitted_identifier.unwrap_or_default().to_owned());
        }
        let retryable = response.is_server_error();
        Self::ServerError(ServerError {
            status: response.status,
            status_text: response.status_text,
            body: response.body,
            retryable,
        })
    }

    pub fn to_error(&self) -> Option<ClientError> {
        match self {
            Self::Success(_) => None,
            Self::Conflict(identifier) => Some(ClientError::Conflict {
                identifier: identifier.clone(),
            }),
            Self::ServerError(error) if error.retryable => Some(ClientError::TransientServer {
                status: error.status,
                status_text: error.status_text.clone(),
                body: error.body.clone(),
            }),
            Self::ServerError(error) => Some(ClientError::GenericRequest {
                status: error.status,
                status_text: error.status_text.clone(),
                body: error.body.clone(),
            }),
        }
    }
}

/// A validated, transformed submission ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedSubmission {
    pub request: PostRequest,
    pub submitted_identifier: Option<String>,
}

/// Per-form controller. Owns the form's validator, wait modal state and the
/// cached geoposition.
pub struct SubmitController<F, M, T, P> {
    kind: FormKind,
    config: Rc<ClientConfig>,
    form: F,
    modal_view: M,
    transport: T,
    page: P,
    validator: RefCell<Validator>,
    modal: RefCell<WaitModal>,
    geoposition: Cell<Option<GeoReading>>,
    in_flight: Cell<bool>,
}

impl<F, M, T, P> SubmitController<F, M, T, P>
where
    F: FormView,
    M: ModalView,
    T: Transport,
    P: Page,
{
    pub fn new(
        kind: FormKind,
        config: Rc<ClientConfig>,
        form: F,
        modal_view: M,
        transport: T,
        page: P,
    ) -> Result<Self, ConfigError> {
        let validator = Validator::new(&config.rules)?;
        let modal = WaitModal::new(modal_view.renew_href());
        Ok(Self {
            kind,
            config,
            form,
            modal_view,
            transport,
            page,
            validator: RefCell::new(validator),
            modal: RefCell::new(modal),
            geoposition: Cell::new(None),
            in_flight: Cell::new(false),
        })
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the browser glue should ask for a location fix at mount.
    pub fn wants_geoposition(&self) -> bool {
        self.kind.wants_geoposition()
    }

    /// Keep a location fix for the next submission if it is accurate enough.
    pub fn record_position(&self, reading: GeoReading) -> bool {
        if !self.wants_geoposition() {
            return false;
        }
        if reading.accuracy_m > self.config.geolocation.max_accuracy_m {
            log::info!("discarding geoposition with accuracy {}m", reading.accuracy_m);
            return false;
        }
        self.geoposition.set(Some(reading));
        true
    }

    pub fn geoposition(&self) -> Option<GeoReading> {
        self.geoposition.get()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    /// Drop the last validation result and the form's error markers, e.g.
    /// before the form is refilled with another member.
    pub fn reset_validation(&self) {
        self.validator.borrow_mut().reset(&self.form);
    }

    /// Snapshot of the wait modal.
    pub fn modal(&self) -> WaitModal {
        self.modal.borrow().clone()
    }

    /// Mutate the modal outside the submit lifecycle (payment notice,
    /// position) and re-render it.
    pub fn update_modal(&self, update: impl FnOnce(&mut WaitModal)) {
        update(&mut *self.modal.borrow_mut());
        self.render_modal();
    }

    fn render_modal(&self) {
        self.modal_view.render(&self.modal.borrow());
    }

    /// Handle a trigger click or retry. Always returns `false` so native
    /// form submission never happens.
    pub async fn submit(&self, event: Option<&dyn TriggerEvent>) -> bool {
        match self.begin(event) {
            Ok(prepared) => {
                self.send(prepared).await;
            }
            Err(error) => log::info!("submission not sent: {error}"),
        }
        false
    }

    /// Dismiss control of the modal. A pending submission keeps it open.
    pub fn dismiss(&self) -> bool {
        if self.in_flight.get() {
            return false;
        }
        self.update_modal(WaitModal::hide);
        true
    }

    /// Retry control: reset the modal, then submit again without an event.
    pub async fn retry(&self) -> bool {
        self.update_modal(WaitModal::reset);
        self.submit(None).await
    }

    /// Synchronous half of a submit, up to and including showing the modal.
    /// An error means nothing is to be sent.
    pub fn begin(&self, event: Option<&dyn TriggerEvent>) -> Result<PreparedSubmission, ClientError> {
        if let Some(event) = event {
            event.prevent_default();
        }
        if self.in_flight.get() {
            return Err(ClientError::Pending);
        }

        {
            let mut validator = self.validator.borrow_mut();
            let report = validator.validate(&self.form);
            if let Some(first) = report.first_invalid() {
                self.form.focus_and_reveal(first);
                self.form.flash_errors(&report.invalid_fields(), self.config.highlight);
                return Err(ClientError::Validation {
                    field: first.to_owned(),
                });
            }
        }

        let submission = self.collect();
        let submitted_identifier = submission.single(&self.config.fields.email).map(str::to_owned);
        let mut request = PostRequest::new(self.form.action(), submission.to_body());
        if let Some(token) = submission.single(&self.config.fields.csrf_token) {
            request = request.header(self.config.endpoints.csrf_header.clone(), token);
        }

        self.in_flight.set(true);
        self.form.set_submit_enabled(false);
        self.update_modal(WaitModal::show);

        Ok(PreparedSubmission {
            request,
            submitted_identifier,
        })
    }

    fn collect(&self) -> FormSubmission {
        let fields = &self.config.fields;
        if !self.kind.is_member() {
            return FormSubmission::serialize(&self.form.controls());
        }

        for control in self.form.controls() {
            if control.is_postal_code() && !control.value.is_empty() {
                self.form.set_value(&control.name, &postal::normalize(&control.value));
            }
        }
        let controls = self.form.controls();
        let mut submission = FormSubmission::serialize(&controls);

        if let Some(reading) = self.geoposition.get() {
            submission.insert(&fields.geoposition, reading.to_field_value());
        }
        submission.join_multi_values(&self.config.multivalue_divider);
        submission.backfill_unchecked_groups(&controls);
        submission.insert(&fields.embedder, page::embedder_url(&self.page));
        submission
    }

    /// Asynchronous half: POST and move the modal to its final state.
    pub async fn send(&self, prepared: PreparedSubmission) -> SubmissionResult {
        let response = match self.transport.post(prepared.request).await {
            Ok(response) => response,
            Err(error) => {
                log::warn!("submission request failed: {error}");
                HttpResponse::from_transport_error(&error)
            }
        };
        let result = SubmissionResult::classify(self.kind, response, prepared.submitted_identifier.as_deref());

        match result.to_error() {
            None => log::info!("submission succeeded"),
            Some(error) => log::warn!("submission failed: {error}"),
        }
        match &result {
            SubmissionResult::Success(body) => {
                let outcome = self.success_outcome(body);
                if let SuccessOutcome::Redirect { url } = &outcome {
                    self.page.navigate_top(url);
                }
                self.modal.borrow_mut().success(outcome);
            }
            SubmissionResult::ServerError(error) => {
                self.modal
                    .borrow_mut()
                    .error(&error.status_text, &error.body, error.retryable, None);
            }
            SubmissionResult::Conflict(identifier) => {
                self.modal.borrow_mut().error("Conflict", "", false, Some(identifier));
            }
        }

        self.in_flight.set(false);
        self.form.set_submit_enabled(true);
        self.render_modal();
        result
    }

    fn success_outcome(&self, body: &str) -> SuccessOutcome {
        let mode = self.kind.mode().unwrap_or(FormMode::Renew);
        if mode == FormMode::SelfServe {
            let body = body.trim();
            if body.starts_with("https://") {
                return SuccessOutcome::Redirect { url: body.to_owned() };
            }
            if body == DEMO_RESPONSE {
                return SuccessOutcome::Demo;
            }
        }
        SuccessOutcome::Done {
            target: page::done_target(&self.page, mode, &self.config.endpoints.home),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use futures::executor::block_on;

    use super::*;
    use crate::config::HighlightTimings;
    use crate::error::TransportError;
    use crate::form::Control;
    use crate::form::validator::{Rule, ValidationReport};
    use crate::modal::ModalState;
    use crate::page::tests::FakePage;

    #[derive(Default)]
    pub struct FakeForm {
        pub controls: RefCell<Vec<Control>>,
        pub focused: RefCell<Vec<String>>,
        pub flashed: RefCell<Vec<Vec<String>>>,
        pub submit_enabled: RefCell<Vec<bool>>,
        pub annotated: RefCell<Option<ValidationReport>>,
    }

    impl FakeForm {
        pub fn new(controls: Vec<Control>) -> Self {
            Self {
                controls: RefCell::new(controls),
                ..Self::default()
            }
        }

        pub fn value(&self, name: &str) -> Option<String> {
            self.controls
                .borrow()
                .iter()
                .find(|control| control.name == name)
                .map(|control| control.value.clone())
        }
    }

    impl FormView for FakeForm {
        fn controls(&self) -> Vec<Control> {
            self.controls.borrow().clone()
        }

        fn action(&self) -> String {
            String::new()
        }

        fn set_value(&self, name: &str, value: &str) {
            for control in self.controls.borrow_mut().iter_mut().filter(|control| control.name == name) {
                control.value = value.to_owned();
            }
        }

        fn set_checked_values(&self, name: &str, values: &[&str]) {
            for control in self.controls.borrow_mut().iter_mut().filter(|control| control.name == name) {
                control.checked = values.contains(&control.value.as_str());
            }
        }

        fn select_radio(&self, name: &str, value: &str) {
            for control in self.controls.borrow_mut().iter_mut().filter(|control| control.name == name) {
                control.checked = control.value == value;
            }
        }

        fn annotate(&self, report: &ValidationReport) {
            *self.annotated.borrow_mut() = Some(report.clone());
        }

        fn clear_annotations(&self) {
            *self.annotated.borrow_mut() = None;
        }

        fn focus_and_reveal(&self, name: &str) {
            self.focused.borrow_mut().push(name.to_owned());
        }

        fn flash_errors(&self, names: &[String], _timings: HighlightTimings) {
            self.flashed.borrow_mut().push(names.to_vec());
        }

        fn set_submit_enabled(&self, enabled: bool) {
            self.submit_enabled.borrow_mut().push(enabled);
        }
    }

    #[derive(Default)]
    pub struct FakeModalView {
        pub renders: RefCell<Vec<WaitModal>>,
    }

    impl ModalView for FakeModalView {
        fn renew_href(&self) -> String {
            "/renew-member".to_owned()
        }

        fn render(&self, modal: &WaitModal) {
            self.renders.borrow_mut().push(modal.clone());
        }
    }

    #[derive(Default)]
    pub struct ScriptedTransport {
        pub responses: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
        pub posts: RefCell<Vec<PostRequest>>,
        pub gets: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn replying(status: u16, status_text: &str, body: &str) -> Self {
            let transport = Self::default();
            transport.push(status, status_text, body);
            transport
        }

        pub fn push(&self, status: u16, status_text: &str, body: &str) {
            self.responses.borrow_mut().push_back(Ok(HttpResponse {
                status,
                status_text: status_text.to_owned(),
                body: body.to_owned(),
            }));
        }

        fn next(&self) -> Result<HttpResponse, TransportError> {
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
        }
    }

    impl Transport for ScriptedTransport {
        async fn post(&self, request: PostRequest) -> Result<HttpResponse, TransportError> {
            self.posts.borrow_mut().push(request);
            self.next()
        }

        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.gets.borrow_mut().push(url.to_owned());
            self.next()
        }
    }

    pub struct Click {
        pub prevented: Cell<bool>,
    }

    impl TriggerEvent for Click {
        fn prevent_default(&self) {
            self.prevented.set(true);
        }
    }

    type Controller = SubmitController<FakeForm, FakeModalView, ScriptedTransport, FakePage>;

    fn member_controls() -> Vec<Control> {
        vec![
            Control::new("csrf_token", crate::form::ControlKind::Hidden, "tok123"),
            Control::text("first_name", "Ann").with_rules([Rule::Required]),
            Control::text("email", "a@b.com").with_rules([Rule::Required, Rule::Email]),
            Control::text("postal_code", "a1b2c3").with_rules([Rule::PostalCode]),
            Control::checkbox("volunteer_interests", "Gardening", true),
            Control::checkbox("volunteer_interests", "Events", true),
            Control::checkbox("skills", "Carpentry", false).with_unchecked_default(""),
        ]
    }

    fn controller(kind: FormKind, controls: Vec<Control>, transport: ScriptedTransport, page: FakePage) -> Controller {
        SubmitController::new(
            kind,
            Rc::new(ClientConfig::default()),
            FakeForm::new(controls),
            FakeModalView::default(),
            transport,
            page,
        )
        .unwrap()
    }

    fn create(transport: ScriptedTransport) -> Controller {
        controller(
            FormKind::Member(FormMode::Create),
            member_controls(),
            transport,
            FakePage {
                document_url: "https://members.example/new-member".into(),
                ..FakePage::default()
            },
        )
    }

    fn body_pairs(request: &PostRequest) -> Vec<(String, String)> {
        request
            .body
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(name, value)| {
                let value = value.replace('+', " ");
                (name.to_owned(), crate::http::decode_uri_component(&value).into_owned())
            })
            .collect()
    }

    fn field(request: &PostRequest, name: &str) -> Option<String> {
        body_pairs(request)
            .into_iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    #[test]
    fn invalid_form_sends_nothing_and_focuses_first_error() {
        let mut controls = member_controls();
        controls[1].value.clear();
        controls[2].value.clear();
        let controller = controller(
            FormKind::Member(FormMode::Create),
            controls,
            ScriptedTransport::default(),
            FakePage::default(),
        );
        let click = Click { prevented: Cell::new(false) };

        assert!(matches!(
            controller.begin(Some(&click)),
            Err(ClientError::Validation { field }) if field == "first_name"
        ));
        assert!(!block_on(controller.submit(Some(&click))));
        assert!(click.prevented.get());
        assert!(controller.transport.posts.borrow().is_empty());
        assert_eq!(*controller.form.focused.borrow(), ["first_name", "first_name"]);
        assert_eq!(controller.form.flashed.borrow()[0], ["first_name", "email"]);
        assert_eq!(controller.modal().state(), ModalState::Idle);
    }

    #[test]
    fn member_submission_is_transformed() {
        let controller = controller(
            FormKind::Member(FormMode::Create),
            member_controls(),
            ScriptedTransport::replying(200, "OK", "success"),
            FakePage {
                framed: true,
                referrer: "https://danforth.example/join".into(),
                ..FakePage::default()
            },
        );
        assert!(controller.record_position(GeoReading {
            latitude: 43.65,
            longitude: -79.38,
            accuracy_m: 20.0,
        }));

        block_on(controller.submit(None));

        let posts = controller.transport.posts.borrow();
        let request = &posts[0];
        assert_eq!(request.url, "");
        assert_eq!(request.header_value("X-Requested-With"), Some("XMLHttpRequest"));
        assert_eq!(request.header_value("X-CSRFToken"), Some("tok123"));
        assert_eq!(field(request, "postal_code").as_deref(), Some("A1B 2C3"));
        assert_eq!(controller.form.value("postal_code").as_deref(), Some("A1B 2C3"));
        assert_eq!(field(request, "geoposition").as_deref(), Some("43.65, -79.38"));
        assert_eq!(field(request, "volunteer_interests").as_deref(), Some("Gardening; Events"));
        assert_eq!(field(request, "skills").as_deref(), Some(""));
        assert_eq!(field(request, "_embedder").as_deref(), Some("https://danforth.example/join"));
    }

    #[test]
    fn inaccurate_position_is_discarded() {
        let controller = create(ScriptedTransport::replying(200, "OK", ""));
        assert!(!controller.record_position(GeoReading {
            latitude: 43.0,
            longitude: -79.0,
            accuracy_m: 1500.0,
        }));
        block_on(controller.submit(None));
        assert_eq!(field(&controller.transport.posts.borrow()[0], "geoposition"), None);
    }

    #[test]
    fn geoposition_is_reused_not_cleared() {
        let transport = ScriptedTransport::replying(500, "Internal Server Error", "");
        transport.push(200, "OK", "");
        let controller = create(transport);
        controller.record_position(GeoReading {
            latitude: 1.5,
            longitude: 2.5,
            accuracy_m: 10.0,
        });
        block_on(controller.submit(None));
        block_on(controller.retry());
        let posts = controller.transport.posts.borrow();
        assert_eq!(posts.len(), 2);
        assert_eq!(field(&posts[1], "geoposition").as_deref(), Some("1.5, 2.5"));
    }

    #[test]
    fn create_success_offers_done_home() {
        let controller = create(ScriptedTransport::replying(200, "OK", "ok"));
        block_on(controller.submit(None));
        let modal = controller.modal();
        assert_eq!(modal.state(), ModalState::Success);
        assert_eq!(modal.outcome(), Some(&SuccessOutcome::Done { target: "/".into() }));
        assert!(!controller.is_in_flight());
        assert_eq!(*controller.form.submit_enabled.borrow(), [false, true]);
    }

    #[test]
    fn self_serve_redirects_top_window_to_payment() {
        let url = "https://www.paypal.com/cgi-bin/webscr?invoice=abc";
        let controller = controller(
            FormKind::Member(FormMode::SelfServe),
            member_controls(),
            ScriptedTransport::replying(200, "OK", url),
            FakePage::default(),
        );
        block_on(controller.submit(None));
        assert_eq!(*controller.page.top_navigations.borrow(), [url]);
        assert_eq!(controller.modal().outcome(), Some(&SuccessOutcome::Redirect { url: url.into() }));
    }

    #[test]
    fn self_serve_demo_shows_notice_without_redirect() {
        let controller = controller(
            FormKind::Member(FormMode::SelfServe),
            member_controls(),
            ScriptedTransport::replying(200, "OK", "demo"),
            FakePage::default(),
        );
        block_on(controller.submit(None));
        assert!(controller.page.top_navigations.borrow().is_empty());
        assert_eq!(controller.modal().outcome(), Some(&SuccessOutcome::Demo));
    }

    #[test]
    fn self_serve_ignores_geoposition() {
        let controller = controller(
            FormKind::Member(FormMode::SelfServe),
            member_controls(),
            ScriptedTransport::replying(200, "OK", "success"),
            FakePage::default(),
        );
        assert!(!controller.wants_geoposition());
        assert!(!controller.record_position(GeoReading {
            latitude: 1.0,
            longitude: 1.0,
            accuracy_m: 1.0,
        }));
    }

    #[test]
    fn server_error_is_retryable() {
        let controller = create(ScriptedTransport::replying(500, "Internal Server Error", "oops"));
        block_on(controller.submit(None));
        let modal = controller.modal();
        assert!(modal.retry_visible());
        assert_eq!(modal.message(), "Internal Server Error: oops");
    }

    #[test]
    fn client_error_is_not_retryable() {
        let controller = create(ScriptedTransport::replying(400, "Bad Request", "bad email"));
        block_on(controller.submit(None));
        let modal = controller.modal();
        assert_eq!(modal.state(), ModalState::Error);
        assert!(!modal.retry_visible());
        assert_eq!(modal.message(), "Bad Request: bad email");
    }

    #[test]
    fn create_conflict_links_to_renew_with_email() {
        let controller = create(ScriptedTransport::replying(409, "Conflict", ""));
        block_on(controller.submit(None));
        let modal = controller.modal();
        assert_eq!(modal.state(), ModalState::ErrorConflict);
        assert_eq!(modal.renew_href(), "/renew-member#a%40b.com");

        controller.update_modal(WaitModal::reset);
        assert_eq!(controller.modal().renew_href(), "/renew-member");
    }

    #[test]
    fn renew_conflict_is_a_generic_error() {
        let controller = controller(
            FormKind::Member(FormMode::Renew),
            member_controls(),
            ScriptedTransport::replying(409, "Conflict", "exists"),
            FakePage::default(),
        );
        block_on(controller.submit(None));
        assert_eq!(controller.modal().state(), ModalState::Error);
    }

    #[test]
    fn transport_failure_reads_as_status_zero() {
        let controller = create(ScriptedTransport::default());
        let result = block_on(async {
            let prepared = controller.begin(None).unwrap();
            controller.send(prepared).await
        });
        let SubmissionResult::ServerError(error) = result else {
            panic!("expected server error");
        };
        assert_eq!(error.status, 0);
        assert!(!error.retryable);
        assert!(controller.modal().message().starts_with("error: "));
    }

    #[test]
    fn second_trigger_while_pending_is_ignored() {
        let controller = create(ScriptedTransport::replying(200, "OK", ""));
        let first = controller.begin(None).unwrap();
        assert!(controller.modal().is_pending());
        assert!(matches!(controller.begin(None), Err(ClientError::Pending)));
        block_on(controller.send(first));
        assert!(controller.begin(None).is_ok());
    }

    #[test]
    fn retry_resets_and_resubmits() {
        let transport = ScriptedTransport::replying(503, "Service Unavailable", "");
        transport.push(200, "OK", "");
        let controller = create(transport);
        block_on(controller.submit(None));
        assert!(controller.modal().retry_visible());

        block_on(controller.retry());
        let renders = controller.modal_view.renders.borrow();
        assert!(renders.iter().any(|modal| modal.state() == ModalState::Idle));
        assert_eq!(controller.modal().state(), ModalState::Success);
    }

    #[test]
    fn authorization_form_keeps_raw_shape() {
        let controls = vec![
            Control::new("csrf_token", crate::form::ControlKind::Hidden, "tok"),
            Control::text("email", "x@y.com").with_rules([Rule::Required]),
            Control::checkbox("roles", "admin", true),
            Control::checkbox("roles", "", true),
        ];
        let controller = controller(
            FormKind::Authorization,
            controls,
            ScriptedTransport::replying(409, "Conflict", "dup"),
            FakePage::default(),
        );
        controller.record_position(GeoReading {
            latitude: 1.0,
            longitude: 1.0,
            accuracy_m: 1.0,
        });
        block_on(controller.submit(None));
        let posts = controller.transport.posts.borrow();
        let pairs = body_pairs(&posts[0]);
        assert_eq!(pairs.iter().filter(|(name, _)| name == "roles").count(), 2);
        assert!(pairs.iter().all(|(name, _)| name != "geoposition" && name != "_embedder"));
        assert_eq!(controller.modal().state(), ModalState::Error);
    }

    #[test]
    fn results_map_to_error_taxonomy() {
        let response = |status| HttpResponse {
            status,
            status_text: "x".into(),
            body: "y".into(),
        };
        let create = FormKind::Member(FormMode::Create);
        assert!(matches!(
            SubmissionResult::classify(create, response(502), None).to_error(),
            Some(ClientError::TransientServer { status: 502, .. })
        ));
        assert!(matches!(
            SubmissionResult::classify(create, response(409), Some("a@b.com")).to_error(),
            Some(ClientError::Conflict { .. })
        ));
        assert!(matches!(
            SubmissionResult::classify(create, response(403), None).to_error(),
            Some(ClientError::GenericRequest { status: 403, .. })
        ));
        assert!(SubmissionResult::classify(create, response(201), None).to_error().is_none());
    }

    #[test]
    fn dismissed_error_reopens_as_pending() {
        let transport = ScriptedTransport::replying(400, "Bad Request", "bad email");
        transport.push(200, "OK", "");
        let controller = create(transport);
        block_on(controller.submit(None));
        assert_eq!(controller.modal().state(), ModalState::Error);

        assert!(controller.dismiss());
        assert!(!controller.modal().is_visible());
        assert!(!controller.modal_view.renders.borrow().last().unwrap().is_visible());

        let prepared = controller.begin(None).unwrap();
        let modal = controller.modal();
        assert!(modal.is_visible());
        assert_eq!(modal.state(), ModalState::Pending);
        assert!(!controller.dismiss());
        assert!(controller.modal().is_visible());
        block_on(controller.send(prepared));
        assert_eq!(controller.modal().state(), ModalState::Success);
    }
}
