//! Page entry point. `<body data-page="...">` names the page; its
//! controllers are built here and kept alive in a thread-local registry
//! until [`unmount`].

use std::cell::RefCell;
use std::rc::Rc;

use zoon::wasm_bindgen::{closure::Closure, JsCast, JsValue};
use zoon::web_sys::{self, Element, HtmlFormElement, HtmlInputElement, KeyboardEvent};
use zoon::{Task, TaskHandle, Timer};

use super::checkbox::watch_checkboxes;
use super::directory::{self as dom_directory, DomDirectoryView};
use super::dom::{self, Listener, js_error, query, query_all, query_document_all};
use super::form::DomForm;
use super::frame::{ParentIFrame, message_text};
use super::logger;
use super::map::{self as dom_map, GoogleMapSurface};
use super::modal::DomModal;
use super::page::{BrowserPage, request_position};
use super::signin::{self as dom_signin, DomSignInView, Gapi};
use super::transport::FetchTransport;
use crate::common::{FormKind, FormMode};
use crate::config::{CONFIG_ELEMENT_ID, ClientConfig};
use crate::directory::map::{self, MemberMap, canvas_height};
use crate::directory::renew::{self, RenewDirectory, blurs_filter};
use crate::form::postal;
use crate::frame::{FrameTimeout, SelfServeFlow};
use crate::page::Page;
use crate::selfserve::{ComboMode, JOIN_FLOW_ID, SelfServeForm, VOLUNTEER_FLOW_ID};
use crate::signin::SignInFlow;
use crate::submit::SubmitController;

type DomController = SubmitController<DomForm, DomModal, FetchTransport, BrowserPage>;
type DomSelfServe = SelfServeForm<DomForm, DomModal, FetchTransport, BrowserPage, ParentIFrame>;
type DomSignIn = SignInFlow<Gapi, DomSignInView, FetchTransport, BrowserPage>;
type DomMemberMap = MemberMap<GoogleMapSurface>;

const PAGE_ATTRIBUTE: &str = "data-page";
const RETRY_SELECTOR: &str = "#waitModalRetry";
const DISMISS_SELECTOR: &str = "[data-dismiss=\"modal\"]";
const POSTAL_CODE_SELECTOR: &str = "[data-bv-zipcode]";
const MODE_CHOOSER: &str = ".mode-chooser";
const MEMBER_SECTION_ID: &str = "newMember";
const VOLUNTEER_SECTION_ID: &str = "newVolunteer";
/// Set on `window` for the `gapi` script tag's `onload`.
const GAPI_INIT_CALLBACK: &str = "onGapiInit";
const FRAME_TICK_MS: u32 = 250;

/// Where one form lives: the form, its own wait modal and the controls
/// that submit it. The combo page carries two of these side by side.
struct FormSection {
    form: &'static str,
    modal: &'static str,
    triggers: &'static str,
}

const NEW_MEMBER: FormSection = FormSection {
    form: "#newMember form",
    modal: "#newMember .waitModal",
    triggers: "#newMember form [type=submit]",
};

const RENEW: FormSection = FormSection {
    form: "#renewMemberForm",
    modal: "#waitModal",
    triggers: "#submitRenewMember",
};

const AUTHORIZE: FormSection = FormSection {
    form: "#authorizeUser form",
    modal: "#authorizeUser .waitModal",
    triggers: "#authorizeUser form [type=submit]",
};

const JOIN: FormSection = FormSection {
    form: "#newMember form",
    modal: "#newMember .waitModal",
    triggers: "#newMember #submitNewMemberPaypal, #newMember #submitNewMemberCheque",
};

const VOLUNTEER: FormSection = FormSection {
    form: "#newVolunteer form",
    modal: "#newVolunteer .waitModal",
    triggers: "#newVolunteer form [type=submit]",
};

/// Controls inside one wait modal.
struct ModalControls {
    retry: Option<Element>,
    dismiss: Vec<Element>,
}

/// Everything a mounted page keeps alive.
#[derive(Default)]
struct Mounted {
    listeners: Vec<Listener>,
    tasks: Vec<TaskHandle>,
    member_map: Option<Rc<DomMemberMap>>,
}

thread_local! {
    static MOUNTED: RefCell<Mounted> = RefCell::new(Mounted::default());
}

fn keep(update: impl FnOnce(&mut Mounted)) {
    MOUNTED.with(|mounted| update(&mut mounted.borrow_mut()));
}

fn keep_listeners(listeners: impl IntoIterator<Item = Listener>) {
    keep(|mounted| mounted.listeners.extend(listeners));
}

/// Run `f` against the map page's [`MemberMap`] once it has loaded.
pub fn with_member_map(f: impl FnOnce(&DomMemberMap)) {
    let member_map = MOUNTED.with(|mounted| mounted.borrow().member_map.clone());
    if let Some(member_map) = member_map {
        f(&member_map);
    }
}

/// Detach every listener and cancel background tasks.
pub fn unmount() {
    let mounted = MOUNTED.with(RefCell::take);
    log::debug!(
        "unmounting {} listeners and {} tasks",
        mounted.listeners.len(),
        mounted.tasks.len()
    );
}

fn load_config() -> ClientConfig {
    let Some(element) = dom::by_id(CONFIG_ELEMENT_ID) else {
        return ClientConfig::default();
    };
    let json = element.text_content().unwrap_or_default();
    match ClientConfig::from_json(&json) {
        Ok(config) => config,
        Err(error) => {
            log::error!("ignoring `#{CONFIG_ELEMENT_ID}`, using defaults: {error}");
            ClientConfig::default()
        }
    }
}

pub fn start() {
    logger::init(log::LevelFilter::Info);
    let config = load_config();
    logger::init(config.log_level.to_level_filter());
    let config = Rc::new(config);

    let page = dom::document()
        .and_then(|document| document.body())
        .and_then(|body| body.get_attribute(PAGE_ATTRIBUTE))
        .unwrap_or_default();
    log::info!("mounting page `{page}`");

    let mounted = match page.as_str() {
        "new-member" => mount_member_form(&config, FormKind::Member(FormMode::Create), &NEW_MEMBER).map(drop),
        "renew-member" => mount_renew(&config),
        "authorize-user" => mount_member_form(&config, FormKind::Authorization, &AUTHORIZE).map(drop),
        "self-serve-join" => mount_self_serve(&config, JOIN_FLOW_ID, &JOIN, true).map(drop),
        "self-serve-volunteer" => mount_self_serve(&config, VOLUNTEER_FLOW_ID, &VOLUNTEER, false).map(drop),
        "self-serve-combo" => mount_combo(&config),
        "map-members" => mount_map(&config),
        "login" => {
            mount_login(&config);
            Ok(())
        }
        "logout" => {
            mount_logout(&config);
            Ok(())
        }
        "" => {
            log::warn!("`<body>` has no `{PAGE_ATTRIBUTE}`; nothing to mount");
            Ok(())
        }
        other => {
            log::warn!("unknown page `{other}`");
            Ok(())
        }
    };
    if let Err(error) = mounted {
        log::error!("mounting `{page}` failed: {}", js_error(&error));
    }
}

fn required(selector: &str) -> Result<Element, JsValue> {
    query_document_all(selector)
        .into_iter()
        .next()
        .ok_or_else(|| JsValue::from_str(&format!("`{selector}` not found")))
}

/// Controller over `section`'s form. Its triggers are disabled while a
/// submission is pending; its modal's retry and dismiss controls come back
/// for wiring.
fn build_controller(
    config: &Rc<ClientConfig>,
    kind: FormKind,
    section: &FormSection,
) -> Result<(DomController, Vec<Element>, ModalControls), JsValue> {
    let form: HtmlFormElement = required(section.form)?
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("`{}` is not a form", section.form)))?;
    let triggers = query_document_all(section.triggers);
    if triggers.is_empty() {
        log::warn!("no submit triggers match `{}`", section.triggers);
    }
    keep_listeners(watch_postal_codes(&form));
    keep_listeners(watch_checkboxes(&form));

    let modal = DomModal::new(required(section.modal)?);
    let controls = ModalControls {
        retry: query(modal.root(), RETRY_SELECTOR),
        dismiss: query_all(modal.root(), DISMISS_SELECTOR),
    };
    let controller = SubmitController::new(
        kind,
        config.clone(),
        DomForm::new(form, triggers.clone()),
        modal,
        FetchTransport,
        BrowserPage,
    )
    .map_err(|error| JsValue::from_str(&error.to_string()))?;
    Ok((controller, triggers, controls))
}

fn watch_postal_codes(form: &Element) -> Vec<Listener> {
    query_all(form, POSTAL_CODE_SELECTOR)
        .into_iter()
        .filter_map(|element| element.dyn_into::<HtmlInputElement>().ok())
        .map(|input| {
            let target = input.clone();
            Listener::new(&input, "keyup", move |_| {
                let value = target.value();
                let upper = postal::uppercase(&value);
                if upper != value {
                    target.set_value(&upper);
                }
            })
        })
        .collect()
}

fn mount_member_form(
    config: &Rc<ClientConfig>,
    kind: FormKind,
    section: &FormSection,
) -> Result<Rc<DomController>, JsValue> {
    let (controller, triggers, controls) = build_controller(config, kind, section)?;
    let controller = Rc::new(controller);

    let mut listeners: Vec<Listener> = triggers
        .iter()
        .map(|trigger| Listener::new(trigger, "click", submit_handler(&controller)))
        .collect();
    listeners.push(Listener::new(
        controller.form().element(),
        "submit",
        submit_handler(&controller),
    ));
    listeners.extend(modal_listeners(controls, &controller, |controller| controller));
    keep_listeners(listeners);

    if controller.wants_geoposition() {
        let located = controller.clone();
        request_position(controller.config().geolocation, move |reading| {
            located.record_position(reading);
        });
    }
    Ok(controller)
}

fn submit_handler(controller: &Rc<DomController>) -> impl FnMut(web_sys::Event) + 'static {
    let controller = controller.clone();
    move |event| {
        // `preventDefault` only counts before the handler returns.
        match controller.begin(Some(&event)) {
            Ok(prepared) => {
                let controller = controller.clone();
                Task::start(async move {
                    controller.send(prepared).await;
                });
            }
            Err(error) => log::info!("submission not sent: {error}"),
        }
    }
}

/// The modal's retry control resubmits `owner`'s form; its dismiss controls
/// close the modal unless a submission is pending.
fn modal_listeners<S: 'static>(
    controls: ModalControls,
    owner: &Rc<S>,
    controller_of: fn(&S) -> &DomController,
) -> Vec<Listener> {
    let mut listeners = Vec::new();
    if let Some(button) = controls.retry {
        let retried = owner.clone();
        listeners.push(Listener::new(&button, "click", move |event| {
            event.prevent_default();
            if !controller_of(&retried).modal().retry_visible() {
                return;
            }
            let retried = retried.clone();
            Task::start(async move {
                controller_of(&retried).retry().await;
            });
        }));
    }
    for control in controls.dismiss {
        let dismissed = owner.clone();
        listeners.push(Listener::new(&control, "click", move |event| {
            event.prevent_default();
            if !controller_of(&dismissed).dismiss() {
                log::debug!("modal stays open while the submission is pending");
            }
        }));
    }
    listeners
}

fn mount_renew(config: &Rc<ClientConfig>) -> Result<(), JsValue> {
    let controller = mount_member_form(config, FormKind::Member(FormMode::Renew), &RENEW)?;
    let list = dom::by_id(dom_directory::LIST_ID)
        .ok_or_else(|| JsValue::from_str(&format!("`#{}` not found", dom_directory::LIST_ID)))?;

    let config = config.clone();
    let task = Task::start_droppable(async move {
        let loaded = renew::load(&FetchTransport, &BrowserPage, &config, DomDirectoryView::new(list)).await;
        let Ok(directory) = loaded else {
            return;
        };
        let directory = Rc::new(directory);
        keep_listeners(directory_listeners(
            &directory,
            &controller,
            config.directory.filter_debounce_ms,
        ));
    });
    keep(|mounted| mounted.tasks.push(task));
    Ok(())
}

fn directory_listeners(
    directory: &Rc<RenewDirectory<DomDirectoryView>>,
    controller: &Rc<DomController>,
    debounce_ms: u32,
) -> Vec<Listener> {
    let mut listeners = Vec::new();

    let clicked = directory.clone();
    let controller = controller.clone();
    listeners.push(Listener::new(directory.view().list(), "click", move |event| {
        let index = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .and_then(|target| dom_directory::clicked_index(&target));
        if let Some(index) = index {
            event.prevent_default();
            clicked.select(index, &controller);
        }
    }));

    let Some(input) = dom::by_id(dom_directory::FILTER_ID).and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
    else {
        log::warn!("`#{}` not found; the list can't be filtered", dom_directory::FILTER_ID);
        return listeners;
    };

    let changed = directory.clone();
    let source = input.clone();
    listeners.push(Listener::new(&input, "change", move |_| {
        changed.on_change(&source.value());
    }));

    let typed = directory.clone();
    let source = input.clone();
    listeners.push(Listener::new(&input, "input", move |_| {
        if debounce_ms == 0 {
            typed.on_change(&source.value());
            return;
        }
        let token = typed.on_keystroke();
        let typed = typed.clone();
        let source = source.clone();
        Task::start(async move {
            Timer::sleep(debounce_ms).await;
            typed.on_settle(token, &source.value());
        });
    }));

    let source = input.clone();
    listeners.push(Listener::new(&input, "keydown", move |event| {
        let key = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key);
        if key.as_deref().is_some_and(blurs_filter) {
            source.blur().ok();
        }
    }));

    listeners
}

fn mount_self_serve(
    config: &Rc<ClientConfig>,
    flow_id: &str,
    section: &FormSection,
    payment_buttons: bool,
) -> Result<Rc<DomSelfServe>, JsValue> {
    let (controller, triggers, controls) = build_controller(config, FormKind::Member(FormMode::SelfServe), section)?;
    let framed = BrowserPage.is_framed();
    if framed {
        for container in query_document_all(".container") {
            dom::set_style(&container, "width", "100%");
        }
    }
    let flow = SelfServeFlow::new(flow_id, framed, ParentIFrame, config.frame_timeout);
    let form = Rc::new(SelfServeForm::new(controller, flow));

    let mut listeners: Vec<Listener> = triggers
        .iter()
        .map(|trigger| {
            let method = payment_buttons.then(|| trigger.get_attribute("value")).flatten();
            let clicked = form.clone();
            Listener::new(trigger, "click", move |event| {
                event.prevent_default();
                let clicked = clicked.clone();
                let method = method.clone();
                Task::start(async move {
                    clicked.on_submit_click(&event, method.as_deref(), dom::now_ms()).await;
                });
            })
        })
        .collect();

    let window = dom::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let answered = form.clone();
    listeners.push(Listener::new(&window, "message", move |event| {
        let Some(raw) = message_text(&event) else {
            return;
        };
        let answered = answered.clone();
        Task::start(async move {
            answered.on_message(&raw).await;
        });
    }));
    listeners.extend(modal_listeners(controls, &form, DomSelfServe::controller));
    keep_listeners(listeners);

    if let FrameTimeout::AfterMs(_) = config.frame_timeout {
        let ticking = form.clone();
        let task = Task::start_droppable(async move {
            loop {
                Timer::sleep(FRAME_TICK_MS).await;
                ticking.on_tick(dom::now_ms()).await;
            }
        });
        keep(|mounted| mounted.tasks.push(task));
    }
    Ok(form)
}

fn mount_combo(config: &Rc<ClientConfig>) -> Result<(), JsValue> {
    mount_self_serve(config, JOIN_FLOW_ID, &JOIN, true)?;
    mount_self_serve(config, VOLUNTEER_FLOW_ID, &VOLUNTEER, false)?;

    let listeners: Vec<Listener> = query_document_all(&format!("{MODE_CHOOSER} button"))
        .into_iter()
        .map(|button| {
            let mode = ComboMode::from_value(&button.get_attribute("value").unwrap_or_default());
            Listener::new(&button, "click", move |event| {
                event.prevent_default();
                let (member, volunteer) = mode.sections_shown();
                for (id, shown) in [(MEMBER_SECTION_ID, member), (VOLUNTEER_SECTION_ID, volunteer)] {
                    if let Some(section) = dom::by_id(id) {
                        dom::set_hidden(&section, !shown);
                    }
                }
                for chooser in query_document_all(MODE_CHOOSER) {
                    dom::set_hidden(&chooser, true);
                }
            })
        })
        .collect();
    keep_listeners(listeners);
    Ok(())
}

fn mount_map(config: &Rc<ClientConfig>) -> Result<(), JsValue> {
    let canvas = required(&format!("#{}", dom_map::CANVAS_ID))?;
    let surface = GoogleMapSurface::new(canvas)?;
    let window = dom::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let ratio = config.map.height_ratio;
    let window_height = {
        let window = window.clone();
        move || window.inner_height().ok().and_then(|height| height.as_f64()).unwrap_or_default()
    };
    surface.resize(canvas_height(window_height(), ratio));

    let mut listeners = vec![Listener::new(&window, "resize", move |_| {
        let height = canvas_height(window_height(), ratio);
        with_member_map(|member_map| member_map.surface().resize(height));
    })];
    let controls: [(&str, fn(&DomMemberMap)); 4] = [
        ("toggleHeatmap", DomMemberMap::toggle_heatmap),
        ("changeGradient", DomMemberMap::change_gradient),
        ("changeRadius", DomMemberMap::change_radius),
        ("changeOpacity", DomMemberMap::change_opacity),
    ];
    for (id, action) in controls {
        let Some(button) = dom::by_id(id) else {
            continue;
        };
        listeners.push(Listener::new(&button, "click", move |event| {
            event.prevent_default();
            with_member_map(action);
        }));
    }
    keep_listeners(listeners);

    let config = config.clone();
    let task = Task::start_droppable(async move {
        if let Ok(member_map) = map::load(&FetchTransport, &BrowserPage, &config, surface).await {
            log::info!("map shows {} members", member_map.plot().plotted.len());
            keep(|mounted| mounted.member_map = Some(Rc::new(member_map)));
        }
    });
    keep(|mounted| mounted.tasks.push(task));
    Ok(())
}

/// Run `init` now if `gapi` is loaded, otherwise from the script's `onload`.
fn when_gapi_ready(init: impl FnOnce() + 'static) {
    if Gapi.is_loaded() {
        init();
        return;
    }
    let Some(window) = dom::window() else {
        return;
    };
    let callback = Closure::once_into_js(init);
    if let Err(error) = js_sys::Reflect::set(&window, &JsValue::from_str(GAPI_INIT_CALLBACK), &callback) {
        log::error!("could not expose `{GAPI_INIT_CALLBACK}`: {}", js_error(&error));
    }
}

fn csrf_token() -> String {
    dom::by_id(dom_signin::CSRF_INPUT_ID)
        .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
        .unwrap_or_default()
}

fn mount_login(config: &Rc<ClientConfig>) {
    let flow: Rc<DomSignIn> = Rc::new(SignInFlow::new(
        config.clone(),
        Gapi,
        DomSignInView,
        FetchTransport,
        BrowserPage,
    ));
    when_gapi_ready(move || {
        let signed_in = flow.clone();
        let failed = flow.clone();
        flow.provider().render_button(
            move |id_token| {
                let signed_in = signed_in.clone();
                Task::start(async move {
                    signed_in.on_sign_in(&id_token, &csrf_token()).await;
                });
            },
            move |error| failed.on_sign_in_failure(&error),
        );
    });
}

fn mount_logout(config: &Rc<ClientConfig>) {
    let flow: Rc<DomSignIn> = Rc::new(SignInFlow::new(
        config.clone(),
        Gapi,
        DomSignInView,
        FetchTransport,
        BrowserPage,
    ));
    when_gapi_ready(move || {
        let provider = *flow.provider();
        provider.load_auth2(move || flow.sign_out());
    });
}
