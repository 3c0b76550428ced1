//! Small DOM helpers shared by the browser views.

use zoon::wasm_bindgen::{closure::Closure, JsCast, JsValue};
use zoon::web_sys::{self, Document, Element, EventTarget, HtmlElement, Window};

use crate::submit::TriggerEvent;

pub const HIDDEN_CLASS: &str = "hidden";

pub fn window() -> Option<Window> {
    web_sys::window()
}

pub fn document() -> Option<Document> {
    window()?.document()
}

pub fn by_id(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

pub fn query(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

pub fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(nodes) = root.query_selector_all(selector) else {
        log::warn!("invalid selector `{selector}`");
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|index| nodes.get(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn query_document_all(selector: &str) -> Vec<Element> {
    document()
        .and_then(|document| document.document_element())
        .map(|root| query_all(&root, selector))
        .unwrap_or_default()
}

/// Readable text of a thrown JS value.
pub fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

pub fn set_class(element: &Element, class: &str, on: bool) {
    if let Err(error) = element.class_list().toggle_with_force(class, on) {
        log::warn!("could not toggle class `{class}`: {}", js_error(&error));
    }
}

pub fn set_hidden(element: &Element, hidden: bool) {
    set_class(element, HIDDEN_CLASS, hidden);
}

pub fn set_style(element: &Element, property: &str, value: &str) {
    if let Some(element) = element.dyn_ref::<HtmlElement>() {
        if let Err(error) = element.style().set_property(property, value) {
            log::warn!("could not set style `{property}`: {}", js_error(&error));
        }
    }
}

pub fn set_attribute(element: &Element, name: &str, value: &str) {
    if let Err(error) = element.set_attribute(name, value) {
        log::warn!("could not set attribute `{name}`: {}", js_error(&error));
    }
}

pub fn focus(element: &Element) {
    if let Some(element) = element.dyn_ref::<HtmlElement>() {
        element.focus().ok();
    }
}

/// Milliseconds since the epoch, as a timer baseline.
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

impl TriggerEvent for web_sys::Event {
    fn prevent_default(&self) {
        web_sys::Event::prevent_default(self);
    }
}

/// An attached event listener; detached again on drop.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    pub fn new(target: &EventTarget, event: &'static str, handler: impl FnMut(web_sys::Event) + 'static) -> Self {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
        if let Err(error) = target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
            log::error!("could not listen to `{event}`: {}", js_error(&error));
        }
        Self {
            target: target.clone(),
            event,
            callback,
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
            .ok();
    }
}
