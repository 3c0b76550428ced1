//! iframe-resizer's `window.parentIFrame` as the parent-frame bridge.

use js_sys::{Function, Reflect};
use zoon::wasm_bindgen::{JsCast, JsValue};
use zoon::web_sys;

use super::dom::{self, js_error};
use crate::frame::FrameBridge;

const PARENT_IFRAME: &str = "parentIFrame";

#[derive(Clone, Copy, Debug, Default)]
pub struct ParentIFrame;

impl ParentIFrame {
    fn object(&self) -> Option<JsValue> {
        let window = dom::window()?;
        let parent = Reflect::get(&window, &JsValue::from_str(PARENT_IFRAME)).ok()?;
        (!parent.is_undefined() && !parent.is_null()).then_some(parent)
    }
}

impl FrameBridge for ParentIFrame {
    fn is_available(&self) -> bool {
        self.object().is_some()
    }

    fn send_message(&self, payload: &str) {
        let Some(parent) = self.object() else {
            log::warn!("parent frame bridge disappeared before sending");
            return;
        };
        let send = Reflect::get(&parent, &JsValue::from_str("sendMessage"))
            .ok()
            .and_then(|send| send.dyn_into::<Function>().ok());
        let Some(send) = send else {
            log::warn!("`{PARENT_IFRAME}.sendMessage` is not a function");
            return;
        };
        if let Err(error) = send.call1(&parent, &JsValue::from_str(payload)) {
            log::error!("sending to parent frame failed: {}", js_error(&error));
        }
    }
}

/// String payload of a window `message` event; other payload types are
/// not for us.
pub fn message_text(event: &web_sys::Event) -> Option<String> {
    event.dyn_ref::<web_sys::MessageEvent>()?.data().as_string()
}
