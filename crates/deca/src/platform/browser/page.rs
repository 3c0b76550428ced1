use js_sys::Reflect;
use zoon::wasm_bindgen::{closure::Closure, JsCast, JsValue};
use zoon::web_sys::PositionOptions;

use super::dom::{self, js_error};
use crate::config::GeolocationOptions;
use crate::page::Page;
use crate::submit::GeoReading;

#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserPage;

impl Page for BrowserPage {
    fn is_framed(&self) -> bool {
        let Some(window) = dom::window() else {
            return false;
        };
        match window.top() {
            Ok(Some(top)) => !js_sys::Object::is(window.as_ref(), top.as_ref()),
            _ => false,
        }
    }

    fn referrer(&self) -> String {
        dom::document().map(|document| document.referrer()).unwrap_or_default()
    }

    fn document_url(&self) -> String {
        dom::document()
            .and_then(|document| document.url().ok())
            .unwrap_or_default()
    }

    fn fragment(&self) -> String {
        dom::window()
            .and_then(|window| window.location().hash().ok())
            .unwrap_or_default()
    }

    fn navigate(&self, url: &str) {
        if let Some(window) = dom::window() {
            if let Err(error) = window.location().set_href(url) {
                log::error!("navigation to `{url}` failed: {}", js_error(&error));
            }
        }
    }

    fn navigate_top(&self, url: &str) {
        let top = dom::window().and_then(|window| window.top().ok().flatten());
        match top {
            Some(top) => {
                if let Err(error) = top.location().set_href(url) {
                    log::error!("top navigation to `{url}` failed: {}", js_error(&error));
                }
            }
            None => self.navigate(url),
        }
    }

    fn alert(&self, message: &str) {
        if let Some(window) = dom::window() {
            window.alert_with_message(message).ok();
        }
    }
}

fn coordinate(coords: &JsValue, name: &str) -> Option<f64> {
    Reflect::get(coords, &JsValue::from_str(name)).ok()?.as_f64()
}

fn reading_of(position: &JsValue) -> Option<GeoReading> {
    let coords = Reflect::get(position, &JsValue::from_str("coords")).ok()?;
    Some(GeoReading {
        latitude: coordinate(&coords, "latitude")?,
        longitude: coordinate(&coords, "longitude")?,
        accuracy_m: coordinate(&coords, "accuracy")?,
    })
}

/// Ask for one location fix; `on_reading` runs at most once.
pub fn request_position(options: GeolocationOptions, on_reading: impl FnOnce(GeoReading) + 'static) {
    let Some(window) = dom::window() else {
        return;
    };
    let geolocation = match window.navigator().geolocation() {
        Ok(geolocation) => geolocation,
        Err(error) => {
            log::info!("geolocation unavailable: {}", js_error(&error));
            return;
        }
    };

    let success = Closure::once_into_js(move |position: JsValue| match reading_of(&position) {
        Some(reading) => on_reading(reading),
        None => log::warn!("geolocation returned a position without coordinates"),
    });
    let failure = Closure::once_into_js(move |error: JsValue| {
        log::info!("geolocation failed: {}", js_error(&error));
    });

    let position_options = PositionOptions::new();
    position_options.set_enable_high_accuracy(options.high_accuracy);
    position_options.set_timeout(options.timeout_ms);
    position_options.set_maximum_age(options.maximum_age_ms);

    if let Err(error) = geolocation.get_current_position_with_error_callback_and_options(
        success.unchecked_ref(),
        Some(failure.unchecked_ref()),
        &position_options,
    ) {
        log::warn!("geolocation request failed: {}", js_error(&error));
    }
}
