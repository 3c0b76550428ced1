//! Google Maps JS API through `js_sys::Reflect`; the script tag is loaded
//! by the page before the wasm module starts.

use std::cell::RefCell;

use deca_protocol::MemberRecord;
use js_sys::Array;
use zoon::wasm_bindgen::{closure::Closure, JsValue};
use zoon::web_sys::Element;

use super::directory::render_member;
use super::dom::{self, js_error, query_document_all};
use super::js::{self, call, get, global, object};
use crate::directory::LatLng;
use crate::directory::map::{Bounds, HeatmapStyle, MapSurface};

pub const CANVAS_ID: &str = "map-canvas";
const INFO_TEMPLATE_ID: &str = "memberInfoTemplate";
const NOT_SHOWN_ID: &str = "membersNotShowing";
const SPINNER_ID: &str = "loadSpinner";
const HEATMAP_CONTROL_CLASS: &str = "heatmap-btn";

fn construct(path: &[&str], args: &[JsValue]) -> Result<JsValue, JsValue> {
    let constructor = get(&global(&["google", "maps"])?, path)?;
    js::construct(&constructor, args)
}

fn lat_lng(point: LatLng) -> Result<JsValue, JsValue> {
    construct(&["LatLng"], &[point.lat.into(), point.lng.into()])
}

fn report(action: &str, result: Result<JsValue, JsValue>) -> Option<JsValue> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            log::error!("google maps: {action} failed: {}", js_error(&error));
            None
        }
    }
}

struct PlacedMarker {
    marker: JsValue,
    info_window: JsValue,
}

pub struct GoogleMapSurface {
    canvas: Element,
    map: JsValue,
    heatmap: JsValue,
    markers: RefCell<Vec<PlacedMarker>>,
    marker_listeners: RefCell<Vec<Closure<dyn FnMut()>>>,
}

impl GoogleMapSurface {
    pub fn new(canvas: Element) -> Result<Self, JsValue> {
        let map = construct(&["Map"], &[canvas.clone().into(), object(&[])])?;
        let heatmap = construct(&["visualization", "HeatmapLayer"], &[object(&[])])?;
        Ok(Self {
            canvas,
            map,
            heatmap,
            markers: RefCell::new(Vec::new()),
            marker_listeners: RefCell::new(Vec::new()),
        })
    }

    pub fn resize(&self, height_px: f64) {
        dom::set_style(&self.canvas, "height", &format!("{height_px}px"));
    }

    /// Marker clicks go to the mounted [`MemberMap`](crate::directory::map::MemberMap),
    /// which owns this surface.
    fn click_handler(marker: usize) -> Closure<dyn FnMut()> {
        Closure::wrap(Box::new(move || {
            super::mount::with_member_map(|map| map.on_marker_click(marker));
        }) as Box<dyn FnMut()>)
    }
}

impl MapSurface for GoogleMapSurface {
    fn center(&self, center: LatLng, zoom: u8) {
        let Some(center) = report("center", lat_lng(center)) else {
            return;
        };
        report("setCenter", call(&self.map, "setCenter", &[center]));
        report("setZoom", call(&self.map, "setZoom", &[zoom.into()]));
    }

    fn add_marker(&self, marker: usize, position: LatLng, member: &MemberRecord) {
        let Some(position) = report("marker position", lat_lng(position)) else {
            return;
        };
        let Some(placed) = report("Marker", construct(&["Marker"], &[object(&[("position", position)])])) else {
            return;
        };
        let content = render_member(INFO_TEMPLATE_ID, member)
            .map(|element| element.outer_html())
            .unwrap_or_default();
        let Some(info_window) = report(
            "InfoWindow",
            construct(&["InfoWindow"], &[object(&[("content", content.into())])]),
        ) else {
            return;
        };

        let handler = Self::click_handler(marker);
        if let Ok(event) = global(&["google", "maps", "event"]) {
            report(
                "addListener",
                call(&event, "addListener", &[placed.clone(), "click".into(), handler.as_ref().clone()]),
            );
        }
        self.marker_listeners.borrow_mut().push(handler);
        self.markers.borrow_mut().push(PlacedMarker {
            marker: placed,
            info_window,
        });
    }

    fn set_heatmap_points(&self, points: &[LatLng]) {
        let data: Array = points.iter().filter_map(|point| lat_lng(*point).ok()).collect();
        report("heatmap data", call(&self.heatmap, "setData", &[data.into()]));
    }

    fn fit_bounds(&self, bounds: Bounds) {
        let (Ok(south_west), Ok(north_east)) = (lat_lng(bounds.south_west), lat_lng(bounds.north_east)) else {
            return;
        };
        if let Some(bounds) = report("LatLngBounds", construct(&["LatLngBounds"], &[south_west, north_east])) {
            report("fitBounds", call(&self.map, "fitBounds", &[bounds]));
        }
    }

    fn set_markers_visible(&self, visible: bool) {
        let target = if visible { self.map.clone() } else { JsValue::NULL };
        for placed in self.markers.borrow().iter() {
            report("marker setMap", call(&placed.marker, "setMap", &[target.clone()]));
        }
    }

    fn set_heatmap_visible(&self, visible: bool) {
        let target = if visible { self.map.clone() } else { JsValue::NULL };
        report("heatmap setMap", call(&self.heatmap, "setMap", &[target]));
    }

    fn apply_heatmap_style(&self, style: &HeatmapStyle) {
        let gradient = style.gradient.as_ref().map_or(JsValue::NULL, |stops| {
            stops.iter().map(|stop| JsValue::from_str(stop)).collect::<Array>().into()
        });
        let radius = style.radius.map_or(JsValue::NULL, JsValue::from);
        let opacity = style.opacity.map_or(JsValue::NULL, JsValue::from);
        for (key, value) in [("gradient", gradient), ("radius", radius), ("opacity", opacity)] {
            report("heatmap set", call(&self.heatmap, "set", &[key.into(), value]));
        }
    }

    fn open_info_window(&self, marker: usize) {
        if let Some(placed) = self.markers.borrow().get(marker) {
            report("open info", call(&placed.info_window, "open", &[self.map.clone(), placed.marker.clone()]));
        }
    }

    fn close_info_window(&self, marker: usize) {
        if let Some(placed) = self.markers.borrow().get(marker) {
            report("close info", call(&placed.info_window, "close", &[]));
        }
    }

    fn set_not_shown(&self, count: usize) {
        if let Some(element) = dom::by_id(NOT_SHOWN_ID) {
            element.set_text_content(Some(&count.to_string()));
        }
    }

    fn set_heatmap_controls_enabled(&self, enabled: bool) {
        for control in query_document_all(&format!(".{HEATMAP_CONTROL_CLASS}")) {
            dom::set_class(&control, "disabled", !enabled);
        }
    }

    fn finish_loading(&self) {
        if let Some(spinner) = dom::by_id(SPINNER_ID) {
            dom::set_hidden(&spinner, true);
        }
    }
}
