//! Map page: one marker per member with coordinates, or an aggregated
//! heatmap of the same points.

use std::cell::RefCell;

use deca_protocol::MemberRecord;

use super::{LatLng, MemberDirectory, fetch_failure_alert, fetch_members};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::Transport;
use crate::page::Page;

pub const HEATMAP_GRADIENT: [&str; 14] = [
    "rgba(0, 255, 255, 0)",
    "rgba(0, 255, 255, 1)",
    "rgba(0, 191, 255, 1)",
    "rgba(0, 127, 255, 1)",
    "rgba(0, 63, 255, 1)",
    "rgba(0, 0, 255, 1)",
    "rgba(0, 0, 223, 1)",
    "rgba(0, 0, 191, 1)",
    "rgba(0, 0, 159, 1)",
    "rgba(0, 0, 127, 1)",
    "rgba(63, 0, 91, 1)",
    "rgba(127, 0, 63, 1)",
    "rgba(191, 0, 31, 1)",
    "rgba(255, 0, 0, 1)",
];

pub const HEATMAP_RADIUS: u32 = 20;
pub const HEATMAP_OPACITY: f64 = 0.2;

/// South-west / north-east corners of the plotted points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    fn around(point: LatLng) -> Self {
        Self {
            south_west: point,
            north_east: point,
        }
    }

    fn extend(&mut self, point: LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }
}

/// Heatmap layer overrides; `None` leaves the layer default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeatmapStyle {
    pub gradient: Option<Vec<String>>,
    pub radius: Option<u32>,
    pub opacity: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapMode {
    Heatmap,
    Markers,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlottedMember {
    /// Index into the directory.
    pub member: usize,
    pub position: LatLng,
}

/// Google Maps side of the page.
pub trait MapSurface {
    fn center(&self, center: LatLng, zoom: u8);

    /// Create marker `marker` with its (closed) info window. Markers start
    /// detached from the map.
    fn add_marker(&self, marker: usize, position: LatLng, member: &MemberRecord);

    fn set_heatmap_points(&self, points: &[LatLng]);

    fn fit_bounds(&self, bounds: Bounds);

    fn set_markers_visible(&self, visible: bool);

    fn set_heatmap_visible(&self, visible: bool);

    fn apply_heatmap_style(&self, style: &HeatmapStyle);

    fn open_info_window(&self, marker: usize);

    fn close_info_window(&self, marker: usize);

    fn set_not_shown(&self, count: usize);

    /// `heatmap-btn` controls are enabled while the heatmap is shown.
    fn set_heatmap_controls_enabled(&self, enabled: bool);

    fn finish_loading(&self);
}

/// Which members can be plotted and which can't.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapPlot {
    pub plotted: Vec<PlottedMember>,
    pub not_shown: usize,
    pub bounds: Option<Bounds>,
}

impl MapPlot {
    pub fn build(directory: &MemberDirectory, latlong_column: &str) -> Self {
        let mut plot = Self::default();
        for (member, record) in directory.members().iter().enumerate() {
            let text = record.text(latlong_column).unwrap_or_default();
            let Some(position) = LatLng::parse(&text) else {
                if !text.trim().is_empty() {
                    log::debug!("member #{member} has unparseable coordinates `{text}`");
                }
                plot.not_shown += 1;
                continue;
            };
            match plot.bounds.as_mut() {
                Some(bounds) => bounds.extend(position),
                None => plot.bounds = Some(Bounds::around(position)),
            }
            plot.plotted.push(PlottedMember { member, position });
        }
        plot
    }

    /// Heatmap dataset: exactly the plotted positions.
    pub fn heatmap_points(&self) -> Vec<LatLng> {
        self.plotted.iter().map(|plotted| plotted.position).collect()
    }
}

struct MapState {
    mode: MapMode,
    style: HeatmapStyle,
    open_info: Option<usize>,
}

pub struct MemberMap<S> {
    directory: MemberDirectory,
    plot: MapPlot,
    surface: S,
    state: RefCell<MapState>,
}

impl<S: MapSurface> MemberMap<S> {
    /// Plot the directory and show the initial heatmap view.
    pub fn mount(directory: MemberDirectory, surface: S, config: &ClientConfig) -> Self {
        let latlong_column = directory.column("address_latlong", &config.fields.address_latlong);
        let plot = MapPlot::build(&directory, latlong_column);

        surface.center(LatLng::new(config.map.center_lat, config.map.center_lng), config.map.zoom);
        for (marker, plotted) in plot.plotted.iter().enumerate() {
            if let Some(record) = directory.get(plotted.member) {
                surface.add_marker(marker, plotted.position, record);
            }
        }
        surface.set_not_shown(plot.not_shown);
        if let Some(bounds) = plot.bounds {
            surface.fit_bounds(bounds);
        }
        surface.set_heatmap_points(&plot.heatmap_points());

        let map = Self {
            directory,
            plot,
            surface,
            state: RefCell::new(MapState {
                mode: MapMode::Markers,
                style: HeatmapStyle::default(),
                open_info: None,
            }),
        };
        map.change_gradient();
        map.show_heatmap();
        map.surface.finish_loading();
        map
    }

    pub fn directory(&self) -> &MemberDirectory {
        &self.directory
    }

    pub fn plot(&self) -> &MapPlot {
        &self.plot
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn mode(&self) -> MapMode {
        self.state.borrow().mode
    }

    pub fn style(&self) -> HeatmapStyle {
        self.state.borrow().style.clone()
    }

    pub fn open_info_window(&self) -> Option<usize> {
        self.state.borrow().open_info
    }

    pub fn toggle_heatmap(&self) {
        match self.mode() {
            MapMode::Heatmap => self.hide_heatmap(),
            MapMode::Markers => self.show_heatmap(),
        }
    }

    fn show_heatmap(&self) {
        self.state.borrow_mut().mode = MapMode::Heatmap;
        self.surface.set_markers_visible(false);
        self.surface.set_heatmap_visible(true);
        self.surface.set_heatmap_controls_enabled(true);
    }

    fn hide_heatmap(&self) {
        self.state.borrow_mut().mode = MapMode::Markers;
        self.surface.set_markers_visible(true);
        self.surface.set_heatmap_visible(false);
        self.surface.set_heatmap_controls_enabled(false);
    }

    pub fn change_gradient(&self) {
        self.restyle(|style| {
            style.gradient = match style.gradient {
                Some(_) => None,
                None => Some(HEATMAP_GRADIENT.iter().map(|stop| (*stop).to_owned()).collect()),
            };
        });
    }

    pub fn change_radius(&self) {
        self.restyle(|style| {
            style.radius = match style.radius {
                Some(_) => None,
                None => Some(HEATMAP_RADIUS),
            };
        });
    }

    pub fn change_opacity(&self) {
        self.restyle(|style| {
            style.opacity = match style.opacity {
                Some(_) => None,
                None => Some(HEATMAP_OPACITY),
            };
        });
    }

    fn restyle(&self, change: impl FnOnce(&mut HeatmapStyle)) {
        let style = {
            let mut state = self.state.borrow_mut();
            change(&mut state.style);
            state.style.clone()
        };
        self.surface.apply_heatmap_style(&style);
    }

    /// Close every info window, then open the clicked marker's.
    pub fn on_marker_click(&self, marker: usize) {
        if marker >= self.plot.plotted.len() {
            return;
        }
        for other in 0..self.plot.plotted.len() {
            self.surface.close_info_window(other);
        }
        self.surface.open_info_window(marker);
        self.state.borrow_mut().open_info = Some(marker);
    }
}

/// Canvas height for a window of `window_height` pixels.
pub fn canvas_height(window_height: f64, ratio: f64) -> f64 {
    (window_height * ratio).max(0.0)
}

/// Fetch the list and mount the map; on failure the user gets a blocking alert.
pub async fn load<S: MapSurface>(
    transport: &impl Transport,
    page: &impl Page,
    config: &ClientConfig,
    surface: S,
) -> Result<MemberMap<S>, ClientError> {
    match fetch_members(transport, &config.endpoints.all_members).await {
        Ok(directory) => Ok(MemberMap::mount(directory, surface, config)),
        Err(error) => {
            page.alert(&fetch_failure_alert(&error));
            Err(error)
        }
    }
}
