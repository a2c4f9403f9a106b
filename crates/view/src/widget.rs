//! The third-party map widget an app instance drives.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A map position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Parameters the widget is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: f64,
    /// Required by the widget for advanced markers.
    pub map_id: String,
    /// Id of the element the widget mounts into.
    pub anchor: String,
}

impl Default for MapOptions {
    /// San Francisco at zoom 12.
    fn default() -> Self {
        Self {
            center: LatLng::new(37.7749, -122.4194),
            zoom: 12.0,
            map_id: "DEMO_MAP_ID".to_string(),
            anchor: "map".to_string(),
        }
    }
}

/// A constructed widget.
pub trait Widget: Send {
    fn set_center(&mut self, center: LatLng);
    fn set_zoom(&mut self, zoom: f64);
}

/// Brings a widget up. Both steps may suspend for network I/O.
#[async_trait]
pub trait WidgetLoader: Send {
    type Widget: Widget + 'static;

    /// Load the widget's scripts. Implementations skip work already done.
    async fn load_scripts(&mut self) -> Result<()>;

    /// Construct the widget against `options.anchor`.
    async fn construct(&mut self, options: &MapOptions) -> Result<Self::Widget>;

    /// Called once after construction, e.g. to hide a loading placeholder.
    fn ready(&mut self) {}
}
