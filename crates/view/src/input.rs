//! Tool-input events and the map updates they carry.

use serde_json::{Map, Value};
use tracing::info;

use crate::widget::{LatLng, Widget};

/// Arguments of a tool call, forwarded by the host to the view.
///
/// Any subset of the tool's fields may be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolInput {
    pub arguments: Option<Map<String, Value>>,
}

impl ToolInput {
    /// Wrap raw arguments. Anything but an object counts as no arguments.
    pub fn new(arguments: Value) -> Self {
        match arguments {
            Value::Object(map) => Self {
                arguments: Some(map),
            },
            _ => Self::default(),
        }
    }
}

impl From<Value> for ToolInput {
    fn from(arguments: Value) -> Self {
        Self::new(arguments)
    }
}

/// The recognised subset of a tool input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MapUpdate {
    pub center: Option<LatLng>,
    pub zoom: Option<f64>,
}

impl MapUpdate {
    /// Extract the fields the map understands.
    ///
    /// The center is taken only when both `lat` and `lng` are numbers; `zoom`
    /// only when it is a number. Everything else is ignored.
    pub fn from_arguments(arguments: &Map<String, Value>) -> Self {
        let number = |key: &str| arguments.get(key).and_then(Value::as_f64);
        let center = match (number("lat"), number("lng")) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        };
        Self {
            center,
            zoom: number("zoom"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_none() && self.zoom.is_none()
    }

    pub fn apply(&self, widget: &mut impl Widget) {
        if let Some(center) = self.center {
            info!(lat = center.lat, lng = center.lng, "panning map");
            widget.set_center(center);
        }
        if let Some(zoom) = self.zoom {
            info!(zoom, "setting zoom");
            widget.set_zoom(zoom);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: Value) -> MapUpdate {
        match value {
            Value::Object(map) => MapUpdate::from_arguments(&map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn full_update() {
        let u = update(json!({"lat": 47, "lng": -122, "zoom": 10}));
        assert_eq!(u.center, Some(LatLng::new(47.0, -122.0)));
        assert_eq!(u.zoom, Some(10.0));
    }

    #[test]
    fn zoom_only() {
        let u = update(json!({"zoom": 5}));
        assert_eq!(u.center, None);
        assert_eq!(u.zoom, Some(5.0));
    }

    #[test]
    fn center_needs_both_coordinates() {
        let u = update(json!({"lat": 10}));
        assert!(u.is_empty());
    }

    #[test]
    fn wrong_types_are_ignored() {
        let u = update(json!({"lat": "47", "lng": -122, "zoom": null}));
        assert!(u.is_empty());
    }

    #[test]
    fn non_object_input_has_no_arguments() {
        assert_eq!(ToolInput::new(json!([1, 2])).arguments, None);
        assert!(ToolInput::from(json!({"zoom": 1})).arguments.is_some());
    }
}
