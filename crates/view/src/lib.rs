//! View side of an app-backed tool.
//!
//! An [`App`] is the per-surface object living in the embedded frame. It
//! connects to its [`Host`], brings up a map [`Widget`] through a
//! [`WidgetLoader`], and applies tool inputs the host forwards. Widget
//! startup and tool inputs race each other; every input waits on the same
//! [`Readiness`] gate, so an input that wins the race is held until the
//! widget exists and is applied then, with the values it arrived with.
//!
//! # Example
//!
//! ```ignore
//! use view::{App, host};
//!
//! let (host, mut link) = host::channel();
//! let app = App::new(host, loader);
//! let running = tokio::spawn(app.run());
//!
//! link.establish();
//! link.send_tool_input(serde_json::json!({ "lat": 47, "lng": -122, "zoom": 10 }));
//! ```

mod app;
mod error;
pub mod gate;
pub mod host;
mod input;
mod widget;

pub use app::{App, AppConfig, AppState, DEFAULT_BOOTSTRAP_TIMEOUT, DEFAULT_CONNECT_TIMEOUT};
pub use error::{Error, Result};
pub use gate::{GateClosed, ReadyGate, Readiness};
pub use host::{AppInfo, ChannelHost, Handshake, Host, HostLink};
pub use input::{MapUpdate, ToolInput};
pub use widget::{LatLng, MapOptions, Widget, WidgetLoader};
