//! The app instance: host handshake, widget bootstrap, tool-input handling.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use crate::gate::{self, ReadyGate, Readiness};
use crate::host::{Handshake, Host};
use crate::input::MapUpdate;
use crate::widget::{MapOptions, WidgetLoader};
use crate::{Error, Result};

/// Default bound on the host handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on loading and constructing the widget.
pub const DEFAULT_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(60);

/// Lifecycle of an app instance.
#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Disconnected,
    /// Connected; the widget is still initializing.
    Connected,
    Ready,
    /// Startup failed. Terminal.
    Failed(Error),
}

/// Startup parameters.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub handshake: Handshake,
    pub map: MapOptions,
    /// `None` waits forever.
    pub connect_timeout: Option<Duration>,
    /// `None` waits forever.
    pub bootstrap_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            handshake: Handshake::default(),
            map: MapOptions::default(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            bootstrap_timeout: Some(DEFAULT_BOOTSTRAP_TIMEOUT),
        }
    }
}

type SharedWidget<L> = Arc<Mutex<<L as WidgetLoader>::Widget>>;

/// One embedded map surface.
///
/// Owns its host connection and at most one widget. Nothing is shared with
/// other instances.
pub struct App<H, L> {
    host: H,
    loader: L,
    config: AppConfig,
    state: watch::Sender<AppState>,
}

impl<H, L> App<H, L>
where
    H: Host,
    L: WidgetLoader,
{
    pub fn new(host: H, loader: L) -> Self {
        let (state, _) = watch::channel(AppState::Disconnected);
        Self {
            host,
            loader,
            config: AppConfig::default(),
            state,
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Run the instance until the host goes away or startup fails.
    ///
    /// After connecting, widget bootstrap and tool-input handling proceed
    /// side by side on this task. Inputs are handled one at a time in arrival
    /// order, each waiting on widget readiness, so an input that arrives
    /// before the widget exists is applied as soon as it does. Returns the
    /// final state.
    pub async fn run(self) -> AppState {
        let App {
            mut host,
            mut loader,
            config,
            state,
        } = self;

        if let Err(e) = connect(&mut host, &config).await {
            error!(error = %e, "startup error");
            state.send_replace(AppState::Failed(e));
            return state.borrow().clone();
        }
        info!("connected to host");
        state.send_replace(AppState::Connected);

        let (ready, readiness) = gate::gate();
        let startup = async {
            match bootstrap(&mut loader, &config, ready).await {
                Ok(()) => {
                    state.send_replace(AppState::Ready);
                }
                Err(e) => {
                    error!(error = %e, "failed to initialize map");
                    state.send_replace(AppState::Failed(e));
                }
            }
        };

        tokio::join!(startup, handle_inputs::<H, L>(&mut host, readiness));

        let final_state = state.borrow().clone();
        debug!(state = ?final_state, "app instance stopped");
        final_state
    }
}

async fn connect<H: Host>(host: &mut H, config: &AppConfig) -> Result<()> {
    bounded(config.connect_timeout, host.connect(&config.handshake))
        .await
        .map_err(Error::ConnectTimeout)?
}

/// Load and construct the widget, then open the gate. On failure the gate is
/// dropped unresolved.
async fn bootstrap<L: WidgetLoader>(
    loader: &mut L,
    config: &AppConfig,
    ready: ReadyGate<SharedWidget<L>>,
) -> Result<()> {
    info!("initializing map");
    let widget = bounded(config.bootstrap_timeout, async {
        loader.load_scripts().await?;
        loader.construct(&config.map).await
    })
    .await
    .map_err(Error::BootstrapTimeout)??;

    info!("map initialized");
    ready.resolve(Arc::new(Mutex::new(widget)));
    loader.ready();
    Ok(())
}

async fn handle_inputs<H: Host, L: WidgetLoader>(
    host: &mut H,
    readiness: Readiness<SharedWidget<L>>,
) {
    loop {
        let input = tokio::select! {
            input = host.next_tool_input() => input,
            // Only taken if bootstrap fails.
            Err(_) = readiness.wait() => {
                debug!("widget unavailable, ignoring further tool input");
                return;
            }
        };
        let Some(input) = input else {
            return;
        };

        info!(arguments = ?input.arguments, "received tool input");
        let Some(arguments) = input.arguments else {
            continue;
        };
        let update = MapUpdate::from_arguments(&arguments);

        let widget = match readiness.wait().await {
            Ok(widget) => widget,
            Err(_) => {
                warn!("widget never became ready, dropping tool input");
                return;
            }
        };
        update.apply(&mut *widget.lock().await);
    }
}

async fn bounded<F: Future>(
    limit: Option<Duration>,
    future: F,
) -> std::result::Result<F::Output, Duration> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| limit),
        None => Ok(future.await),
    }
}
