//! The hosting runtime's side of the app connection.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::input::ToolInput;
use crate::{Error, Result};

/// Identity the app presents when connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Google Maps".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

/// Everything sent to the host during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub info: AppInfo,
    /// The app may change the set of tools it exposes.
    pub tools_list_changed: bool,
    /// Whether the host should size the frame to the app's content.
    pub auto_resize: bool,
}

impl Default for Handshake {
    fn default() -> Self {
        Self {
            info: AppInfo::default(),
            tools_list_changed: true,
            auto_resize: false,
        }
    }
}

/// A connection to the hosting runtime.
#[async_trait]
pub trait Host: Send {
    /// Establish the channel. Called once per app instance.
    async fn connect(&mut self, handshake: &Handshake) -> Result<()>;

    /// Next tool input, or `None` once the host has gone away.
    ///
    /// Must be cancel-safe: an input is never lost if the returned future is
    /// dropped before completing.
    async fn next_tool_input(&mut self) -> Option<ToolInput>;
}

/// In-process [`Host`] driven through a [`HostLink`].
#[derive(Debug)]
pub struct ChannelHost {
    live: Option<oneshot::Receiver<std::result::Result<(), String>>>,
    handshake_tx: Option<oneshot::Sender<Handshake>>,
    inputs: mpsc::UnboundedReceiver<ToolInput>,
}

/// The hosting runtime's handle on a [`ChannelHost`].
#[derive(Debug)]
pub struct HostLink {
    live: Option<oneshot::Sender<std::result::Result<(), String>>>,
    handshake_rx: Option<oneshot::Receiver<Handshake>>,
    inputs: mpsc::UnboundedSender<ToolInput>,
}

/// Create a connected pair. The handshake completes once the link side calls
/// [`HostLink::establish`].
pub fn channel() -> (ChannelHost, HostLink) {
    let (live_tx, live_rx) = oneshot::channel();
    let (handshake_tx, handshake_rx) = oneshot::channel();
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    (
        ChannelHost {
            live: Some(live_rx),
            handshake_tx: Some(handshake_tx),
            inputs: input_rx,
        },
        HostLink {
            live: Some(live_tx),
            handshake_rx: Some(handshake_rx),
            inputs: input_tx,
        },
    )
}

#[async_trait]
impl Host for ChannelHost {
    async fn connect(&mut self, handshake: &Handshake) -> Result<()> {
        if let Some(tx) = self.handshake_tx.take() {
            let _ = tx.send(handshake.clone());
        }
        let Some(live) = self.live.take() else {
            return Err(Error::Connection("already connected".to_string()));
        };

        match live.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(Error::Connection(reason)),
            Err(_) => Err(Error::Connection("host link closed".to_string())),
        }
    }

    async fn next_tool_input(&mut self) -> Option<ToolInput> {
        self.inputs.recv().await
    }
}

impl HostLink {
    /// Accept the app's connection. Returns false if already decided.
    pub fn establish(&mut self) -> bool {
        self.decide(Ok(()))
    }

    /// Refuse the app's connection.
    pub fn refuse(&mut self, reason: impl Into<String>) -> bool {
        self.decide(Err(reason.into()))
    }

    fn decide(&mut self, outcome: std::result::Result<(), String>) -> bool {
        match self.live.take() {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// The handshake the app sent, once it has started connecting.
    pub async fn handshake(&mut self) -> Option<Handshake> {
        self.handshake_rx.take()?.await.ok()
    }

    /// Deliver a tool input. Inputs sent before the connection is up are
    /// queued and delivered in order.
    pub fn send_tool_input(&self, input: impl Into<ToolInput>) -> bool {
        let sent = self.inputs.send(input.into()).is_ok();
        debug!(sent, "forwarded tool input");
        sent
    }
}
