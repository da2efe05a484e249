//! Relay channel between the control and display surfaces
//!
//! A fixed catalogue of typed messages replaces string-named events:
//! - [`DisplayMessage`]: control → display, fire-and-forget
//! - [`ControlMessage`]: display → control, fire-and-forget telemetry
//! - [`HostRequest`]: control → window host, one-way commands plus a few
//!   request/response pairs answered through `oneshot` channels
//!
//! Delivery is in order per direction with no acknowledgement. Once the
//! receiving side has been torn down, sends are dropped silently; nothing is
//! queued or retried. Request/response pairs travel on their own channel and
//! may interleave freely with one-way traffic.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Control → display messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum DisplayMessage {
    /// Switch the embedded widget to this video id; clears any local file
    LoadVideo(String),
    /// Replace the manual transform
    TransformUpdate(TransformState),
    /// Apply to whichever driver is active
    PlaybackCommand(PlaybackCommand),
    /// Logo overlay on/off
    ShowLogo(bool),
    /// Switch to the local-file driver with this `local-media:` URL
    PlayLocalFile(String),
    /// Change geometry policy
    VideoFitMode(VideoFitMode),
    /// Replace the loop policy and reset the loop counter
    LoopSettings(LoopSettings),
    /// Effective volume 0..=100, 0 meaning muted
    VolumeChange(u8),
}

impl DisplayMessage {
    /// Wire name of the channel this message travels on
    pub fn channel(&self) -> &'static str {
        match self {
            DisplayMessage::LoadVideo(_) => "load-video",
            DisplayMessage::TransformUpdate(_) => "transform-update",
            DisplayMessage::PlaybackCommand(_) => "playback-command",
            DisplayMessage::ShowLogo(_) => "show-logo",
            DisplayMessage::PlayLocalFile(_) => "play-local-file",
            DisplayMessage::VideoFitMode(_) => "video-fit-mode",
            DisplayMessage::LoopSettings(_) => "loop-settings",
            DisplayMessage::VolumeChange(_) => "volume-change",
        }
    }
}

/// Display → control messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// Playback telemetry, about four per second
    PlaybackState(PlaybackState),
    /// Embedded widget initialised, or the degraded-mode timeout elapsed
    PlayerReady,
}

impl ControlMessage {
    pub fn channel(&self) -> &'static str {
        match self {
            ControlMessage::PlaybackState(_) => "playback-state",
            ControlMessage::PlayerReady => "player-ready",
        }
    }
}

/// Control → window host requests
#[derive(Debug)]
pub enum HostRequest {
    GetDisplays(oneshot::Sender<Vec<DisplayInfo>>),
    MoveToDisplay(i64),
    SetAlwaysOnTop(bool),
    /// File dialog; answers a `local-media:` URL or `None` when cancelled
    OpenLocalFile(oneshot::Sender<Option<String>>),
    /// Folder dialog
    BrowseFolder(oneshot::Sender<Option<PathBuf>>),
    ScanFolder {
        path: PathBuf,
        reply: oneshot::Sender<Vec<LocalFileInfo>>,
    },
}

impl HostRequest {
    pub fn channel(&self) -> &'static str {
        match self {
            HostRequest::GetDisplays(_) => "get-displays",
            HostRequest::MoveToDisplay(_) => "move-to-display",
            HostRequest::SetAlwaysOnTop(_) => "set-always-on-top",
            HostRequest::OpenLocalFile(_) => "open-local-file",
            HostRequest::BrowseFolder(_) => "browse-folder",
            HostRequest::ScanFolder { .. } => "scan-folder",
        }
    }
}

/// All five ends of a freshly connected relay
pub struct Relay {
    pub control: ControlEndpoint,
    pub control_inbox: ControlInbox,
    pub display: DisplayEndpoint,
    pub display_inbox: DisplayInbox,
    pub host: HostEndpoint,
}

/// Wire up control, display and host
pub fn connect() -> Relay {
    let (to_display, display_rx) = mpsc::unbounded_channel();
    let (to_control, control_rx) = mpsc::unbounded_channel();
    let (to_host, host_rx) = mpsc::unbounded_channel();

    Relay {
        control: ControlEndpoint { to_display, to_host },
        control_inbox: ControlInbox { rx: control_rx },
        display: DisplayEndpoint { to_control },
        display_inbox: DisplayInbox { rx: display_rx },
        host: HostEndpoint { rx: host_rx },
    }
}

/// Sending half owned by the control surface
#[derive(Debug, Clone)]
pub struct ControlEndpoint {
    to_display: mpsc::UnboundedSender<DisplayMessage>,
    to_host: mpsc::UnboundedSender<HostRequest>,
}

impl ControlEndpoint {
    /// Fire-and-forget to the display surface. Returns whether the message
    /// was handed to a live surface.
    pub fn send(&self, msg: DisplayMessage) -> bool {
        let channel = msg.channel();
        match self.to_display.send(msg) {
            Ok(()) => {
                debug!(channel, "Relayed to display");
                true
            }
            Err(_) => {
                debug!(channel, "Display surface gone, message dropped");
                false
            }
        }
    }

    /// Fire-and-forget to the window host
    pub fn send_host(&self, req: HostRequest) -> bool {
        let channel = req.channel();
        if self.to_host.send(req).is_err() {
            debug!(channel, "Window host gone, request dropped");
            return false;
        }
        true
    }

    /// True once the display surface has been torn down
    pub fn display_closed(&self) -> bool {
        self.to_display.is_closed()
    }

    async fn request<T: Default>(&self, build: impl FnOnce(oneshot::Sender<T>) -> HostRequest) -> T {
        let (reply, rx) = oneshot::channel();
        if !self.send_host(build(reply)) {
            return T::default();
        }
        rx.await.unwrap_or_default()
    }

    /// Enumerate attached monitors; empty when the host is gone
    #[instrument(skip(self))]
    pub async fn get_displays(&self) -> Vec<DisplayInfo> {
        self.request(HostRequest::GetDisplays).await
    }

    /// Run the open-file dialog
    #[instrument(skip(self))]
    pub async fn open_local_file(&self) -> Option<String> {
        self.request(HostRequest::OpenLocalFile).await
    }

    /// Run the folder dialog
    #[instrument(skip(self))]
    pub async fn browse_folder(&self) -> Option<PathBuf> {
        self.request(HostRequest::BrowseFolder).await
    }

    /// List media files in `path`; empty on any failure
    #[instrument(skip(self))]
    pub async fn scan_folder(&self, path: PathBuf) -> Vec<LocalFileInfo> {
        self.request(|reply| HostRequest::ScanFolder { path, reply }).await
    }
}

/// Telemetry arriving at the control surface
#[derive(Debug)]
pub struct ControlInbox {
    rx: mpsc::UnboundedReceiver<ControlMessage>,
}

impl ControlInbox {
    /// Next message; `None` once the display surface is gone
    pub async fn recv(&mut self) -> Option<ControlMessage> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ControlMessage> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued
    pub fn drain(&mut self) -> Vec<ControlMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

/// Sending half owned by the display surface
#[derive(Debug, Clone)]
pub struct DisplayEndpoint {
    to_control: mpsc::UnboundedSender<ControlMessage>,
}

impl DisplayEndpoint {
    pub fn send(&self, msg: ControlMessage) -> bool {
        let channel = msg.channel();
        if self.to_control.send(msg).is_err() {
            debug!(channel, "Control surface gone, message dropped");
            return false;
        }
        true
    }

    pub fn control_closed(&self) -> bool {
        self.to_control.is_closed()
    }
}

/// Commands arriving at the display surface
#[derive(Debug)]
pub struct DisplayInbox {
    rx: mpsc::UnboundedReceiver<DisplayMessage>,
}

impl DisplayInbox {
    /// Next message; `None` once the control surface is gone
    pub async fn recv(&mut self) -> Option<DisplayMessage> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<DisplayMessage> {
        self.rx.try_recv().ok()
    }
}

/// Requests arriving at the window host
#[derive(Debug)]
pub struct HostEndpoint {
    rx: mpsc::UnboundedReceiver<HostRequest>,
}

impl HostEndpoint {
    pub async fn recv(&mut self) -> Option<HostRequest> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let msg = DisplayMessage::VideoFitMode(VideoFitMode::Cover);
        assert_eq!(msg.channel(), "video-fit-mode");
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"channel":"video-fit-mode","payload":"cover"}"#
        );

        let msg = DisplayMessage::LoopSettings(LoopSettings::infinite());
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"channel":"loop-settings","payload":{"mode":"infinite","count":1}}"#
        );

        assert_eq!(
            serde_json::to_string(&ControlMessage::PlayerReady).unwrap(),
            r#"{"channel":"player-ready"}"#
        );
    }

    #[test]
    fn test_message_from_wire() {
        let msg: DisplayMessage = serde_json::from_str(
            r#"{"channel":"playback-command","payload":{"type":"seek","time":42.5}}"#,
        )
        .unwrap();
        assert_eq!(msg, DisplayMessage::PlaybackCommand(PlaybackCommand::Seek { time: 42.5 }));
    }

    #[tokio::test]
    async fn test_in_order_delivery() {
        let mut relay = connect();
        relay.control.send(DisplayMessage::ShowLogo(true));
        relay.control.send(DisplayMessage::LoadVideo("dQw4w9WgXcQ".into()));
        relay.control.send(DisplayMessage::ShowLogo(false));

        assert_eq!(relay.display_inbox.recv().await, Some(DisplayMessage::ShowLogo(true)));
        assert_eq!(
            relay.display_inbox.recv().await,
            Some(DisplayMessage::LoadVideo("dQw4w9WgXcQ".into()))
        );
        assert_eq!(relay.display_inbox.recv().await, Some(DisplayMessage::ShowLogo(false)));
    }

    #[tokio::test]
    async fn test_send_to_torn_down_display_is_dropped() {
        let relay = connect();
        drop(relay.display_inbox);

        assert!(relay.control.display_closed());
        assert!(!relay.control.send(DisplayMessage::ShowLogo(true)));
    }

    #[tokio::test]
    async fn test_requests_without_host_return_empty() {
        let relay = connect();
        drop(relay.host);

        assert!(relay.control.get_displays().await.is_empty());
        assert_eq!(relay.control.open_local_file().await, None);
        assert!(relay.control.scan_folder(PathBuf::from("/nowhere")).await.is_empty());
    }

    #[tokio::test]
    async fn test_request_answered_by_host() {
        let relay = connect();
        let control = relay.control.clone();
        let mut host_end = relay.host;

        let host = tokio::spawn(async move {
            if let Some(HostRequest::BrowseFolder(reply)) = host_end.recv().await {
                let _ = reply.send(Some(PathBuf::from("/media/clips")));
            }
        });

        assert_eq!(control.browse_folder().await, Some(PathBuf::from("/media/clips")));
        host.await.unwrap();
    }
}
