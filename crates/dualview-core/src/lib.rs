//! Dualview Core - Control/Display Synchronization Library
//!
//! This crate provides the pieces shared by the operator ("control") surface
//! and the borderless output ("display") surface:
//! - Fit geometry mapping a 16:9 source into the 2880x960 output canvas
//! - Manual pan/zoom transform state
//! - A typed relay channel between the two surfaces
//! - Playback drivers with loop handling and telemetry sampling
//! - Local media scanning and the `local-media:` URL scheme
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Dualview Core                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────┐    DisplayMessage     ┌──────────────┐         │
//! │  │   Control    │ ────────────────────▶ │   Display    │         │
//! │  │   Surface    │ ◀──────────────────── │   Surface    │         │
//! │  └──────┬───────┘    ControlMessage     └──────┬───────┘         │
//! │         │                                      │                 │
//! │         │ HostRequest                  ┌───────┴──────┐          │
//! │  ┌──────┴───────┐                      │   Playback   │          │
//! │  │ Window Host  │                      │    Driver    │          │
//! │  │  + Library   │                      └───────┬──────┘          │
//! │  └──────────────┘                              │                 │
//! │                  ┌──────────────┐      ┌───────┴──────┐          │
//! │                  │  Transform   │ ───▶ │   Geometry   │          │
//! │                  │    State     │      │    Engine    │          │
//! │                  └──────────────┘      └──────────────┘          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod geometry;
pub mod transform;
pub mod relay;
pub mod control;
pub mod player;
pub mod display;
pub mod runtime;
pub mod library;
pub mod host;
pub mod clock;
pub mod youtube;

pub use error::{Error, Result};
pub use types::*;
pub use config::AppConfig;
pub use geometry::{compute_rect, escapes, PreviewGeometry, Rect, RenderTransform};
pub use relay::{
    connect, ControlEndpoint, ControlInbox, ControlMessage, DisplayEndpoint, DisplayInbox,
    DisplayMessage, HostEndpoint, HostRequest, Relay,
};
pub use control::{ControlSurface, PreviewSnapshot, TransportView};
pub use player::{
    ActiveSource, LoopAction, LoopController, MediaElement, PlaybackDriver, ReadyLatch, SimulatedMedia,
};
pub use display::{DisplaySurface, RenderFrame, RenderedSource};
pub use runtime::{DisplayRuntime, EmbedLoader, Shutdown, SimulatedEmbed};
pub use library::{format_size, media_url_from_path, path_from_media_url, scan_folder};
pub use host::{display_label, HeadlessHost, Monitor, WindowHost};
pub use youtube::extract_video_id;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Dualview Core initialized");
}
