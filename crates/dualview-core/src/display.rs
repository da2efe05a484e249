//! Display surface
//!
//! Consumes relay messages and produces a [`RenderFrame`] describing what the
//! output window should show. The surface never originates state of its own:
//! transform, fit mode, loop policy, volume and logo are whatever the control
//! surface last sent. Fit mode, loop policy and volume are cached here so they
//! outlive source switches: volume is pushed to the player again on every
//! load, while fit mode is read from the cache each time a frame is rendered.

use crate::config::AppConfig;
use crate::geometry::{compute_rect, Rect, RenderTransform};
use crate::player::{ActiveSource, LoopAction, PlaybackDriver};
use crate::relay::DisplayMessage;
use crate::types::*;
use serde::Serialize;
use tracing::{debug, info};

/// Snapshot of everything drawn on the output canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub source: RenderedSource,
    pub fit_mode: VideoFitMode,
    /// Video rectangle on the canvas; `None` while the source size is unknown
    pub video_rect: Option<Rect>,
    /// Transform applied to the source-sized player element
    pub css_transform: String,
    pub logo_visible: bool,
    pub clock: String,
}

/// Serializable view of [`ActiveSource`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RenderedSource {
    Idle,
    Embedded { video_id: String },
    LocalFile { url: String },
}

impl From<&ActiveSource> for RenderedSource {
    fn from(source: &ActiveSource) -> Self {
        match source {
            ActiveSource::Embedded { video_id: None } => RenderedSource::Idle,
            ActiveSource::Embedded { video_id: Some(id) } => RenderedSource::Embedded { video_id: id.clone() },
            ActiveSource::LocalFile { url } => RenderedSource::LocalFile { url: url.clone() },
        }
    }
}

/// Output-side state machine
pub struct DisplaySurface {
    canvas: Size,
    embed_source: Size,
    transform: TransformState,
    fit_mode: VideoFitMode,
    logo_visible: bool,
    volume: u8,
    clock: String,
    driver: PlaybackDriver,
}

impl DisplaySurface {
    pub fn new(config: &AppConfig, driver: PlaybackDriver) -> Self {
        Self {
            canvas: config.canvas,
            embed_source: config.embed_source,
            transform: TransformState::IDENTITY,
            fit_mode: VideoFitMode::default(),
            logo_visible: true,
            volume: 100,
            clock: String::new(),
            driver,
        }
    }

    pub fn transform(&self) -> TransformState {
        self.transform
    }

    pub fn fit_mode(&self) -> VideoFitMode {
        self.fit_mode
    }

    pub fn logo_visible(&self) -> bool {
        self.logo_visible
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn driver(&self) -> &PlaybackDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut PlaybackDriver {
        &mut self.driver
    }

    pub fn set_clock(&mut self, text: String) {
        self.clock = text;
    }

    /// Apply one relay message
    pub fn apply(&mut self, msg: DisplayMessage) {
        debug!(channel = msg.channel(), "Display received");
        match msg {
            DisplayMessage::LoadVideo(video_id) => {
                self.driver.load_video(&video_id);
                self.reapply_cached();
            }
            DisplayMessage::PlayLocalFile(url) => {
                self.driver.play_local(&url);
                self.reapply_cached();
            }
            DisplayMessage::TransformUpdate(transform) => {
                self.transform = transform;
            }
            DisplayMessage::PlaybackCommand(command) => {
                self.driver.apply_command(command);
            }
            DisplayMessage::ShowLogo(visible) => {
                self.logo_visible = visible;
                info!(visible, "Logo overlay");
            }
            DisplayMessage::VideoFitMode(mode) => {
                self.fit_mode = mode;
                info!(fit = %mode, "Fit mode");
            }
            DisplayMessage::LoopSettings(settings) => {
                self.driver.set_loop(settings);
            }
            DisplayMessage::VolumeChange(volume) => {
                self.volume = volume.min(100);
                self.driver.set_volume(self.volume);
            }
        }
    }

    /// Loop policy lives in the driver across loads; volume must be pushed
    /// into the freshly loaded element
    fn reapply_cached(&mut self) {
        self.driver.set_volume(self.volume);
        debug!(
            fit = %self.fit_mode,
            loop_mode = %self.driver.loop_settings().mode,
            volume = self.volume,
            "Cached settings re-applied"
        );
    }

    /// Check the active element for end-of-media and run the loop policy
    pub fn poll_ended(&mut self) -> Option<LoopAction> {
        self.driver.poll_ended()
    }

    /// Telemetry for the control surface
    pub fn sample(&self) -> Option<PlaybackState> {
        self.driver.sample()
    }

    /// The embedded widget always renders at its fixed frame size; a local
    /// file reports its own once metadata is in
    fn source_size(&self) -> Size {
        if self.driver.source().is_local() {
            self.driver.source_size()
        } else {
            self.embed_source
        }
    }

    /// Geometry of the active source on the canvas; the transform only
    /// matters in manual mode
    pub fn video_rect(&self) -> Option<Rect> {
        let rect = compute_rect(self.fit_mode, &self.transform, self.source_size(), self.canvas);
        rect.is_finite().then_some(rect)
    }

    pub fn render(&self) -> RenderFrame {
        let source = self.source_size();
        RenderFrame {
            source: RenderedSource::from(self.driver.source()),
            fit_mode: self.fit_mode,
            video_rect: self.video_rect(),
            css_transform: RenderTransform::new(self.fit_mode, &self.transform, source, self.canvas).to_css(),
            logo_visible: self.logo_visible,
            clock: self.clock.clone(),
        }
    }
}
