//! Core types shared by the control and display surfaces

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Width/height pair in pixels.
///
/// Floating point because a local file's intrinsic size is unknown (NaN)
/// until its metadata has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size not yet known (media metadata still loading)
    pub const UNKNOWN: Size = Size { width: f64::NAN, height: f64::NAN };

    /// Output canvas of the display surface (3:1 ultrawide)
    pub const OUTPUT_CANVAS: Size = Size { width: 2880.0, height: 960.0 };

    /// Fixed frame of the embedded video widget (16:9)
    pub const EMBED_SOURCE: Size = Size { width: 3840.0, height: 2160.0 };

    /// Both dimensions finite and strictly positive
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Manual offset/zoom of the video within the display frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformState {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TransformState {
    pub const IDENTITY: TransformState = TransformState {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };
}

/// Playback telemetry pushed from the display to the control surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Current position in seconds
    pub current_time: f64,
    /// Media duration in seconds (0 when unknown)
    pub duration: f64,
    pub is_playing: bool,
}

impl PlaybackState {
    /// Fraction of the media played, 0 when the duration is unknown
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 && self.duration.is_finite() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// One-shot playback intent sent to whichever driver is active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackCommand {
    Play,
    Pause,
    Seek { time: f64 },
    SeekRelative { delta: f64 },
}

impl std::fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackCommand::Play => write!(f, "play"),
            PlaybackCommand::Pause => write!(f, "pause"),
            PlaybackCommand::Seek { time } => write!(f, "seek {:.2}s", time),
            PlaybackCommand::SeekRelative { delta } => write!(f, "seek {:+.2}s", delta),
        }
    }
}

/// Restart-on-end policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Off,
    Infinite,
    Count,
}

impl std::fmt::Display for LoopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopMode::Off => write!(f, "off"),
            LoopMode::Infinite => write!(f, "infinite"),
            LoopMode::Count => write!(f, "count"),
        }
    }
}

/// Loop policy; `count` is only consulted when `mode` is `Count`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSettings {
    pub mode: LoopMode,
    pub count: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self { mode: LoopMode::Off, count: 1 }
    }
}

impl LoopSettings {
    pub fn off() -> Self {
        Self::default()
    }

    pub fn infinite() -> Self {
        Self { mode: LoopMode::Infinite, count: 1 }
    }

    /// Play `count` times in total (clamped to at least one)
    pub fn count(count: u32) -> Self {
        Self { mode: LoopMode::Count, count: count.max(1) }
    }
}

/// Policy for mapping the source aspect ratio into the output frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFitMode {
    /// Whole source visible, letterboxed
    #[default]
    Contain,
    /// Frame filled, source cropped
    Cover,
    /// Manual pan/zoom from the transform state
    None,
}

impl VideoFitMode {
    pub const ALL: [VideoFitMode; 3] = [VideoFitMode::Contain, VideoFitMode::Cover, VideoFitMode::None];

    /// Operator-facing button label
    pub fn label(&self) -> &'static str {
        match self {
            VideoFitMode::Contain => "Fit",
            VideoFitMode::Cover => "Fill",
            VideoFitMode::None => "Manual",
        }
    }
}

impl std::fmt::Display for VideoFitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoFitMode::Contain => write!(f, "contain"),
            VideoFitMode::Cover => write!(f, "cover"),
            VideoFitMode::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for VideoFitMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contain" | "fit" => Ok(VideoFitMode::Contain),
            "cover" | "fill" => Ok(VideoFitMode::Cover),
            "none" | "manual" => Ok(VideoFitMode::None),
            other => Err(format!("unknown fit mode '{}'", other)),
        }
    }
}

/// Which source panel the operator is using
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Url,
    Browse,
    Local,
}

/// Monitor rectangle in virtual-desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Snapshot of an attached monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub id: i64,
    pub label: String,
    pub bounds: Bounds,
    #[serde(default, rename = "isPrimary")]
    pub is_primary: bool,
}

/// Media file found by a folder scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFileInfo {
    pub name: String,
    pub path: PathBuf,
    /// `local-media:` URL playable by the display surface
    pub file_url: String,
    /// Size in bytes
    pub size: u64,
}
