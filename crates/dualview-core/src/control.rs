//! Control surface
//!
//! Owns every piece of operator state and turns each operator action into
//! relay traffic for the display surface (or the window host). The display
//! never answers with state of its own beyond playback telemetry and the
//! one-shot ready signal, so this is the single source of truth for framing,
//! loop policy, volume and overlays.

use crate::config::AppConfig;
use crate::geometry::{PreviewGeometry, Rect};
use crate::library::{self, is_video_file};
use crate::relay::{ControlEndpoint, ControlMessage, DisplayMessage, HostRequest};
use crate::types::*;
use crate::youtube::extract_video_id;
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Volume restored by un-mute when the operator never set a nonzero level
const DEFAULT_UNMUTE_VOLUME: u8 = 50;

/// Highest loop count the operator can enter
pub const MAX_LOOP_COUNT: u32 = 99;

/// Live preview of the framing, in preview pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewSnapshot {
    pub rect: Rect,
    /// `Some(true)` when part of the video falls outside the frame
    pub crop: Option<bool>,
}

/// Transport bar contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportView {
    pub label: String,
    pub progress: f64,
    pub is_playing: bool,
}

/// Operator-side state machine
pub struct ControlSurface {
    relay: ControlEndpoint,
    preview: PreviewGeometry,
    embed_source: Size,

    input_mode: InputMode,
    fit_mode: VideoFitMode,
    loop_settings: LoopSettings,
    logo_visible: bool,
    volume: u8,
    muted: bool,
    last_nonzero_volume: Option<u8>,
    always_on_top: bool,
    transform: TransformState,

    player_ready: bool,
    playback: PlaybackState,
    video_id: Option<String>,
    local_file_name: Option<String>,

    displays: Vec<DisplayInfo>,
    selected_display: Option<i64>,
    folder: Option<PathBuf>,
    files: Vec<LocalFileInfo>,
}

impl ControlSurface {
    pub fn new(config: &AppConfig, relay: ControlEndpoint) -> Self {
        Self {
            relay,
            preview: PreviewGeometry::new(config.preview_width, config.canvas),
            embed_source: config.embed_source,
            input_mode: InputMode::default(),
            fit_mode: VideoFitMode::default(),
            loop_settings: LoopSettings { mode: LoopMode::Off, count: 2 },
            logo_visible: false,
            volume: 100,
            muted: false,
            last_nonzero_volume: None,
            always_on_top: config.always_on_top,
            transform: TransformState::IDENTITY,
            player_ready: false,
            playback: PlaybackState::default(),
            video_id: None,
            local_file_name: None,
            displays: Vec::new(),
            selected_display: None,
            folder: None,
            files: Vec::new(),
        }
    }

    // Accessors

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn fit_mode(&self) -> VideoFitMode {
        self.fit_mode
    }

    pub fn loop_settings(&self) -> LoopSettings {
        self.loop_settings
    }

    pub fn logo_visible(&self) -> bool {
        self.logo_visible
    }

    /// Slider position, kept while muted
    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// What the display actually plays at
    pub fn effective_volume(&self) -> u8 {
        if self.muted {
            0
        } else {
            self.volume
        }
    }

    pub fn always_on_top(&self) -> bool {
        self.always_on_top
    }

    pub fn transform(&self) -> TransformState {
        self.transform
    }

    pub fn player_ready(&self) -> bool {
        self.player_ready
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn local_file_name(&self) -> Option<&str> {
        self.local_file_name.as_deref()
    }

    pub fn displays(&self) -> &[DisplayInfo] {
        &self.displays
    }

    pub fn selected_display(&self) -> Option<i64> {
        self.selected_display
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn files(&self) -> &[LocalFileInfo] {
        &self.files
    }

    /// Switch the source panel; no other toggle is touched
    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
    }

    // Sources

    /// Load a YouTube URL or bare video id. Anything unrecognised is ignored.
    pub fn load_video(&mut self, reference: &str) -> Option<String> {
        let Some(video_id) = extract_video_id(reference) else {
            let err = Error::InvalidVideoReference(reference.trim().to_string());
            warn!(error = %err, code = err.error_code(), "Load ignored");
            return None;
        };
        info!(video_id = %video_id, "Loading video");
        self.relay.send(DisplayMessage::LoadVideo(video_id.clone()));
        self.video_id = Some(video_id.clone());
        self.local_file_name = None;
        Some(video_id)
    }

    pub fn play_local_file(&mut self, file: &LocalFileInfo) {
        self.play_local_url(&file.file_url, &file.name);
    }

    /// Send a `local-media:` URL to the display. A visible logo would cover
    /// the file the operator just chose, so it is hidden.
    pub fn play_local_url(&mut self, url: &str, name: &str) {
        info!(name, "Playing local file");
        self.relay.send(DisplayMessage::PlayLocalFile(url.to_string()));
        self.local_file_name = Some(name.to_string());
        self.video_id = None;
        if self.logo_visible {
            self.set_logo(false);
        }
    }

    /// Drag-and-drop onto the file list; only video files are accepted
    pub fn play_dropped_path(&mut self, path: &Path) -> Result<()> {
        if !is_video_file(path) {
            return Err(Error::InvalidMediaPath(path.display().to_string()));
        }
        let url = library::media_url_from_path(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.play_local_url(&url, &name);
        Ok(())
    }

    /// Run the host's file dialog and play the pick
    pub async fn open_local_file(&mut self) -> Option<String> {
        let url = self.relay.open_local_file().await?;
        let name = library::path_from_media_url(&url)
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| url.clone());
        self.play_local_url(&url, &name);
        Some(url)
    }

    // Overlays and framing

    pub fn toggle_logo(&mut self) -> bool {
        self.set_logo(!self.logo_visible);
        self.logo_visible
    }

    fn set_logo(&mut self, visible: bool) {
        self.logo_visible = visible;
        self.relay.send(DisplayMessage::ShowLogo(visible));
    }

    /// Change the fit policy. Leaving or entering manual mode starts from an
    /// identity transform on both surfaces.
    pub fn set_fit_mode(&mut self, mode: VideoFitMode) {
        let changed = mode != self.fit_mode;
        self.fit_mode = mode;
        self.relay.send(DisplayMessage::VideoFitMode(mode));
        if changed {
            self.transform.reset_all();
            self.broadcast_transform();
        }
        info!(fit = %mode, label = mode.label(), "Fit mode set");
    }

    /// Replace the loop policy. Always sent, so re-selecting the current
    /// settings restarts the display's loop count.
    pub fn set_loop(&mut self, mode: LoopMode, count: Option<u32>) {
        let count = count
            .unwrap_or(self.loop_settings.count)
            .clamp(1, MAX_LOOP_COUNT);
        self.loop_settings = LoopSettings { mode, count };
        self.relay.send(DisplayMessage::LoopSettings(self.loop_settings));
    }

    fn broadcast_transform(&self) {
        self.relay.send(DisplayMessage::TransformUpdate(self.transform));
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        self.transform.set_scale(scale)?;
        self.broadcast_transform();
        Ok(())
    }

    /// Nudge by canvas pixels
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.transform.pan(dx, dy);
        self.broadcast_transform();
    }

    /// Mouse drag on the preview, in preview pixels
    pub fn drag_preview(&mut self, dx: f64, dy: f64) {
        let (cx, cy) = self.preview.canvas_delta(dx, dy);
        self.pan(cx, cy);
    }

    pub fn reset_center(&mut self) {
        self.transform.reset_center();
        self.broadcast_transform();
    }

    pub fn reset_all(&mut self) {
        self.transform.reset_all();
        self.broadcast_transform();
    }

    // Playback

    fn command(&self, command: PlaybackCommand) {
        debug!(%command, "Playback command");
        self.relay.send(DisplayMessage::PlaybackCommand(command));
    }

    pub fn play(&self) {
        self.command(PlaybackCommand::Play);
    }

    pub fn pause(&self) {
        self.command(PlaybackCommand::Pause);
    }

    /// Play or pause depending on the last telemetry
    pub fn toggle_play(&self) {
        if self.playback.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&self, time: f64) {
        self.command(PlaybackCommand::Seek { time: time.max(0.0) });
    }

    pub fn seek_relative(&self, delta: f64) {
        self.command(PlaybackCommand::SeekRelative { delta });
    }

    // Volume

    /// Move the slider. Zero mutes; anything above un-mutes and becomes the
    /// level restored by a later un-mute.
    pub fn set_volume(&mut self, volume: u32) -> Result<()> {
        let volume = u8::try_from(volume)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or(Error::InvalidVolume(volume))?;
        self.volume = volume;
        self.muted = volume == 0;
        if volume > 0 {
            self.last_nonzero_volume = Some(volume);
        }
        self.send_volume();
        Ok(())
    }

    pub fn toggle_mute(&mut self) -> bool {
        if self.muted {
            self.muted = false;
            if self.volume == 0 {
                self.volume = self.last_nonzero_volume.unwrap_or(DEFAULT_UNMUTE_VOLUME);
            }
        } else {
            self.muted = true;
        }
        self.send_volume();
        self.muted
    }

    fn send_volume(&self) {
        self.relay.send(DisplayMessage::VolumeChange(self.effective_volume()));
    }

    // Window host

    pub fn set_always_on_top(&mut self, on_top: bool) {
        self.always_on_top = on_top;
        self.relay.send_host(HostRequest::SetAlwaysOnTop(on_top));
    }

    /// Re-enumerate monitors. The first non-primary monitor becomes the
    /// default target if nothing valid is selected.
    #[instrument(skip(self))]
    pub async fn refresh_displays(&mut self) -> &[DisplayInfo] {
        self.displays = self.relay.get_displays().await;
        let still_there = self
            .selected_display
            .map(|id| self.displays.iter().any(|d| d.id == id))
            .unwrap_or(false);
        if !still_there {
            self.selected_display = self
                .displays
                .iter()
                .find(|d| !d.is_primary)
                .or_else(|| self.displays.first())
                .map(|d| d.id);
        }
        debug!(count = self.displays.len(), selected = ?self.selected_display, "Displays refreshed");
        &self.displays
    }

    pub fn select_display(&mut self, id: i64) -> Result<()> {
        if !self.displays.iter().any(|d| d.id == id) {
            return Err(Error::UnknownDisplay { id });
        }
        self.selected_display = Some(id);
        Ok(())
    }

    /// Send the display window to a monitor from the last enumeration
    pub fn move_to_display(&mut self, id: i64) -> Result<()> {
        self.select_display(id)?;
        self.relay.send_host(HostRequest::MoveToDisplay(id));
        info!(display_id = id, "Moving display window");
        Ok(())
    }

    /// Run the folder dialog and list what is in the chosen folder
    pub async fn browse_and_scan(&mut self) -> Option<&[LocalFileInfo]> {
        let folder = self.relay.browse_folder().await?;
        self.scan_folder(folder).await;
        Some(&self.files)
    }

    pub async fn scan_folder(&mut self, folder: PathBuf) -> &[LocalFileInfo] {
        self.files = self.relay.scan_folder(folder.clone()).await;
        info!(folder = %folder.display(), count = self.files.len(), "File list updated");
        self.folder = Some(folder);
        &self.files
    }

    /// Push every piece of display-facing state again, for a display
    /// surface that has just been (re)created
    pub fn rebroadcast(&self) {
        self.relay.send(DisplayMessage::VideoFitMode(self.fit_mode));
        self.relay.send(DisplayMessage::LoopSettings(self.loop_settings));
        self.broadcast_transform();
        self.send_volume();
        self.relay.send(DisplayMessage::ShowLogo(self.logo_visible));
    }

    /// Handle one message from the display surface
    pub fn apply(&mut self, msg: ControlMessage) {
        match msg {
            ControlMessage::PlaybackState(state) => self.playback = state,
            ControlMessage::PlayerReady => {
                if !self.player_ready {
                    info!("Display player ready");
                }
                self.player_ready = true;
            }
        }
    }

    // Views

    /// Preview rectangle and crop flag. The embedded frame size stands in for
    /// the source while a local file plays; its real size is only known on
    /// the display side.
    pub fn preview(&self) -> PreviewSnapshot {
        let rect = self.preview.preview_rect(self.fit_mode, &self.transform, self.embed_source);
        PreviewSnapshot {
            rect,
            crop: self.preview.crop_indicator(&rect),
        }
    }

    pub fn transport(&self) -> TransportView {
        TransportView {
            label: format!(
                "{} / {}",
                format_time(self.playback.current_time),
                format_time(self.playback.duration)
            ),
            progress: self.playback.progress(),
            is_playing: self.playback.is_playing,
        }
    }
}

/// `m:ss`, minutes unbounded
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{connect, DisplayInbox};

    fn surface() -> (ControlSurface, DisplayInbox) {
        let relay = connect();
        (ControlSurface::new(&AppConfig::default(), relay.control), relay.display_inbox)
    }

    fn drain(inbox: &mut DisplayInbox) -> Vec<DisplayMessage> {
        let mut out = Vec::new();
        while let Some(msg) = inbox.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_defaults() {
        let (control, _inbox) = surface();
        assert_eq!(control.input_mode(), InputMode::Url);
        assert_eq!(control.fit_mode(), VideoFitMode::Contain);
        assert_eq!(control.loop_settings(), LoopSettings { mode: LoopMode::Off, count: 2 });
        assert!(!control.logo_visible());
        assert_eq!(control.volume(), 100);
        assert!(!control.is_muted());
        assert!(control.always_on_top());
        assert!(!control.player_ready());
    }

    #[test]
    fn test_invalid_reference_sends_nothing() {
        let (mut control, mut inbox) = surface();
        assert_eq!(control.load_video("https://vimeo.com/12345"), None);
        assert_eq!(control.load_video(""), None);
        assert!(drain(&mut inbox).is_empty());
    }

    #[test]
    fn test_load_video_clears_local_label() {
        let (mut control, mut inbox) = surface();
        control.play_local_url("local-media:///a.mp4", "a.mp4");
        assert_eq!(control.local_file_name(), Some("a.mp4"));

        let id = control.load_video("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(control.local_file_name(), None);
        assert_eq!(
            drain(&mut inbox).last(),
            Some(&DisplayMessage::LoadVideo("dQw4w9WgXcQ".into()))
        );
    }

    #[test]
    fn test_local_file_hides_visible_logo() {
        let (mut control, mut inbox) = surface();
        assert!(control.toggle_logo());
        control.play_local_url("local-media:///a.mp4", "a.mp4");
        assert!(!control.logo_visible());
        assert_eq!(
            drain(&mut inbox),
            vec![
                DisplayMessage::ShowLogo(true),
                DisplayMessage::PlayLocalFile("local-media:///a.mp4".into()),
                DisplayMessage::ShowLogo(false),
            ]
        );
    }

    #[test]
    fn test_local_file_leaves_fit_and_loop() {
        let (mut control, mut inbox) = surface();
        control.set_fit_mode(VideoFitMode::Cover);
        control.set_loop(LoopMode::Infinite, None);
        drain(&mut inbox);

        control.play_local_url("local-media:///a.mp4", "a.mp4");
        assert_eq!(control.fit_mode(), VideoFitMode::Cover);
        assert_eq!(control.loop_settings().mode, LoopMode::Infinite);
        assert_eq!(drain(&mut inbox).len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_drop_accepts_only_video() {
        let (mut control, mut inbox) = surface();
        assert!(control.play_dropped_path(Path::new("/media/still.png")).is_err());
        assert!(drain(&mut inbox).is_empty());

        control.play_dropped_path(Path::new("/media/clip.MOV")).unwrap();
        assert_eq!(
            drain(&mut inbox),
            vec![DisplayMessage::PlayLocalFile("local-media:///media/clip.MOV".into())]
        );
        assert_eq!(control.local_file_name(), Some("clip.MOV"));
    }

    #[test]
    fn test_every_transform_op_broadcasts_full_state() {
        let (mut control, mut inbox) = surface();
        control.set_scale(2.0).unwrap();
        control.pan(10.0, 0.0);
        control.pan(10.0, 0.0);
        control.reset_center();

        let updates: Vec<_> = drain(&mut inbox)
            .into_iter()
            .filter_map(|m| match m {
                DisplayMessage::TransformUpdate(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(
            updates,
            vec![
                TransformState { scale: 2.0, translate_x: 0.0, translate_y: 0.0 },
                TransformState { scale: 2.0, translate_x: 10.0, translate_y: 0.0 },
                TransformState { scale: 2.0, translate_x: 20.0, translate_y: 0.0 },
                TransformState { scale: 2.0, translate_x: 0.0, translate_y: 0.0 },
            ]
        );
    }

    #[test]
    fn test_invalid_scale_not_broadcast() {
        let (mut control, mut inbox) = surface();
        assert!(matches!(control.set_scale(0.0), Err(Error::InvalidScale(_))));
        assert!(control.set_scale(f64::NAN).is_err());
        assert!(drain(&mut inbox).is_empty());
        assert_eq!(control.transform(), TransformState::IDENTITY);
    }

    #[test]
    fn test_drag_converts_preview_pixels() {
        let (mut control, mut inbox) = surface();
        control.drag_preview(60.0, -30.0);
        // 600 preview px span 2880 canvas px
        assert_eq!(
            drain(&mut inbox),
            vec![DisplayMessage::TransformUpdate(TransformState {
                scale: 1.0,
                translate_x: 288.0,
                translate_y: -144.0,
            })]
        );
    }

    #[test]
    fn test_fit_mode_change_resets_transform() {
        let (mut control, mut inbox) = surface();
        control.set_fit_mode(VideoFitMode::None);
        control.set_scale(1.5).unwrap();
        control.pan(40.0, 40.0);
        drain(&mut inbox);

        control.set_fit_mode(VideoFitMode::Cover);
        assert!(control.transform().is_identity());
        assert_eq!(
            drain(&mut inbox),
            vec![
                DisplayMessage::VideoFitMode(VideoFitMode::Cover),
                DisplayMessage::TransformUpdate(TransformState::IDENTITY),
            ]
        );

        // Re-selecting the same mode is just a resend
        control.set_fit_mode(VideoFitMode::Cover);
        assert_eq!(drain(&mut inbox), vec![DisplayMessage::VideoFitMode(VideoFitMode::Cover)]);
    }

    #[test]
    fn test_loop_resend_and_clamp() {
        let (mut control, mut inbox) = surface();
        control.set_loop(LoopMode::Count, None);
        control.set_loop(LoopMode::Count, None);
        control.set_loop(LoopMode::Count, Some(0));
        control.set_loop(LoopMode::Count, Some(500));
        assert_eq!(
            drain(&mut inbox),
            vec![
                DisplayMessage::LoopSettings(LoopSettings::count(2)),
                DisplayMessage::LoopSettings(LoopSettings::count(2)),
                DisplayMessage::LoopSettings(LoopSettings::count(1)),
                DisplayMessage::LoopSettings(LoopSettings::count(99)),
            ]
        );
    }

    #[test]
    fn test_volume_mute_cross_link() {
        let (mut control, mut inbox) = surface();
        control.set_volume(30).unwrap();
        assert!(control.toggle_mute());
        assert!(!control.toggle_mute());
        assert_eq!(control.volume(), 30);

        control.set_volume(0).unwrap();
        assert!(control.is_muted());
        assert!(!control.toggle_mute());
        assert_eq!(control.volume(), 30);

        assert_eq!(
            drain(&mut inbox),
            vec![
                DisplayMessage::VolumeChange(30),
                DisplayMessage::VolumeChange(0),
                DisplayMessage::VolumeChange(30),
                DisplayMessage::VolumeChange(0),
                DisplayMessage::VolumeChange(30),
            ]
        );
    }

    #[test]
    fn test_unmute_without_history_uses_default() {
        let (mut control, _inbox) = surface();
        control.set_volume(0).unwrap();
        control.toggle_mute();
        assert_eq!(control.effective_volume(), 50);
        assert!(matches!(control.set_volume(101), Err(Error::InvalidVolume(101))));
    }

    #[test]
    fn test_toggle_play_follows_telemetry() {
        let (mut control, mut inbox) = surface();
        control.toggle_play();
        control.apply(ControlMessage::PlaybackState(PlaybackState {
            current_time: 3.0,
            duration: 10.0,
            is_playing: true,
        }));
        control.toggle_play();
        assert_eq!(
            drain(&mut inbox),
            vec![
                DisplayMessage::PlaybackCommand(PlaybackCommand::Play),
                DisplayMessage::PlaybackCommand(PlaybackCommand::Pause),
            ]
        );
    }

    #[test]
    fn test_preview_crop_indicator() {
        let (mut control, _inbox) = surface();
        assert_eq!(control.preview().crop, Some(false));
        control.set_fit_mode(VideoFitMode::Cover);
        assert_eq!(control.preview().crop, Some(true));

        let preview = control.preview();
        assert!((preview.rect.w - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_transport_label() {
        let (mut control, _inbox) = surface();
        assert_eq!(control.transport().label, "0:00 / 0:00");
        control.apply(ControlMessage::PlaybackState(PlaybackState {
            current_time: 65.9,
            duration: 3725.0,
            is_playing: false,
        }));
        let view = control.transport();
        assert_eq!(view.label, "1:05 / 62:05");
        assert!(view.progress > 0.0 && view.progress < 0.02);
    }

    #[test]
    fn test_rebroadcast_sends_everything() {
        let (control, mut inbox) = surface();
        control.rebroadcast();
        let channels: Vec<_> = drain(&mut inbox).iter().map(|m| m.channel()).collect();
        assert_eq!(
            channels,
            vec!["video-fit-mode", "loop-settings", "transform-update", "volume-change", "show-logo"]
        );
    }

    #[test]
    fn test_ready_is_sticky() {
        let (mut control, _inbox) = surface();
        control.apply(ControlMessage::PlayerReady);
        control.apply(ControlMessage::PlayerReady);
        assert!(control.player_ready());
    }
}
