//! Playback drivers for the display surface
//!
//! Two player elements exist side by side: the embedded video widget and the
//! local-file element. A single [`PlaybackDriver`] routes commands to
//! whichever one the [`ActiveSource`] selects and owns the one
//! [`LoopController`] both share, so switching sources never leaves a stale
//! loop policy behind.

use crate::relay::{ControlMessage, DisplayEndpoint};
use crate::types::*;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use tracing::{debug, info};

/// The opaque player collaborator (embedded widget or local media element)
pub trait MediaElement: Send {
    /// Load a new source and start playing it
    fn load(&mut self, source: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, time: f64);
    fn current_time(&self) -> f64;
    /// Duration in seconds; NaN or 0 while unknown
    fn duration(&self) -> f64;
    fn is_playing(&self) -> bool;
    fn set_volume(&mut self, volume: u8);
    fn set_muted(&mut self, muted: bool);
    /// Intrinsic frame size, [`Size::UNKNOWN`] until metadata loads
    fn intrinsic_size(&self) -> Size;
    /// Report (once) that playback reached the end since the last call
    fn take_ended(&mut self) -> bool;
}

/// Which element is logically playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveSource {
    /// Embedded widget; `None` until the first video is loaded
    Embedded { video_id: Option<String> },
    /// Local file played from a `local-media:` URL
    LocalFile { url: String },
}

impl Default for ActiveSource {
    fn default() -> Self {
        ActiveSource::Embedded { video_id: None }
    }
}

impl ActiveSource {
    pub fn is_local(&self) -> bool {
        matches!(self, ActiveSource::LocalFile { .. })
    }
}

/// What to do when the active media reaches its end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Stop,
    Restart,
}

/// Loop policy plus the play counter of the current media load
#[derive(Debug, Clone, Default)]
pub struct LoopController {
    settings: LoopSettings,
    completed: u32,
}

impl LoopController {
    pub fn new(settings: LoopSettings) -> Self {
        Self { settings, completed: 0 }
    }

    pub fn settings(&self) -> LoopSettings {
        self.settings
    }

    /// Playbacks completed since the last reset
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Install new settings; always restarts the count, even when unchanged
    pub fn replace(&mut self, settings: LoopSettings) {
        self.settings = settings;
        self.completed = 0;
    }

    /// New media loaded
    pub fn reset_counter(&mut self) {
        self.completed = 0;
    }

    /// Record an end-of-media event and decide whether to play again
    pub fn on_ended(&mut self) -> LoopAction {
        match self.settings.mode {
            LoopMode::Off => LoopAction::Stop,
            LoopMode::Infinite => LoopAction::Restart,
            LoopMode::Count => {
                self.completed += 1;
                if self.completed < self.settings.count {
                    LoopAction::Restart
                } else {
                    LoopAction::Stop
                }
            }
        }
    }
}

/// Emits `player-ready` at most once
#[derive(Debug, Default)]
pub struct ReadyLatch {
    fired: bool,
}

impl ReadyLatch {
    pub fn is_fired(&self) -> bool {
        self.fired
    }

    /// Send `player-ready` unless already sent. Returns true on the first call.
    pub fn fire(&mut self, endpoint: &DisplayEndpoint) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        endpoint.send(ControlMessage::PlayerReady);
        true
    }
}

/// Routes playback to the active element
pub struct PlaybackDriver {
    embedded: Box<dyn MediaElement>,
    local: Box<dyn MediaElement>,
    source: ActiveSource,
    looping: LoopController,
}

impl PlaybackDriver {
    pub fn new(embedded: Box<dyn MediaElement>, local: Box<dyn MediaElement>) -> Self {
        Self {
            embedded,
            local,
            source: ActiveSource::default(),
            looping: LoopController::default(),
        }
    }

    pub fn source(&self) -> &ActiveSource {
        &self.source
    }

    pub fn loop_settings(&self) -> LoopSettings {
        self.looping.settings()
    }

    pub fn loops_completed(&self) -> u32 {
        self.looping.completed()
    }

    /// Whether any element currently has media to drive
    pub fn has_player(&self) -> bool {
        !matches!(self.source, ActiveSource::Embedded { video_id: None })
    }

    fn active(&mut self) -> Option<&mut Box<dyn MediaElement>> {
        match &self.source {
            ActiveSource::Embedded { video_id: None } => None,
            ActiveSource::Embedded { .. } => Some(&mut self.embedded),
            ActiveSource::LocalFile { .. } => Some(&mut self.local),
        }
    }

    /// Switch the embedded widget to `video_id`; a playing local file stops
    pub fn load_video(&mut self, video_id: &str) {
        if self.source.is_local() {
            self.local.pause();
        }
        self.looping.reset_counter();
        self.source = ActiveSource::Embedded { video_id: Some(video_id.to_string()) };
        self.embedded.load(video_id);
        info!(video_id, "Embedded video loaded");
    }

    /// Switch to the local element; the embedded widget is paused so only
    /// one source plays
    pub fn play_local(&mut self, url: &str) {
        if let ActiveSource::Embedded { video_id: Some(_) } = self.source {
            self.embedded.pause();
        }
        self.looping.reset_counter();
        self.source = ActiveSource::LocalFile { url: url.to_string() };
        self.local.load(url);
        info!(url, "Local file loaded");
    }

    pub fn set_loop(&mut self, settings: LoopSettings) {
        self.looping.replace(settings);
        debug!(mode = %settings.mode, count = settings.count, "Loop settings applied");
    }

    /// Apply an operator command; ignored while no media is loaded
    pub fn apply_command(&mut self, command: PlaybackCommand) {
        let Some(element) = self.active() else {
            debug!(%command, "No active player, command ignored");
            return;
        };
        match command {
            PlaybackCommand::Play => element.play(),
            PlaybackCommand::Pause => element.pause(),
            PlaybackCommand::Seek { time } => element.seek(time),
            PlaybackCommand::SeekRelative { delta } => {
                let target = element.current_time() + delta;
                element.seek(target);
            }
        }
    }

    /// Volume applies to the embedded widget; 0 mutes it
    pub fn set_volume(&mut self, volume: u8) {
        if volume == 0 {
            self.embedded.set_muted(true);
        } else {
            self.embedded.set_muted(false);
            self.embedded.set_volume(volume.min(100));
        }
    }

    /// Apply the loop policy to an end-of-media event on the active element
    pub fn handle_ended(&mut self) -> LoopAction {
        let action = self.looping.on_ended();
        if action == LoopAction::Restart {
            if let Some(element) = self.active() {
                element.seek(0.0);
                element.play();
            }
        }
        info!(
            ?action,
            mode = %self.looping.settings().mode,
            completed = self.looping.completed(),
            "Media ended"
        );
        action
    }

    /// Check both elements for end events; only the active one counts
    pub fn poll_ended(&mut self) -> Option<LoopAction> {
        let embedded_ended = self.embedded.take_ended();
        let local_ended = self.local.take_ended();
        let ended = match self.source {
            ActiveSource::Embedded { video_id: Some(_) } => embedded_ended,
            ActiveSource::Embedded { video_id: None } => false,
            ActiveSource::LocalFile { .. } => local_ended,
        };
        ended.then(|| self.handle_ended())
    }

    /// Telemetry snapshot of the active element
    pub fn sample(&self) -> Option<PlaybackState> {
        let element = match self.source {
            ActiveSource::Embedded { video_id: None } => return None,
            ActiveSource::Embedded { .. } => &self.embedded,
            ActiveSource::LocalFile { .. } => &self.local,
        };
        let duration = element.duration();
        Some(PlaybackState {
            current_time: element.current_time(),
            duration: if duration.is_finite() { duration } else { 0.0 },
            is_playing: element.is_playing(),
        })
    }

    /// Frame size of the active source for fit geometry
    pub fn source_size(&self) -> Size {
        match self.source {
            ActiveSource::LocalFile { .. } => self.local.intrinsic_size(),
            ActiveSource::Embedded { .. } => self.embedded.intrinsic_size(),
        }
    }
}

#[derive(Debug)]
struct SimulatedState {
    source: Option<String>,
    duration: f64,
    size: Size,
    /// Position at `anchor`
    position: f64,
    anchor: Instant,
    playing: bool,
    ended_pending: bool,
    volume: u8,
    muted: bool,
    loads: u32,
    plays: u32,
}

impl SimulatedState {
    fn position_now(&self) -> f64 {
        if self.playing {
            let elapsed = Instant::now().saturating_duration_since(self.anchor).as_secs_f64();
            (self.position + elapsed).min(self.duration)
        } else {
            self.position
        }
    }

    fn settle(&mut self) {
        let now = self.position_now();
        self.position = now;
        self.anchor = Instant::now();
        if self.playing && self.position >= self.duration {
            self.playing = false;
            self.ended_pending = true;
        }
    }
}

/// Clock-driven stand-in for a real player element.
///
/// Position advances with `tokio::time`, so paused-clock tests can drive it
/// deterministically. Clones share state, letting a test keep a handle on an
/// element owned by a [`PlaybackDriver`].
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedMedia {
    /// Element whose every load lasts `duration` seconds at `size`
    pub fn new(duration: f64, size: Size) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimulatedState {
                source: None,
                duration,
                size,
                position: 0.0,
                anchor: Instant::now(),
                playing: false,
                ended_pending: false,
                volume: 100,
                muted: false,
                loads: 0,
                plays: 0,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimulatedState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.settle();
        f(&mut guard)
    }

    pub fn source(&self) -> Option<String> {
        self.with(|s| s.source.clone())
    }

    /// Number of times playback was started from a stopped state
    pub fn play_count(&self) -> u32 {
        self.with(|s| s.plays)
    }

    pub fn load_count(&self) -> u32 {
        self.with(|s| s.loads)
    }

    pub fn volume(&self) -> u8 {
        self.with(|s| s.volume)
    }

    pub fn is_muted(&self) -> bool {
        self.with(|s| s.muted)
    }

    /// Jump straight to the end, as if playback had run out
    pub fn finish(&self) {
        self.with(|s| {
            if s.source.is_some() {
                s.position = s.duration;
                s.playing = false;
                s.ended_pending = true;
            }
        })
    }
}

impl MediaElement for SimulatedMedia {
    fn load(&mut self, source: &str) {
        self.with(|s| {
            s.source = Some(source.to_string());
            s.position = 0.0;
            s.ended_pending = false;
            s.loads += 1;
            s.plays += 1;
            s.playing = true;
        })
    }

    fn play(&mut self) {
        self.with(|s| {
            if s.source.is_some() && !s.playing {
                if s.position >= s.duration {
                    s.position = 0.0;
                }
                s.playing = true;
                s.plays += 1;
            }
        })
    }

    fn pause(&mut self) {
        self.with(|s| s.playing = false)
    }

    fn seek(&mut self, time: f64) {
        self.with(|s| {
            s.position = time.clamp(0.0, s.duration);
            s.ended_pending = false;
        })
    }

    fn current_time(&self) -> f64 {
        self.with(|s| s.position)
    }

    fn duration(&self) -> f64 {
        self.with(|s| if s.source.is_some() { s.duration } else { f64::NAN })
    }

    fn is_playing(&self) -> bool {
        self.with(|s| s.playing)
    }

    fn set_volume(&mut self, volume: u8) {
        self.with(|s| s.volume = volume)
    }

    fn set_muted(&mut self, muted: bool) {
        self.with(|s| s.muted = muted)
    }

    fn intrinsic_size(&self) -> Size {
        self.with(|s| if s.source.is_some() { s.size } else { Size::UNKNOWN })
    }

    fn take_ended(&mut self) -> bool {
        self.with(|s| std::mem::take(&mut s.ended_pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> (PlaybackDriver, SimulatedMedia, SimulatedMedia) {
        let embedded = SimulatedMedia::new(60.0, Size::EMBED_SOURCE);
        let local = SimulatedMedia::new(30.0, Size::new(1920.0, 1080.0));
        let driver = PlaybackDriver::new(Box::new(embedded.clone()), Box::new(local.clone()));
        (driver, embedded, local)
    }

    fn end_and_poll(driver: &mut PlaybackDriver, element: &SimulatedMedia) -> Option<LoopAction> {
        element.finish();
        driver.poll_ended()
    }

    #[test]
    fn test_loop_count_three_plays_total() {
        let mut ctl = LoopController::new(LoopSettings::count(3));
        assert_eq!(ctl.on_ended(), LoopAction::Restart);
        assert_eq!(ctl.on_ended(), LoopAction::Restart);
        assert_eq!(ctl.on_ended(), LoopAction::Stop);
    }

    #[test]
    fn test_loop_off_never_restarts() {
        let mut ctl = LoopController::new(LoopSettings::off());
        for _ in 0..3 {
            assert_eq!(ctl.on_ended(), LoopAction::Stop);
        }
    }

    #[test]
    fn test_loop_infinite_keeps_restarting() {
        let mut ctl = LoopController::new(LoopSettings::infinite());
        for _ in 0..10 {
            assert_eq!(ctl.on_ended(), LoopAction::Restart);
        }
    }

    #[test]
    fn test_identical_settings_still_reset_counter() {
        let mut ctl = LoopController::new(LoopSettings::count(2));
        assert_eq!(ctl.on_ended(), LoopAction::Restart);
        ctl.replace(LoopSettings::count(2));
        assert_eq!(ctl.completed(), 0);
        assert_eq!(ctl.on_ended(), LoopAction::Restart);
        assert_eq!(ctl.on_ended(), LoopAction::Stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_ignored_without_player() {
        let (mut driver, embedded, _) = driver();
        driver.apply_command(PlaybackCommand::Play);
        assert_eq!(embedded.play_count(), 0);
        assert!(driver.sample().is_none());
        assert!(!driver.has_player());
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_file_pauses_embedded() {
        let (mut driver, embedded, local) = driver();
        driver.load_video("dQw4w9WgXcQ");
        assert!(embedded.is_playing());

        driver.play_local("local-media:///clips/a.mp4");
        assert!(!embedded.is_playing());
        assert!(local.is_playing());
        assert_eq!(driver.source_size(), Size::new(1920.0, 1080.0));

        driver.apply_command(PlaybackCommand::Pause);
        assert!(!local.is_playing());
        assert!(!embedded.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_embedded_load_stops_local_file() {
        let (mut driver, embedded, local) = driver();
        driver.play_local("local-media:///clips/a.mp4");
        assert!(local.is_playing());

        driver.load_video("dQw4w9WgXcQ");
        assert!(!local.is_playing());
        assert!(embedded.is_playing());
        assert!(!driver.source().is_local());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_seeks_to_zero_and_plays() {
        let (mut driver, embedded, _) = driver();
        driver.set_loop(LoopSettings::infinite());
        driver.load_video("dQw4w9WgXcQ");

        for _ in 0..5 {
            assert_eq!(end_and_poll(&mut driver, &embedded), Some(LoopAction::Restart));
            assert!(embedded.is_playing());
            assert_eq!(embedded.current_time(), 0.0);
        }
        assert_eq!(embedded.play_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_load_resets_counter() {
        let (mut driver, embedded, _) = driver();
        driver.set_loop(LoopSettings::count(2));
        driver.load_video("aaaaaaaaaaa");
        assert_eq!(end_and_poll(&mut driver, &embedded), Some(LoopAction::Restart));
        assert_eq!(driver.loops_completed(), 1);

        driver.load_video("bbbbbbbbbbb");
        assert_eq!(driver.loops_completed(), 0);
        assert_eq!(end_and_poll(&mut driver, &embedded), Some(LoopAction::Restart));
        assert_eq!(end_and_poll(&mut driver, &embedded), Some(LoopAction::Stop));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_element_end_is_ignored() {
        let (mut driver, embedded, local) = driver();
        driver.set_loop(LoopSettings::infinite());
        driver.load_video("dQw4w9WgXcQ");
        driver.play_local("local-media:///clips/a.mp4");

        embedded.finish();
        assert_eq!(driver.poll_ended(), None);
        assert!(!embedded.is_playing());

        assert_eq!(end_and_poll(&mut driver, &local), Some(LoopAction::Restart));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_relative_from_current_position() {
        let (mut driver, _, local) = driver();
        driver.play_local("local-media:///clips/a.mp4");
        tokio::time::advance(std::time::Duration::from_secs(10)).await;
        driver.apply_command(PlaybackCommand::SeekRelative { delta: -4.0 });
        let state = driver.sample().unwrap();
        assert!((state.current_time - 6.0).abs() < 1e-6);
        assert_eq!(state.duration, 30.0);
        assert!(local.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_volume_zero_mutes_embedded() {
        let (mut driver, embedded, _) = driver();
        driver.set_volume(0);
        assert!(embedded.is_muted());
        driver.set_volume(35);
        assert!(!embedded.is_muted());
        assert_eq!(embedded.volume(), 35);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_when_paused_is_noop() {
        let (mut driver, embedded, _) = driver();
        driver.load_video("dQw4w9WgXcQ");
        driver.apply_command(PlaybackCommand::Pause);
        driver.apply_command(PlaybackCommand::Pause);
        assert!(!embedded.is_playing());
        driver.apply_command(PlaybackCommand::Play);
        assert_eq!(embedded.play_count(), 2);
    }

    #[test]
    fn test_ready_latch_fires_once() {
        let mut relay = crate::relay::connect();
        let mut latch = ReadyLatch::default();
        assert!(latch.fire(&relay.display));
        assert!(!latch.fire(&relay.display));
        assert_eq!(relay.control_inbox.drain(), vec![ControlMessage::PlayerReady]);
    }
}
