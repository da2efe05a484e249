//! Display surface event loop
//!
//! One task owns the [`DisplaySurface`] and multiplexes relay messages,
//! the telemetry poll, the clock overlay and the embedded widget's
//! initialisation. All timers belong to the loop and go away with it.

use crate::clock;
use crate::config::AppConfig;
use crate::display::{DisplaySurface, RenderFrame};
use crate::player::ReadyLatch;
use crate::relay::{ControlMessage, DisplayEndpoint, DisplayInbox};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// Linked lifetime of the two windows: closing either closes both
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Signal every holder; idempotent
    pub fn close(&self) {
        if !self.tx.send_replace(true) {
            debug!("Shutdown signalled");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`close`](Self::close) has been called
    pub async fn closed(&mut self) {
        // The sender lives in `self`, so this only ends on `true`
        let _ = self.rx.wait_for(|closed| *closed).await;
    }
}

/// Initialisation of the third-party embedded player
#[async_trait]
pub trait EmbedLoader: Send {
    async fn initialize(&mut self) -> Result<()>;
}

/// Stand-in loader that becomes ready after a fixed delay, or never
#[derive(Debug, Clone, Copy)]
pub struct SimulatedEmbed {
    delay: Option<Duration>,
}

impl SimulatedEmbed {
    pub fn ready_after(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }

    /// Never finishes loading, forcing the degraded-mode fallback
    pub fn never() -> Self {
        Self { delay: None }
    }
}

#[async_trait]
impl EmbedLoader for SimulatedEmbed {
    async fn initialize(&mut self) -> Result<()> {
        match self.delay {
            Some(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => std::future::pending().await,
        }
    }
}

/// The display surface's task
pub struct DisplayRuntime {
    surface: DisplaySurface,
    inbox: DisplayInbox,
    endpoint: DisplayEndpoint,
    latch: ReadyLatch,
    shutdown: Shutdown,
    frames: watch::Sender<RenderFrame>,
    poll_interval: Duration,
    clock_interval: Duration,
    ready_timeout: Duration,
}

impl DisplayRuntime {
    pub fn new(
        config: &AppConfig,
        surface: DisplaySurface,
        inbox: DisplayInbox,
        endpoint: DisplayEndpoint,
        shutdown: Shutdown,
    ) -> Self {
        let (frames, _) = watch::channel(surface.render());
        Self {
            surface,
            inbox,
            endpoint,
            latch: ReadyLatch::default(),
            shutdown,
            frames,
            poll_interval: config.poll_interval(),
            clock_interval: config.clock_interval(),
            ready_timeout: config.ready_timeout(),
        }
    }

    /// Follow what the output canvas shows
    pub fn subscribe_frames(&self) -> watch::Receiver<RenderFrame> {
        self.frames.subscribe()
    }

    fn publish(&self) {
        self.frames.send_replace(self.surface.render());
    }

    /// Run until either surface closes. The surface is handed back for
    /// inspection.
    #[instrument(skip_all)]
    pub async fn run<L: EmbedLoader>(mut self, mut loader: L) -> DisplaySurface {
        let mut poll = interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut clock_tick = interval(self.clock_interval);
        clock_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let ready_timeout = self.ready_timeout;
        let embed = async move { timeout(ready_timeout, loader.initialize()).await };
        tokio::pin!(embed);
        let mut embed_pending = true;

        let mut shutdown = self.shutdown.clone();
        info!("Display surface running");

        loop {
            tokio::select! {
                _ = shutdown.closed() => {
                    debug!("Display surface closing");
                    break;
                }
                msg = self.inbox.recv() => match msg {
                    Some(msg) => {
                        self.surface.apply(msg);
                        self.publish();
                    }
                    None => {
                        info!("Control surface gone");
                        break;
                    }
                },
                outcome = &mut embed, if embed_pending => {
                    embed_pending = false;
                    match outcome {
                        Ok(Ok(())) => info!("Embedded player ready"),
                        Ok(Err(e)) => warn!(error = %e, code = e.error_code(), "Embedded player failed, running degraded"),
                        Err(_) => warn!(
                            timeout_ms = ready_timeout.as_millis() as u64,
                            "Embedded player not ready in time, running degraded"
                        ),
                    }
                    self.latch.fire(&self.endpoint);
                }
                _ = poll.tick() => {
                    if self.surface.poll_ended().is_some() {
                        self.publish();
                    }
                    if let Some(state) = self.surface.sample() {
                        self.endpoint.send(ControlMessage::PlaybackState(state));
                    }
                }
                _ = clock_tick.tick() => {
                    self.surface.set_clock(clock::now());
                    self.publish();
                }
            }
        }

        self.shutdown.close();
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlaybackDriver, SimulatedMedia};
    use crate::relay::{connect, DisplayMessage, Relay};
    use crate::types::Size;
    use crate::Error;

    struct FailingEmbed;

    #[async_trait]
    impl EmbedLoader for FailingEmbed {
        async fn initialize(&mut self) -> Result<()> {
            Err(Error::embed("script blocked"))
        }
    }

    fn runtime(relay: Relay, shutdown: Shutdown) -> (DisplayRuntime, crate::relay::ControlEndpoint, crate::relay::ControlInbox) {
        let config = AppConfig::default();
        let driver = PlaybackDriver::new(
            Box::new(SimulatedMedia::new(30.0, Size::EMBED_SOURCE)),
            Box::new(SimulatedMedia::new(30.0, Size::new(1920.0, 1080.0))),
        );
        let surface = DisplaySurface::new(&config, driver);
        let rt = DisplayRuntime::new(&config, surface, relay.display_inbox, relay.display, shutdown);
        (rt, relay.control, relay.control_inbox)
    }

    fn ready_count(inbox: &mut crate::relay::ControlInbox) -> usize {
        inbox
            .drain()
            .into_iter()
            .filter(|m| *m == ControlMessage::PlayerReady)
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_ready_after_timeout() {
        let (rt, _control, mut inbox) = runtime(connect(), Shutdown::new());
        tokio::spawn(rt.run(SimulatedEmbed::never()));

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(ready_count(&mut inbox), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ready_count(&mut inbox), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ready_count(&mut inbox), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_embed_still_ready() {
        let (rt, _control, mut inbox) = runtime(connect(), Shutdown::new());
        tokio::spawn(rt.run(FailingEmbed));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ready_count(&mut inbox), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_telemetry_only_with_player() {
        let (rt, control, mut inbox) = runtime(connect(), Shutdown::new());
        tokio::spawn(rt.run(SimulatedEmbed::ready_after(Duration::from_millis(100))));

        tokio::time::sleep(Duration::from_secs(2)).await;
        let telemetry = inbox
            .drain()
            .into_iter()
            .filter(|m| matches!(m, ControlMessage::PlaybackState(_)))
            .count();
        assert_eq!(telemetry, 0);

        control.send(DisplayMessage::LoadVideo("dQw4w9WgXcQ".into()));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let states: Vec<_> = inbox
            .drain()
            .into_iter()
            .filter_map(|m| match m {
                ControlMessage::PlaybackState(s) => Some(s),
                _ => None,
            })
            .collect();
        assert!((3..=5).contains(&states.len()), "got {} samples", states.len());
        assert!(states.iter().all(|s| s.is_playing && s.duration == 30.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_follow_messages() {
        let (rt, control, _inbox) = runtime(connect(), Shutdown::new());
        let mut frames = rt.subscribe_frames();
        tokio::spawn(rt.run(SimulatedEmbed::never()));

        control.send(DisplayMessage::ShowLogo(false));
        frames.changed().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!frames.borrow_and_update().logo_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_control_stops_display() {
        let shutdown = Shutdown::new();
        let (rt, control, _inbox) = runtime(connect(), shutdown.clone());
        let task = tokio::spawn(rt.run(SimulatedEmbed::never()));

        drop(control);
        task.await.unwrap();
        assert!(shutdown.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_signal_stops_display() {
        let shutdown = Shutdown::new();
        let (rt, control, mut inbox) = runtime(connect(), shutdown.clone());
        let task = tokio::spawn(rt.run(SimulatedEmbed::never()));

        shutdown.close();
        task.await.unwrap();
        assert!(control.display_closed());
        // Display endpoint dropped with the loop
        inbox.drain();
        assert_eq!(inbox.recv().await, None);
    }
}
