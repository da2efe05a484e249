//! Window host
//!
//! The system side of the application: monitor enumeration, window placement
//! and the native file/folder dialogs. [`serve`] answers the control
//! surface's [`HostRequest`]s against any [`WindowHost`].

use crate::library::{media_url_from_path, scan_folder};
use crate::relay::{HostEndpoint, HostRequest};
use crate::types::{Bounds, DisplayInfo};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// An attached monitor as the platform reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub id: i64,
    pub bounds: Bounds,
    pub is_primary: bool,
}

/// Platform window and dialog services
#[async_trait]
pub trait WindowHost: Send {
    /// Monitors in platform order
    fn monitors(&self) -> Vec<Monitor>;

    /// Place the display window's top-left corner at the monitor origin
    fn move_display_window(&mut self, bounds: Bounds);

    /// Pin the control window above other windows
    fn set_always_on_top(&mut self, on_top: bool);

    /// Open-file dialog; `None` when cancelled
    async fn pick_file(&mut self) -> Option<PathBuf>;

    /// Folder dialog; `None` when cancelled
    async fn pick_folder(&mut self) -> Option<PathBuf>;
}

/// Operator-facing monitor label, e.g. `Display 1 (Primary) — 2560×1440`
pub fn display_label(index: usize, is_primary: bool, bounds: &Bounds) -> String {
    format!(
        "Display {}{} — {}×{}",
        index + 1,
        if is_primary { " (Primary)" } else { "" },
        bounds.width,
        bounds.height
    )
}

/// Labelled snapshot of every monitor
pub fn describe_displays(monitors: &[Monitor]) -> Vec<DisplayInfo> {
    monitors
        .iter()
        .enumerate()
        .map(|(i, m)| DisplayInfo {
            id: m.id,
            label: display_label(i, m.is_primary, &m.bounds),
            bounds: m.bounds,
            is_primary: m.is_primary,
        })
        .collect()
}

/// Answer host requests until the control surface goes away, then hand the
/// host back
pub async fn serve<H: WindowHost>(mut host: H, mut endpoint: HostEndpoint) -> H {
    while let Some(request) = endpoint.recv().await {
        debug!(channel = request.channel(), "Host request");
        handle(&mut host, request).await;
    }
    debug!("Host service stopped");
    host
}

async fn handle<H: WindowHost>(host: &mut H, request: HostRequest) {
    // Replies are dropped silently if the requester stopped waiting
    match request {
        HostRequest::GetDisplays(reply) => {
            let _ = reply.send(describe_displays(&host.monitors()));
        }
        HostRequest::MoveToDisplay(id) => match host.monitors().into_iter().find(|m| m.id == id) {
            Some(monitor) => {
                host.move_display_window(monitor.bounds);
                info!(display_id = id, x = monitor.bounds.x, y = monitor.bounds.y, "Display window moved");
            }
            None => debug!(display_id = id, "Monitor no longer attached"),
        },
        HostRequest::SetAlwaysOnTop(on_top) => host.set_always_on_top(on_top),
        HostRequest::OpenLocalFile(reply) => {
            let url = host.pick_file().await.and_then(|path| match media_url_from_path(&path) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(error = %e, "Picked file not playable");
                    None
                }
            });
            let _ = reply.send(url);
        }
        HostRequest::BrowseFolder(reply) => {
            let _ = reply.send(host.pick_folder().await);
        }
        HostRequest::ScanFolder { path, reply } => {
            let _ = reply.send(scan_folder(&path).await);
        }
    }
}

/// In-process host with a fixed monitor layout and preset dialog answers
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    monitors: Vec<Monitor>,
    file_answer: Option<PathBuf>,
    folder_answer: Option<PathBuf>,
    display_origin: (i32, i32),
    always_on_top: bool,
}

impl Default for HeadlessHost {
    /// A 2560×1440 primary with the 2880×960 output panel to its right
    fn default() -> Self {
        Self::new(vec![
            Monitor {
                id: 1,
                bounds: Bounds { x: 0, y: 0, width: 2560, height: 1440 },
                is_primary: true,
            },
            Monitor {
                id: 2,
                bounds: Bounds { x: 2560, y: 0, width: 2880, height: 960 },
                is_primary: false,
            },
        ])
    }
}

impl HeadlessHost {
    pub fn new(monitors: Vec<Monitor>) -> Self {
        Self {
            monitors,
            file_answer: None,
            folder_answer: None,
            display_origin: (0, 0),
            always_on_top: false,
        }
    }

    /// Path the open-file dialog will return
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_answer = Some(path.into());
        self
    }

    /// Path the folder dialog will return
    pub fn with_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.folder_answer = Some(path.into());
        self
    }

    pub fn display_origin(&self) -> (i32, i32) {
        self.display_origin
    }

    pub fn always_on_top(&self) -> bool {
        self.always_on_top
    }
}

#[async_trait]
impl WindowHost for HeadlessHost {
    fn monitors(&self) -> Vec<Monitor> {
        self.monitors.clone()
    }

    fn move_display_window(&mut self, bounds: Bounds) {
        self.display_origin = (bounds.x, bounds.y);
    }

    fn set_always_on_top(&mut self, on_top: bool) {
        self.always_on_top = on_top;
    }

    async fn pick_file(&mut self) -> Option<PathBuf> {
        self.file_answer.clone()
    }

    async fn pick_folder(&mut self) -> Option<PathBuf> {
        self.folder_answer.clone()
    }
}
