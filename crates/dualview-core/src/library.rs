//! Local media library
//!
//! Folder scanning for the file list and the `local-media:` URL scheme that
//! lets the sandboxed display renderer fetch files from disk. The scheme is a
//! plain 1:1 rewrite of `file:` URLs.

use crate::{types::LocalFileInfo, Error, Result};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// URL scheme the display surface resolves to local files
pub const MEDIA_SCHEME: &str = "local-media";

/// Extensions listed by a folder scan (video and still images)
pub const MEDIA_EXTENSIONS: &[&str] = &[
    // Video
    "mp4", "webm", "mov", "mkv", "avi", "m4v", "m4p", "mpg", "mpeg", "wmv", "flv",
    // Image
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "svg",
];

/// Extensions accepted by drag-and-drop onto the file list
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi", "m4v"];

fn extension_in(path: &Path, set: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            set.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

/// Recognised media extension, case-insensitive
pub fn is_media_file(path: &Path) -> bool {
    extension_in(path, MEDIA_EXTENSIONS)
}

/// Recognised video extension, case-insensitive
pub fn is_video_file(path: &Path) -> bool {
    extension_in(path, VIDEO_EXTENSIONS)
}

/// Rewrite an absolute filesystem path as a `local-media:` URL
pub fn media_url_from_path(path: &Path) -> Result<String> {
    let file_url = Url::from_file_path(path)
        .map_err(|_| Error::InvalidMediaPath(path.display().to_string()))?;
    let rest = file_url
        .as_str()
        .strip_prefix("file:")
        .ok_or_else(|| Error::InvalidMediaPath(path.display().to_string()))?;
    Ok(format!("{}:{}", MEDIA_SCHEME, rest))
}

/// Inverse of [`media_url_from_path`]
pub fn path_from_media_url(media_url: &str) -> Result<PathBuf> {
    let rest = media_url
        .strip_prefix(MEDIA_SCHEME)
        .and_then(|r| r.strip_prefix(':'))
        .ok_or_else(|| Error::NotAMediaUrl(media_url.to_string()))?;
    let file_url = Url::parse(&format!("file:{}", rest))
        .map_err(|_| Error::NotAMediaUrl(media_url.to_string()))?;
    file_url
        .to_file_path()
        .map_err(|_| Error::NotAMediaUrl(media_url.to_string()))
}

/// Case-insensitive name order, ties broken by the raw name
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// List media files directly inside `folder`, sorted by name.
///
/// A missing or unreadable folder yields an empty list. Entries that cannot
/// be inspected (broken links, permission errors) are skipped.
pub async fn scan_folder(folder: impl AsRef<Path>) -> Vec<LocalFileInfo> {
    let folder = folder.as_ref();
    match try_scan(folder).await {
        Ok(files) => {
            debug!(folder = %folder.display(), count = files.len(), "Folder scanned");
            files
        }
        Err(e) => {
            warn!(folder = %folder.display(), error = %e, "Folder not readable");
            Vec::new()
        }
    }
}

async fn try_scan(folder: &Path) -> Result<Vec<LocalFileInfo>> {
    // Media URLs need absolute paths
    let folder = tokio::fs::canonicalize(folder).await?;
    let mut entries = tokio::fs::read_dir(&folder).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_media_file(&path) {
            continue;
        }
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !meta.is_file() {
            continue;
        }
        let file_url = media_url_from_path(&path)?;
        files.push(LocalFileInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            file_url,
            size: meta.len(),
        });
    }

    files.sort_by(|a, b| compare_names(&a.name, &b.name));
    Ok(files)
}

/// Human-readable size for the file list
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < MB {
        format!("{:.0} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else {
        format!("{:.2} GB", b / GB)
    }
}
