//! Output formatting for the console

use console::style;
use dualview_core::library::format_size;
use dualview_core::{ControlSurface, DisplayInfo, LocalFileInfo, LoopMode};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
}

#[derive(Tabled)]
struct DisplayRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Monitor")]
    label: String,
    #[tabled(rename = "Origin")]
    origin: String,
    #[tabled(rename = "")]
    selected: &'static str,
}

/// Numbered file list, as shown by the local-file browser
pub fn file_table(files: &[LocalFileInfo]) -> String {
    if files.is_empty() {
        return "No media files".to_string();
    }
    let rows = files.iter().enumerate().map(|(i, f)| FileRow {
        index: i + 1,
        name: f.name.clone(),
        size: format_size(f.size),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn display_table(displays: &[DisplayInfo], selected: Option<i64>) -> String {
    if displays.is_empty() {
        return "No displays reported".to_string();
    }
    let rows = displays.iter().map(|d| DisplayRow {
        id: d.id,
        label: d.label.clone(),
        origin: format!("{},{}", d.bounds.x, d.bounds.y),
        selected: if Some(d.id) == selected { "<" } else { "" },
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One-screen summary of the control surface
pub fn status(surface: &ControlSurface) -> String {
    let ready = if surface.player_ready() {
        style("Player ready").green().to_string()
    } else {
        style("Waiting for player...").yellow().to_string()
    };

    let source = match (surface.video_id(), surface.local_file_name()) {
        (Some(id), _) => format!("YouTube {}", id),
        (None, Some(name)) => format!("Playing: {}", name),
        (None, None) => "nothing loaded".to_string(),
    };

    let loop_settings = surface.loop_settings();
    let looping = match loop_settings.mode {
        LoopMode::Count => format!("count {}", loop_settings.count),
        mode => mode.to_string(),
    };

    let volume = if surface.is_muted() {
        "muted".to_string()
    } else {
        format!("{}%", surface.volume())
    };

    let t = surface.transform();
    let preview = surface.preview();
    let crop = match preview.crop {
        Some(true) => style("cropped").red().to_string(),
        Some(false) => "whole frame".to_string(),
        None => "size pending".to_string(),
    };
    let transport = surface.transport();

    format!(
        "{}\n  Source:    {}\n  Fit:       {} (scale {:.2}, pan {:.0},{:.0}) {}\n  Loop:      {}\n  Volume:    {}\n  Logo:      {}\n  Transport: {} [{}] {:.0}%",
        ready,
        source,
        surface.fit_mode().label(),
        t.scale,
        t.translate_x,
        t.translate_y,
        crop,
        looping,
        volume,
        if surface.logo_visible() { "on" } else { "off" },
        transport.label,
        if transport.is_playing { "playing" } else { "paused" },
        transport.progress * 100.0,
    )
}
