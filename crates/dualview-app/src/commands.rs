//! Operator console
//!
//! One command per line on stdin, each mapped onto a control-surface action.

use crate::output;
use dualview_core::{
    ControlInbox, ControlSurface, InputMode, LoopMode, RenderFrame, Shutdown, VideoFitMode,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Status,
    Mode(InputMode),
    Load(String),
    /// Play by file-list index or path
    Local(String),
    Open,
    Scan(Option<PathBuf>),
    Files,
    Fit(VideoFitMode),
    Zoom(f64),
    Pan(f64, f64),
    Drag(f64, f64),
    Center,
    Reset,
    Play,
    Pause,
    Toggle,
    Seek(f64),
    Skip(f64),
    Loop(LoopMode, Option<u32>),
    Volume(u32),
    Mute,
    Logo,
    Pin(bool),
    Displays,
    Move(i64),
    Resync,
}

pub const HELP: &str = "\
Sources:   load <url|id> | local <n|path> | open | scan [dir] | files | mode <url|browse|local>
Framing:   fit <fit|fill|manual> | zoom <scale> | pan <dx> <dy> | drag <dx> <dy> | center | reset
Playback:  play | pause | toggle | seek <s> | skip <+/-s> | loop <off|infinite|count> [n]
Audio:     volume <0-100> | mute
Windows:   logo | pin <on|off> | displays | move <id> | resync
Other:     status | help | quit";

fn arg<'a>(args: &[&'a str], i: usize, what: &str) -> Result<&'a str, String> {
    args.get(i).copied().ok_or_else(|| format!("missing {}", what))
}

fn number<T: std::str::FromStr>(args: &[&str], i: usize, what: &str) -> Result<T, String> {
    let raw = arg(args, i, what)?;
    raw.parse().map_err(|_| format!("'{}' is not a valid {}", raw, what))
}

fn switch(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on/off, got '{}'", other)),
    }
}

/// Parse one console line; blank lines yield `Ok(None)`
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = words.split_first() else {
        return Ok(None);
    };
    // Everything after the command word, spaces kept (paths, URLs)
    let rest = line.trim_start()[name.len()..].trim();

    let command = match name.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "status" => Command::Status,
        "mode" => Command::Mode(match arg(args, 0, "mode")? {
            "url" => InputMode::Url,
            "browse" | "youtube" => InputMode::Browse,
            "local" => InputMode::Local,
            other => return Err(format!("unknown input mode '{}'", other)),
        }),
        "load" => Command::Load(arg(args, 0, "video reference").map(|_| rest.to_string())?),
        "local" => Command::Local(arg(args, 0, "file").map(|_| rest.to_string())?),
        "open" => Command::Open,
        "scan" => Command::Scan((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "files" => Command::Files,
        "fit" => Command::Fit(arg(args, 0, "fit mode")?.parse()?),
        "zoom" => Command::Zoom(number(args, 0, "scale")?),
        "pan" => Command::Pan(number(args, 0, "dx")?, number(args, 1, "dy")?),
        "drag" => Command::Drag(number(args, 0, "dx")?, number(args, 1, "dy")?),
        "center" => Command::Center,
        "reset" => Command::Reset,
        "play" => Command::Play,
        "pause" => Command::Pause,
        "toggle" => Command::Toggle,
        "seek" => Command::Seek(number(args, 0, "time")?),
        "skip" => Command::Skip(number(args, 0, "offset")?),
        "loop" => {
            let mode = match arg(args, 0, "loop mode")? {
                "off" => LoopMode::Off,
                "infinite" | "on" => LoopMode::Infinite,
                "count" => LoopMode::Count,
                other => return Err(format!("unknown loop mode '{}'", other)),
            };
            let count = if args.len() > 1 { Some(number(args, 1, "count")?) } else { None };
            Command::Loop(mode, count)
        }
        "volume" | "vol" => Command::Volume(number(args, 0, "volume")?),
        "mute" => Command::Mute,
        "logo" => Command::Logo,
        "pin" => Command::Pin(switch(arg(args, 0, "on/off")?)?),
        "displays" => Command::Displays,
        "move" => Command::Move(number(args, 0, "display id")?),
        "resync" => Command::Resync,
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(Some(command))
}

/// Whether the console keeps running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Apply one command to the control surface
pub async fn execute(surface: &mut ControlSurface, command: Command) -> Flow {
    match command {
        Command::Help => println!("{}", HELP),
        Command::Quit => return Flow::Quit,
        Command::Status => println!("{}", output::status(surface)),
        Command::Mode(mode) => surface.set_input_mode(mode),
        Command::Load(reference) => {
            if surface.load_video(&reference).is_none() {
                println!("Not a YouTube URL or video id: {}", reference);
            }
        }
        Command::Local(which) => play_local(surface, &which),
        Command::Open => {
            if surface.open_local_file().await.is_none() {
                println!("No file chosen");
            }
        }
        Command::Scan(Some(dir)) => {
            let files = surface.scan_folder(dir).await;
            println!("{}", output::file_table(files));
        }
        Command::Scan(None) => match surface.browse_and_scan().await {
            Some(files) => println!("{}", output::file_table(files)),
            None => println!("No folder chosen"),
        },
        Command::Files => println!("{}", output::file_table(surface.files())),
        Command::Fit(mode) => surface.set_fit_mode(mode),
        Command::Zoom(scale) => report(surface.set_scale(scale)),
        Command::Pan(dx, dy) => surface.pan(dx, dy),
        Command::Drag(dx, dy) => surface.drag_preview(dx, dy),
        Command::Center => surface.reset_center(),
        Command::Reset => surface.reset_all(),
        Command::Play => surface.play(),
        Command::Pause => surface.pause(),
        Command::Toggle => surface.toggle_play(),
        Command::Seek(time) => surface.seek(time),
        Command::Skip(delta) => surface.seek_relative(delta),
        Command::Loop(mode, count) => surface.set_loop(mode, count),
        Command::Volume(volume) => report(surface.set_volume(volume)),
        Command::Mute => {
            surface.toggle_mute();
        }
        Command::Logo => {
            surface.toggle_logo();
        }
        Command::Pin(on_top) => surface.set_always_on_top(on_top),
        Command::Displays => {
            let displays = surface.refresh_displays().await.to_vec();
            println!("{}", output::display_table(&displays, surface.selected_display()));
        }
        Command::Move(id) => report(surface.move_to_display(id)),
        Command::Resync => surface.rebroadcast(),
    }
    Flow::Continue
}

fn report(result: dualview_core::Result<()>) {
    if let Err(e) = result {
        warn!(error = %e, code = e.error_code(), "Command ignored");
        println!("{}", e);
    }
}

fn play_local(surface: &mut ControlSurface, which: &str) {
    if let Ok(n) = which.parse::<usize>() {
        match n.checked_sub(1).and_then(|i| surface.files().get(i)).cloned() {
            Some(file) => surface.play_local_file(&file),
            None => println!("No file #{} in the list", n),
        }
        return;
    }
    report(surface.play_dropped_path(std::path::Path::new(which)));
}

/// Read commands until `quit`, end of input, or the display closing
pub async fn console(
    surface: &mut ControlSurface,
    mut inbox: ControlInbox,
    mut frames: watch::Receiver<RenderFrame>,
    mut shutdown: Shutdown,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = shutdown.closed() => break,
            msg = inbox.recv() => match msg {
                Some(msg) => surface.apply(msg),
                None => {
                    info!("Display surface closed");
                    break;
                }
            },
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                debug!(frame = %serde_json::to_string(&frame)?, "Display frame");
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input");
                    break;
                };
                match parse(&line) {
                    Ok(Some(command)) => {
                        if execute(surface, command).await == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{} (try 'help')", e),
                }
            }
        }
    }
    Ok(())
}
