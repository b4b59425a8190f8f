// ============================================================================
// Stroke scripts: replay pointer input against a session without a window
// ============================================================================
//
// One command per line. `# ` starts a comment:
//
//   artwork 2            load preset "2" (unknown ids fall back to "1")
//   tool bucket          brush | fine | marker | spray | eraser | bucket
//   color #0000FF        palette color by hex, name ("blue") or index (0-7)
//   gradient on          on | off | toggle
//   size 12              absolute width (clamped), or `+` / `-` to step
//   zoom in              in | out | reset | <factor>
//   bounds 40 20         screen position of the overlay's top-left corner
//   down 10 10           pointer down at a screen position
//   move 30 10           pointer move
//   up                   pointer up
//   click 50 50          down + up
//   undo / redo / reset

use egui::{Pos2, Rect, pos2};
use std::path::Path;

use crate::assets::Artwork;
use crate::components::colors::{PALETTE, PALETTE_NAMES, palette_index, parse_hex};
use crate::components::tools::Tool;
use crate::io::ArtworkError;
use crate::session::CanvasEditorSession;

#[derive(Debug)]
pub enum ScriptError {
    Parse { line: usize, message: String },
    Io(std::io::Error),
    Artwork(ArtworkError),
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptError::Parse { line, message } => write!(f, "Line {}: {}", line, message),
            ScriptError::Io(e) => write!(f, "I/O error: {}", e),
            ScriptError::Artwork(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<std::io::Error> for ScriptError {
    fn from(e: std::io::Error) -> Self {
        ScriptError::Io(e)
    }
}

impl From<ArtworkError> for ScriptError {
    fn from(e: ArtworkError) -> Self {
        ScriptError::Artwork(e)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeChange {
    Set(i64),
    Increase,
    Decrease,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomChange {
    In,
    Out,
    Reset,
    Set(f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Artwork(Artwork),
    Tool(Tool),
    Color(usize),
    Gradient(Option<bool>),
    Size(SizeChange),
    Zoom(ZoomChange),
    Bounds(Pos2),
    Down(Pos2),
    Move(Pos2),
    Up,
    Click(Pos2),
    Undo,
    Redo,
    Reset,
}

/// A parsed script, ready to replay.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrokeScript {
    commands: Vec<Command>,
}

impl StrokeScript {
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut commands = Vec::new();
        for (idx, raw) in source.lines().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            let cmd = parse_line(line).map_err(|message| ScriptError::Parse {
                line: idx + 1,
                message,
            })?;
            commands.push(cmd);
        }
        Ok(Self { commands })
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Replay every command in order. Only artwork loading can fail; editing
    /// commands on an unloaded session are ignored like any other input.
    pub fn run(&self, session: &mut CanvasEditorSession) -> Result<(), ScriptError> {
        let mut origin = pos2(0.0, 0.0);
        for cmd in &self.commands {
            let (w, h) = session.surfaces().dimensions();
            let bounds = Rect::from_min_size(origin, session.viewport().display_size(w, h));
            match *cmd {
                Command::Artwork(artwork) => session.load_artwork(artwork)?,
                Command::Tool(tool) => session.set_tool(tool),
                Command::Color(index) => {
                    session.settings_mut().select_palette(index);
                }
                Command::Gradient(Some(on)) => session.settings_mut().set_gradient(on),
                Command::Gradient(None) => session.settings_mut().toggle_gradient(),
                Command::Size(SizeChange::Set(v)) => session.settings_mut().set_size(v),
                Command::Size(SizeChange::Increase) => session.settings_mut().increase_size(),
                Command::Size(SizeChange::Decrease) => session.settings_mut().decrease_size(),
                Command::Zoom(ZoomChange::In) => session.viewport_mut().zoom_in(),
                Command::Zoom(ZoomChange::Out) => session.viewport_mut().zoom_out(),
                Command::Zoom(ZoomChange::Reset) => session.viewport_mut().reset_zoom(),
                Command::Zoom(ZoomChange::Set(z)) => session.viewport_mut().set_zoom(z),
                Command::Bounds(p) => origin = p,
                Command::Down(p) => session.pointer_down(p, bounds),
                Command::Move(p) => session.pointer_move(p, bounds),
                Command::Up => session.pointer_up(),
                Command::Click(p) => {
                    session.pointer_down(p, bounds);
                    session.pointer_up();
                }
                Command::Undo => {
                    session.undo();
                }
                Command::Redo => {
                    session.redo();
                }
                Command::Reset => session.reset(),
            }
        }
        // a script that ends mid-stroke still records it
        session.pointer_up();
        Ok(())
    }
}

/// Cut a `#` comment. A `#` glued to a word (`#FF0000`) is a hex color, not
/// a comment, unless it opens the line.
fn strip_comment(raw: &str) -> &str {
    for (i, c) in raw.char_indices() {
        if c != '#' {
            continue;
        }
        let rest = &raw[i + 1..];
        if raw[..i].trim().is_empty() || rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return &raw[..i];
        }
    }
    raw
}

fn parse_line(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Err("empty command".into());
    };
    let args: Vec<&str> = words.collect();
    let want = |n: usize| -> Result<(), String> {
        if args.len() == n {
            Ok(())
        } else {
            Err(format!("'{}' takes {} argument(s), got {}", keyword, n, args.len()))
        }
    };

    let cmd = match keyword.to_ascii_lowercase().as_str() {
        "artwork" => {
            want(1)?;
            Command::Artwork(Artwork::from_query(Some(args[0])))
        }
        "tool" => {
            want(1)?;
            Command::Tool(Tool::from_name(args[0]).ok_or_else(|| format!("unknown tool '{}'", args[0]))?)
        }
        "color" => {
            want(1)?;
            Command::Color(parse_color(args[0])?)
        }
        "gradient" => {
            want(1)?;
            Command::Gradient(match args[0].to_ascii_lowercase().as_str() {
                "on" | "true" => Some(true),
                "off" | "false" => Some(false),
                "toggle" => None,
                other => return Err(format!("expected on/off/toggle, got '{}'", other)),
            })
        }
        "size" => {
            want(1)?;
            Command::Size(match args[0] {
                "+" => SizeChange::Increase,
                "-" => SizeChange::Decrease,
                v => SizeChange::Set(v.parse().map_err(|_| format!("bad size '{}'", v))?),
            })
        }
        "zoom" => {
            want(1)?;
            Command::Zoom(match args[0].to_ascii_lowercase().as_str() {
                "in" => ZoomChange::In,
                "out" => ZoomChange::Out,
                "reset" => ZoomChange::Reset,
                v => ZoomChange::Set(v.parse().map_err(|_| format!("bad zoom '{}'", v))?),
            })
        }
        "bounds" => {
            want(2)?;
            Command::Bounds(parse_point(&args)?)
        }
        "down" => {
            want(2)?;
            Command::Down(parse_point(&args)?)
        }
        "move" => {
            want(2)?;
            Command::Move(parse_point(&args)?)
        }
        "click" => {
            want(2)?;
            Command::Click(parse_point(&args)?)
        }
        "up" => {
            want(0)?;
            Command::Up
        }
        "undo" => {
            want(0)?;
            Command::Undo
        }
        "redo" => {
            want(0)?;
            Command::Redo
        }
        "reset" => {
            want(0)?;
            Command::Reset
        }
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(cmd)
}

/// Palette index from a hex code, a swatch name or a bare index.
fn parse_color(arg: &str) -> Result<usize, String> {
    if arg.starts_with('#') {
        let c = parse_hex(arg).ok_or_else(|| format!("bad hex color '{}'", arg))?;
        return palette_index(c).ok_or_else(|| format!("{} is not a palette color", arg));
    }
    if let Some(i) = PALETTE_NAMES.iter().position(|n| n.eq_ignore_ascii_case(arg)) {
        return Ok(i);
    }
    match arg.parse::<usize>() {
        Ok(i) if i < PALETTE.len() => Ok(i),
        _ => Err(format!("unknown color '{}'", arg)),
    }
}

fn parse_point(args: &[&str]) -> Result<Pos2, String> {
    let x: f32 = args[0].parse().map_err(|_| format!("bad x '{}'", args[0]))?;
    let y: f32 = args[1].parse().map_err(|_| format!("bad y '{}'", args[1]))?;
    Ok(pos2(x, y))
}
