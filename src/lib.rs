//! ReefPaint: the coloring page of the coral reef site as a desktop app and
//! a headless renderer.
//!
//! [`CanvasEditorSession`] owns one page (line art, paint overlay, tools,
//! zoom and history). The `app` module wraps it in an egui window; `cli`
//! replays stroke scripts against it and writes the finished PNG.

pub mod logger;

pub mod app;
pub mod assets;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod io;
pub mod ops;
pub mod session;

pub use session::{CanvasEditorSession, SessionOptions};
