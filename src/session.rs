use egui::{Pos2, Rect};
use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;

use crate::assets::{AppSettings, Artwork};
use crate::canvas::{SurfaceError, Surfaces, ViewportState};
use crate::components::fill::{FillOutcome, WallThreshold, fill_color, flood_fill};
use crate::components::history::{DEFAULT_HISTORY_LIMIT, HistoryManager};
use crate::components::tools::{DEFAULT_SIZE, StrokeRenderer, StrokeStyle, Tool, ToolSettings};
use crate::io::{self, ArtworkError, ExportError, ProgressProject, ProjectError};
use crate::{log_err, log_info};

/// Construction-time knobs for a [`CanvasEditorSession`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionOptions {
    pub history_limit: usize,
    pub default_size: u32,
    pub walls: WallThreshold,
    /// Fixed spray seed; `None` seeds from the OS.
    pub spray_seed: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_size: DEFAULT_SIZE,
            walls: WallThreshold::default(),
            spray_seed: None,
        }
    }
}

impl From<&AppSettings> for SessionOptions {
    fn from(settings: &AppSettings) -> Self {
        Self {
            history_limit: settings.max_undo_steps,
            default_size: settings.default_size,
            walls: settings.walls,
            spray_seed: settings.spray_seed,
        }
    }
}

// ============================================================================
// CANVAS EDITOR SESSION
// ============================================================================

/// Exclusive owner of one coloring page: both surfaces, the tool settings,
/// the viewport, and the undo/redo history.
///
/// Every editing operation is a method here and none of them fail. Input that
/// arrives before an artwork is loaded is ignored, coordinates off the surface
/// are clipped, and history failures are logged and skipped.
pub struct CanvasEditorSession {
    artwork_id: Option<String>,
    surfaces: Surfaces,
    settings: ToolSettings,
    viewport: ViewportState,
    history: HistoryManager,
    walls: WallThreshold,
    stroke: Option<StrokeRenderer>,
    rng: StdRng,
}

impl Default for CanvasEditorSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl CanvasEditorSession {
    pub fn new(options: SessionOptions) -> Self {
        let rng = match options.spray_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            artwork_id: None,
            surfaces: Surfaces::new(),
            settings: ToolSettings::new(options.default_size),
            viewport: ViewportState::default(),
            history: HistoryManager::new(options.history_limit),
            walls: options.walls,
            stroke: None,
            rng,
        }
    }

    // ---- artwork loading ----

    /// Load one of the embedded presets.
    pub fn load_artwork(&mut self, artwork: Artwork) -> Result<(), ArtworkError> {
        match io::decode_artwork(artwork.bytes()) {
            Ok(img) => {
                self.load_image(Some(artwork.id().to_string()), img);
                Ok(())
            }
            Err(e) => {
                self.fail_load(&format!("preset {}", artwork.id()), &e);
                Err(e)
            }
        }
    }

    /// Load line art from a file on disk.
    pub fn load_artwork_file(&mut self, path: &Path) -> Result<(), ArtworkError> {
        match io::load_artwork_file(path) {
            Ok(img) => {
                self.load_image(None, img);
                Ok(())
            }
            Err(e) => {
                self.fail_load(&path.display().to_string(), &e);
                Err(e)
            }
        }
    }

    /// Install decoded line art. The overlay starts fully transparent and the
    /// history holds only that cleared state; nothing carries over from the
    /// previous artwork.
    pub fn load_image(&mut self, artwork_id: Option<String>, artwork: RgbaImage) {
        self.stroke = None;
        self.surfaces.load(artwork);
        self.history.reseed(self.surfaces.overlay());
        log_info!(
            "Loaded artwork {} ({}x{})",
            artwork_id.as_deref().unwrap_or("<file>"),
            self.surfaces.width(),
            self.surfaces.height()
        );
        self.artwork_id = artwork_id;
    }

    fn fail_load(&mut self, what: &str, e: &ArtworkError) {
        log_err!("Failed to load artwork {}: {}", what, e);
        self.stroke = None;
        self.surfaces.unload();
        self.history.clear();
        self.artwork_id = None;
    }

    // ---- pointer input (screen space) ----

    /// Pointer pressed at `screen` while the overlay is drawn inside `bounds`.
    pub fn pointer_down(&mut self, screen: Pos2, bounds: Rect) {
        let (x, y) = self.viewport.screen_to_surface(screen, bounds);
        self.press_at(x, y);
    }

    pub fn pointer_move(&mut self, screen: Pos2, bounds: Rect) {
        let (x, y) = self.viewport.screen_to_surface(screen, bounds);
        self.drag_to(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.release();
    }

    // ---- pointer input (surface space) ----

    /// Begin a stroke, or fill when the bucket is active. The overlay is
    /// recorded before anything is drawn.
    pub fn press_at(&mut self, x: i32, y: i32) {
        if !self.surfaces.is_loaded() {
            return;
        }
        self.stroke = None;
        self.history.push(self.surfaces.overlay());

        let Some(style) = StrokeStyle::from_settings(&self.settings) else {
            // fills complete on press, so the result is recorded right away
            if self.bucket_fill(x, y).changed() {
                self.history.push(self.surfaces.overlay());
            }
            return;
        };
        let overlay = self.surfaces.overlay_mut();
        self.stroke = Some(StrokeRenderer::begin(style, overlay, (x, y), &mut self.rng));
    }

    /// Extend the active stroke. Ignored when no stroke is in progress.
    pub fn drag_to(&mut self, x: i32, y: i32) {
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.extend(self.surfaces.overlay_mut(), (x, y), &mut self.rng);
        }
    }

    /// Finish the active stroke and record the result.
    pub fn release(&mut self) {
        if self.stroke.take().is_some() {
            self.history.push(self.surfaces.overlay());
        }
    }

    /// Press and release at one point.
    pub fn click_at(&mut self, x: i32, y: i32) {
        self.press_at(x, y);
        self.release();
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    fn bucket_fill(&mut self, x: i32, y: i32) -> FillOutcome {
        if !self.surfaces.contains(x, y) {
            return FillOutcome::OutOfBounds;
        }
        let (w, h) = self.surfaces.dimensions();
        let color = fill_color(self.settings.color_source(), x as u32, y as u32, w, h);
        let (base, overlay) = self.surfaces.layers_mut();
        flood_fill(base, overlay, (x, y), color, self.walls)
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        self.stroke = None;
        self.history.undo(self.surfaces.overlay_mut())
    }

    pub fn redo(&mut self) -> bool {
        self.stroke = None;
        self.history.redo(self.surfaces.overlay_mut())
    }

    /// Clear everything painted and start the history over from the blank page.
    pub fn reset(&mut self) {
        if !self.surfaces.is_loaded() {
            return;
        }
        self.stroke = None;
        self.surfaces.clear_overlay();
        self.history.reseed(self.surfaces.overlay());
        log_info!("Page reset");
    }

    // ---- export / progress ----

    /// Base with the overlay composited on top, as a fresh image.
    pub fn export_image(&self) -> Result<RgbaImage, ExportError> {
        if !self.surfaces.is_loaded() {
            return Err(ExportError::Unloaded);
        }
        Ok(self.surfaces.composite())
    }

    pub fn export_png(&self) -> Result<Vec<u8>, ExportError> {
        io::encode_png(&self.export_image()?)
    }

    pub fn export_to(&self, path: &Path) -> Result<(), ExportError> {
        io::write_export(&self.export_image()?, path)
    }

    /// Snapshot of the current progress for saving.
    pub fn progress(&self) -> Result<ProgressProject, SurfaceError> {
        if !self.surfaces.is_loaded() {
            return Err(SurfaceError::Unloaded);
        }
        Ok(ProgressProject::new(self.artwork_id.clone(), self.surfaces.overlay()))
    }

    /// Apply saved progress. A project that names a preset loads it first;
    /// one made on file-based line art needs that art already loaded.
    pub fn restore_progress(&mut self, project: &ProgressProject) -> Result<(), ProjectError> {
        let overlay = project.overlay_image()?;

        // Everything is validated before the current page is touched.
        if let Some(id) = project.artwork_id.as_deref()
            && self.artwork_id.as_deref() != Some(id)
        {
            let artwork = Artwork::from_id(id)
                .ok_or_else(|| ProjectError::InvalidFormat(format!("Unknown artwork '{}'", id)))?;
            let img = io::decode_artwork(artwork.bytes())
                .map_err(|e| ProjectError::InvalidFormat(e.to_string()))?;
            if img.dimensions() != overlay.dimensions() {
                return Err(ProjectError::InvalidFormat(format!(
                    "artwork {} is {}x{} but snapshot is {}x{}",
                    id,
                    img.width(),
                    img.height(),
                    overlay.width(),
                    overlay.height()
                )));
            }
            self.load_image(Some(id.to_string()), img);
        }
        self.surfaces
            .replace_overlay(&overlay)
            .map_err(|e| ProjectError::InvalidFormat(e.to_string()))?;
        self.stroke = None;
        self.history.reseed(self.surfaces.overlay());
        log_info!("Restored progress on {}x{} page", project.width, project.height);
        Ok(())
    }

    // ---- accessors ----

    pub fn is_loaded(&self) -> bool {
        self.surfaces.is_loaded()
    }

    pub fn artwork_id(&self) -> Option<&str> {
        self.artwork_id.as_deref()
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    pub fn overlay(&self) -> &RgbaImage {
        self.surfaces.overlay()
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.settings.set_tool(tool);
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportState {
        &mut self.viewport
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }
}
