use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, TextureHandle, TextureOptions, pos2, vec2};
use std::path::PathBuf;

use crate::assets::{AppSettings, Artwork};
use crate::canvas::{MAX_ZOOM, MIN_ZOOM};
use crate::cli::CliArgs;
use crate::components::colors::{PALETTE, PALETTE_NAMES, to_hex};
use crate::components::tools::{MAX_SIZE, MIN_SIZE, Tool};
use crate::io::{self, PROJECT_EXTENSION};
use crate::session::{CanvasEditorSession, SessionOptions};
use crate::{log_err, log_info};

const SWATCH_SIZE: f32 = 26.0;
/// Hint color for the gradient button (second gradient stop).
const GRADIENT_HINT: Color32 = Color32::from_rgb(0xFF, 0x7F, 0x00);

/// The coloring page window.
pub struct ReefPaintApp {
    session: CanvasEditorSession,
    settings: AppSettings,
    canvas_texture: Option<TextureHandle>,
    /// Composite needs re-uploading before the next paint.
    canvas_dirty: bool,
    last_pointer: Option<Pos2>,
    status: Option<String>,
}

impl ReefPaintApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, args: &CliArgs) -> Self {
        let settings = AppSettings::load();
        let mut options = SessionOptions::from(&settings);
        if args.seed.is_some() {
            options.spray_seed = args.seed;
        }
        let mut app = Self {
            session: CanvasEditorSession::new(options),
            settings,
            canvas_texture: None,
            canvas_dirty: true,
            last_pointer: None,
            status: None,
        };

        let loaded = match &args.artwork_file {
            Some(path) => app.session.load_artwork_file(path).map_err(|e| e.to_string()),
            None => {
                let artwork = match args.artwork.as_deref() {
                    Some(id) => Artwork::from_query(Some(id)),
                    None => app.settings.default_artwork,
                };
                app.session.load_artwork(artwork).map_err(|e| e.to_string())
            }
        };
        if let Err(e) = loaded {
            app.status = Some(format!("Could not load artwork: {}", e));
        }
        if let Some(path) = &args.project {
            app.open_progress_path(path.clone());
        }
        app
    }

    // ========================================================================
    // FILE ACTIONS
    // ========================================================================

    fn save_png(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.settings.export_file_name)
            .add_filter("PNG", &["png"])
            .save_file()
        else {
            return;
        };
        self.status = Some(match self.session.export_to(&path) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => {
                log_err!("Export failed: {}", e);
                format!("Save failed: {}", e)
            }
        });
    }

    fn open_line_art(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg", "bmp", "webp"])
            .pick_file()
        else {
            return;
        };
        if let Err(e) = self.session.load_artwork_file(&path) {
            self.status = Some(format!("Could not open {}: {}", path.display(), e));
        } else {
            self.status = None;
        }
        self.canvas_dirty = true;
    }

    fn choose_artwork(&mut self, artwork: Artwork) {
        if self.session.artwork_id() == Some(artwork.id()) {
            return;
        }
        if let Err(e) = self.session.load_artwork(artwork) {
            self.status = Some(format!("Could not load artwork: {}", e));
        } else {
            self.status = None;
        }
        self.settings.default_artwork = artwork;
        self.settings.save();
        self.canvas_dirty = true;
    }

    fn save_progress(&mut self) {
        let project = match self.session.progress() {
            Ok(p) => p,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("colorir.{}", PROJECT_EXTENSION))
            .add_filter("ReefPaint progress", &[PROJECT_EXTENSION])
            .save_file()
        else {
            return;
        };
        self.status = Some(match io::save_project(&project, &path) {
            Ok(()) => format!("Progress saved to {}", path.display()),
            Err(e) => format!("Could not save progress: {}", e),
        });
    }

    fn open_progress(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("ReefPaint progress", &[PROJECT_EXTENSION])
            .pick_file()
        {
            self.open_progress_path(path);
        }
    }

    fn open_progress_path(&mut self, path: PathBuf) {
        let result = io::load_project(&path).and_then(|p| self.session.restore_progress(&p));
        match result {
            Ok(()) => {
                log_info!("Opened progress {}", path.display());
                self.status = None;
            }
            Err(e) => {
                log_err!("Could not open progress {}: {}", path.display(), e);
                self.status = Some(format!("Could not open {}: {}", path.display(), e));
            }
        }
        self.canvas_dirty = true;
    }

    // ========================================================================
    // PANELS
    // ========================================================================

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let current = self.session.artwork_id().and_then(Artwork::from_id);
            let mut picked = current;
            egui::ComboBox::from_id_source("artwork_picker")
                .selected_text(current.map_or("Custom line art", |a| a.title()))
                .show_ui(ui, |ui| {
                    for art in Artwork::all() {
                        ui.selectable_value(&mut picked, Some(*art), art.title());
                    }
                });
            if picked != current
                && let Some(artwork) = picked
            {
                self.choose_artwork(artwork);
            }
            if ui.button("Open line art…").clicked() {
                self.open_line_art();
            }

            ui.separator();

            let settings = self.session.settings();
            let flat_color = (!settings.gradient_active()).then(|| settings.color());
            for (i, color) in PALETTE.iter().enumerate() {
                let fill = Color32::from_rgb(color[0], color[1], color[2]);
                let selected = flat_color == Some(*color);
                let stroke = if selected {
                    egui::Stroke::new(3.0, Color32::WHITE)
                } else {
                    egui::Stroke::new(1.0, Color32::DARK_GRAY)
                };
                let resp = ui
                    .add(
                        egui::Button::new("")
                            .fill(fill)
                            .stroke(stroke)
                            .min_size(vec2(SWATCH_SIZE, SWATCH_SIZE)),
                    )
                    .on_hover_text(format!("{} {}", PALETTE_NAMES[i], to_hex(*color)));
                if resp.clicked() {
                    self.session.settings_mut().select_palette(i);
                }
            }
            let gradient = self.session.settings().gradient_active();
            if ui
                .add(egui::SelectableLabel::new(
                    gradient,
                    egui::RichText::new("🌈 Gradient").color(if gradient { GRADIENT_HINT } else { Color32::GRAY }),
                ))
                .clicked()
            {
                self.session.settings_mut().toggle_gradient();
            }

            ui.separator();

            ui.label("Size");
            if ui.button("−").clicked() {
                self.session.settings_mut().decrease_size();
            }
            let mut size = self.session.settings().size();
            if ui.add(egui::Slider::new(&mut size, MIN_SIZE..=MAX_SIZE)).changed() {
                self.session.settings_mut().set_size(size as i64);
            }
            if ui.button("+").clicked() {
                self.session.settings_mut().increase_size();
            }
        });

        ui.horizontal_wrapped(|ui| {
            let active = self.session.settings().tool();
            for tool in Tool::all() {
                if ui.selectable_label(active == *tool, tool.label()).clicked() {
                    self.session.set_tool(*tool);
                }
            }

            ui.separator();

            if ui
                .add_enabled(self.session.history().can_undo(), egui::Button::new("Undo"))
                .clicked()
            {
                self.session.undo();
                self.canvas_dirty = true;
            }
            if ui
                .add_enabled(self.session.history().can_redo(), egui::Button::new("Redo"))
                .clicked()
            {
                self.session.redo();
                self.canvas_dirty = true;
            }

            ui.separator();

            let zoom = self.session.viewport().zoom();
            if ui.add_enabled(zoom > MIN_ZOOM, egui::Button::new("🔍−")).clicked() {
                self.session.viewport_mut().zoom_out();
            }
            if ui.button(format!("{:.0}%", zoom * 100.0)).on_hover_text("Reset zoom").clicked() {
                self.session.viewport_mut().reset_zoom();
            }
            if ui.add_enabled(zoom < MAX_ZOOM, egui::Button::new("🔍+")).clicked() {
                self.session.viewport_mut().zoom_in();
            }

            ui.separator();

            if ui.button("Save PNG").clicked() {
                self.save_png();
            }
            if ui.button("Save progress").clicked() {
                self.save_progress();
            }
            if ui.button("Open progress").clicked() {
                self.open_progress();
            }
            if ui.button("Reset").clicked() {
                self.session.reset();
                self.canvas_dirty = true;
            }
        });
    }

    fn show_canvas(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        if !self.session.is_loaded() {
            ui.centered_and_justified(|ui| {
                ui.label("No artwork loaded");
            });
            return;
        }

        self.refresh_texture(ctx);
        let Some(texture_id) = self.canvas_texture.as_ref().map(|t| t.id()) else {
            return;
        };

        let (w, h) = self.session.surfaces().dimensions();
        let size = self.session.viewport().display_size(w, h);
        egui::ScrollArea::both().show(ui, |ui| {
            let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
            ui.painter().image(
                texture_id,
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
            ui.painter()
                .rect_stroke(rect, 0.0, egui::Stroke::new(1.0, Color32::from_gray(90)));

            self.handle_pointer(ctx, rect, response.hovered());
        });
    }

    /// Raw pointer handling: a stroke keeps receiving moves after the cursor
    /// leaves the canvas until the button is released.
    fn handle_pointer(&mut self, ctx: &egui::Context, rect: Rect, hovered: bool) {
        let (pressed, down, released, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });

        if pressed && hovered {
            if let Some(p) = pos {
                self.session.pointer_down(p, rect);
                self.last_pointer = Some(p);
                self.canvas_dirty = true;
            }
        } else if down
            && self.session.is_drawing()
            && let Some(p) = pos
            && self.last_pointer != Some(p)
        {
            self.session.pointer_move(p, rect);
            self.last_pointer = Some(p);
            self.canvas_dirty = true;
        }

        if released {
            self.session.pointer_up();
            self.last_pointer = None;
        }
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.canvas_dirty && self.canvas_texture.is_some() {
            return;
        }
        let page = match self.session.export_image() {
            Ok(page) => page,
            Err(_) => return,
        };
        let size = [page.width() as usize, page.height() as usize];
        let image = ColorImage::from_rgba_unmultiplied(size, page.as_raw());
        match &mut self.canvas_texture {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                self.canvas_texture = Some(ctx.load_texture("reef_canvas", image, TextureOptions::NEAREST));
            }
        }
        self.canvas_dirty = false;
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (redo, undo, redo_alt, save) = ctx.input_mut(|i| {
            (
                i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::S),
            )
        });
        if undo {
            self.session.undo();
            self.canvas_dirty = true;
        }
        if redo || redo_alt {
            self.session.redo();
            self.canvas_dirty = true;
        }
        if save {
            self.save_png();
        }
    }
}

impl eframe::App for ReefPaintApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_toolbar(ui);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else {
                    let (w, h) = self.session.surfaces().dimensions();
                    ui.label(format!(
                        "{}×{}  ·  {}  ·  size {}  ·  undo {}",
                        w,
                        h,
                        self.session.settings().tool().label(),
                        self.session.settings().size(),
                        self.session.history().undo_count().saturating_sub(1),
                    ));
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_canvas(ctx, ui);
        });
    }
}
