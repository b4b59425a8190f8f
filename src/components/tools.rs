use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::canvas::{blend_over, erase};
use crate::components::colors::{PALETTE, palette_index, sample_gradient};

// ============================================================================
// TOOL SETTINGS
// ============================================================================

pub const MIN_SIZE: u32 = 1;
pub const MAX_SIZE: u32 = 200;
pub const SIZE_STEP: u32 = 2;
pub const DEFAULT_SIZE: u32 = 6;

/// Marker strokes are wider and translucent.
pub const MARKER_WIDTH_FACTOR: f32 = 1.6;
pub const MARKER_OPACITY: f32 = 0.35;
/// Fine pen width is a third of the setting (never below one pixel).
pub const FINE_WIDTH_DIVISOR: f32 = 3.0;
/// Minimum number of dabs per spray burst.
pub const SPRAY_MIN_DENSITY: u32 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub enum Tool {
    #[default]
    Brush,
    Fine,
    Marker,
    Spray,
    Eraser,
    Bucket,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Brush,
            Tool::Fine,
            Tool::Marker,
            Tool::Spray,
            Tool::Eraser,
            Tool::Bucket,
        ]
    }

    /// Stable lowercase identifier, used by scripts and settings.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Brush => "brush",
            Tool::Fine => "fine",
            Tool::Marker => "marker",
            Tool::Spray => "spray",
            Tool::Eraser => "eraser",
            Tool::Bucket => "bucket",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Brush => "Brush",
            Tool::Fine => "Fine pen",
            Tool::Marker => "Highlighter",
            Tool::Spray => "Spray",
            Tool::Eraser => "Eraser",
            Tool::Bucket => "Bucket",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Tool::all()
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Where paint color comes from: one palette swatch or the gradient field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSource {
    Flat(Rgba<u8>),
    Gradient,
}

/// The active tool, its width and the current color choice.
///
/// Gradient mode and a flat palette color are mutually exclusive: picking a
/// swatch turns gradient mode off. The last swatch is remembered so turning
/// gradient mode off again falls back to it.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSettings {
    tool: Tool,
    size: u32,
    color: Rgba<u8>,
    gradient: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

impl ToolSettings {
    pub fn new(size: u32) -> Self {
        Self {
            tool: Tool::Brush,
            size: size.clamp(MIN_SIZE, MAX_SIZE),
            color: PALETTE[0],
            gradient: false,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Set the width, clamping into `MIN_SIZE..=MAX_SIZE`.
    pub fn set_size(&mut self, size: i64) {
        self.size = size.clamp(MIN_SIZE as i64, MAX_SIZE as i64) as u32;
    }

    pub fn increase_size(&mut self) {
        self.set_size(self.size as i64 + SIZE_STEP as i64);
    }

    pub fn decrease_size(&mut self) {
        self.set_size(self.size as i64 - SIZE_STEP as i64);
    }

    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    /// Pick palette swatch `index`. Disables gradient mode.
    pub fn select_palette(&mut self, index: usize) -> bool {
        match PALETTE.get(index) {
            Some(c) => {
                self.color = *c;
                self.gradient = false;
                true
            }
            None => false,
        }
    }

    /// Pick a color by value; only palette colors are accepted.
    pub fn select_color(&mut self, color: Rgba<u8>) -> bool {
        match palette_index(color) {
            Some(i) => self.select_palette(i),
            None => false,
        }
    }

    pub fn gradient_active(&self) -> bool {
        self.gradient
    }

    pub fn set_gradient(&mut self, active: bool) {
        self.gradient = active;
    }

    pub fn toggle_gradient(&mut self) {
        self.gradient = !self.gradient;
    }

    pub fn color_source(&self) -> ColorSource {
        if self.gradient {
            ColorSource::Gradient
        } else {
            ColorSource::Flat(self.color)
        }
    }
}

// ============================================================================
// STROKE STYLE
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeKind {
    /// Round-capped path painted source-over.
    Paint,
    /// Round-capped path that removes overlay alpha.
    Erase,
    /// Scattered single-pixel dabs around the pointer.
    Spray,
}

/// Paint parameters resolved from [`ToolSettings`] when a stroke begins, so
/// setting changes mid-stroke do not leak into it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub kind: StrokeKind,
    /// Path width in pixels (spray: scatter radius).
    pub width: f32,
    pub opacity: f32,
    pub source: ColorSource,
}

impl StrokeStyle {
    /// `None` for the bucket, which fills instead of stroking.
    pub fn from_settings(settings: &ToolSettings) -> Option<Self> {
        let size = settings.size() as f32;
        let flat = ColorSource::Flat(settings.color());
        let style = match settings.tool() {
            Tool::Brush => StrokeStyle {
                kind: StrokeKind::Paint,
                width: size,
                opacity: 1.0,
                source: settings.color_source(),
            },
            Tool::Fine => StrokeStyle {
                kind: StrokeKind::Paint,
                width: (size / FINE_WIDTH_DIVISOR).round().max(1.0),
                opacity: 1.0,
                source: flat,
            },
            Tool::Marker => StrokeStyle {
                kind: StrokeKind::Paint,
                width: size * MARKER_WIDTH_FACTOR,
                opacity: MARKER_OPACITY,
                source: flat,
            },
            Tool::Spray => StrokeStyle {
                kind: StrokeKind::Spray,
                width: size,
                opacity: 1.0,
                source: flat,
            },
            Tool::Eraser => StrokeStyle {
                kind: StrokeKind::Erase,
                width: size,
                opacity: 1.0,
                source: flat,
            },
            Tool::Bucket => return None,
        };
        Some(style)
    }

    /// Number of dabs per spray burst.
    pub fn spray_density(&self) -> u32 {
        SPRAY_MIN_DENSITY.max(self.width as u32 * 2)
    }
}

// ============================================================================
// STROKE RENDERER
// ============================================================================

/// One pointer-down → pointer-up path on the overlay.
///
/// Path strokes keep a copy of the overlay as it was when the stroke began and
/// a per-pixel coverage mask. Each new segment raises coverage and recomputes
/// touched pixels from that origin, so overlapping segments of one stroke do
/// not stack translucent paint (a marker stroke stays at its opacity where
/// it crosses itself).
pub struct StrokeRenderer {
    style: StrokeStyle,
    last: (i32, i32),
    origin: Option<RgbaImage>,
    coverage: Vec<u8>,
}

impl StrokeRenderer {
    /// Start a stroke at surface position `pos`. Spray deposits its first burst
    /// immediately; path tools only record the starting point.
    pub fn begin<R: Rng + ?Sized>(
        style: StrokeStyle,
        overlay: &mut RgbaImage,
        pos: (i32, i32),
        rng: &mut R,
    ) -> Self {
        let mut stroke = Self {
            style,
            last: pos,
            origin: None,
            coverage: Vec::new(),
        };
        match style.kind {
            StrokeKind::Spray => stroke.spray(overlay, pos, rng),
            StrokeKind::Paint | StrokeKind::Erase => {
                stroke.origin = Some(overlay.clone());
                stroke.coverage = vec![0; overlay.width() as usize * overlay.height() as usize];
            }
        }
        stroke
    }

    /// Continue the stroke to `pos`.
    pub fn extend<R: Rng + ?Sized>(&mut self, overlay: &mut RgbaImage, pos: (i32, i32), rng: &mut R) {
        match self.style.kind {
            StrokeKind::Spray => self.spray(overlay, pos, rng),
            StrokeKind::Paint | StrokeKind::Erase => self.segment(overlay, self.last, pos),
        }
        self.last = pos;
    }

    fn spray<R: Rng + ?Sized>(&self, overlay: &mut RgbaImage, center: (i32, i32), rng: &mut R) {
        let color = match self.style.source {
            ColorSource::Flat(c) => Rgba([c[0], c[1], c[2], 255]),
            ColorSource::Gradient => return,
        };
        let (w, h) = overlay.dimensions();
        for _ in 0..self.style.spray_density() {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let radius = rng.random::<f32>() * self.style.width;
            let x = (center.0 as f32 + angle.cos() * radius).floor();
            let y = (center.1 as f32 + angle.sin() * radius).floor();
            if x >= 0.0 && y >= 0.0 && (x as u32) < w && (y as u32) < h {
                overlay.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Rasterize a round-capped segment. Joins come out round because every
    /// segment carries its own caps.
    fn segment(&mut self, overlay: &mut RgbaImage, from: (i32, i32), to: (i32, i32)) {
        let Some(origin) = self.origin.as_ref() else { return };
        let (w, h) = overlay.dimensions();
        if w == 0 || h == 0 {
            return;
        }

        let radius = self.style.width / 2.0;
        let (ax, ay) = (from.0 as f32, from.1 as f32);
        let (bx, by) = (to.0 as f32, to.1 as f32);
        let pad = radius + 1.0;

        let min_x = (ax.min(bx) - pad).floor().max(0.0) as u32;
        let min_y = (ay.min(by) - pad).floor().max(0.0) as u32;
        let max_x = (ax.max(bx) + pad).ceil().min(w as f32 - 1.0);
        let max_y = (ay.max(by) + pad).ceil().min(h as f32 - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let (max_x, max_y) = (max_x as u32, max_y as u32);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dist = segment_distance(x as f32 + 0.5, y as f32 + 0.5, ax, ay, bx, by);
                // One pixel of linear falloff at the edge
                let cov = (radius + 0.5 - dist).clamp(0.0, 1.0);
                let cov8 = (cov * 255.0).round() as u8;
                let idx = y as usize * w as usize + x as usize;
                if cov8 <= self.coverage[idx] {
                    continue;
                }
                self.coverage[idx] = cov8;

                let cov = cov8 as f32 / 255.0;
                let under = *origin.get_pixel(x, y);
                let px = match (self.style.kind, self.style.source) {
                    (StrokeKind::Erase, _) => erase(under, cov),
                    (_, ColorSource::Flat(c)) => blend_over(under, c, self.style.opacity * cov),
                    (_, ColorSource::Gradient) => {
                        blend_over(under, sample_gradient(x, y, w, h), self.style.opacity * cov)
                    }
                };
                overlay.put_pixel(x, y, px);
            }
        }
    }
}

/// Distance from point `(px, py)` to the segment `a`–`b`.
fn segment_distance(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = ax + dx * t;
    let cy = ay + dy * t;
    ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TRANSPARENT;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn settings(tool: Tool, size: i64) -> ToolSettings {
        let mut s = ToolSettings::default();
        s.set_tool(tool);
        s.set_size(size);
        s
    }

    #[test]
    fn size_is_clamped_and_stepped() {
        let mut s = ToolSettings::default();
        assert_eq!(s.size(), DEFAULT_SIZE);
        s.set_size(0);
        assert_eq!(s.size(), 1);
        s.decrease_size();
        assert_eq!(s.size(), 1);
        s.set_size(5000);
        assert_eq!(s.size(), 200);
        s.increase_size();
        assert_eq!(s.size(), 200);
        s.decrease_size();
        assert_eq!(s.size(), 198);
    }

    #[test]
    fn palette_and_gradient_are_exclusive() {
        let mut s = ToolSettings::default();
        s.set_gradient(true);
        assert_eq!(s.color_source(), ColorSource::Gradient);

        assert!(s.select_palette(4));
        assert!(!s.gradient_active());
        assert_eq!(s.color_source(), ColorSource::Flat(PALETTE[4]));

        s.toggle_gradient();
        assert_eq!(s.color_source(), ColorSource::Gradient);
        s.toggle_gradient();
        assert_eq!(s.color_source(), ColorSource::Flat(PALETTE[4]));

        assert!(!s.select_palette(8));
        assert!(!s.select_color(Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn per_tool_widths() {
        let brush = StrokeStyle::from_settings(&settings(Tool::Brush, 10)).unwrap();
        assert_eq!(brush.width, 10.0);
        assert_eq!(brush.opacity, 1.0);

        let fine = StrokeStyle::from_settings(&settings(Tool::Fine, 10)).unwrap();
        assert_eq!(fine.width, 3.0);
        let fine_small = StrokeStyle::from_settings(&settings(Tool::Fine, 1)).unwrap();
        assert_eq!(fine_small.width, 1.0);

        let marker = StrokeStyle::from_settings(&settings(Tool::Marker, 10)).unwrap();
        assert!((marker.width - 16.0).abs() < 1e-4);
        assert_eq!(marker.opacity, MARKER_OPACITY);

        assert!(StrokeStyle::from_settings(&settings(Tool::Bucket, 10)).is_none());
    }

    #[test]
    fn only_brush_uses_gradient() {
        let mut s = settings(Tool::Brush, 4);
        s.set_gradient(true);
        assert_eq!(StrokeStyle::from_settings(&s).unwrap().source, ColorSource::Gradient);
        s.set_tool(Tool::Marker);
        assert_eq!(
            StrokeStyle::from_settings(&s).unwrap().source,
            ColorSource::Flat(PALETTE[0])
        );
    }

    #[test]
    fn spray_density_has_a_floor() {
        assert_eq!(StrokeStyle::from_settings(&settings(Tool::Spray, 2)).unwrap().spray_density(), 12);
        assert_eq!(StrokeStyle::from_settings(&settings(Tool::Spray, 30)).unwrap().spray_density(), 60);
    }

    #[test]
    fn brush_segment_paints_opaque_core() {
        let mut overlay = RgbaImage::new(40, 20);
        let mut rng = StdRng::seed_from_u64(1);
        let style = StrokeStyle::from_settings(&settings(Tool::Brush, 6)).unwrap();

        let mut stroke = StrokeRenderer::begin(style, &mut overlay, (5, 10), &mut rng);
        // pointer-down alone leaves no mark
        assert!(overlay.pixels().all(|p| *p == TRANSPARENT));

        stroke.extend(&mut overlay, (30, 10), &mut rng);
        assert_eq!(*overlay.get_pixel(15, 10), PALETTE[0]);
        assert_eq!(*overlay.get_pixel(15, 9), PALETTE[0]);
        // round cap extends past the end point, but not far
        assert_eq!(*overlay.get_pixel(31, 10), PALETTE[0]);
        assert_eq!(*overlay.get_pixel(36, 10), TRANSPARENT);
        assert_eq!(*overlay.get_pixel(15, 2), TRANSPARENT);
    }

    #[test]
    fn gradient_brush_samples_the_field_per_pixel() {
        let mut brush = settings(Tool::Brush, 6);
        brush.set_gradient(true);
        let style = StrokeStyle::from_settings(&brush).unwrap();
        assert_eq!(style.source, ColorSource::Gradient);

        let mut overlay = RgbaImage::new(100, 100);
        let mut rng = StdRng::seed_from_u64(1);
        let mut stroke = StrokeRenderer::begin(style, &mut overlay, (10, 50), &mut rng);
        stroke.extend(&mut overlay, (90, 50), &mut rng);

        let left = *overlay.get_pixel(20, 50);
        let right = *overlay.get_pixel(80, 50);
        assert_eq!(left, sample_gradient(20, 50, 100, 100));
        assert_eq!(right, sample_gradient(80, 50, 100, 100));
        assert_ne!(left, right);
    }

    #[test]
    fn marker_does_not_stack_within_one_stroke() {
        let mut overlay = RgbaImage::new(30, 30);
        let mut rng = StdRng::seed_from_u64(2);
        let style = StrokeStyle::from_settings(&settings(Tool::Marker, 4)).unwrap();

        let mut stroke = StrokeRenderer::begin(style, &mut overlay, (2, 15), &mut rng);
        stroke.extend(&mut overlay, (27, 15), &mut rng);
        let once = *overlay.get_pixel(15, 15);
        stroke.extend(&mut overlay, (2, 15), &mut rng);
        assert_eq!(*overlay.get_pixel(15, 15), once);
        assert_eq!(once[3], (MARKER_OPACITY * 255.0).round() as u8);
    }

    #[test]
    fn eraser_clears_painted_pixels() {
        let mut overlay = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 255, 255]));
        let mut rng = StdRng::seed_from_u64(3);
        let style = StrokeStyle::from_settings(&settings(Tool::Eraser, 4)).unwrap();

        let mut stroke = StrokeRenderer::begin(style, &mut overlay, (0, 10), &mut rng);
        stroke.extend(&mut overlay, (19, 10), &mut rng);
        assert_eq!(*overlay.get_pixel(10, 10), TRANSPARENT);
        assert_eq!(*overlay.get_pixel(10, 2), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn spray_stays_within_radius() {
        let mut overlay = RgbaImage::new(100, 100);
        let mut rng = StdRng::seed_from_u64(4);
        let style = StrokeStyle::from_settings(&settings(Tool::Spray, 10)).unwrap();

        let stroke = StrokeRenderer::begin(style, &mut overlay, (50, 50), &mut rng);
        drop(stroke);
        let painted: Vec<(u32, u32)> = overlay
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] != 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!painted.is_empty());
        assert!(painted.len() <= 20);
        for (x, y) in painted {
            let dx = x as f32 - 50.0;
            let dy = y as f32 - 50.0;
            assert!((dx * dx + dy * dy).sqrt() <= 10.0 + 1.5);
        }
    }
}
