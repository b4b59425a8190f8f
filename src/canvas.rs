use egui::{Pos2, Rect, Vec2};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

// ============================================================================
// SURFACE ERRORS
// ============================================================================

/// Failure to read or write a pixel surface as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// No artwork has been loaded, the surfaces are zero-sized.
    Unloaded,
    /// A snapshot and the surface it is applied to disagree on size.
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::Unloaded => write!(f, "surface is not loaded"),
            SurfaceError::DimensionMismatch { expected, found } => write!(
                f,
                "surface is {}x{} but snapshot is {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for SurfaceError {}

// ============================================================================
// PIXEL SURFACES - base line art + user overlay
// ============================================================================

/// The two stacked surfaces of the coloring page.
///
/// `base` holds the line art and is only replaced wholesale by [`Surfaces::load`].
/// `overlay` is the transparent layer that receives every edit. Both always
/// share the same dimensions. Pixels are row-major RGBA8, straight alpha.
#[derive(Clone, Debug)]
pub struct Surfaces {
    base: RgbaImage,
    overlay: RgbaImage,
}

impl Default for Surfaces {
    fn default() -> Self {
        Self::new()
    }
}

impl Surfaces {
    /// Zero-sized surfaces; nothing can be drawn until an artwork is loaded.
    pub fn new() -> Self {
        Self {
            base: RgbaImage::new(0, 0),
            overlay: RgbaImage::new(0, 0),
        }
    }

    /// Adopt `artwork` as the base and size a fresh, fully transparent overlay to match.
    pub fn load(&mut self, artwork: RgbaImage) {
        let (w, h) = artwork.dimensions();
        self.base = artwork;
        self.overlay = RgbaImage::new(w, h);
    }

    /// Drop both surfaces back to zero size.
    pub fn unload(&mut self) {
        *self = Self::new();
    }

    pub fn is_loaded(&self) -> bool {
        self.base.width() > 0 && self.base.height() > 0
    }

    pub fn width(&self) -> u32 {
        self.base.width()
    }

    pub fn height(&self) -> u32 {
        self.base.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.base.dimensions()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    pub fn base(&self) -> &RgbaImage {
        &self.base
    }

    pub fn overlay(&self) -> &RgbaImage {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut RgbaImage {
        &mut self.overlay
    }

    /// Split borrow for operations that read the line art while editing the overlay.
    pub fn layers_mut(&mut self) -> (&RgbaImage, &mut RgbaImage) {
        (&self.base, &mut self.overlay)
    }

    pub fn clear_overlay(&mut self) {
        self.overlay.fill(0);
    }

    /// Overwrite the overlay with `pixels`, which must match the surface size.
    pub fn replace_overlay(&mut self, pixels: &RgbaImage) -> Result<(), SurfaceError> {
        if !self.is_loaded() {
            return Err(SurfaceError::Unloaded);
        }
        if pixels.dimensions() != self.overlay.dimensions() {
            return Err(SurfaceError::DimensionMismatch {
                expected: pixels.dimensions(),
                found: self.overlay.dimensions(),
            });
        }
        self.overlay.copy_from_slice(pixels.as_raw());
        Ok(())
    }

    /// Flatten base then overlay onto a fresh transparent surface.
    pub fn composite(&self) -> RgbaImage {
        let (w, h) = self.dimensions();
        let mut out = RgbaImage::new(w, h);
        if w == 0 || h == 0 {
            return out;
        }
        let row_bytes = w as usize * 4;
        let base = self.base.as_raw();
        let overlay = self.overlay.as_raw();

        out.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                let start = y * row_bytes;
                let base_row = &base[start..start + row_bytes];
                let overlay_row = &overlay[start..start + row_bytes];
                for ((dst, b), o) in row
                    .chunks_exact_mut(4)
                    .zip(base_row.chunks_exact(4))
                    .zip(overlay_row.chunks_exact(4))
                {
                    // base over an empty surface is the base itself
                    let px = blend_over(Rgba([b[0], b[1], b[2], b[3]]), Rgba([o[0], o[1], o[2], o[3]]), 1.0);
                    dst.copy_from_slice(&px.0);
                }
            });
        out
    }
}

// ============================================================================
// COMPOSITING
// ============================================================================

/// Source-over blend of `top` onto `base` with straight (non-premultiplied)
/// alpha. `opacity` scales the top pixel's alpha.
pub fn blend_over(base: Rgba<u8>, top: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let top_a = (top[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);

    // Fast paths: nothing to blend / fully covering top
    if top_a <= 0.0 {
        return base;
    }
    if top_a >= 1.0 {
        return Rgba([top[0], top[1], top[2], 255]);
    }
    if base[3] == 0 {
        let a = (top_a * 255.0).round() as u8;
        return if a == 0 { base } else { Rgba([top[0], top[1], top[2], a]) };
    }

    let base_a = base[3] as f32 / 255.0;
    let out_a = top_a + base_a * (1.0 - top_a);
    let mix = |t: u8, b: u8| {
        ((t as f32 * top_a + b as f32 * base_a * (1.0 - top_a)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(top[0], base[0]),
        mix(top[1], base[1]),
        mix(top[2], base[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Destination-out: remove `coverage` (0..1) of the pixel's alpha. Pixels
/// erased to zero alpha come back as fully transparent black, matching a
/// freshly cleared overlay.
pub fn erase(base: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let keep = 1.0 - coverage.clamp(0.0, 1.0);
    let a = (base[3] as f32 * keep).round() as u8;
    if a == 0 {
        TRANSPARENT
    } else {
        Rgba([base[0], base[1], base[2], a])
    }
}

// ============================================================================
// VIEWPORT - zoom + screen-to-surface mapping
// ============================================================================

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.1;

/// Uniform display scale applied to both surfaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    zoom: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self { zoom: 1.0 }
    }
}

impl ViewportState {
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn zoom_in(&mut self) {
        self.zoom = round_hundredths(self.zoom + ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = round_hundredths(self.zoom - ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = round_hundredths(zoom).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// On-screen size of a `width`×`height` surface at the current zoom.
    pub fn display_size(&self, width: u32, height: u32) -> Vec2 {
        Vec2::new(width as f32 * self.zoom, height as f32 * self.zoom)
    }

    /// Map a pointer position to surface pixel coordinates given the overlay's
    /// current on-screen rectangle. Results outside the surface are returned
    /// as-is; callers clip.
    pub fn screen_to_surface(&self, screen: Pos2, bounds: Rect) -> (i32, i32) {
        (
            round_half_up((screen.x - bounds.min.x) / self.zoom),
            round_half_up((screen.y - bounds.min.y) / self.zoom),
        )
    }
}

fn round_hundredths(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Halves round toward positive infinity, so -2.5 maps to -2.
fn round_half_up(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(w, h, color)
    }

    #[test]
    fn load_sizes_overlay_to_artwork() {
        let mut surfaces = Surfaces::new();
        assert!(!surfaces.is_loaded());

        surfaces.load(solid(12, 7, Rgba([255, 255, 255, 255])));
        assert!(surfaces.is_loaded());
        assert_eq!(surfaces.overlay().dimensions(), (12, 7));
        assert!(surfaces.overlay().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn replace_overlay_rejects_wrong_size() {
        let mut surfaces = Surfaces::new();
        assert_eq!(
            surfaces.replace_overlay(&RgbaImage::new(1, 1)),
            Err(SurfaceError::Unloaded)
        );

        surfaces.load(solid(4, 4, TRANSPARENT));
        let err = surfaces.replace_overlay(&RgbaImage::new(3, 4)).unwrap_err();
        assert_eq!(
            err,
            SurfaceError::DimensionMismatch { expected: (3, 4), found: (4, 4) }
        );
    }

    #[test]
    fn composite_with_empty_overlay_is_base() {
        let mut base = solid(5, 3, Rgba([240, 240, 240, 255]));
        base.put_pixel(1, 1, Rgba([10, 20, 30, 128]));
        base.put_pixel(2, 2, TRANSPARENT);
        let mut surfaces = Surfaces::new();
        surfaces.load(base.clone());

        assert_eq!(surfaces.composite(), base);
    }

    #[test]
    fn composite_puts_overlay_on_top() {
        let mut surfaces = Surfaces::new();
        surfaces.load(solid(2, 2, Rgba([0, 0, 0, 255])));
        surfaces.overlay_mut().put_pixel(0, 0, Rgba([255, 0, 0, 255]));

        let out = surfaces.composite();
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn blend_over_half_alpha_on_opaque() {
        let out = blend_over(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255]), 0.5);
        assert_eq!(out, Rgba([128, 128, 128, 255]));
        assert_eq!(blend_over(Rgba([9, 9, 9, 9]), TRANSPARENT, 1.0), Rgba([9, 9, 9, 9]));
    }

    #[test]
    fn erase_clears_to_transparent() {
        assert_eq!(erase(Rgba([50, 60, 70, 255]), 1.0), TRANSPARENT);
        assert_eq!(erase(Rgba([50, 60, 70, 200]), 0.5), Rgba([50, 60, 70, 100]));
    }

    #[test]
    fn zoom_steps_are_clamped() {
        let mut vp = ViewportState::default();
        for _ in 0..40 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom(), MAX_ZOOM);
        for _ in 0..40 {
            vp.zoom_out();
        }
        assert_eq!(vp.zoom(), MIN_ZOOM);
        vp.reset_zoom();
        vp.zoom_in();
        assert!((vp.zoom() - 1.1).abs() < 1e-6);
        vp.set_zoom(12.0);
        assert_eq!(vp.zoom(), MAX_ZOOM);
    }

    #[test]
    fn pointer_mapping_divides_by_zoom() {
        let mut vp = ViewportState::default();
        vp.set_zoom(2.0);
        let bounds = Rect::from_min_size(Pos2::new(100.0, 50.0), Vec2::new(400.0, 300.0));

        assert_eq!(vp.screen_to_surface(Pos2::new(120.0, 70.0), bounds), (10, 10));
        assert_eq!(vp.screen_to_surface(Pos2::new(103.0, 50.0), bounds), (2, 0));
        // left of the surface passes through unclipped
        assert_eq!(vp.screen_to_surface(Pos2::new(90.0, 40.0), bounds), (-5, -5));
    }
}
