use image::{Rgba, RgbaImage};

use crate::components::colors::sample_gradient;
use crate::components::tools::ColorSource;

// ============================================================================
// WALL DETECTION
// ============================================================================

/// Classifies base pixels as line art. A wall is near-opaque and near-black:
/// alpha above `alpha_min` and every color channel below `channel_max`.
///
/// The defaults are tuned to the bundled illustrations; other line art may
/// need different values, which is why they live in the settings file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallThreshold {
    pub alpha_min: u8,
    pub channel_max: u8,
}

impl Default for WallThreshold {
    fn default() -> Self {
        Self {
            alpha_min: 200,
            channel_max: 100,
        }
    }
}

impl WallThreshold {
    #[inline(always)]
    pub fn is_wall(&self, px: &[u8]) -> bool {
        px[3] > self.alpha_min
            && px[0] < self.channel_max
            && px[1] < self.channel_max
            && px[2] < self.channel_max
    }
}

/// Stand-in color for wall pixels when comparing against the seed.
pub const WALL_COLOR: [u8; 4] = [0, 0, 0, 255];

// ============================================================================
// FLOOD FILL
// ============================================================================

/// What a bucket click did to the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillOutcome {
    /// `pixels` overlay pixels were recolored inside `bounds` (inclusive min/max x, y).
    Filled {
        pixels: usize,
        bounds: (u32, u32, u32, u32),
    },
    /// The seed region already has the fill color; nothing was written.
    AlreadyFilled,
    /// The seed is a line-art pixel; nothing was written.
    OnWall,
    /// The seed lies outside the surface.
    OutOfBounds,
}

impl FillOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, FillOutcome::Filled { .. })
    }
}

/// Opaque color a bucket click at `(x, y)` paints with. Gradient mode picks
/// the single gradient color under the seed.
pub fn fill_color(source: ColorSource, x: u32, y: u32, width: u32, height: u32) -> Rgba<u8> {
    match source {
        ColorSource::Flat(c) => Rgba([c[0], c[1], c[2], 255]),
        ColorSource::Gradient => sample_gradient(x, y, width, height),
    }
}

/// Color the fill compares against at pixel index `idx`: walls read as
/// [`WALL_COLOR`], everything else as the overlay's own pixel.
#[inline(always)]
fn effective_color(base: &[u8], overlay: &[u8], idx: usize, walls: WallThreshold) -> [u8; 4] {
    let o = idx * 4;
    if walls.is_wall(&base[o..o + 4]) {
        WALL_COLOR
    } else {
        [overlay[o], overlay[o + 1], overlay[o + 2], overlay[o + 3]]
    }
}

/// Fill the 4-connected region of overlay pixels around `seed` whose effective
/// color equals the seed's, never entering wall pixels of `base`.
///
/// Traversal uses an explicit stack of flat indices over a visited mask, so
/// region size is bounded only by memory. Writes go to a copy of the overlay
/// that is committed in one piece at the end.
pub fn flood_fill(
    base: &RgbaImage,
    overlay: &mut RgbaImage,
    seed: (i32, i32),
    fill: Rgba<u8>,
    walls: WallThreshold,
) -> FillOutcome {
    let (w, h) = overlay.dimensions();
    if base.dimensions() != (w, h)
        || seed.0 < 0
        || seed.1 < 0
        || seed.0 as u32 >= w
        || seed.1 as u32 >= h
    {
        return FillOutcome::OutOfBounds;
    }

    let (start_x, start_y) = (seed.0 as u32, seed.1 as u32);
    let wu = w as usize;
    let base_px = base.as_raw();
    let overlay_px = overlay.as_raw();
    let seed_idx = start_y as usize * wu + start_x as usize;

    let target = effective_color(base_px, overlay_px, seed_idx, walls);
    if target == fill.0 {
        return FillOutcome::AlreadyFilled;
    }
    if walls.is_wall(&base_px[seed_idx * 4..seed_idx * 4 + 4]) {
        return FillOutcome::OnWall;
    }

    let matches = |idx: usize| -> bool {
        let o = idx * 4;
        !walls.is_wall(&base_px[o..o + 4]) && overlay_px[o..o + 4] == target
    };

    let mut visited = vec![false; wu * h as usize];
    let mut buffer = overlay_px.to_vec();
    let mut filled = 0usize;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (start_x, start_y, start_x, start_y);

    let mut stack: Vec<u32> = Vec::with_capacity(4096);
    visited[seed_idx] = true;
    stack.push(seed_idx as u32);

    while let Some(idx) = stack.pop() {
        let idx = idx as usize;
        let x = (idx % wu) as u32;
        let y = (idx / wu) as u32;

        buffer[idx * 4..idx * 4 + 4].copy_from_slice(&fill.0);
        filled += 1;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        let mut visit = |ni: usize| {
            if !visited[ni] && matches(ni) {
                visited[ni] = true;
                stack.push(ni as u32);
            }
        };
        if x > 0 {
            visit(idx - 1);
        }
        if x + 1 < w {
            visit(idx + 1);
        }
        if y > 0 {
            visit(idx - wu);
        }
        if y + 1 < h {
            visit(idx + wu);
        }
    }

    overlay.copy_from_slice(&buffer);
    FillOutcome::Filled {
        pixels: filled,
        bounds: (min_x, min_y, max_x, max_y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TRANSPARENT;

    const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// 10×10 base with a closed square outline from (2,2) to (7,7).
    fn boxed_base() -> RgbaImage {
        let mut base = RgbaImage::new(10, 10);
        for i in 2..=7 {
            base.put_pixel(i, 2, INK);
            base.put_pixel(i, 7, INK);
            base.put_pixel(2, i, INK);
            base.put_pixel(7, i, INK);
        }
        base
    }

    #[test]
    fn wall_threshold_defaults() {
        let walls = WallThreshold::default();
        assert!(walls.is_wall(&[0, 0, 0, 255]));
        assert!(walls.is_wall(&[99, 99, 99, 201]));
        assert!(!walls.is_wall(&[100, 0, 0, 255]));
        assert!(!walls.is_wall(&[0, 0, 0, 200]));
        assert!(!walls.is_wall(&[255, 255, 255, 255]));
    }

    #[test]
    fn fill_stays_inside_outline() {
        let base = boxed_base();
        let mut overlay = RgbaImage::new(10, 10);

        let outcome = flood_fill(&base, &mut overlay, (4, 4), RED, WallThreshold::default());
        assert_eq!(
            outcome,
            FillOutcome::Filled { pixels: 16, bounds: (3, 3, 6, 6) }
        );
        for (x, y, px) in overlay.enumerate_pixels() {
            let inside = (3..=6).contains(&x) && (3..=6).contains(&y);
            assert_eq!(*px, if inside { RED } else { TRANSPARENT }, "pixel ({x},{y})");
        }
    }

    #[test]
    fn fill_only_replaces_matching_color() {
        let base = RgbaImage::new(6, 1);
        let mut overlay = RgbaImage::new(6, 1);
        overlay.put_pixel(3, 0, Rgba([0, 0, 255, 255]));

        flood_fill(&base, &mut overlay, (0, 0), RED, WallThreshold::default());
        assert_eq!(*overlay.get_pixel(2, 0), RED);
        assert_eq!(*overlay.get_pixel(3, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*overlay.get_pixel(4, 0), TRANSPARENT);
    }

    #[test]
    fn repeat_fill_is_a_no_op() {
        let base = boxed_base();
        let mut overlay = RgbaImage::new(10, 10);
        flood_fill(&base, &mut overlay, (4, 4), RED, WallThreshold::default());
        let before = overlay.clone();

        let outcome = flood_fill(&base, &mut overlay, (5, 5), RED, WallThreshold::default());
        assert_eq!(outcome, FillOutcome::AlreadyFilled);
        assert_eq!(overlay, before);
    }

    #[test]
    fn clicking_line_art_changes_nothing() {
        let base = boxed_base();
        let mut overlay = RgbaImage::new(10, 10);

        let outcome = flood_fill(&base, &mut overlay, (2, 4), RED, WallThreshold::default());
        assert_eq!(outcome, FillOutcome::OnWall);
        assert!(overlay.pixels().all(|p| *p == TRANSPARENT));

        // black on a wall matches the wall stand-in color
        let outcome = flood_fill(&base, &mut overlay, (2, 4), INK, WallThreshold::default());
        assert_eq!(outcome, FillOutcome::AlreadyFilled);
    }

    #[test]
    fn seeds_off_the_surface_are_ignored() {
        let base = boxed_base();
        let mut overlay = RgbaImage::new(10, 10);
        for seed in [(-1, 0), (0, -3), (10, 0), (0, 10)] {
            assert_eq!(
                flood_fill(&base, &mut overlay, seed, RED, WallThreshold::default()),
                FillOutcome::OutOfBounds
            );
        }
    }

    #[test]
    fn custom_threshold_changes_walls() {
        let mut base = RgbaImage::new(5, 1);
        base.put_pixel(2, 0, Rgba([150, 150, 150, 255]));
        let mut overlay = RgbaImage::new(5, 1);

        let grey_walls = WallThreshold { alpha_min: 200, channel_max: 160 };
        flood_fill(&base, &mut overlay, (0, 0), RED, grey_walls);
        assert_eq!(*overlay.get_pixel(1, 0), RED);
        assert_eq!(*overlay.get_pixel(2, 0), TRANSPARENT);
        assert_eq!(*overlay.get_pixel(3, 0), TRANSPARENT);
    }

    #[test]
    fn large_open_region_does_not_recurse() {
        let base = RgbaImage::new(800, 600);
        let mut overlay = RgbaImage::new(800, 600);
        let outcome = flood_fill(&base, &mut overlay, (400, 300), RED, WallThreshold::default());
        assert_eq!(
            outcome,
            FillOutcome::Filled { pixels: 800 * 600, bounds: (0, 0, 799, 599) }
        );
    }

    #[test]
    fn gradient_fill_uses_one_sampled_color() {
        let c = fill_color(ColorSource::Gradient, 3, 4, 10, 10);
        assert_eq!(c, sample_gradient(3, 4, 10, 10));
        assert_eq!(c[3], 255);
        assert_eq!(
            fill_color(ColorSource::Flat(Rgba([1, 2, 3, 9])), 0, 0, 1, 1),
            Rgba([1, 2, 3, 255])
        );
    }
}
