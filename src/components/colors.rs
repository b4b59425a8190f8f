use image::Rgba;

// ============================================================================
// FIXED PALETTE
// ============================================================================

/// The eight swatches offered by the coloring page, in display order.
pub const PALETTE: [Rgba<u8>; 8] = [
    Rgba([0xFF, 0x00, 0x00, 0xFF]),
    Rgba([0xFF, 0x7F, 0x00, 0xFF]),
    Rgba([0xFF, 0xFF, 0x00, 0xFF]),
    Rgba([0x00, 0xFF, 0x00, 0xFF]),
    Rgba([0x00, 0x00, 0xFF, 0xFF]),
    Rgba([0x4B, 0x00, 0x82, 0xFF]),
    Rgba([0x8B, 0x00, 0xFF, 0xFF]),
    Rgba([0x00, 0x00, 0x00, 0xFF]),
];

pub const PALETTE_NAMES: [&str; 8] = [
    "Red", "Orange", "Yellow", "Green", "Blue", "Indigo", "Violet", "Black",
];

/// Position of `color` in [`PALETTE`], comparing RGB only.
pub fn palette_index(color: Rgba<u8>) -> Option<usize> {
    PALETTE
        .iter()
        .position(|p| p.0[..3] == color.0[..3])
}

/// Parse `#RRGGBB` (leading `#` optional) into an opaque color.
pub fn parse_hex(s: &str) -> Option<Rgba<u8>> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let num = u32::from_str_radix(hex, 16).ok()?;
    Some(Rgba([
        ((num >> 16) & 0xFF) as u8,
        ((num >> 8) & 0xFF) as u8,
        (num & 0xFF) as u8,
        0xFF,
    ]))
}

pub fn to_hex(color: Rgba<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}

// ============================================================================
// GRADIENT FIELD
// ============================================================================

/// Stops of the rainbow ramp used by gradient mode. Positions are along the
/// surface diagonal, 0.0 at the top-left corner and 1.0 at the bottom-right.
pub const GRADIENT_STOPS: [(f32, [u8; 3]); 6] = [
    (0.0, [0xFF, 0x00, 0x00]),
    (0.2, [0xFF, 0x7F, 0x00]),
    (0.4, [0xFF, 0xD3, 0x00]),
    (0.6, [0x00, 0xC2, 0xA8]),
    (0.8, [0x3B, 0x82, 0xF6]),
    (1.0, [0x8B, 0x5C, 0xF6]),
];

/// Color of the gradient field at pixel `(x, y)` of a `width`×`height`
/// surface. The pixel center is projected onto the top-left → bottom-right
/// diagonal, so the result depends only on the position and the surface size.
pub fn sample_gradient(x: u32, y: u32, width: u32, height: u32) -> Rgba<u8> {
    let w = width as f64;
    let h = height as f64;
    let len_sq = w * w + h * h;
    let t = if len_sq > 0.0 {
        ((x as f64 + 0.5) * w + (y as f64 + 0.5) * h) / len_sq
    } else {
        0.0
    };
    gradient_at(t.clamp(0.0, 1.0) as f32)
}

/// Evaluate the ramp at parameter `t` in `[0, 1]`.
pub fn gradient_at(t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let upper = GRADIENT_STOPS
        .iter()
        .position(|(pos, _)| *pos >= t)
        .unwrap_or(GRADIENT_STOPS.len() - 1);
    if upper == 0 {
        let [r, g, b] = GRADIENT_STOPS[0].1;
        return Rgba([r, g, b, 255]);
    }

    let (p0, c0) = GRADIENT_STOPS[upper - 1];
    let (p1, c1) = GRADIENT_STOPS[upper];
    let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round().clamp(0.0, 255.0) as u8;
    Rgba([lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2]), 255])
}
