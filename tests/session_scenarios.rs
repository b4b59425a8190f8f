use image::{Rgba, RgbaImage};

use reefpaint::canvas::TRANSPARENT;
use reefpaint::components::colors::sample_gradient;
use reefpaint::components::history::DEFAULT_HISTORY_LIMIT;
use reefpaint::components::tools::Tool;
use reefpaint::{CanvasEditorSession, SessionOptions};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn session() -> CanvasEditorSession {
    CanvasEditorSession::new(SessionOptions {
        spray_seed: Some(1234),
        ..SessionOptions::default()
    })
}

/// 100×100 transparent base with a 1px black ring of radius 40 around (50, 50).
/// Ring pixels sit within 0.71px of the true circle.
fn ring_base() -> (RgbaImage, Vec<(u32, u32)>) {
    let mut base = RgbaImage::new(100, 100);
    let mut ring = Vec::new();
    for step in 0..4000 {
        let theta = step as f64 / 4000.0 * std::f64::consts::TAU;
        let x = (50.0 + 40.0 * theta.cos()).round() as u32;
        let y = (50.0 + 40.0 * theta.sin()).round() as u32;
        if *base.get_pixel(x, y) != INK {
            base.put_pixel(x, y, INK);
            ring.push((x, y));
        }
    }
    (base, ring)
}

fn distance_from_center(x: u32, y: u32) -> f64 {
    let dx = x as f64 - 50.0;
    let dy = y as f64 - 50.0;
    (dx * dx + dy * dy).sqrt()
}

#[test]
fn bucket_fill_stays_inside_the_ring() {
    let (base, ring) = ring_base();
    let mut session = session();
    session.load_image(None, base);
    session.set_tool(Tool::Bucket);
    session.settings_mut().select_palette(0);

    session.click_at(50, 50);

    let overlay = session.overlay();
    for &(x, y) in &ring {
        assert_eq!(*overlay.get_pixel(x, y), TRANSPARENT, "ring pixel ({x},{y}) changed");
    }
    for (x, y, px) in overlay.enumerate_pixels() {
        let d = distance_from_center(x, y);
        if ring.contains(&(x, y)) {
            continue;
        }
        if d < 39.2 {
            assert_eq!(*px, RED, "inside pixel ({x},{y}) not filled");
        } else if d > 40.8 {
            assert_eq!(*px, TRANSPARENT, "outside pixel ({x},{y}) leaked");
        }
    }
}

#[test]
fn three_strokes_two_undos_one_redo() {
    let mut session = session();
    session.load_image(None, RgbaImage::from_pixel(60, 60, Rgba([255, 255, 255, 255])));
    session.settings_mut().set_size(4);

    let mut after = Vec::new();
    for row in [10, 30, 50] {
        session.press_at(5, row);
        session.drag_to(30, row);
        session.drag_to(55, row);
        session.release();
        after.push(session.overlay().clone());
    }

    session.undo();
    session.undo();
    session.redo();
    assert_eq!(session.overlay(), &after[1]);
    assert_ne!(session.overlay(), &after[2]);
}

#[test]
fn undo_and_redo_are_inverse_for_fills() {
    let (base, _) = ring_base();
    let mut session = session();
    session.load_image(None, base);
    session.set_tool(Tool::Bucket);

    let mut states = vec![session.overlay().clone()];
    for (i, seed) in [(50, 50), (2, 2), (50, 50)].into_iter().enumerate() {
        session.settings_mut().select_palette(i + 1);
        session.click_at(seed.0, seed.1);
        states.push(session.overlay().clone());
    }

    assert!(session.undo());
    assert_eq!(session.overlay(), &states[2]);
    assert!(session.redo());
    assert_eq!(session.overlay(), &states[3]);
}

#[test]
fn undo_floor_is_idempotent() {
    let mut session = session();
    session.load_image(None, RgbaImage::new(20, 20));
    session.set_tool(Tool::Bucket);
    session.click_at(3, 3);

    while session.undo() {}
    let floor = session.overlay().clone();
    for _ in 0..10 {
        assert!(!session.undo());
    }
    assert_eq!(session.overlay(), &floor);
    assert!(floor.pixels().all(|p| *p == TRANSPARENT));
    assert_eq!(session.history().undo_count(), 1);
}

#[test]
fn history_never_exceeds_its_limit() {
    let mut session = session();
    session.load_image(None, RgbaImage::new(16, 16));
    session.set_tool(Tool::Bucket);
    for i in 0..120 {
        session.settings_mut().select_palette(i % 8);
        session.click_at(1, 1);
        assert!(session.history().undo_count() <= DEFAULT_HISTORY_LIMIT);
    }
    assert_eq!(session.history().undo_count(), DEFAULT_HISTORY_LIMIT);

    let mut undos = 0;
    while session.undo() {
        undos += 1;
    }
    assert_eq!(undos, DEFAULT_HISTORY_LIMIT - 1);
    // the blank page from the start is no longer reachable
    assert!(session.overlay().pixels().all(|p| p[3] == 255));
}

#[test]
fn gradient_fill_samples_the_same_color_at_the_same_seed() {
    let (base, _) = ring_base();
    let mut session = session();
    session.load_image(None, base);
    session.set_tool(Tool::Bucket);
    session.settings_mut().set_gradient(true);

    session.click_at(40, 60);
    let first = *session.overlay().get_pixel(50, 50);
    session.reset();
    session.click_at(40, 60);
    let second = *session.overlay().get_pixel(50, 50);

    assert_eq!(first, second);
    assert_eq!(first, sample_gradient(40, 60, 100, 100));
}

#[test]
fn refilling_with_the_same_color_changes_nothing() {
    let (base, _) = ring_base();
    let mut session = session();
    session.load_image(None, base);
    session.set_tool(Tool::Bucket);
    session.click_at(50, 50);
    let before = session.overlay().clone();

    session.click_at(45, 55);
    assert_eq!(session.overlay().as_raw(), before.as_raw());
}

#[test]
fn clicking_on_the_ring_is_a_no_op() {
    let (base, ring) = ring_base();
    let mut session = session();
    session.load_image(None, base);
    session.set_tool(Tool::Bucket);
    let (x, y) = ring[0];
    session.click_at(x as i32, y as i32);
    assert!(session.overlay().pixels().all(|p| *p == TRANSPARENT));
}

#[test]
fn export_of_blank_overlay_is_the_base() {
    let (base, _) = ring_base();
    let mut session = session();
    session.load_image(None, base.clone());
    assert_eq!(session.export_image().unwrap(), base);

    let png = session.export_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded, base);
}

#[test]
fn export_draws_overlay_over_base() {
    let mut session = session();
    session.load_image(None, RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])));
    session.set_tool(Tool::Bucket);
    session.settings_mut().select_palette(4);
    session.click_at(0, 0);
    let page = session.export_image().unwrap();
    assert!(page.pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
}

#[test]
fn eraser_clears_paint_back_to_transparent() {
    let mut session = session();
    session.load_image(None, RgbaImage::from_pixel(30, 30, Rgba([255, 255, 255, 255])));
    session.set_tool(Tool::Bucket);
    session.click_at(0, 0);

    session.set_tool(Tool::Eraser);
    session.settings_mut().set_size(6);
    session.press_at(5, 15);
    session.drag_to(25, 15);
    session.release();

    assert_eq!(*session.overlay().get_pixel(15, 15), TRANSPARENT);
    assert_eq!(*session.overlay().get_pixel(15, 2), RED);
    let page = session.export_image().unwrap();
    assert_eq!(*page.get_pixel(15, 15), Rgba([255, 255, 255, 255]));
}

#[test]
fn seeded_spray_is_reproducible() {
    let run = || {
        let mut session = session();
        session.load_image(None, RgbaImage::new(50, 50));
        session.set_tool(Tool::Spray);
        session.settings_mut().set_size(10);
        session.press_at(25, 25);
        session.drag_to(30, 25);
        session.release();
        session.overlay().clone()
    };
    let a = run();
    assert_eq!(a, run());
    let painted = a.pixels().filter(|p| p[3] != 0).count();
    assert!(painted > 0 && painted <= 40);
}
