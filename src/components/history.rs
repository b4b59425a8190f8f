use image::RgbaImage;
use std::collections::VecDeque;

use crate::canvas::SurfaceError;
use crate::log_warn;

/// Undo depth of the coloring page.
pub const DEFAULT_HISTORY_LIMIT: usize = 70;

// ============================================================================
// OVERLAY SNAPSHOT - full copy of the overlay pixels
// ============================================================================

/// The complete overlay buffer at one point in time (row-major RGBA8).
#[derive(Clone, PartialEq, Eq)]
pub struct OverlaySnapshot {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for OverlaySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OverlaySnapshot({}x{})", self.width, self.height)
    }
}

impl OverlaySnapshot {
    /// Copy the overlay. Fails on a zero-sized (unloaded) surface.
    pub fn capture(surface: &RgbaImage) -> Result<Self, SurfaceError> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(SurfaceError::Unloaded);
        }
        Ok(Self {
            width,
            height,
            pixels: surface.as_raw().clone(),
        })
    }

    /// Write the snapshot back. The surface is untouched on error.
    pub fn restore_into(&self, surface: &mut RgbaImage) -> Result<(), SurfaceError> {
        if surface.dimensions() != (self.width, self.height) {
            return Err(SurfaceError::DimensionMismatch {
                expected: (self.width, self.height),
                found: surface.dimensions(),
            });
        }
        surface.copy_from_slice(&self.pixels);
        Ok(())
    }
}

// ============================================================================
// HISTORY MANAGER - bounded undo stack + redo stack of overlay snapshots
// ============================================================================

/// Snapshot history for one artwork session.
///
/// The top of `undo_stack` mirrors the overlay's current state. The bottom
/// entry is a floor that `undo` never removes, so once seeded the stack is
/// never empty. Pushing clears `redo_stack`; once the stack exceeds
/// `max_history_size` the oldest entries are dropped.
pub struct HistoryManager {
    undo_stack: VecDeque<OverlaySnapshot>,
    redo_stack: Vec<OverlaySnapshot>,
    max_history_size: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_history_size: max_history_size.max(1),
        }
    }

    /// Forget everything and start over from `overlay` as the floor entry.
    pub fn reseed(&mut self, overlay: &RgbaImage) {
        self.clear();
        self.push(overlay);
    }

    /// Record the current overlay. On a capture failure the stacks are left
    /// exactly as they were.
    pub fn push(&mut self, overlay: &RgbaImage) -> bool {
        let snapshot = match OverlaySnapshot::capture(overlay) {
            Ok(s) => s,
            Err(e) => {
                log_warn!("history push skipped: {}", e);
                return false;
            }
        };
        self.undo_stack.push_back(snapshot);
        self.prune();
        self.redo_stack.clear();
        true
    }

    /// Step back one entry and restore it onto `overlay`. No-op at the floor.
    pub fn undo(&mut self, overlay: &mut RgbaImage) -> bool {
        let len = self.undo_stack.len();
        if len <= 1 {
            return false;
        }
        // Restore first so a failure leaves both stacks untouched
        if let Err(e) = self.undo_stack[len - 2].restore_into(overlay) {
            log_warn!("undo skipped: {}", e);
            return false;
        }
        if let Some(top) = self.undo_stack.pop_back() {
            self.redo_stack.push(top);
        }
        true
    }

    /// Re-apply the most recently undone entry. No-op when nothing was undone.
    pub fn redo(&mut self, overlay: &mut RgbaImage) -> bool {
        let Some(next) = self.redo_stack.last() else {
            return false;
        };
        if let Err(e) = next.restore_into(overlay) {
            log_warn!("redo skipped: {}", e);
            return false;
        }
        if let Some(next) = self.redo_stack.pop() {
            self.undo_stack.push_back(next);
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_history_size {
            self.undo_stack.pop_front();
        }
    }
}
