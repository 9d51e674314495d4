//! Application mode state machine.
//!
//! Three modes, gesture-triggered transitions, and the round-robin focus
//! cursor. The machine is a pure transition function over its own state:
//! it reads the pool but never mutates it, and nothing else writes the
//! mode.

use gallery_scene::{ItemId, ItemPool};

use crate::gesture::{GestureLabel, HandState};

/// The three top-level arrangements the gallery can be in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMode {
    /// Items clustered on the cone; the showcase scheduler runs.
    Assembled,
    /// Items spread on the sphere band.
    Dispersed,
    /// One item pulled to the front of the camera.
    Focus,
}

/// Gesture-driven mode transitions.
///
/// The focus cursor is monotonic for the life of the process: it is never
/// reset by mode changes or deletions, and it is validated against the
/// current pool size at selection time, so a shrunken pool wraps safely.
#[derive(Debug)]
pub struct ModeMachine {
    mode: AppMode,
    focus: Option<ItemId>,
    cursor: usize,
}

impl Default for ModeMachine {
    fn default() -> Self {
        ModeMachine::new()
    }
}

impl ModeMachine {
    pub fn new() -> Self {
        ModeMachine {
            mode: AppMode::Assembled,
            focus: None,
            cursor: 0,
        }
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn focus(&self) -> Option<ItemId> {
        self.focus
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Drop the focus target if its item has been deleted.
    pub fn revalidate_focus(&mut self, pool: &ItemPool) {
        if let Some(id) = self.focus {
            if pool.get(id).is_none() {
                self.focus = None;
            }
        }
    }

    /// Apply one stable hand state. Hand absence never changes the mode —
    /// only deliberate gestures do.
    pub fn apply(&mut self, hand: &HandState, pool: &ItemPool) {
        if !hand.is_present {
            return;
        }

        match hand.gesture {
            // Fist overrides everything else: collapse back to the
            // assembled arrangement and drop any focus.
            GestureLabel::Fist if self.mode != AppMode::Assembled => {
                self.mode = AppMode::Assembled;
                self.focus = None;
            }
            GestureLabel::OpenPalm if self.mode == AppMode::Assembled => {
                self.mode = AppMode::Dispersed;
            }
            GestureLabel::OpenPalm if self.mode == AppMode::Focus => {
                self.mode = AppMode::Dispersed;
                self.focus = None;
            }
            // Pinch selects the next item round-robin, but never
            // re-triggers while a focus already exists.
            GestureLabel::Pinch if self.mode == AppMode::Dispersed && self.focus.is_none() => {
                if let Some(item) = pool.nth(self.cursor % pool.len().max(1)) {
                    self.focus = Some(item.id);
                    self.cursor += 1;
                    self.mode = AppMode::Focus;
                }
            }
            _ => {}
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn pool_of(n: usize) -> ItemPool {
        let mut pool = ItemPool::new();
        for i in 0..n {
            pool.upload(&format!("img-{}", i), Vec3::ZERO, Vec3::ONE);
        }
        pool
    }

    fn present(gesture: GestureLabel) -> HandState {
        HandState {
            gesture,
            position: (0.5, 0.5),
            rotation: 0.0,
            is_present: true,
        }
    }

    #[test]
    fn starts_assembled() {
        assert_eq!(ModeMachine::new().mode(), AppMode::Assembled);
    }

    #[test]
    fn open_palm_disperses_from_assembled() {
        let pool = pool_of(3);
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);
        assert_eq!(m.mode(), AppMode::Dispersed);
    }

    #[test]
    fn pinch_focuses_round_robin() {
        let pool = pool_of(3);
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);

        m.apply(&present(GestureLabel::Pinch), &pool);
        assert_eq!(m.mode(), AppMode::Focus);
        assert_eq!(m.focus(), Some(pool.nth(0).unwrap().id));
        assert_eq!(m.cursor(), 1);
    }

    #[test]
    fn pinch_is_idempotent_while_focused() {
        let pool = pool_of(3);
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);
        m.apply(&present(GestureLabel::Pinch), &pool);

        // Further pinches neither advance the cursor nor change focus.
        m.apply(&present(GestureLabel::Pinch), &pool);
        assert_eq!(m.cursor(), 1);
        assert_eq!(m.focus(), Some(pool.nth(0).unwrap().id));
        assert_eq!(m.mode(), AppMode::Focus);
    }

    #[test]
    fn cursor_wraps_over_the_pool() {
        let pool = pool_of(2);
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);

        for expected in [0usize, 1, 0] {
            m.apply(&present(GestureLabel::Pinch), &pool);
            assert_eq!(m.focus(), Some(pool.nth(expected).unwrap().id));
            // Release focus without resetting the cursor.
            m.apply(&present(GestureLabel::OpenPalm), &pool);
            assert_eq!(m.mode(), AppMode::Dispersed);
        }
        assert_eq!(m.cursor(), 3);
    }

    #[test]
    fn pinch_on_empty_pool_is_a_noop() {
        let pool = ItemPool::new();
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);
        m.apply(&present(GestureLabel::Pinch), &pool);
        assert_eq!(m.mode(), AppMode::Dispersed);
        assert_eq!(m.focus(), None);
        assert_eq!(m.cursor(), 0);
    }

    #[test]
    fn fist_returns_to_assembled_and_clears_focus() {
        let pool = pool_of(3);
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);
        m.apply(&present(GestureLabel::Pinch), &pool);
        assert_eq!(m.mode(), AppMode::Focus);

        m.apply(&present(GestureLabel::Fist), &pool);
        assert_eq!(m.mode(), AppMode::Assembled);
        assert_eq!(m.focus(), None);
    }

    #[test]
    fn open_palm_from_focus_clears_focus() {
        let pool = pool_of(3);
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);
        m.apply(&present(GestureLabel::Pinch), &pool);

        m.apply(&present(GestureLabel::OpenPalm), &pool);
        assert_eq!(m.mode(), AppMode::Dispersed);
        assert_eq!(m.focus(), None);
    }

    #[test]
    fn absence_never_changes_the_mode() {
        let pool = pool_of(3);
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);
        assert_eq!(m.mode(), AppMode::Dispersed);

        m.apply(&HandState::absent(), &pool);
        assert_eq!(m.mode(), AppMode::Dispersed);
    }

    #[test]
    fn deleted_focus_is_revalidated() {
        let mut pool = pool_of(3);
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);
        m.apply(&present(GestureLabel::Pinch), &pool);
        let focused = m.focus().unwrap();

        pool.remove(focused);
        m.revalidate_focus(&pool);
        assert_eq!(m.focus(), None);
    }

    #[test]
    fn cursor_revalidates_against_a_shrunken_pool() {
        let mut pool = pool_of(4);
        let mut m = ModeMachine::new();
        m.apply(&present(GestureLabel::OpenPalm), &pool);

        // Advance the cursor to 3…
        for _ in 0..3 {
            m.apply(&present(GestureLabel::Pinch), &pool);
            m.apply(&present(GestureLabel::OpenPalm), &pool);
        }
        assert_eq!(m.cursor(), 3);

        // …then shrink the pool below it. Selection must wrap, not panic.
        let last = pool.nth(3).unwrap().id;
        pool.remove(last);
        let second = pool.nth(2).unwrap().id;
        pool.remove(second);
        assert_eq!(pool.len(), 2);

        m.apply(&present(GestureLabel::Pinch), &pool);
        assert_eq!(m.focus(), Some(pool.nth(3 % 2).unwrap().id));
        assert_eq!(m.cursor(), 4);
    }
}
