//! Gesture classification and stabilization.
//!
//! [`classify`] is a pure function from one landmark sample to a
//! [`GestureLabel`]; [`GestureStabilizer`] debounces the per-tick labels
//! into the [`HandState`] the rest of the pipeline consumes. Neither has a
//! failure path: malformed samples classify as `None` and hand loss is a
//! defined reset, so the control loop can run on bad data indefinitely.

use crate::hand::{joints, Landmark, LANDMARK_COUNT};

// ════════════════════════════════════════════════════════════════════════════
// GestureLabel
// ════════════════════════════════════════════════════════════════════════════

/// The gesture vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureLabel {
    None,
    Fist,
    OpenPalm,
    Pinch,
    /// Reserved: no classifier rule maps to it yet.
    #[allow(dead_code)]
    Point,
}

// Classification thresholds (empirically tuned, normalized units)
const FIST_MAX_SPREAD: f32 = 0.4; // avg wrist→fingertip distance below ⇒ fist
const PINCH_MAX_GAP: f32 = 0.06; // thumb tip to index tip distance below ⇒ pinch
const PALM_MIN_SPREAD: f32 = 0.5; // avg wrist→fingertip distance above ⇒ open palm

/// Classify one landmark sample.
///
/// Checks run in strict priority order. A closed fist routinely brings the
/// thumb tip within pinch range of the index tip, so the fist check must
/// come before the pinch check — the ordering is load-bearing, not
/// stylistic. Samples with fewer than 21 points classify as `None`.
pub fn classify(points: &[Landmark]) -> GestureLabel {
    if points.len() < LANDMARK_COUNT {
        return GestureLabel::None;
    }

    let wrist = points[joints::WRIST];
    let tips = [
        joints::INDEX_TIP,
        joints::MIDDLE_TIP,
        joints::RING_TIP,
        joints::PINKY_TIP,
    ];
    let spread =
        tips.iter().map(|&t| wrist.distance(points[t])).sum::<f32>() / tips.len() as f32;

    if spread < FIST_MAX_SPREAD {
        return GestureLabel::Fist;
    }
    if points[joints::THUMB_TIP].distance(points[joints::INDEX_TIP]) < PINCH_MAX_GAP {
        return GestureLabel::Pinch;
    }
    if spread > PALM_MIN_SPREAD {
        return GestureLabel::OpenPalm;
    }
    GestureLabel::None
}

/// Horizontal offset of the palm centre (midpoint of wrist and
/// middle-finger base) from the frame centre, scaled to [-1, 1].
pub fn rotation_estimate(points: &[Landmark]) -> f32 {
    if points.len() < LANDMARK_COUNT {
        return 0.0;
    }
    let mid = (points[joints::WRIST].x + points[joints::MIDDLE_MCP].x) * 0.5;
    ((mid - 0.5) * 2.0).clamp(-1.0, 1.0)
}

/// Palm position used for the emitted hand state (the same midpoint the
/// rotation estimate uses).
pub fn palm_position(points: &[Landmark]) -> (f32, f32) {
    if points.len() < LANDMARK_COUNT {
        return (0.5, 0.5);
    }
    let wrist = points[joints::WRIST];
    let mcp = points[joints::MIDDLE_MCP];
    ((wrist.x + mcp.x) * 0.5, (wrist.y + mcp.y) * 0.5)
}

// ════════════════════════════════════════════════════════════════════════════
// HandState
// ════════════════════════════════════════════════════════════════════════════

/// The debounced hand state emitted once per classification tick and
/// replaced on the next — no history is kept beyond the stabilizer's own
/// counters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandState {
    pub gesture: GestureLabel,
    /// Palm position, normalized to the camera frame.
    pub position: (f32, f32),
    /// Hand rotation feedback in [-1, 1].
    pub rotation: f32,
    pub is_present: bool,
}

impl HandState {
    /// Neutral state while no hand is in view.
    pub fn absent() -> Self {
        HandState {
            gesture: GestureLabel::None,
            position: (0.5, 0.5),
            rotation: 0.0,
            is_present: false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureStabilizer
// ════════════════════════════════════════════════════════════════════════════

/// A raw label must repeat this many consecutive classification ticks
/// before it becomes the stable label. Suppresses single-frame flicker,
/// notably PINCH↔OPEN_PALM at the pinch threshold.
const CONSISTENT_TICKS: u32 = 2;

/// Debounce filter over raw per-tick gesture labels.
///
/// Presence changes are debounced; absence is trusted instantly — losing
/// the hand hard-resets the filter the same tick.
#[derive(Debug, Default)]
pub struct GestureStabilizer {
    last_raw: Option<GestureLabel>,
    consistency: u32,
    stable: Option<GestureLabel>,
}

impl GestureStabilizer {
    pub fn new() -> Self {
        GestureStabilizer::default()
    }

    /// Feed one landmark sample and get the stable hand state. Ticks here
    /// are the classifier's own invocations, not render frames — the
    /// caller is responsible for the sampling cadence.
    pub fn sample(&mut self, points: &[Landmark]) -> HandState {
        let raw = classify(points);

        if self.last_raw == Some(raw) {
            self.consistency += 1;
        } else {
            self.last_raw = Some(raw);
            self.consistency = 1;
        }
        if self.consistency >= CONSISTENT_TICKS {
            self.stable = Some(raw);
        }

        HandState {
            gesture: self.stable.unwrap_or(GestureLabel::None),
            position: palm_position(points),
            rotation: rotation_estimate(points),
            is_present: true,
        }
    }

    /// No hand this tick: immediate hard reset, no debounce.
    pub fn lost(&mut self) -> HandState {
        self.last_raw = None;
        self.consistency = 0;
        self.stable = None;
        HandState::absent()
    }

    pub fn stable_label(&self) -> GestureLabel {
        self.stable.unwrap_or(GestureLabel::None)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::LandmarkFrame;

    #[test]
    fn short_sample_is_none() {
        let points = vec![Landmark::default(); 5];
        assert_eq!(classify(&points), GestureLabel::None);
        assert_eq!(rotation_estimate(&points), 0.0);
    }

    #[test]
    fn empty_sample_is_none() {
        assert_eq!(classify(&[]), GestureLabel::None);
    }

    #[test]
    fn fist_wins_over_pinch() {
        // A fist pose whose thumb tip is inside pinch range must still be
        // a fist: the spread check runs first.
        let frame = LandmarkFrame::fist(0.5, 0.5);
        let gap =
            frame.points[joints::THUMB_TIP].distance(frame.points[joints::INDEX_TIP]);
        assert!(gap < PINCH_MAX_GAP);
        assert_eq!(classify(&frame.points), GestureLabel::Fist);
    }

    #[test]
    fn pinch_requires_touching_thumb() {
        assert_eq!(
            classify(&LandmarkFrame::pinch(0.5, 0.5).points),
            GestureLabel::Pinch
        );
    }

    #[test]
    fn open_palm_needs_wide_spread() {
        assert_eq!(
            classify(&LandmarkFrame::open_palm(0.5, 0.5).points),
            GestureLabel::OpenPalm
        );
    }

    #[test]
    fn neutral_band_is_none() {
        // Mid spread with a clear thumb matches no class.
        assert_eq!(
            classify(&LandmarkFrame::relaxed(0.5, 0.5).points),
            GestureLabel::None
        );
    }

    #[test]
    fn rotation_tracks_horizontal_offset() {
        let left = rotation_estimate(&LandmarkFrame::open_palm(0.25, 0.5).points);
        let centre = rotation_estimate(&LandmarkFrame::open_palm(0.5, 0.5).points);
        let right = rotation_estimate(&LandmarkFrame::open_palm(0.75, 0.5).points);
        assert!(left < -0.4);
        assert!(centre.abs() < 1e-5);
        assert!(right > 0.4);
    }

    #[test]
    fn single_frame_flicker_is_suppressed() {
        let mut stab = GestureStabilizer::new();
        let palm = LandmarkFrame::open_palm(0.5, 0.5);
        let pinch = LandmarkFrame::pinch(0.5, 0.5);

        stab.sample(&palm.points);
        stab.sample(&palm.points);
        assert_eq!(stab.stable_label(), GestureLabel::OpenPalm);

        // One spurious pinch frame does not flip the stable label…
        let state = stab.sample(&pinch.points);
        assert_eq!(state.gesture, GestureLabel::OpenPalm);

        // …but a second consecutive one does.
        let state = stab.sample(&pinch.points);
        assert_eq!(state.gesture, GestureLabel::Pinch);
    }

    #[test]
    fn loss_resets_instantly() {
        let mut stab = GestureStabilizer::new();
        let fist = LandmarkFrame::fist(0.5, 0.5);
        stab.sample(&fist.points);
        stab.sample(&fist.points);
        assert_eq!(stab.stable_label(), GestureLabel::Fist);

        let state = stab.lost();
        assert_eq!(state, HandState::absent());
        assert_eq!(stab.stable_label(), GestureLabel::None);

        // The debounce starts over after the reset.
        let state = stab.sample(&fist.points);
        assert_eq!(state.gesture, GestureLabel::None);
        let state = stab.sample(&fist.points);
        assert_eq!(state.gesture, GestureLabel::Fist);
    }
}
