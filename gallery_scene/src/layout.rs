//! Deterministic placement for new items.
//!
//! Every uploaded item gets two target positions at creation time: a slot
//! on the assembled cone and a slot on the dispersed sphere band. Both use
//! the golden angle for azimuth, which spreads items evenly without any
//! sorting or packing step. The small random jitter on the assembled slot
//! is drawn once at creation and persisted with the item, so it is stable
//! for the item's whole life.

use glam::Vec3;
use rand::Rng;

/// Golden angle in radians. Successive multiples never land close to each
/// other, which is what keeps the spiral free of visible seams.
pub const GOLDEN_ANGLE: f32 = 2.399_96;

// ── Assembled arrangement: cone surface ─────────────────────────────────────

const CONE_HEIGHT: f32 = 6.0;
const CONE_RADIUS: f32 = 3.0; // radius at the base (height fraction 0)
/// Items per height-band cycle: slot heights repeat every this many items.
const BAND_ITEMS: usize = 15;
const BAND_LOW: f32 = 0.25; // lowest height fraction used
const BAND_HIGH: f32 = 0.75; // highest height fraction used
const HEIGHT_JITTER: f32 = 0.02;

// ── Dispersed arrangement: restricted sphere band ───────────────────────────

const SHELL_BASE: f32 = 6.0;
const SHELL_STEP: f32 = 1.5; // three shells: 6.0 / 7.5 / 9.0
/// Fraction of the shell's vertical extent items may occupy. Keeping them
/// out of the poles keeps every dispersed item inside the camera frustum.
const VERTICAL_BAND: f32 = 0.8;

/// Slot on the cone surface for the item inserted at `index`.
///
/// Height cycles across a [`BAND_ITEMS`]-item band between 25% and 75% of
/// the cone height with a ±2% jitter; radius sits at 90–100% of the cone's
/// radius at that height.
pub fn assembled_position(index: usize) -> Vec3 {
    let mut rng = rand::thread_rng();

    let band = (index % BAND_ITEMS) as f32 / BAND_ITEMS as f32;
    let h = (BAND_LOW + band * (BAND_HIGH - BAND_LOW)
        + rng.gen_range(-HEIGHT_JITTER..=HEIGHT_JITTER))
    .clamp(0.0, 1.0);

    // The cone narrows toward the top.
    let radius = CONE_RADIUS * (1.0 - h) * rng.gen_range(0.9..=1.0);
    let theta = GOLDEN_ANGLE * index as f32;

    Vec3::new(radius * theta.sin(), h * CONE_HEIGHT, radius * theta.cos())
}

/// Slot on the dispersed sphere band for the item inserted at `index`.
///
/// Fully deterministic: shell radius varies by `index % 3`, the vertical
/// coordinate comes from a golden-ratio hash of the index confined to the
/// middle of the shell, and azimuth is the golden angle again.
pub fn dispersed_position(index: usize) -> Vec3 {
    let shell = SHELL_BASE + (index % 3) as f32 * SHELL_STEP;

    // Scatter heights without randomness: the fractional part of n·φ⁻¹ is
    // uniform over [0, 1) as n grows.
    let hash = (index as f32 * 0.618_034).fract();
    let y = shell * VERTICAL_BAND * (hash * 2.0 - 1.0);

    let ring = (shell * shell - y * y).sqrt();
    let theta = GOLDEN_ANGLE * index as f32;

    Vec3::new(ring * theta.sin(), y, ring * theta.cos())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembled_stays_on_cone_band() {
        for i in 0..60 {
            let p = assembled_position(i);
            let h = p.y / CONE_HEIGHT;
            assert!(
                (BAND_LOW - HEIGHT_JITTER..=BAND_HIGH + HEIGHT_JITTER).contains(&h),
                "item {} height fraction {} out of band",
                i,
                h
            );
            let radius = (p.x * p.x + p.z * p.z).sqrt();
            assert!(radius <= CONE_RADIUS * (1.0 - h) + 1e-4);
        }
    }

    #[test]
    fn assembled_band_cycles() {
        // Items a full band apart sit at (nearly) the same height.
        let a = assembled_position(2);
        let b = assembled_position(2 + BAND_ITEMS);
        assert!((a.y - b.y).abs() <= 2.0 * HEIGHT_JITTER * CONE_HEIGHT + 1e-4);
    }

    #[test]
    fn dispersed_is_deterministic() {
        for i in 0..40 {
            assert_eq!(dispersed_position(i), dispersed_position(i));
        }
    }

    #[test]
    fn dispersed_sits_on_a_known_shell() {
        for i in 0..40 {
            let r = dispersed_position(i).length();
            let shell = SHELL_BASE + (i % 3) as f32 * SHELL_STEP;
            assert!((r - shell).abs() < 1e-3, "item {} radius {} != {}", i, r, shell);
        }
    }

    #[test]
    fn dispersed_avoids_the_poles() {
        for i in 0..120 {
            let p = dispersed_position(i);
            let shell = SHELL_BASE + (i % 3) as f32 * SHELL_STEP;
            assert!(p.y.abs() <= shell * VERTICAL_BAND + 1e-4);
        }
    }

    #[test]
    fn neighbours_spread_apart() {
        // The golden angle must keep consecutive items from stacking up.
        let a = dispersed_position(10);
        let b = dispersed_position(11);
        assert!(a.distance(b) > 1.0);
    }
}
