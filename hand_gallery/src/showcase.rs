//! Showcase scheduler — the orbital highlight choreography.
//!
//! While the gallery is assembled, the scheduler periodically pulls two
//! items out of the arrangement, carries them around an orbit, slows them
//! down for a pass in front of the viewer, and reinserts each one only
//! once its orbital angle lines up with its home slot's current world
//! angle — so items always glide back into place instead of snapping.
//!
//! The scheduler never blocks and never throws: it advances from `(now,
//! dt)` alone, every quantity is closed-form or a single increment, and an
//! arbitrarily large time gap cannot trigger a catch-up loop.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use rand::Rng;

use gallery_scene::{ItemId, ItemPool};

use crate::mode::AppMode;

// ════════════════════════════════════════════════════════════════════════════
// Tuning constants
// ════════════════════════════════════════════════════════════════════════════

/// Wait between showcase cycles, seconds.
const COOLDOWN_SECS: f64 = 6.0;
/// Entry delay of the second participant, seconds.
const LAUNCH_STAGGER: f64 = 0.7;
/// Orbital angular speed, rad/s.
const ORBIT_SPEED: f64 = 2.5;
/// Angular speed during the slow-motion presentation pass, rad/s.
const PRESENT_SPEED: f64 = 0.3;
/// World angle directly in front of the camera.
const TARGET_ANGLE: f64 = FRAC_PI_2;

// The three windows are tuned visual constants, not derived from each
// other: entering SLOW_ZONE throttles the orbit, the tighter PRESENT_ZONE
// marks the pass as seen, and RETURN_ZONE gates slot reinsertion.
const SLOW_ZONE: f64 = 0.4;
const PRESENT_ZONE: f64 = 0.1;
const RETURN_ZONE: f64 = 0.3;

/// Full laps required before any presentation can happen.
const MIN_LAPS: u32 = 2;

// ════════════════════════════════════════════════════════════════════════════
// Participant
// ════════════════════════════════════════════════════════════════════════════

/// One item temporarily pulled into the orbit. At most two exist at a
/// time; each lives from launch until slot realignment.
#[derive(Clone, Debug)]
pub struct Participant {
    pub id: ItemId,
    /// Fixed angular offset from the system angle: 0 or π.
    pub offset: f64,
    /// Absolute time at which this participant enters the orbit.
    pub launch_time: f64,
    pub has_presented: bool,
    /// Polar angle of the item's assembled slot, fixed at creation.
    slot_angle: f64,
}

impl Participant {
    fn new(id: ItemId, assembled_x: f32, assembled_z: f32, offset: f64, launch_time: f64) -> Self {
        Participant {
            id,
            offset,
            launch_time,
            has_presented: false,
            slot_angle: wrap((assembled_x as f64).atan2(assembled_z as f64)),
        }
    }

    /// True once the staggered entry delay has elapsed.
    pub fn launched(&self, now: f64) -> bool {
        now >= self.launch_time
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Phase
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    /// Waiting for the next cycle; no participants exist.
    Cooldown { until: f64 },
    /// Two participants are in orbit (fewer once returns begin).
    Active,
}

// ════════════════════════════════════════════════════════════════════════════
// Showcase
// ════════════════════════════════════════════════════════════════════════════

pub struct Showcase {
    phase: Phase,
    participants: Vec<Participant>,
    /// Monotonically non-decreasing while active; wrapped only for
    /// comparisons, never in storage, so lap counting stays exact.
    system_angle: f64,
    lap_count: u32,
}

impl Default for Showcase {
    fn default() -> Self {
        Showcase::new()
    }
}

impl Showcase {
    pub fn new() -> Self {
        Showcase {
            phase: Phase::Cooldown {
                until: COOLDOWN_SECS,
            },
            participants: Vec::new(),
            system_angle: 0.0,
            lap_count: 0,
        }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ItemId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn lap_count(&self) -> u32 {
        self.lap_count
    }

    /// Current orbital world angle of a participant, in [0, 2π).
    pub fn world_angle(&self, p: &Participant) -> f64 {
        wrap(self.system_angle + p.offset)
    }

    /// Advance one tick.
    ///
    /// `base_rotation` is the assembled arrangement's current world
    /// rotation — supplied by the caller, not computed here — against
    /// which slot realignment is checked.
    pub fn tick(
        &mut self,
        now: f64,
        dt: f64,
        mode: AppMode,
        pool: &ItemPool,
        focus: Option<ItemId>,
        base_rotation: f64,
    ) {
        // The showcase exists only for the assembled arrangement with
        // something worth showing.
        if mode != AppMode::Assembled || pool.len() < 2 {
            self.rest(now);
            return;
        }

        match self.phase {
            Phase::Cooldown { until } => {
                if now > until {
                    self.launch(now, pool, focus);
                }
            }
            Phase::Active => self.advance(now, dt, base_rotation),
        }
    }

    /// Forced dormancy. Re-arms the full cooldown every tick it is called,
    /// so re-entering the assembled mode always waits the whole interval.
    fn rest(&mut self, now: f64) {
        if !self.participants.is_empty() {
            log::info!(
                "showcase: cancelled, {} participant(s) snapped home",
                self.participants.len()
            );
        }
        self.participants.clear();
        self.phase = Phase::Cooldown {
            until: now + COOLDOWN_SECS,
        };
        self.lap_count = 0;
    }

    /// Try to start a cycle: pick two distinct candidates (never the
    /// focused item), stagger their entries, and randomize the starting
    /// angle. With fewer than two candidates the cooldown simply persists
    /// and the check repeats next tick.
    fn launch(&mut self, now: f64, pool: &ItemPool, focus: Option<ItemId>) {
        let candidates: Vec<_> = pool
            .items()
            .iter()
            .filter(|item| Some(item.id) != focus)
            .collect();
        if candidates.len() < 2 {
            return;
        }

        let mut rng = rand::thread_rng();
        let first = rng.gen_range(0..candidates.len());
        // Start the second pick half the pool away so the pair rarely
        // comes from the same neighborhood.
        let mut second = (first + candidates.len() / 2) % candidates.len();
        if second == first {
            second = (second + 1) % candidates.len();
        }

        let a = candidates[first];
        let b = candidates[second];
        self.system_angle = rng.gen_range(0.0..TAU);
        self.lap_count = 0;
        self.participants = vec![
            Participant::new(a.id, a.assembled.x, a.assembled.z, 0.0, now),
            Participant::new(b.id, b.assembled.x, b.assembled.z, PI, now + LAUNCH_STAGGER),
        ];
        self.phase = Phase::Active;
        log::info!("showcase: launched {} and {}", a.id, b.id);
    }

    fn advance(&mut self, now: f64, dt: f64, base_rotation: f64) {
        let in_zone = self.in_presentation_zone(now);

        // Slow-motion pass while anything is in front of the viewer.
        let speed = if in_zone { PRESENT_SPEED } else { ORBIT_SPEED };
        let laps_before = (self.system_angle / TAU).floor();
        self.system_angle += speed * dt.max(0.0);
        let laps_after = (self.system_angle / TAU).floor();
        self.lap_count += (laps_after - laps_before) as u32;

        // Mark presentations inside the tight window.
        let angle = self.system_angle;
        let laps = self.lap_count;
        for p in &mut self.participants {
            if p.has_presented || laps < MIN_LAPS || !p.launched(now) {
                continue;
            }
            if angular_gap(wrap(angle + p.offset), TARGET_ANGLE) < PRESENT_ZONE {
                p.has_presented = true;
                log::debug!("showcase: {} presented on lap {}", p.id, laps);
            }
        }

        // Release presented participants once realigned with their slot —
        // but never mid-presentation, so the slow pass is uninterrupted.
        self.participants.retain(|p| {
            if !p.has_presented || in_zone {
                return true;
            }
            let orbital = wrap(angle + p.offset);
            let slot_world = wrap(base_rotation + p.slot_angle);
            if angular_gap(orbital, slot_world) < RETURN_ZONE {
                log::info!("showcase: {} realigned with its slot", p.id);
                false
            } else {
                true
            }
        });

        if self.participants.is_empty() {
            self.phase = Phase::Cooldown {
                until: now + COOLDOWN_SECS,
            };
        }
    }

    /// True while any launched participant sits within the slow-down
    /// window in front of the camera, once the minimum laps are done.
    fn in_presentation_zone(&self, now: f64) -> bool {
        self.lap_count >= MIN_LAPS
            && self.participants.iter().any(|p| {
                p.launched(now)
                    && angular_gap(self.world_angle(p), TARGET_ANGLE) < SLOW_ZONE
            })
    }
}

/// Wrap an angle into [0, 2π).
fn wrap(a: f64) -> f64 {
    a.rem_euclid(TAU)
}

/// Shortest-path angular distance, in [0, π].
fn angular_gap(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
