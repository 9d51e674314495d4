//! Per-tick application state.
//!
//! `AppState` owns the stabilizer, the mode machine, the showcase
//! scheduler, and the item pool, and runs the classify → stabilize →
//! transition → schedule pipeline once per frame on a single thread. Each
//! tick ends with an immutable [`SceneSnapshot`] handed to the renderer —
//! the renderer never reads live state, so there are no ordering
//! dependencies between the pipeline and the draw code.

use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Instant;

use glam::Vec3;
use thiserror::Error;

use gallery_scene::store::{self, StoreError};
use gallery_scene::{layout, ItemId, ItemPool};

use crate::gesture::{GestureStabilizer, HandState};
use crate::hand::{spawn_hand_source, HandEvent, SimInput};
use crate::mode::{AppMode, ModeMachine};
use crate::showcase::Showcase;
use crate::visualizer::{UiCommand, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// Tuning constants
// ════════════════════════════════════════════════════════════════════════════

/// Minimum interval between gesture classification samples, seconds.
/// Classification runs at ~20 Hz regardless of the render rate; the
/// stabilizer's consistency ticks are these samples, not frames.
const SAMPLE_INTERVAL: f64 = 0.05;
/// Seconds for a full assembled↔dispersed transition.
const TRANSITION_SECS: f64 = 1.2;
/// Idle spin of the assembled arrangement, rad/s.
const IDLE_SPIN: f64 = 0.05;
/// Extra spin per unit of hand rotation, rad/s.
const HAND_SPIN: f64 = 1.2;

// Renderer-side geometry for the two override transforms.
const SHOWCASE_RADIUS: f32 = 4.5;
const SHOWCASE_HEIGHT: f32 = 3.0;
const SHOWCASE_SCALE: f32 = 1.6;
const FOCUS_POS: Vec3 = Vec3::new(0.0, 3.0, 6.0);
const FOCUS_SCALE: f32 = 2.2;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig / AppError
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
pub struct AppConfig {
    /// Persisted gallery manifest; loaded at startup if it exists and
    /// written back on exit.
    pub manifest_path: Option<PathBuf>,
    /// Demo items generated when no manifest is loaded.
    pub demo_items: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            manifest_path: None,
            demo_items: 24,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("window: {0}")]
    Window(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ════════════════════════════════════════════════════════════════════════════
// Scene snapshot
// ════════════════════════════════════════════════════════════════════════════

/// Transform intent for one item, valid for a single tick.
#[derive(Clone, Debug)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub position: Vec3,
    /// Yaw the tile faces, radians.
    pub yaw: f32,
    pub scale: f32,
    /// Showcased or focused items render above the rest.
    pub elevated: bool,
}

/// Immutable per-tick scene description. The renderer consumes only this.
#[derive(Clone, Debug)]
pub struct SceneSnapshot {
    pub mode: AppMode,
    /// 0.0 = assembled, 1.0 = dispersed.
    pub progress: f32,
    /// Current world rotation of the assembled arrangement, radians.
    pub base_rotation: f64,
    pub hand: HandState,
    pub focus: Option<ItemId>,
    pub items: Vec<ItemSnapshot>,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    pool: ItemPool,
    stabilizer: GestureStabilizer,
    modes: ModeMachine,
    showcase: Showcase,

    /// Latest stable hand state; replaced at the sampling cadence.
    hand: HandState,
    /// 0.0 = assembled, 1.0 = dispersed; eases toward the mode's target.
    progress: f64,
    /// Accumulated hand-driven spin, radians.
    spin: f64,
    last_sample: f64,
}

impl AppState {
    pub fn new(pool: ItemPool) -> Self {
        AppState {
            pool,
            stabilizer: GestureStabilizer::new(),
            modes: ModeMachine::new(),
            showcase: Showcase::new(),
            hand: HandState::absent(),
            progress: 0.0,
            spin: 0.0,
            last_sample: f64::NEG_INFINITY,
        }
    }

    pub fn pool(&self) -> &ItemPool {
        &self.pool
    }

    pub fn mode(&self) -> AppMode {
        self.modes.mode()
    }

    pub fn focus(&self) -> Option<ItemId> {
        self.modes.focus()
    }

    pub fn hand(&self) -> &HandState {
        &self.hand
    }

    pub fn showcase(&self) -> &Showcase {
        &self.showcase
    }

    /// Add a new item at the next free slot pair. Positions are generated
    /// here, once, and never recomputed afterwards.
    pub fn upload(&mut self, image: &str) -> ItemId {
        let index = self.pool.len();
        let id = self.pool.upload(
            image,
            layout::assembled_position(index),
            layout::dispersed_position(index),
        );
        log::info!("uploaded {} as {}", image, id);
        id
    }

    /// Remove an item. A dangling focus target is dropped; the round-robin
    /// cursor is left alone (it re-wraps at the next selection).
    pub fn delete(&mut self, id: ItemId) -> bool {
        let removed = self.pool.remove(id).is_some();
        if removed {
            self.modes.revalidate_focus(&self.pool);
            log::info!("deleted {}", id);
        }
        removed
    }

    /// Feed the latest hand event. Loss resets the stabilizer instantly;
    /// frames are classified at the bounded sampling cadence and ignored
    /// in between.
    pub fn observe(&mut self, event: &HandEvent, now: f64) {
        match event {
            HandEvent::Lost => {
                self.hand = self.stabilizer.lost();
            }
            HandEvent::Frame(frame) => {
                if now - self.last_sample >= SAMPLE_INTERVAL {
                    self.last_sample = now;
                    self.hand = self.stabilizer.sample(&frame.points);
                }
            }
        }
    }

    /// Advance one frame: mode transition, spin and progress easing, then
    /// the showcase scheduler.
    pub fn tick(&mut self, now: f64, dt: f64) {
        let dt = dt.max(0.0);

        let before = self.modes.mode();
        self.modes.apply(&self.hand, &self.pool);
        let after = self.modes.mode();
        if before != after {
            log::info!("mode {:?} -> {:?}", before, after);
        }

        // Hand rotation feeds the arrangement spin.
        if self.hand.is_present {
            self.spin += self.hand.rotation as f64 * HAND_SPIN * dt;
        }

        // Ease the arrangement toward the mode's target.
        let target = if after == AppMode::Assembled { 0.0 } else { 1.0 };
        let step = dt / TRANSITION_SECS;
        self.progress = if target > self.progress {
            (self.progress + step).min(target)
        } else {
            (self.progress - step).max(target)
        };

        let base = self.base_rotation(now);
        self.showcase
            .tick(now, dt, after, &self.pool, self.modes.focus(), base);
    }

    /// The arrangement's current world rotation: idle drift plus the
    /// accumulated hand spin.
    pub fn base_rotation(&self, now: f64) -> f64 {
        (now * IDLE_SPIN + self.spin).rem_euclid(std::f64::consts::TAU)
    }

    /// Produce the immutable per-tick snapshot for the renderer.
    pub fn snapshot(&self, now: f64) -> SceneSnapshot {
        let base = self.base_rotation(now);
        let focus = self.modes.focus();

        let items = self
            .pool
            .items()
            .iter()
            .map(|item| {
                // Showcase and focus transforms override the arrangement
                // slot; an unlaunched participant stays in its slot.
                if let Some(p) = self.showcase.participant(item.id) {
                    if p.launched(now) {
                        let angle = self.showcase.world_angle(p) as f32;
                        return ItemSnapshot {
                            id: item.id,
                            position: Vec3::new(
                                SHOWCASE_RADIUS * angle.sin(),
                                SHOWCASE_HEIGHT,
                                SHOWCASE_RADIUS * angle.cos(),
                            ),
                            yaw: angle,
                            scale: SHOWCASE_SCALE,
                            elevated: true,
                        };
                    }
                }
                if focus == Some(item.id) {
                    return ItemSnapshot {
                        id: item.id,
                        position: FOCUS_POS,
                        yaw: 0.0,
                        scale: FOCUS_SCALE,
                        elevated: true,
                    };
                }

                let assembled = rotate_y(item.assembled, base as f32);
                let position = assembled.lerp(item.dispersed, self.progress as f32);
                ItemSnapshot {
                    id: item.id,
                    position,
                    yaw: item.assembled.x.atan2(item.assembled.z) + base as f32,
                    scale: 1.0,
                    elevated: false,
                }
            })
            .collect();

        SceneSnapshot {
            mode: self.modes.mode(),
            progress: self.progress as f32,
            base_rotation: base,
            hand: self.hand,
            focus,
            items,
        }
    }
}

/// Rotate a point around the vertical axis.
fn rotate_y(v: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(v.x * c + v.z * s, v.y, v.z * c - v.x * s)
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the hand source (keyboard simulation by default, MediaPipe
/// sidecar with `--features tracker`), the visualizer window, and drives
/// the tick/render loop at ~60 fps. The hand source delivers at its own
/// cadence; only its latest event is consumed each frame.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let pool = build_pool(&cfg)?;

    // ── Hand source ───────────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    #[cfg(not(feature = "tracker"))]
    let hand_rx = spawn_hand_source(crate::hand::SimHandSource { rx: sim_rx });
    #[cfg(feature = "tracker")]
    let hand_rx = {
        // Window keys still steer uploads and quitting, but frames come
        // from the sidecar.
        let _ = sim_rx;
        spawn_hand_source(crate::hand::TrackerHandSource::from_env())
    };

    // ── Visualizer and state ──────────────────────────────────────────────
    let mut vis = Visualizer::new(sim_tx).map_err(AppError::Window)?;
    let mut app = AppState::new(pool);

    let start = Instant::now();
    let mut last = 0.0_f64;
    let mut latest: Option<HandEvent> = None;

    // ── Main loop ─────────────────────────────────────────────────────────
    'frames: while vis.is_open() {
        for command in vis.poll_input() {
            match command {
                UiCommand::Quit => break 'frames,
                UiCommand::Upload => {
                    let image = format!("local/photo-{:03}.jpg", app.pool().len());
                    app.upload(&image);
                }
                UiCommand::Delete => {
                    let target = app
                        .focus()
                        .or_else(|| app.pool().items().last().map(|i| i.id));
                    if let Some(id) = target {
                        app.delete(id);
                    }
                }
            }
        }

        let now = start.elapsed().as_secs_f64();
        let dt = (now - last).max(0.0);
        last = now;

        // Keep only the newest hand event; the producer has its own clock.
        loop {
            match hand_rx.try_recv() {
                Ok(event) => latest = Some(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    latest = Some(HandEvent::Lost);
                    break;
                }
            }
        }
        if let Some(event) = &latest {
            app.observe(event, now);
        }

        app.tick(now, dt);
        vis.render(&app.snapshot(now));
    }

    if let Some(path) = &cfg.manifest_path {
        store::save_manifest(path, app.pool())?;
        log::info!("saved manifest: {}", path.display());
    }
    Ok(())
}

fn build_pool(cfg: &AppConfig) -> Result<ItemPool, AppError> {
    if let Some(path) = &cfg.manifest_path {
        if path.exists() {
            let pool = store::load_manifest(path)?;
            log::info!("loaded {} item(s) from {}", pool.len(), path.display());
            return Ok(pool);
        }
        log::info!("no manifest at {}; starting fresh", path.display());
    }

    let mut pool = ItemPool::new();
    for i in 0..cfg.demo_items {
        pool.upload(
            &format!("demo/photo-{:03}.jpg", i),
            layout::assembled_position(i),
            layout::dispersed_position(i),
        );
    }
    Ok(pool)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
