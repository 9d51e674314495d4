//! Hand landmark input — keyboard-synthesized frames and the tracker sidecar.
//!
//! The public interface is [`HandEvent`] delivered over an `mpsc` channel.
//! Consumers don't need to know whether frames came from a real tracker or
//! the keyboard simulator; both deliver at their own cadence and the
//! application only ever reads the latest event.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

// ════════════════════════════════════════════════════════════════════════════
// Landmarks
// ════════════════════════════════════════════════════════════════════════════

/// One hand joint. `x`/`y` are normalized to [0, 1] within the camera
/// frame; `z` is depth relative to the wrist.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    pub fn distance(self, other: Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// MediaPipe hand landmark indices (the subset this crate reads).
pub mod joints {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;
}

/// Landmarks per detected hand. Frames with fewer points classify as NONE.
pub const LANDMARK_COUNT: usize = 21;

/// One landmark sample for one detected hand. Produced once per tracker
/// tick and replaced by the next; never retained.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkFrame {
    pub points: Vec<Landmark>,
}

impl LandmarkFrame {
    /// All 21 points collapsed onto the palm centre, fingertips then moved
    /// outward. Shared scaffolding for the synthetic poses below.
    fn pose(cx: f32, cy: f32, tip_reach: f32, thumb_gap: f32) -> Self {
        let mut points = vec![Landmark::new(cx, cy, 0.0); LANDMARK_COUNT];

        // Fan the four non-thumb fingertips upward from the wrist, each at
        // exactly `tip_reach` distance.
        let tips = [
            joints::INDEX_TIP,
            joints::MIDDLE_TIP,
            joints::RING_TIP,
            joints::PINKY_TIP,
        ];
        for (i, &tip) in tips.iter().enumerate() {
            let spread = (i as f32 - 1.5) * 0.25; // radians around straight-up
            points[tip] = Landmark::new(
                cx + tip_reach * spread.sin(),
                cy - tip_reach * spread.cos(),
                0.0,
            );
        }

        let index = points[joints::INDEX_TIP];
        points[joints::THUMB_TIP] = Landmark::new(index.x - thumb_gap, index.y, 0.0);
        points[joints::MIDDLE_MCP] = Landmark::new(cx, cy - 0.1, 0.0);
        LandmarkFrame { points }
    }

    /// Closed fist: fingertips pulled in near the wrist. The thumb sits
    /// right next to the index tip, as it does on a real fist.
    pub fn fist(cx: f32, cy: f32) -> Self {
        Self::pose(cx, cy, 0.2, 0.02)
    }

    /// Open palm: fingertips spread well away from the wrist.
    pub fn open_palm(cx: f32, cy: f32) -> Self {
        Self::pose(cx, cy, 0.6, 0.2)
    }

    /// Pinch: half-extended fingers with thumb and index tips touching.
    pub fn pinch(cx: f32, cy: f32) -> Self {
        Self::pose(cx, cy, 0.45, 0.01)
    }

    /// Half-open hand that matches no gesture class.
    pub fn relaxed(cx: f32, cy: f32) -> Self {
        Self::pose(cx, cy, 0.45, 0.2)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandEvent + HandSource trait
// ════════════════════════════════════════════════════════════════════════════

/// One message from a hand source.
#[derive(Clone, Debug)]
pub enum HandEvent {
    /// A hand was detected this tick.
    Frame(LandmarkFrame),
    /// No hand visible this tick.
    Lost,
}

/// Anything that can deliver [`HandEvent`]s over a channel.
pub trait HandSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandEvent>);
}

/// Spawn a hand source on its own thread and return the receiving end.
pub fn spawn_hand_source<S: HandSource>(source: S) -> Receiver<HandEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug)]
pub enum SimInput {
    KeyDown(SimKey),
    /// Horizontal hand position in [0, 1].
    MoveTo(f32),
}

/// Simulated pose keys (mapped from minifb keys by the visualizer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    Fist,       // F
    OpenPalm,   // O
    Pinch,      // P
    Relax,      // R
    ToggleHand, // H — hand enters / leaves the camera view
}

/// Landmark source driven by the visualizer's keyboard events.
///
/// Holds the current simulated pose and emits a full landmark frame at a
/// fixed cadence, mimicking a tracker that reports independently of the
/// render loop. The frames run through the real classifier, so the whole
/// pipeline is exercised without camera hardware.
pub struct SimHandSource {
    pub rx: Receiver<SimInput>,
}

impl HandSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<HandEvent>) {
        const FRAME_INTERVAL: Duration = Duration::from_millis(33);

        let mut present = true;
        let mut pose = SimKey::Relax;
        let mut cx = 0.5_f32;

        loop {
            // Drain pending key events
            loop {
                match self.rx.try_recv() {
                    Ok(SimInput::KeyDown(SimKey::ToggleHand)) => present = !present,
                    Ok(SimInput::KeyDown(key)) => pose = key,
                    Ok(SimInput::MoveTo(x)) => cx = x.clamp(0.05, 0.95),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }

            let event = if present {
                let frame = match pose {
                    SimKey::Fist => LandmarkFrame::fist(cx, 0.5),
                    SimKey::OpenPalm => LandmarkFrame::open_palm(cx, 0.5),
                    SimKey::Pinch => LandmarkFrame::pinch(cx, 0.5),
                    _ => LandmarkFrame::relaxed(cx, 0.5),
                };
                HandEvent::Frame(frame)
            } else {
                HandEvent::Lost
            };

            if tx.send(event).is_err() {
                return;
            }
            thread::sleep(FRAME_INTERVAL);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackerHandSource — MediaPipe sidecar (feature = "tracker")
// ════════════════════════════════════════════════════════════════════════════

/// Hand source backed by a MediaPipe sidecar process.
///
/// The sidecar owns the camera and prints one JSON object per line:
/// `{"hands":[{"landmarks":[{"x":..,"y":..,"z":..}, ...]}]}` — an empty
/// `hands` list means no hand this tick. Requires the `tracker` feature.
#[cfg(feature = "tracker")]
pub struct TrackerHandSource {
    pub command: String,
}

#[cfg(feature = "tracker")]
impl TrackerHandSource {
    /// Sidecar command from `HAND_TRACKER_CMD`; defaults to a
    /// `hand_tracker.py` next to the working directory.
    pub fn from_env() -> Self {
        TrackerHandSource {
            command: std::env::var("HAND_TRACKER_CMD")
                .unwrap_or_else(|_| "python3 hand_tracker.py".to_string()),
        }
    }
}

#[cfg(feature = "tracker")]
mod wire {
    #[derive(serde::Deserialize)]
    pub struct WireLandmark {
        pub x: f32,
        pub y: f32,
        pub z: f32,
    }

    #[derive(serde::Deserialize)]
    pub struct WireHand {
        pub landmarks: Vec<WireLandmark>,
    }

    #[derive(serde::Deserialize)]
    pub struct WireFrame {
        pub hands: Vec<WireHand>,
    }
}

#[cfg(feature = "tracker")]
impl HandSource for TrackerHandSource {
    fn run(self: Box<Self>, tx: Sender<HandEvent>) {
        use std::io::{BufRead, BufReader};
        use std::process::{Command, Stdio};

        let mut parts = self.command.split_whitespace();
        let Some(program) = parts.next() else {
            log::error!("tracker: empty sidecar command");
            return;
        };

        let child = Command::new(program)
            .args(parts)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn();
        let mut child = match child {
            Ok(c) => c,
            Err(e) => {
                log::error!("tracker: failed to start {:?}: {}", self.command, e);
                let _ = tx.send(HandEvent::Lost);
                return;
            }
        };
        log::info!("tracker: sidecar started ({})", self.command);

        let Some(stdout) = child.stdout.take() else {
            log::error!("tracker: sidecar has no stdout");
            return;
        };
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    log::warn!("tracker: read error: {}", e);
                    break;
                }
            };
            let frame: wire::WireFrame = match serde_json::from_str(&line) {
                Ok(f) => f,
                Err(e) => {
                    log::warn!("tracker: bad frame ({}), skipping", e);
                    continue;
                }
            };

            // Single-hand system: only the first detected hand is used.
            let event = match frame.hands.into_iter().next() {
                Some(hand) => HandEvent::Frame(LandmarkFrame {
                    points: hand
                        .landmarks
                        .into_iter()
                        .map(|p| Landmark::new(p.x, p.y, p.z))
                        .collect(),
                }),
                None => HandEvent::Lost,
            };
            if tx.send(event).is_err() {
                break;
            }
        }

        log::info!("tracker: sidecar stream ended");
        let _ = child.kill();
        let _ = tx.send(HandEvent::Lost);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn avg_tip_reach(frame: &LandmarkFrame) -> f32 {
        let wrist = frame.points[joints::WRIST];
        let tips = [
            joints::INDEX_TIP,
            joints::MIDDLE_TIP,
            joints::RING_TIP,
            joints::PINKY_TIP,
        ];
        tips.iter().map(|&t| wrist.distance(frame.points[t])).sum::<f32>() / tips.len() as f32
    }

    #[test]
    fn synthetic_poses_have_full_landmark_sets() {
        for frame in [
            LandmarkFrame::fist(0.5, 0.5),
            LandmarkFrame::open_palm(0.5, 0.5),
            LandmarkFrame::pinch(0.5, 0.5),
            LandmarkFrame::relaxed(0.5, 0.5),
        ] {
            assert_eq!(frame.points.len(), LANDMARK_COUNT);
        }
    }

    #[test]
    fn fist_pose_is_tight() {
        assert!(avg_tip_reach(&LandmarkFrame::fist(0.5, 0.5)) < 0.4);
    }

    #[test]
    fn open_palm_pose_is_wide_with_thumb_clear() {
        let frame = LandmarkFrame::open_palm(0.5, 0.5);
        assert!(avg_tip_reach(&frame) > 0.5);
        let gap = frame.points[joints::THUMB_TIP].distance(frame.points[joints::INDEX_TIP]);
        assert!(gap >= 0.06);
    }

    #[test]
    fn pinch_pose_touches_thumb_to_index() {
        let frame = LandmarkFrame::pinch(0.5, 0.5);
        let gap = frame.points[joints::THUMB_TIP].distance(frame.points[joints::INDEX_TIP]);
        assert!(gap < 0.06);
        // But the hand is not a fist
        assert!(avg_tip_reach(&frame) >= 0.4);
    }

    #[test]
    fn sim_source_emits_frames_then_lost() {
        let (in_tx, in_rx) = mpsc::channel();
        let rx = spawn_hand_source(SimHandSource { rx: in_rx });

        // Default pose streams frames
        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(first, HandEvent::Frame(_)));

        // Hand leaves the view
        in_tx.send(SimInput::KeyDown(SimKey::ToggleHand)).unwrap();
        let mut saw_lost = false;
        for _ in 0..20 {
            if let Ok(HandEvent::Lost) = rx.recv_timeout(Duration::from_secs(2)) {
                saw_lost = true;
                break;
            }
        }
        assert!(saw_lost);
    }
}
