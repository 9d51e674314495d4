//! Software-rendered visualizer using `minifb`.
//!
//! The renderer consumes one [`SceneSnapshot`] per frame and nothing
//! else: items are projected with a fixed perspective camera and drawn as
//! colored tiles back-to-front, with showcased/focused tiles drawn on top
//! regardless of depth.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │        ▾ hand marker (tracks palm x)                │
//! │                                                     │
//! │        · · tiles of the arrangement · ·             │
//! │      ·   [showcased tile gliding past]   ·          │
//! │                                                     │
//! │  status bar                                         │
//! │  key legend                                         │
//! └─────────────────────────────────────────────────────┘
//! ```

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use glam::Vec3;

use std::sync::mpsc::Sender;

use crate::app::{ItemSnapshot, SceneSnapshot};
use crate::gesture::GestureLabel;
use crate::hand::{SimInput, SimKey};
use crate::mode::AppMode;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 1100;
pub const WIN_H: usize = 700;
const STATUS_Y: usize = WIN_H - 40;

const BG_COLOR: u32 = 0xFF10101C;
const TEXT_BG: u32 = 0xFF1C2340;
const TILE_BORDER: u32 = 0xFF000000;
const ELEVATED_BORDER: u32 = 0xFFFFD700; // gold
const HAND_COLOR: u32 = 0xFF7FD4FF;

// Camera: fixed position on +z looking toward the origin.
const CAM_POS: Vec3 = Vec3::new(0.0, 3.5, 14.0);
const FOCAL: f32 = 520.0;
const NEAR: f32 = 0.5;
/// Half-extent of a tile in world units before per-item scale.
const TILE: f32 = 0.35;

// ════════════════════════════════════════════════════════════════════════════
// UiCommand
// ════════════════════════════════════════════════════════════════════════════

/// Non-gesture actions collected from the keyboard each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    Upload,
    Delete,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf: Vec<u32>,
    sim_tx: Sender<SimInput>,
    /// Simulated hand x, steered with the arrow keys.
    hand_x: f32,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, String> {
        let mut window = Window::new(
            "Hand Gallery — gesture-driven orbital gallery",
            WIN_W,
            WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            hand_x: 0.5,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll keyboard input: pose keys go to the simulated hand source,
    /// app-level actions come back as [`UiCommand`]s.
    pub fn poll_input(&mut self) -> Vec<UiCommand> {
        let mut commands = Vec::new();
        if !self.window.is_open() {
            commands.push(UiCommand::Quit);
            return commands;
        }

        let fist = self.window.is_key_pressed(Key::F, KeyRepeat::No);
        let palm = self.window.is_key_pressed(Key::O, KeyRepeat::No);
        let pinch = self.window.is_key_pressed(Key::P, KeyRepeat::No);
        let relax = self.window.is_key_pressed(Key::R, KeyRepeat::No);
        let toggle = self.window.is_key_pressed(Key::H, KeyRepeat::No);
        let upload = self.window.is_key_pressed(Key::U, KeyRepeat::No);
        let delete = self.window.is_key_pressed(Key::X, KeyRepeat::No);
        let quit = self.window.is_key_pressed(Key::Q, KeyRepeat::No);
        let left = self.window.is_key_pressed(Key::Left, KeyRepeat::Yes);
        let right = self.window.is_key_pressed(Key::Right, KeyRepeat::Yes);

        if fist {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Fist));
        }
        if palm {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::OpenPalm));
        }
        if pinch {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Pinch));
        }
        if relax {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Relax));
        }
        if toggle {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::ToggleHand));
        }

        if left || right {
            self.hand_x = (self.hand_x + if right { 0.02 } else { -0.02 }).clamp(0.05, 0.95);
            let _ = self.sim_tx.send(SimInput::MoveTo(self.hand_x));
        }

        if upload {
            commands.push(UiCommand::Upload);
        }
        if delete {
            commands.push(UiCommand::Delete);
        }
        if quit {
            commands.push(UiCommand::Quit);
        }
        commands
    }

    /// Render one frame from the snapshot.
    pub fn render(&mut self, scene: &SceneSnapshot) {
        self.buf.fill(BG_COLOR);

        // ── Items, back to front; elevated tiles always on top ────────────
        let mut order: Vec<&ItemSnapshot> = scene.items.iter().collect();
        order.sort_by(|a, b| {
            let da = CAM_POS.distance(a.position);
            let db = CAM_POS.distance(b.position);
            a.elevated
                .cmp(&b.elevated)
                .then(db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal))
        });
        for item in order {
            self.draw_item(item);
        }

        // ── Hand marker ───────────────────────────────────────────────────
        if scene.hand.is_present {
            let hx = (scene.hand.position.0 * WIN_W as f32) as isize;
            self.fill_rect(hx - 5, 8, 10, 10, HAND_COLOR);
        }

        // ── Status bar + key legend ───────────────────────────────────────
        self.fill_rect(0, STATUS_Y as isize, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        let status = format!(
            "{}  gesture={}  hand={}  progress={:.2}  items={}",
            mode_text(scene.mode),
            gesture_text(scene.hand.gesture),
            if scene.hand.is_present { "in" } else { "out" },
            scene.progress,
            scene.items.len(),
        );
        self.draw_label(&status, 10, STATUS_Y + 8, 0xFFEEEEEE);
        self.draw_label(
            "f=fist o=palm p=pinch r=relax h=hand in/out arrows=move u=upload x=delete q=quit",
            10,
            WIN_H - 14,
            0xFF888888,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Item tile ─────────────────────────────────────────────────────────

    fn draw_item(&mut self, item: &ItemSnapshot) {
        let Some((sx, sy, depth)) = project(item.position) else {
            return;
        };

        let half = (TILE * item.scale * FOCAL / depth).max(1.0);
        // Tiles narrow as they turn away from the camera.
        let half_w = half * (0.3 + 0.7 * item.yaw.cos().abs());

        let x0 = (sx - half_w) as isize;
        let y0 = (sy - half) as isize;
        let w = (half_w * 2.0) as usize;
        let h = (half * 2.0) as usize;

        self.fill_rect(x0, y0, w, h, item_color(item.id.0));
        if item.elevated {
            self.draw_border(x0 - 1, y0 - 1, w + 2, h + 2, ELEVATED_BORDER);
            self.draw_border(x0, y0, w, h, ELEVATED_BORDER);
        } else {
            self.draw_border(x0, y0, w, h, TILE_BORDER);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32) {
        let x1 = (x + w as isize).clamp(0, WIN_W as isize) as usize;
        let y1 = (y + h as isize).clamp(0, WIN_H as isize) as usize;
        let x0 = x.clamp(0, WIN_W as isize) as usize;
        let y0 = y.clamp(0, WIN_H as isize) as usize;
        for row in y0..y1 {
            for col in x0..x1 {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 {
            return;
        }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h as isize - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w as isize - 1, y, 1, h, color);
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Minimal 3×5 bitmap font for status/legend text.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > WIN_W {
                break;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Projection and colors
// ════════════════════════════════════════════════════════════════════════════

/// Project a world point to screen space. Returns `(x, y, depth)` or
/// `None` when the point is behind the near plane.
fn project(p: Vec3) -> Option<(f32, f32, f32)> {
    let depth = CAM_POS.z - p.z;
    if depth < NEAR {
        return None;
    }
    let sx = WIN_W as f32 * 0.5 + (p.x - CAM_POS.x) * FOCAL / depth;
    let sy = WIN_H as f32 * 0.5 + (CAM_POS.y - p.y) * FOCAL / depth;
    Some((sx, sy, depth))
}

/// Stable per-item color from a hue wheel, so tiles keep their color
/// across arrangements and showcase rides.
fn item_color(id: u64) -> u32 {
    let hue = (id % 12) as f32 / 12.0 * 360.0;
    hsv_to_argb(hue, 0.65, 0.88)
}

/// Convert HSV → packed ARGB (0xAARRGGBB, A=0xFF).
fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h = h % 360.0;
    let hi = (h / 60.0) as u32;
    let f = h / 60.0 - hi as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let ri = (r * 255.0) as u32;
    let gi = (g * 255.0) as u32;
    let bi = (b * 255.0) as u32;
    0xFF000000 | (ri << 16) | (gi << 8) | bi
}

fn mode_text(mode: AppMode) -> &'static str {
    match mode {
        AppMode::Assembled => "assembled",
        AppMode::Dispersed => "dispersed",
        AppMode::Focus => "focus",
    }
}

fn gesture_text(gesture: GestureLabel) -> &'static str {
    match gesture {
        GestureLabel::None => "none",
        GestureLabel::Fist => "fist",
        GestureLabel::OpenPalm => "palm",
        GestureLabel::Pinch => "pinch",
        GestureLabel::Point => "point",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_lowercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _ => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
