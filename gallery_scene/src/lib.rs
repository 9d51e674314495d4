//! # gallery_scene
//!
//! Scene-side data for the orbital photo gallery:
//!
//! * [`item`] — gallery items and the [`ItemPool`] they live in.
//! * [`layout`] — deterministic golden-angle placement producing the two
//!   target positions (assembled cone, dispersed sphere band) every item
//!   receives at upload time.
//! * [`store`] — the persisted JSON manifest. Positions are generated once
//!   at upload and stored; they are never recomputed for persisted items.
//!
//! The crate holds no per-frame state. Everything here is either plain
//! data or a pure placement function; the gesture pipeline and the
//! showcase scheduler live in the `hand_gallery` crate.

pub mod item;
pub mod layout;
pub mod store;

pub use item::{Item, ItemId, ItemPool};
