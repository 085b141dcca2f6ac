// Copyright 2026 the Caliper Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caliper Session: the interaction state machine for spacing measurement.
//!
//! While a hotkey is held, the pointer picks out two elements: the element
//! hovered at the moment the key went down (the **selection**, the
//! measurement anchor) and whatever the pointer is currently over (the
//! **target**). [`SpacingEngine`] consumes the host's keyboard and pointer
//! events, tracks those two references, and on every target change measures
//! the pair — classify the rectangles, derive the four edge gaps, format
//! them — and emits highlight and mark requests to a
//! [`caliper_overlay::OverlayBackend`].
//!
//! ## Design Philosophy
//!
//! The engine follows the same rules as the other Caliper crates:
//!
//! - **Host-agnostic**: elements are an opaque key type `K`; hit testing is
//!   the host's job (feed the engine a top-most-first hit path), geometry
//!   arrives through the [`BoundsSource`] capability, and time arrives as a
//!   `u64` the host supplies.
//! - **Single-threaded and non-blocking**: every method is a plain `&mut
//!   self` call on the host's event loop. Bounds are read in the same call
//!   that commits the state change they belong to, never across a
//!   suspension point.
//! - **Failure-absorbing**: a missing bounding box (an element detached
//!   mid-session) degrades to "no visual update this tick". No event
//!   method panics or returns an error for it.
//!
//! ## Arming, retargeting, dismissal
//!
//! Pressing the configured hotkey **arms** the engine and fixes the
//! selection; releasing it schedules a teardown — immediate (next tick) by
//! default, or after a 3000-unit grace window when shift was held during
//! the armed session, so the overlay survives long enough to be read.
//! Re-arming during the grace window cancels the pending teardown
//! synchronously and starts a fresh cycle with no flicker.
//!
//! Target updates are modeled as a one-shot deferred step:
//! [`SpacingEngine::pointer_move`] resolves a [`Retarget`] only when the
//! target would actually change, and [`SpacingEngine::apply_retarget`]
//! discards it unless its dispatch token is still the latest — a stale
//! resolution can never overwrite fresher hover state. Hosts without a
//! deferred dispatch step can use
//! [`SpacingEngine::pointer_move_immediate`].
//!
//! ## Minimal example
//!
//! ```
//! use caliper_session::{KeyInput, SpacingEngine, SpacingOptions};
//! use caliper_overlay_ref::RecordingOverlay;
//! use kurbo::Rect;
//!
//! // Two elements the host can hit-test: an outer box and a nested box.
//! let bounds = |key: &u32| match key {
//!     1 => Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
//!     2 => Some(Rect::new(10.0, 10.0, 20.0, 20.0)),
//!     _ => None,
//! };
//!
//! let mut overlay = RecordingOverlay::new();
//! let mut engine = SpacingEngine::new(SpacingOptions::default());
//! engine.start(true).unwrap();
//!
//! // Hover the outer box; nothing resolves while idle.
//! assert!(engine.pointer_move(&[1]).is_none());
//!
//! // Hold the hotkey: the hovered box becomes the selection.
//! let reaction = engine.key_down(&KeyInput { key: "Alt", shift: false }, &bounds, &mut overlay);
//! assert!(reaction.prevent_default);
//!
//! // Hover the nested box: it becomes the target and the pair is measured.
//! let retarget = engine.pointer_move(&[2]).unwrap();
//! assert!(engine.apply_retarget(&retarget, &bounds, &mut overlay));
//! assert_eq!(overlay.marks().len(), 4);
//! assert_eq!(overlay.marks()[0].1, "10px");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::string::String;

use caliper_overlay::LineShape;
use caliper_units::DEFAULT_REM_RATIO;
use kurbo::Rect;

mod engine;

pub use engine::{Retarget, SpacingEngine};

/// Delay, in host time units, between hotkey release and teardown when the
/// dismissal-grace modifier was held during the armed session.
pub const DISMISS_GRACE_DELAY: u64 = 3000;

bitflags::bitflags! {
    /// Session state word.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SessionFlags: u8 {
        /// The engine has started and consumes events.
        const STARTED = 0b0000_0001;
        /// The hotkey is physically held down.
        const ARMED = 0b0000_0010;
        /// The grace modifier was observed during this armed session, so the
        /// next hotkey release schedules a delayed teardown.
        const DISMISS_PENDING = 0b0000_0100;
        /// Page scrolling is currently suppressed on the host.
        const SCROLL_LOCKED = 0b0000_1000;
    }
}

/// Tool configuration, supplied once at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct SpacingOptions {
    /// Cosmetic line weight passed through to the overlay backend.
    pub shape: LineShape,
    /// When `true`, measurements are formatted in rem instead of px.
    pub px2rem: bool,
    /// Root font size used as the rem divisor.
    pub rem_ratio: f64,
    /// Key identifier that arms the engine.
    pub hot_key: String,
}

impl Default for SpacingOptions {
    fn default() -> Self {
        Self {
            shape: LineShape::default(),
            px2rem: false,
            rem_ratio: DEFAULT_REM_RATIO,
            hot_key: String::from("Alt"),
        }
    }
}

/// A keyboard event as the engine sees it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyInput<'a> {
    /// Key identifier, compared against [`SpacingOptions::hot_key`].
    pub key: &'a str,
    /// Whether the dismissal-grace modifier (shift) is held.
    pub shift: bool,
}

/// Scroll-suppression change requested from the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScrollControl {
    /// Attach wheel/scroll-prevention listeners.
    Lock,
    /// Detach them again.
    Unlock,
}

/// Host effects requested by an event method.
///
/// The engine cannot reach the host's event plumbing itself, so it reports
/// the net effect of each call: whether the event's default action should be
/// suppressed, and whether the host should change scroll suppression.
/// `scroll` is the *net* change over the whole call — a teardown followed by
/// a re-arm inside one key press nets out to `None`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Reaction {
    /// Suppress the browser/host default action for this event.
    pub prevent_default: bool,
    /// Scroll-suppression change, if any.
    pub scroll: Option<ScrollControl>,
}

/// Error returned by [`SpacingEngine::start`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    /// The host has no document root yet; the engine stays un-started and
    /// the caller may retry once one exists.
    #[error("document root does not exist; start was a no-op")]
    MissingRoot,
}

/// Geometry capability: viewport-relative bounding boxes for element keys.
///
/// `None` means the element is no longer attached (or never had a box); the
/// engine treats that as "no measurement possible" and skips the draw.
/// Implemented for any `Fn(&K) -> Option<Rect>`, which is usually all a test
/// harness needs.
pub trait BoundsSource<K> {
    /// Current bounding box for `key`, or `None` when unavailable.
    fn bounds(&self, key: &K) -> Option<Rect>;
}

impl<K, F> BoundsSource<K> for F
where
    F: Fn(&K) -> Option<Rect>,
{
    fn bounds(&self, key: &K) -> Option<Rect> {
        self(key)
    }
}
