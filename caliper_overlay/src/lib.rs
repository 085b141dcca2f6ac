// Copyright 2026 the Caliper Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caliper Overlay: backend-agnostic overlay requests and backend traits.
//!
//! This crate defines the boundary between the measurement engine and
//! whatever actually draws on screen. The engine emits two kinds of
//! requests — element highlights and edge marks — as plain data, and a
//! host-provided [`OverlayBackend`] turns them into DOM nodes, terminal
//! cells, GPU quads, or nothing at all.
//!
//! # Position in the stack
//!
//! - **Engine** (`caliper_session`): decides *what* to highlight and
//!   measure. Lives upstream of this crate.
//! - **Requests (this crate)**: [`HighlightDesc`] and [`MarkDesc`] as POD
//!   values, plus the [`OverlayBackend`] trait that consumes them.
//! - **Backends**: a browser content script, a debug recording backend
//!   (`caliper_overlay_ref`), or any renderer the host embeds.
//!
//! Backends are expected to be tolerant: clearing a highlight that was
//! never placed, or clearing marks twice, must be a no-op. The engine
//! leans on that to keep every event handler a terminal boundary for
//! failures.
//!
//! ## Minimal example
//!
//! ```
//! use caliper_overlay::{
//!     HighlightDesc, HighlightRole, MarkDesc, OverlayBackend, SELECTED_COLOR,
//! };
//! use caliper_rect::Side;
//! use kurbo::Rect;
//!
//! /// A backend that just counts what it is asked to draw.
//! #[derive(Default)]
//! struct Counting {
//!     highlights: u32,
//!     marks: u32,
//! }
//!
//! impl OverlayBackend for Counting {
//!     fn place_highlight(&mut self, _role: HighlightRole, _desc: &HighlightDesc) {
//!         self.highlights += 1;
//!     }
//!     fn clear_highlight(&mut self, _role: HighlightRole) {}
//!     fn place_mark(&mut self, _mark: &MarkDesc<'_>) {
//!         self.marks += 1;
//!     }
//!     fn clear_marks(&mut self) {}
//! }
//!
//! let mut backend = Counting::default();
//! let rect = Rect::new(10.0, 20.0, 110.0, 70.0);
//! backend.place_highlight(
//!     HighlightRole::Selected,
//!     &HighlightDesc::from_rect(rect, SELECTED_COLOR),
//! );
//! assert_eq!(backend.highlights, 1);
//! ```
//!
//! This crate is `no_std`.

#![no_std]

use caliper_rect::Side;
use kurbo::Rect;
use peniko::Color;
use peniko::color::palette;

/// Default highlight color for the selected element.
pub const SELECTED_COLOR: Color = palette::css::RED;

/// Default highlight color for the target element.
pub const TARGET_COLOR: Color = palette::css::BLUE;

/// Which of the two measured elements a highlight belongs to.
///
/// At most one highlight exists per role; placing a highlight for a role
/// replaces any previous one, and clearing a role with no highlight is a
/// no-op.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HighlightRole {
    /// The measurement anchor, fixed at hotkey-press time.
    Selected,
    /// The element currently measured against the anchor.
    Target,
}

/// Cosmetic weight of highlight borders and mark lines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineShape {
    /// Hairline.
    Thin,
    /// Default weight.
    #[default]
    Normal,
    /// Heavy.
    Fat,
}

/// Request to draw a highlight box over an element.
///
/// Coordinates are viewport-relative CSS-pixel values, pre-split into the
/// position/size form most hosts position absolutely with.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HighlightDesc {
    /// Distance from the viewport top to the element's top edge.
    pub top: f64,
    /// Distance from the viewport left to the element's left edge.
    pub left: f64,
    /// Element width.
    pub width: f64,
    /// Element height.
    pub height: f64,
    /// Fill/border color for the highlight.
    pub color: Color,
}

impl HighlightDesc {
    /// Build a highlight request covering `rect`.
    pub fn from_rect(rect: Rect, color: Color) -> Self {
        Self {
            top: rect.y0,
            left: rect.x0,
            width: rect.width(),
            height: rect.height(),
            color,
        }
    }
}

/// Request to draw one edge label between the two measured elements.
///
/// The backend owns label placement; it gets both rectangles, which edge the
/// value belongs to, and whether the rectangles are disjoint (`outside`),
/// which flips whether the label sits between the boxes or inside the
/// overlap.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarkDesc<'a> {
    /// Bounding box of the selected element.
    pub selected: Rect,
    /// Bounding box of the target element.
    pub target: Rect,
    /// Edge the measurement annotates.
    pub side: Side,
    /// Pre-formatted measurement text, e.g. `"24px"` or `"1.5000rem"`.
    pub label: &'a str,
    /// `true` when the rectangles are disjoint and the gap is the empty
    /// space between them.
    pub outside: bool,
    /// Cosmetic line weight from the tool configuration.
    pub shape: LineShape,
}

/// A renderer for overlay requests.
///
/// Implementations must treat every call as best-effort and non-fatal:
/// drawing over an element that has disappeared should silently do nothing,
/// and clears are idempotent. No call is allowed to panic.
pub trait OverlayBackend {
    /// Draw (or replace) the highlight for `role`.
    fn place_highlight(&mut self, role: HighlightRole, desc: &HighlightDesc);

    /// Remove the highlight for `role`, if present.
    fn clear_highlight(&mut self, role: HighlightRole);

    /// Draw one edge label.
    fn place_mark(&mut self, mark: &MarkDesc<'_>);

    /// Remove all edge labels.
    fn clear_marks(&mut self);
}
