// Copyright 2026 the Caliper Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caliper Overlay Reference Backend.
//!
//! This crate provides a small, stateful implementation of
//! [`OverlayBackend`] for **request recording**.
//!
//! It is intentionally *not* a renderer:
//! - It does **not** draw anything.
//! - It does **not** establish "golden" visual behavior across backends.
//! - It is intended primarily for tests and debugging that want to assert
//!   on the overlay calls the measurement engine emits, in order.
//!
//! ## Minimal example
//!
//! ```
//! use caliper_overlay::{HighlightDesc, HighlightRole, OverlayBackend, TARGET_COLOR};
//! use caliper_overlay_ref::{OverlayOp, RecordingOverlay};
//! use kurbo::Rect;
//!
//! let mut overlay = RecordingOverlay::new();
//! let rect = Rect::new(0.0, 0.0, 40.0, 30.0);
//! overlay.place_highlight(
//!     HighlightRole::Target,
//!     &HighlightDesc::from_rect(rect, TARGET_COLOR),
//! );
//! overlay.clear_marks();
//!
//! assert_eq!(overlay.ops().len(), 2);
//! assert!(matches!(
//!     overlay.ops()[0],
//!     OverlayOp::PlaceHighlight {
//!         role: HighlightRole::Target,
//!         ..
//!     }
//! ));
//! assert_eq!(overlay.highlight(HighlightRole::Target).map(|d| d.width), Some(40.0));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use caliper_overlay::{HighlightDesc, HighlightRole, LineShape, MarkDesc, OverlayBackend};
use caliper_rect::Side;
use kurbo::Rect;

/// One recorded overlay request.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayOp {
    /// A highlight was placed (or replaced) for `role`.
    PlaceHighlight {
        /// Role the highlight was placed for.
        role: HighlightRole,
        /// The request as received.
        desc: HighlightDesc,
    },
    /// The highlight for `role` was cleared.
    ClearHighlight {
        /// Role the clear applied to.
        role: HighlightRole,
    },
    /// An edge mark was placed.
    PlaceMark {
        /// Bounding box of the selected element at placement time.
        selected: Rect,
        /// Bounding box of the target element at placement time.
        target: Rect,
        /// Edge the mark annotates.
        side: Side,
        /// The formatted measurement text.
        label: String,
        /// Whether the rectangles were disjoint.
        outside: bool,
        /// Cosmetic line weight.
        shape: LineShape,
    },
    /// All marks were cleared.
    ClearMarks,
}

/// Recording implementation of the overlay backend.
///
/// This backend:
/// - Logs every call as an [`OverlayOp`], in order,
/// - Tracks the currently visible highlight per role and the currently
///   visible marks, so tests can assert on the end state as well as the
///   call sequence,
/// - Is tolerant: clearing what is not there records the op and changes
///   nothing else.
#[derive(Clone, Debug, Default)]
pub struct RecordingOverlay {
    ops: Vec<OverlayOp>,
    selected_highlight: Option<HighlightDesc>,
    target_highlight: Option<HighlightDesc>,
    marks: Vec<(Side, String)>,
}

impl RecordingOverlay {
    /// Create an empty recording backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded requests in call order.
    pub fn ops(&self) -> &[OverlayOp] {
        &self.ops
    }

    /// Clears the request log but keeps the visible state.
    pub fn clear_log(&mut self) {
        self.ops.clear();
    }

    /// The highlight currently visible for `role`, if any.
    pub fn highlight(&self, role: HighlightRole) -> Option<&HighlightDesc> {
        match role {
            HighlightRole::Selected => self.selected_highlight.as_ref(),
            HighlightRole::Target => self.target_highlight.as_ref(),
        }
    }

    /// The marks currently visible, as (side, label) pairs in placement
    /// order.
    pub fn marks(&self) -> &[(Side, String)] {
        &self.marks
    }

    /// Number of `PlaceMark` requests recorded since construction or the
    /// last [`Self::clear_log`].
    pub fn marks_placed(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, OverlayOp::PlaceMark { .. }))
            .count()
    }
}

impl OverlayBackend for RecordingOverlay {
    fn place_highlight(&mut self, role: HighlightRole, desc: &HighlightDesc) {
        self.ops.push(OverlayOp::PlaceHighlight { role, desc: *desc });
        match role {
            HighlightRole::Selected => self.selected_highlight = Some(*desc),
            HighlightRole::Target => self.target_highlight = Some(*desc),
        }
    }

    fn clear_highlight(&mut self, role: HighlightRole) {
        self.ops.push(OverlayOp::ClearHighlight { role });
        match role {
            HighlightRole::Selected => self.selected_highlight = None,
            HighlightRole::Target => self.target_highlight = None,
        }
    }

    fn place_mark(&mut self, mark: &MarkDesc<'_>) {
        self.ops.push(OverlayOp::PlaceMark {
            selected: mark.selected,
            target: mark.target,
            side: mark.side,
            label: mark.label.to_string(),
            outside: mark.outside,
            shape: mark.shape,
        });
        self.marks.push((mark.side, mark.label.to_string()));
    }

    fn clear_marks(&mut self) {
        self.ops.push(OverlayOp::ClearMarks);
        self.marks.clear();
    }
}
