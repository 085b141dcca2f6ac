// Copyright 2026 the Caliper Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caliper Rect: rectangle relations and edge gaps for spacing measurement.
//!
//! This crate classifies the spatial relationship between two axis-aligned
//! rectangles and derives the four directional gap measurements a spacing
//! overlay annotates on screen. It is the pure-geometry leaf of the Caliper
//! stack: no element identity, no interaction state, just [`kurbo::Rect`]
//! values in and numbers out.
//!
//! ## Relations and the outside flag
//!
//! [`classify`] reports one of five [`Relation`]s: equal, containment in
//! either direction, overlapping, or disjoint. Downstream measurement only
//! cares about one bit of that answer — [`Relation::is_outside`] — because
//! touching, overlapping, and nested rectangles all share the same gap
//! formula (the inset between *same-named* edges), while only truly disjoint
//! rectangles are measured against *opposite* edges (the empty space that
//! separates them). The full relation is still surfaced so hosts can style
//! the cases differently if they want to.
//!
//! ## Minimal example
//!
//! ```
//! use caliper_rect::{Relation, classify, edge_gaps};
//! use kurbo::Rect;
//!
//! // A 10x10 box nested inside a 100x100 box.
//! let selected = Rect::new(0.0, 0.0, 100.0, 100.0);
//! let target = Rect::new(10.0, 10.0, 20.0, 20.0);
//!
//! let relation = classify(selected, target);
//! assert_eq!(relation, Relation::Contains);
//! assert!(!relation.is_outside());
//!
//! let gaps = edge_gaps(selected, target, relation.is_outside());
//! assert_eq!(gaps.top, 10.0);
//! assert_eq!(gaps.bottom, 80.0);
//! assert_eq!(gaps.left, 10.0);
//! assert_eq!(gaps.right, 80.0);
//! ```
//!
//! Coordinates are viewport-relative with `y` growing downwards, matching
//! [`kurbo::Rect`]: `x0` is the left edge, `y0` the top, `x1` the right,
//! `y1` the bottom. Inputs are assumed finite (no NaNs).
//!
//! This crate is `no_std`.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

#[cfg(all(not(feature = "std"), not(feature = "libm")))]
compile_error!("caliper_rect requires either the `std` or `libm` feature");

use kurbo::Rect;

/// Absolute value, split over the float backend the same way Kurbo does it.
#[inline]
fn abs(x: f64) -> f64 {
    #[cfg(feature = "std")]
    {
        x.abs()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::fabs(x)
    }
}

/// Round to nearest, ties away from zero.
#[inline]
fn round(x: f64) -> f64 {
    #[cfg(feature = "std")]
    {
        x.round()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::round(x)
    }
}

/// Spatial relationship between two axis-aligned rectangles.
///
/// Produced fresh by [`classify`] for every measurement; relations are never
/// cached because either rectangle may change on any pointer move.
///
/// `classify` is symmetric for [`Equal`](Self::Equal),
/// [`Overlapping`](Self::Overlapping), and [`Disjoint`](Self::Disjoint), and
/// antisymmetric for the two containment cases.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    /// All four edges coincide.
    Equal,
    /// The first rectangle encloses the second on all four sides.
    Contains,
    /// The second rectangle encloses the first on all four sides.
    ContainedBy,
    /// The projections overlap on both axes without either containing the
    /// other. Touching edges count as overlapping.
    Overlapping,
    /// The rectangles share no points and do not touch.
    Disjoint,
}

impl Relation {
    /// Returns `true` when the rectangles are disjoint, selecting the
    /// opposite-edge gap formula in [`edge_gaps`].
    ///
    /// Containment and overlap are deliberately grouped: both use the
    /// same-edge formula, so they are indistinguishable in the gap readout.
    pub const fn is_outside(self) -> bool {
        matches!(self, Self::Disjoint)
    }
}

/// One of the four rectangle edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The top edge (`y0`).
    Top,
    /// The right edge (`x1`).
    Right,
    /// The bottom edge (`y1`).
    Bottom,
    /// The left edge (`x0`).
    Left,
}

impl Side {
    /// All four sides in CSS order: top, right, bottom, left.
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// Lower-case name of the side, e.g. for mark styling or logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

/// The four directional gap measurements between two rectangles.
///
/// Values are non-negative and rounded to the nearest whole pixel by
/// [`edge_gaps`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EdgeGaps {
    /// Gap along the top edge.
    pub top: f64,
    /// Gap along the right edge.
    pub right: f64,
    /// Gap along the bottom edge.
    pub bottom: f64,
    /// Gap along the left edge.
    pub left: f64,
}

impl EdgeGaps {
    /// All four gaps zero.
    pub const ZERO: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    /// Gap for the given side.
    pub const fn get(self, side: Side) -> f64 {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }
}

/// Returns `true` when `outer` encloses `inner` on all four sides.
///
/// Edge-inclusive, so a rectangle encloses itself; [`classify`] checks
/// equality first to keep the containment cases strict.
fn encloses(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// Classify the spatial relationship between two rectangles.
///
/// Precedence: equality, then containment in either direction, then
/// overlapping (projections overlap on both axes; touching counts), then
/// disjoint.
///
/// ```
/// use caliper_rect::{Relation, classify};
/// use kurbo::Rect;
///
/// let a = Rect::new(0.0, 0.0, 10.0, 10.0);
/// let b = Rect::new(20.0, 20.0, 30.0, 30.0);
/// assert_eq!(classify(a, b), Relation::Disjoint);
/// assert_eq!(classify(b, a), Relation::Disjoint);
/// assert_eq!(classify(a, a), Relation::Equal);
/// ```
pub fn classify(a: Rect, b: Rect) -> Relation {
    if a == b {
        Relation::Equal
    } else if encloses(&a, &b) {
        Relation::Contains
    } else if encloses(&b, &a) {
        Relation::ContainedBy
    } else if a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1 {
        Relation::Overlapping
    } else {
        Relation::Disjoint
    }
}

/// Compute the four directional gaps between two rectangles.
///
/// With `outside = false` (touching, overlapping, or nested rectangles) each
/// gap is the absolute difference between the *same-named* edges of `a` and
/// `b` — the inset between matching edges. With `outside = true` (disjoint
/// rectangles) each gap is measured against the *opposite* edge — the empty
/// space separating the boxes. `outside` is exactly
/// `classify(a, b).is_outside()`; switching the edge pairing is what lets one
/// formula answer both questions without branching in the caller.
///
/// Results are rounded to the nearest whole pixel.
pub fn edge_gaps(a: Rect, b: Rect, outside: bool) -> EdgeGaps {
    let (top, right, bottom, left) = if outside {
        (a.y0 - b.y1, a.x1 - b.x0, a.y1 - b.y0, a.x0 - b.x1)
    } else {
        (a.y0 - b.y0, a.x1 - b.x1, a.y1 - b.y1, a.x0 - b.x0)
    };
    EdgeGaps {
        top: round(abs(top)),
        right: round(abs(right)),
        bottom: round(abs(bottom)),
        left: round(abs(left)),
    }
}
