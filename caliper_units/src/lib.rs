// Copyright 2026 the Caliper Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caliper Units: measurement label formatting for spacing overlays.
//!
//! A measured gap is a raw number of pixels; this crate turns it into the
//! display string an edge mark shows. Two unit systems are supported:
//! absolute CSS pixels (`"24px"`) and root-relative rem (`"1.5000rem"`),
//! where the rem value is the pixel value divided by the configured
//! root font size.
//!
//! ## Minimal example
//!
//! ```
//! use caliper_units::{DEFAULT_REM_RATIO, Unit, format_len};
//!
//! assert_eq!(format_len(24.0, Unit::Absolute, DEFAULT_REM_RATIO), "24px");
//! assert_eq!(format_len(24.0, Unit::Relative, 16.0), "1.5000rem");
//!
//! // A zero ratio cannot divide; it falls back to the default of 16.
//! assert_eq!(format_len(24.0, Unit::Relative, 0.0), "1.5000rem");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::format;
use alloc::string::String;

/// Root font size assumed when none (or an unusable one) is configured.
pub const DEFAULT_REM_RATIO: f64 = 16.0;

/// Unit system for measurement labels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Whole CSS pixels, suffixed `px`.
    #[default]
    Absolute,
    /// Pixels divided by the root font size, to four decimal places,
    /// suffixed `rem`.
    Relative,
}

impl Unit {
    /// Map the `px2rem` configuration flag to a unit.
    pub const fn from_px2rem(px2rem: bool) -> Self {
        if px2rem { Self::Relative } else { Self::Absolute }
    }
}

/// Format a measured length under the given unit system.
///
/// `value` is expected to already be rounded to a whole number of pixels;
/// the geometry layer guarantees that for gap measurements. `ratio` is only
/// consulted in [`Unit::Relative`] mode: its sign is ignored, and zero (or a
/// ratio that is otherwise unusable as a divisor) silently falls back to
/// [`DEFAULT_REM_RATIO`] rather than producing a division error.
pub fn format_len(value: f64, unit: Unit, ratio: f64) -> String {
    match unit {
        Unit::Absolute => format!("{value:.0}px"),
        Unit::Relative => {
            let ratio = if ratio < 0.0 { -ratio } else { ratio };
            let ratio = if ratio > 0.0 { ratio } else { DEFAULT_REM_RATIO };
            format!("{:.4}rem", value / ratio)
        }
    }
}
