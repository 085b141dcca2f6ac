// Copyright 2026 the Caliper Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caliper Timing: host-agnostic timer queue primitives.
//!
//! UI runtimes already own a clock and a way to wake up later; what the
//! measurement engine needs is only the bookkeeping: "run this at deadline
//! D, unless it is cancelled first". [`TimerQueue`] provides exactly that.
//! It never reads a wall clock — the host passes its notion of `now` (any
//! monotonically non-decreasing `u64`, typically milliseconds) into
//! [`TimerQueue::pop_due`], and the queue hands back due entries in deadline
//! order.
//!
//! Handles are monotonic: a [`TimerHandle`] from an earlier `schedule` never
//! aliases a later one, so cancelling a stale handle is a safe no-op rather
//! than a misfire.
//!
//! ## Minimal example
//!
//! ```
//! use caliper_timing::TimerQueue;
//!
//! let mut timers = TimerQueue::new();
//! let cleanup = timers.schedule(3000, "cleanup");
//! let blink = timers.schedule(500, "blink");
//!
//! // Nothing is due yet.
//! assert_eq!(timers.pop_due(100), None);
//! assert_eq!(timers.next_deadline(), Some(500));
//!
//! // The earlier deadline fires first.
//! assert_eq!(timers.pop_due(3000), Some((blink, "blink")));
//! assert_eq!(timers.pop_due(3000), Some((cleanup, "cleanup")));
//! assert_eq!(timers.pop_due(3000), None);
//!
//! // Cancelling an already-fired handle is a no-op.
//! assert!(!timers.cancel(blink));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;

/// Handle for a scheduled timer.
///
/// Handles are allocated from a per-queue monotonic counter and are never
/// reused, so a handle uniquely identifies one `schedule` call for the
/// lifetime of the queue. A handle whose timer has fired or been cancelled
/// is stale; stale handles compare unequal to every live handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Clone, Debug)]
struct Entry<T> {
    handle: TimerHandle,
    deadline: u64,
    payload: T,
}

/// A small deadline queue over host-supplied time.
///
/// Entries are stored unordered; [`TimerQueue::pop_due`] selects the due
/// entry with the earliest deadline, breaking ties by scheduling order.
/// The expected population is tiny (the measurement engine keeps at most
/// one dismissal timer outstanding), so a scan beats a heap here.
#[derive(Clone, Debug, Default)]
pub struct TimerQueue<T> {
    next_handle: u64,
    entries: Vec<Entry<T>>,
}

impl<T> TimerQueue<T> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            next_handle: 0,
            entries: Vec::new(),
        }
    }

    /// Schedule `payload` to become due at `deadline`.
    ///
    /// A deadline at or before the host's current `now` is valid: the entry
    /// is simply due on the next [`TimerQueue::pop_due`] call, which is how
    /// "defer to the next tick" is expressed.
    pub fn schedule(&mut self, deadline: u64, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(Entry {
            handle,
            deadline,
            payload,
        });
        handle
    }

    /// Cancel the timer for `handle`.
    ///
    /// Returns `true` if a live timer was removed. Cancelling a handle that
    /// already fired or was already cancelled is a safe no-op.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.entries.iter().position(|e| e.handle == handle) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove and return the due entry with the earliest deadline, if any.
    ///
    /// An entry is due when `deadline <= now`. Equal deadlines fire in
    /// scheduling order. Call in a loop to drain everything due this tick.
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerHandle, T)> {
        let mut best: Option<usize> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.deadline > now {
                continue;
            }
            match best {
                Some(b) if self.entries[b].deadline <= entry.deadline => {}
                _ => best = Some(idx),
            }
        }
        let entry = self.entries.remove(best?);
        Some((entry.handle, entry.payload))
    }

    /// Earliest deadline currently scheduled, so hosts can sleep until then.
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Returns `true` while `handle` refers to a live (unfired, uncancelled)
    /// timer.
    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no timers are scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
