// Copyright 2026 the Caliper Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The measurement engine: arm/retarget/dismiss transitions and the
//! measurement pipeline.

use caliper_overlay::{
    HighlightDesc, HighlightRole, MarkDesc, OverlayBackend, SELECTED_COLOR, TARGET_COLOR,
};
use caliper_rect::{Side, classify, edge_gaps};
use caliper_timing::{TimerHandle, TimerQueue};
use caliper_units::{Unit, format_len};

use crate::{
    BoundsSource, DISMISS_GRACE_DELAY, KeyInput, Reaction, ScrollControl, SessionFlags,
    SpacingOptions, StartError,
};

/// Marks are emitted top, bottom, left, right.
const MARK_ORDER: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

/// A resolved target change, keyed by its dispatch token.
///
/// [`SpacingEngine::pointer_move`] hands one of these back only when the
/// hovered element would actually become the new target. Applying it is a
/// separate step so hosts that defer work (microtasks, frame callbacks) can
/// do so safely: [`SpacingEngine::apply_retarget`] discards a retarget whose
/// token is no longer the latest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Retarget<K> {
    token: u64,
    candidate: K,
}

impl<K> Retarget<K> {
    /// The element this retarget would promote to target.
    pub fn candidate(&self) -> &K {
        &self.candidate
    }
}

/// The interaction state machine for one tool attachment.
///
/// One instance exists per active attachment; all state lives here, not in
/// globals. `K` is the host's opaque element reference — anything cloneable
/// and comparable, from a DOM node wrapper to a plain `u32` in tests.
///
/// See the crate docs for the event flow and a minimal example.
#[derive(Debug)]
pub struct SpacingEngine<K> {
    options: SpacingOptions,
    flags: SessionFlags,
    hovering: Option<K>,
    selected: Option<K>,
    target: Option<K>,
    retarget_token: u64,
    timers: TimerQueue<()>,
    dismiss_timer: Option<TimerHandle>,
}

impl<K: Clone + PartialEq> SpacingEngine<K> {
    /// Create an engine with the given configuration. The engine ignores
    /// all events until [`Self::start`] succeeds.
    pub fn new(options: SpacingOptions) -> Self {
        Self {
            options,
            flags: SessionFlags::empty(),
            hovering: None,
            selected: None,
            target: None,
            retarget_token: 0,
            timers: TimerQueue::new(),
            dismiss_timer: None,
        }
    }

    /// The configuration supplied at construction.
    pub fn options(&self) -> &SpacingOptions {
        &self.options
    }

    /// Current session state word.
    pub fn flags(&self) -> SessionFlags {
        self.flags
    }

    /// Returns `true` after a successful [`Self::start`] and before
    /// [`Self::stop`].
    pub fn is_started(&self) -> bool {
        self.flags.contains(SessionFlags::STARTED)
    }

    /// Returns `true` while the hotkey is held.
    pub fn is_armed(&self) -> bool {
        self.flags.contains(SessionFlags::ARMED)
    }

    /// The element currently under the pointer, tracked regardless of
    /// armed state.
    pub fn hovering(&self) -> Option<&K> {
        self.hovering.as_ref()
    }

    /// The measurement anchor, fixed at hotkey-press time.
    pub fn selected(&self) -> Option<&K> {
        self.selected.as_ref()
    }

    /// The element currently measured against the anchor.
    pub fn target(&self) -> Option<&K> {
        self.target.as_ref()
    }

    /// Earliest scheduled deadline, so hosts can sleep until the next
    /// [`Self::advance`] is worth calling.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Begin consuming events.
    ///
    /// The host reports whether a document root exists; without one there is
    /// nothing to attach listeners to, so the call warns, leaves the engine
    /// un-started, and the caller may retry later.
    pub fn start(&mut self, root_present: bool) -> Result<(), StartError> {
        if !root_present {
            log::warn!("unable to initialise: document root does not exist");
            return Err(StartError::MissingRoot);
        }
        self.flags.insert(SessionFlags::STARTED);
        Ok(())
    }

    /// Stop consuming events and tear down all visual state.
    ///
    /// The host detaches its listeners after this returns; the [`Reaction`]
    /// carries the scroll unlock if one is still owed.
    pub fn stop(&mut self, overlay: &mut impl OverlayBackend) -> Reaction {
        if !self.is_started() {
            return Reaction::default();
        }
        let was_locked = self.flags.contains(SessionFlags::SCROLL_LOCKED);
        if let Some(handle) = self.dismiss_timer.take() {
            self.timers.cancel(handle);
        }
        self.teardown(overlay);
        self.flags.remove(SessionFlags::STARTED);
        self.reaction(was_locked, false)
    }

    /// Handle a key-down event.
    ///
    /// Pressing the configured hotkey arms the engine: any pending dismissal
    /// is cancelled and torn down synchronously first, then the currently
    /// hovered element becomes the selection and page scrolling is locked.
    /// Re-pressing while armed (key repeat) is a no-op. Observing the shift
    /// modifier while armed requests the dismissal grace window for this
    /// session.
    pub fn key_down(
        &mut self,
        input: &KeyInput<'_>,
        bounds: &impl BoundsSource<K>,
        overlay: &mut impl OverlayBackend,
    ) -> Reaction {
        if !self.is_started() {
            return Reaction::default();
        }
        let was_locked = self.flags.contains(SessionFlags::SCROLL_LOCKED);
        let mut prevent_default = false;

        if input.key == self.options.hot_key {
            // A pending dismissal is cancelled and its teardown runs now, so
            // a fresh session never inherits the previous overlays.
            if let Some(handle) = self.dismiss_timer.take() {
                self.timers.cancel(handle);
                self.teardown(overlay);
            }

            if !self.flags.contains(SessionFlags::ARMED) {
                prevent_default = true;
                self.flags.insert(SessionFlags::ARMED | SessionFlags::SCROLL_LOCKED);
                self.select_hovered(bounds, overlay);
            }
        }

        if input.shift && self.flags.contains(SessionFlags::ARMED) {
            self.flags.insert(SessionFlags::DISMISS_PENDING);
        }

        self.reaction(was_locked, prevent_default)
    }

    /// Handle a key-up event at host time `now`.
    ///
    /// Releasing the hotkey while armed schedules the teardown: after
    /// [`DISMISS_GRACE_DELAY`] units when the grace modifier was observed
    /// this session, otherwise at `now` — still deferred to the next
    /// [`Self::advance`] tick, never run synchronously here.
    pub fn key_up(&mut self, input: &KeyInput<'_>, now: u64) -> Reaction {
        if !self.is_started() {
            return Reaction::default();
        }
        if input.key == self.options.hot_key && self.flags.contains(SessionFlags::ARMED) {
            self.flags.remove(SessionFlags::ARMED);
            let delay = if self.flags.contains(SessionFlags::DISMISS_PENDING) {
                DISMISS_GRACE_DELAY
            } else {
                0
            };
            if let Some(stale) = self.dismiss_timer.take() {
                self.timers.cancel(stale);
            }
            self.dismiss_timer = Some(self.timers.schedule(now + delay, ()));
        }
        Reaction::default()
    }

    /// Handle a pointer move over the given hit path (top-most element
    /// first; empty when nothing is under the pointer).
    ///
    /// Hover tracking always happens. While armed, this additionally
    /// resolves a [`Retarget`] — but only when the hovered element is
    /// present, differs from the selection, and differs from the current
    /// target. Anything else resolves nothing, which is the common, silent
    /// case.
    pub fn pointer_move(&mut self, path: &[K]) -> Option<Retarget<K>> {
        if !self.is_started() {
            return None;
        }
        self.hovering = path.first().cloned();
        if !self.flags.contains(SessionFlags::ARMED) {
            return None;
        }
        // Every armed move invalidates any retarget still in flight, even
        // when this one resolves nothing: a stale resolution must not
        // overwrite fresher hover state.
        self.retarget_token += 1;
        let candidate = self.hovering.as_ref()?;
        if self.selected.as_ref() == Some(candidate) || self.target.as_ref() == Some(candidate) {
            return None;
        }
        Some(Retarget {
            token: self.retarget_token,
            candidate: candidate.clone(),
        })
    }

    /// Commit a resolved target change and measure the pair.
    ///
    /// Returns `false` without side effects when the retarget is stale (its
    /// token is no longer the latest), the engine has disarmed in the
    /// meantime, or the candidate no longer passes the target rules.
    /// Otherwise the target highlight is redrawn, existing marks are
    /// cleared, and — when both selection and target are set and still have
    /// boxes — the four edge gaps are measured, formatted, and placed.
    pub fn apply_retarget(
        &mut self,
        retarget: &Retarget<K>,
        bounds: &impl BoundsSource<K>,
        overlay: &mut impl OverlayBackend,
    ) -> bool {
        if !self.flags.contains(SessionFlags::STARTED | SessionFlags::ARMED) {
            return false;
        }
        if retarget.token != self.retarget_token {
            return false;
        }
        let candidate = &retarget.candidate;
        if self.selected.as_ref() == Some(candidate) || self.target.as_ref() == Some(candidate) {
            return false;
        }
        self.target = Some(candidate.clone());

        overlay.clear_highlight(HighlightRole::Target);
        if let Some(rect) = bounds.bounds(candidate) {
            overlay.place_highlight(
                HighlightRole::Target,
                &HighlightDesc::from_rect(rect, TARGET_COLOR),
            );
        }
        self.measure(bounds, overlay);
        true
    }

    /// Perform a pointer move and apply the retarget (if any) in one call,
    /// for hosts without a deferred dispatch step.
    pub fn pointer_move_immediate(
        &mut self,
        path: &[K],
        bounds: &impl BoundsSource<K>,
        overlay: &mut impl OverlayBackend,
    ) -> bool {
        match self.pointer_move(path) {
            Some(retarget) => self.apply_retarget(&retarget, bounds, overlay),
            None => false,
        }
    }

    /// Fire any timers due at host time `now`.
    ///
    /// The only timer is the dismissal; when it fires, all visual state is
    /// torn down and the [`Reaction`] carries the scroll unlock.
    pub fn advance(&mut self, now: u64, overlay: &mut impl OverlayBackend) -> Reaction {
        if !self.is_started() {
            return Reaction::default();
        }
        let was_locked = self.flags.contains(SessionFlags::SCROLL_LOCKED);
        while let Some((handle, ())) = self.timers.pop_due(now) {
            if self.dismiss_timer == Some(handle) {
                self.dismiss_timer = None;
                self.teardown(overlay);
            }
        }
        self.reaction(was_locked, false)
    }

    /// Fix the currently hovered element as the selection and draw its
    /// highlight. No-op when nothing is hovered or the selection would not
    /// change.
    fn select_hovered(
        &mut self,
        bounds: &impl BoundsSource<K>,
        overlay: &mut impl OverlayBackend,
    ) {
        let Some(hovering) = self.hovering.as_ref() else {
            return;
        };
        if self.selected.as_ref() == Some(hovering) {
            return;
        }
        let hovering = hovering.clone();
        overlay.clear_highlight(HighlightRole::Selected);
        if let Some(rect) = bounds.bounds(&hovering) {
            overlay.place_highlight(
                HighlightRole::Selected,
                &HighlightDesc::from_rect(rect, SELECTED_COLOR),
            );
        }
        self.selected = Some(hovering);
    }

    /// Measure the selection/target pair and place the four edge marks.
    ///
    /// Both bounds are read here, in the same turn as the state change that
    /// triggered the measurement. An element without a box (detached
    /// mid-session) leaves the marks cleared and places nothing.
    fn measure(&self, bounds: &impl BoundsSource<K>, overlay: &mut impl OverlayBackend) {
        let (Some(selected), Some(target)) = (self.selected.as_ref(), self.target.as_ref()) else {
            return;
        };
        overlay.clear_marks();
        let Some(selected_rect) = bounds.bounds(selected) else {
            return;
        };
        let Some(target_rect) = bounds.bounds(target) else {
            return;
        };

        let relation = classify(selected_rect, target_rect);
        let outside = relation.is_outside();
        let gaps = edge_gaps(selected_rect, target_rect, outside);
        let unit = Unit::from_px2rem(self.options.px2rem);

        for side in MARK_ORDER {
            let label = format_len(gaps.get(side), unit, self.options.rem_ratio);
            overlay.place_mark(&MarkDesc {
                selected: selected_rect,
                target: target_rect,
                side,
                label: &label,
                outside,
                shape: self.options.shape,
            });
        }
    }

    /// Clear both highlights and all marks, drop the selection and target,
    /// and release the scroll lock and grace flag. Hover tracking survives.
    fn teardown(&mut self, overlay: &mut impl OverlayBackend) {
        overlay.clear_highlight(HighlightRole::Selected);
        overlay.clear_highlight(HighlightRole::Target);
        overlay.clear_marks();
        self.flags
            .remove(SessionFlags::DISMISS_PENDING | SessionFlags::SCROLL_LOCKED);
        self.selected = None;
        self.target = None;
    }

    /// Build the [`Reaction`] for a call, netting the scroll-lock change
    /// against the state at entry.
    fn reaction(&self, was_locked: bool, prevent_default: bool) -> Reaction {
        let now_locked = self.flags.contains(SessionFlags::SCROLL_LOCKED);
        let scroll = match (was_locked, now_locked) {
            (false, true) => Some(ScrollControl::Lock),
            (true, false) => Some(ScrollControl::Unlock),
            _ => None,
        };
        Reaction {
            prevent_default,
            scroll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliper_overlay::LineShape;

    struct NoOverlay;

    impl OverlayBackend for NoOverlay {
        fn place_highlight(&mut self, _role: HighlightRole, _desc: &HighlightDesc) {}
        fn clear_highlight(&mut self, _role: HighlightRole) {}
        fn place_mark(&mut self, _mark: &MarkDesc<'_>) {}
        fn clear_marks(&mut self) {}
    }

    fn no_bounds(_key: &u32) -> Option<kurbo::Rect> {
        None
    }

    #[test]
    fn default_options_match_documented_defaults() {
        let options = SpacingOptions::default();
        assert_eq!(options.shape, LineShape::Normal);
        assert!(!options.px2rem);
        assert_eq!(options.rem_ratio, 16.0);
        assert_eq!(options.hot_key, "Alt");
    }

    #[test]
    fn start_without_root_is_a_warned_noop() {
        let mut engine: SpacingEngine<u32> = SpacingEngine::new(SpacingOptions::default());
        assert_eq!(engine.start(false), Err(StartError::MissingRoot));
        assert!(!engine.is_started());

        // A retry with a root present succeeds.
        assert_eq!(engine.start(true), Ok(()));
        assert!(engine.is_started());
    }

    #[test]
    fn events_are_ignored_until_started() {
        let mut engine: SpacingEngine<u32> = SpacingEngine::new(SpacingOptions::default());
        let input = KeyInput {
            key: "Alt",
            shift: false,
        };

        let reaction = engine.key_down(&input, &no_bounds, &mut NoOverlay);
        assert_eq!(reaction, Reaction::default());
        assert!(engine.pointer_move(&[7]).is_none());
        assert!(engine.hovering().is_none());
        assert_eq!(engine.key_up(&input, 0), Reaction::default());
    }

    #[test]
    fn fresh_engine_has_no_session_state() {
        let engine: SpacingEngine<u32> = SpacingEngine::new(SpacingOptions::default());
        assert_eq!(engine.flags(), SessionFlags::empty());
        assert!(engine.selected().is_none());
        assert!(engine.target().is_none());
        assert!(engine.next_deadline().is_none());
    }
}
