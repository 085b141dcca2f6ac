// Copyright 2026 the Caliper Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `caliper_session` crate.
//!
//! These drive the full arm → retarget → measure → dismiss cycle against the
//! recording overlay backend, asserting on both the engine state and the
//! exact overlay call sequence.

use caliper_overlay::{HighlightRole, LineShape};
use caliper_overlay_ref::{OverlayOp, RecordingOverlay};
use caliper_rect::Side;
use caliper_session::{
    DISMISS_GRACE_DELAY, KeyInput, Reaction, ScrollControl, SpacingEngine, SpacingOptions,
};
use kurbo::Rect;

/// Element keys used throughout: 1 is a 100x100 box, 2 is nested inside it,
/// 3 is disjoint from 1, 9 exists but has no box (detached).
fn bounds(key: &u32) -> Option<Rect> {
    match key {
        1 => Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
        2 => Some(Rect::new(10.0, 10.0, 20.0, 20.0)),
        3 => Some(Rect::new(120.0, 120.0, 130.0, 130.0)),
        _ => None,
    }
}

fn alt() -> KeyInput<'static> {
    KeyInput {
        key: "Alt",
        shift: false,
    }
}

fn shift() -> KeyInput<'static> {
    KeyInput {
        key: "Shift",
        shift: true,
    }
}

fn started_engine() -> SpacingEngine<u32> {
    let mut engine = SpacingEngine::new(SpacingOptions::default());
    engine.start(true).expect("root is present");
    engine
}

/// Arm over element 1 and return the overlay used.
fn armed_over(engine: &mut SpacingEngine<u32>, element: u32) -> RecordingOverlay {
    let mut overlay = RecordingOverlay::new();
    assert!(engine.pointer_move(&[element]).is_none());
    engine.key_down(&alt(), &bounds, &mut overlay);
    overlay
}

fn mark_labels(overlay: &RecordingOverlay) -> Vec<(Side, String)> {
    overlay.marks().to_vec()
}

#[test]
fn hover_is_tracked_while_idle() {
    let mut engine = started_engine();
    assert!(engine.pointer_move(&[2, 1]).is_none());
    assert_eq!(engine.hovering(), Some(&2));

    // An empty hit path clears the hover.
    assert!(engine.pointer_move(&[]).is_none());
    assert_eq!(engine.hovering(), None);
}

#[test]
fn arming_fixes_selection_and_locks_scroll() {
    let mut engine = started_engine();
    let mut overlay = RecordingOverlay::new();
    engine.pointer_move(&[1]);

    let reaction = engine.key_down(&alt(), &bounds, &mut overlay);
    assert_eq!(
        reaction,
        Reaction {
            prevent_default: true,
            scroll: Some(ScrollControl::Lock),
        }
    );
    assert!(engine.is_armed());
    assert_eq!(engine.selected(), Some(&1));

    let placed = overlay
        .highlight(HighlightRole::Selected)
        .expect("selected highlight placed");
    assert_eq!(placed.top, 0.0);
    assert_eq!(placed.left, 0.0);
    assert_eq!(placed.width, 100.0);
    assert_eq!(placed.height, 100.0);
}

#[test]
fn arming_with_nothing_hovered_selects_nothing() {
    let mut engine = started_engine();
    let mut overlay = RecordingOverlay::new();

    let reaction = engine.key_down(&alt(), &bounds, &mut overlay);
    assert!(reaction.prevent_default);
    assert!(engine.is_armed());
    assert_eq!(engine.selected(), None);
    assert!(overlay.highlight(HighlightRole::Selected).is_none());
}

#[test]
fn key_repeat_while_armed_is_a_noop() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);
    let ops_after_arm = overlay.ops().len();

    let reaction = engine.key_down(&alt(), &bounds, &mut overlay);
    assert_eq!(reaction, Reaction::default());
    assert_eq!(overlay.ops().len(), ops_after_arm);
    assert_eq!(engine.selected(), Some(&1));
}

#[test]
fn other_keys_do_not_arm() {
    let mut engine = started_engine();
    let mut overlay = RecordingOverlay::new();
    engine.pointer_move(&[1]);

    let reaction = engine.key_down(
        &KeyInput {
            key: "Meta",
            shift: false,
        },
        &bounds,
        &mut overlay,
    );
    assert_eq!(reaction, Reaction::default());
    assert!(!engine.is_armed());
    assert!(overlay.ops().is_empty());
}

#[test]
fn retarget_measures_a_nested_pair() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);
    overlay.clear_log();

    let retarget = engine.pointer_move(&[2]).expect("target should resolve");
    assert_eq!(retarget.candidate(), &2);
    assert!(engine.apply_retarget(&retarget, &bounds, &mut overlay));
    assert_eq!(engine.target(), Some(&2));

    // Element 2 is nested in element 1: same-edge gaps, outside = false.
    assert_eq!(
        mark_labels(&overlay),
        vec![
            (Side::Top, String::from("10px")),
            (Side::Bottom, String::from("80px")),
            (Side::Left, String::from("10px")),
            (Side::Right, String::from("80px")),
        ]
    );
    for op in overlay.ops() {
        if let OverlayOp::PlaceMark { outside, .. } = op {
            assert!(!outside);
        }
    }
}

#[test]
fn retarget_emits_highlight_then_cleared_marks() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);
    overlay.clear_log();

    let retarget = engine.pointer_move(&[2]).unwrap();
    engine.apply_retarget(&retarget, &bounds, &mut overlay);

    // Target highlight is replaced first, then marks are cleared and the
    // four new ones placed.
    assert!(matches!(
        overlay.ops()[0],
        OverlayOp::ClearHighlight {
            role: HighlightRole::Target
        }
    ));
    assert!(matches!(
        overlay.ops()[1],
        OverlayOp::PlaceHighlight {
            role: HighlightRole::Target,
            ..
        }
    ));
    assert!(matches!(overlay.ops()[2], OverlayOp::ClearMarks));
    assert_eq!(overlay.marks_placed(), 4);
    assert_eq!(overlay.ops().len(), 7);
}

#[test]
fn disjoint_pair_measures_outside_gaps() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);
    overlay.clear_log();

    let retarget = engine.pointer_move(&[3]).unwrap();
    engine.apply_retarget(&retarget, &bounds, &mut overlay);

    // Element 3 sits past the bottom-right corner of element 1.
    assert_eq!(
        mark_labels(&overlay),
        vec![
            (Side::Top, String::from("130px")),
            (Side::Bottom, String::from("20px")),
            (Side::Left, String::from("130px")),
            (Side::Right, String::from("20px")),
        ]
    );
    for op in overlay.ops() {
        if let OverlayOp::PlaceMark { outside, .. } = op {
            assert!(outside);
        }
    }
}

#[test]
fn rem_mode_formats_relative_labels() {
    let mut engine = SpacingEngine::new(SpacingOptions {
        px2rem: true,
        ..SpacingOptions::default()
    });
    engine.start(true).unwrap();
    let mut overlay = armed_over(&mut engine, 1);
    overlay.clear_log();

    let retarget = engine.pointer_move(&[2]).unwrap();
    engine.apply_retarget(&retarget, &bounds, &mut overlay);

    assert_eq!(overlay.marks()[0], (Side::Top, String::from("0.6250rem")));
    assert_eq!(overlay.marks()[1], (Side::Bottom, String::from("5.0000rem")));
}

#[test]
fn mark_requests_carry_the_configured_shape() {
    let mut engine = SpacingEngine::new(SpacingOptions {
        shape: LineShape::Fat,
        ..SpacingOptions::default()
    });
    engine.start(true).unwrap();
    let mut overlay = armed_over(&mut engine, 1);

    engine.pointer_move_immediate(&[2], &bounds, &mut overlay);
    let shapes: Vec<LineShape> = overlay
        .ops()
        .iter()
        .filter_map(|op| match op {
            OverlayOp::PlaceMark { shape, .. } => Some(*shape),
            _ => None,
        })
        .collect();
    assert_eq!(shapes, vec![LineShape::Fat; 4]);
}

#[test]
fn hovering_the_selection_resolves_nothing() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);
    overlay.clear_log();

    assert!(engine.pointer_move(&[1]).is_none());
    assert_eq!(engine.target(), None);
    assert!(overlay.ops().is_empty());
}

#[test]
fn hovering_the_current_target_again_redraws_nothing() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);

    engine.pointer_move_immediate(&[2], &bounds, &mut overlay);
    let ops_after_measure = overlay.ops().len();

    // Two more moves over the same element: no retarget, no redraw.
    assert!(engine.pointer_move(&[2]).is_none());
    assert!(!engine.pointer_move_immediate(&[2], &bounds, &mut overlay));
    assert_eq!(overlay.ops().len(), ops_after_measure);
}

#[test]
fn stale_retarget_is_discarded() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);

    let stale = engine.pointer_move(&[2]).unwrap();
    let fresh = engine.pointer_move(&[3]).unwrap();

    assert!(engine.apply_retarget(&fresh, &bounds, &mut overlay));
    assert_eq!(engine.target(), Some(&3));
    let ops_after_fresh = overlay.ops().len();

    // The older resolution arrives late; it must not overwrite the target.
    assert!(!engine.apply_retarget(&stale, &bounds, &mut overlay));
    assert_eq!(engine.target(), Some(&3));
    assert_eq!(overlay.ops().len(), ops_after_fresh);
}

#[test]
fn any_newer_move_invalidates_an_unapplied_retarget() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);

    let stale = engine.pointer_move(&[2]).unwrap();
    // The newer move resolves nothing (it hovers the selection), but it
    // still represents fresher state than the pending retarget.
    assert!(engine.pointer_move(&[1]).is_none());

    assert!(!engine.apply_retarget(&stale, &bounds, &mut overlay));
    assert_eq!(engine.target(), None);
}

#[test]
fn retarget_is_discarded_after_disarm() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);

    let retarget = engine.pointer_move(&[2]).unwrap();
    engine.key_up(&alt(), 1000);
    assert!(!engine.apply_retarget(&retarget, &bounds, &mut overlay));
    assert_eq!(engine.target(), None);
}

#[test]
fn detached_target_skips_the_draw() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);
    overlay.clear_log();

    // Element 9 is hit-testable but detached by measurement time.
    let retarget = engine.pointer_move(&[9]).unwrap();
    assert!(engine.apply_retarget(&retarget, &bounds, &mut overlay));
    assert_eq!(engine.target(), Some(&9));

    // The target highlight is cleared but nothing new is drawn, and the
    // measurement degrades to cleared marks.
    assert!(overlay.highlight(HighlightRole::Target).is_none());
    assert_eq!(overlay.marks_placed(), 0);
    assert!(overlay.marks().is_empty());
}

#[test]
fn measurement_without_a_selection_draws_only_the_target_highlight() {
    let mut engine = started_engine();
    let mut overlay = RecordingOverlay::new();
    // Arm with nothing hovered: no selection.
    engine.key_down(&alt(), &bounds, &mut overlay);
    overlay.clear_log();

    engine.pointer_move_immediate(&[2], &bounds, &mut overlay);
    assert!(overlay.highlight(HighlightRole::Target).is_some());
    assert_eq!(overlay.marks_placed(), 0);
    // Without a pair there is nothing to measure, so marks are not touched.
    assert!(
        overlay
            .ops()
            .iter()
            .all(|op| !matches!(op, OverlayOp::ClearMarks))
    );
}

#[test]
fn release_without_grace_tears_down_on_the_next_tick() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);
    engine.pointer_move_immediate(&[2], &bounds, &mut overlay);

    assert_eq!(engine.key_up(&alt(), 500), Reaction::default());
    assert!(!engine.is_armed());
    // Teardown is deferred: state is intact until the host ticks.
    assert_eq!(engine.selected(), Some(&1));
    assert_eq!(engine.next_deadline(), Some(500));

    let reaction = engine.advance(500, &mut overlay);
    assert_eq!(reaction.scroll, Some(ScrollControl::Unlock));
    assert_eq!(engine.selected(), None);
    assert_eq!(engine.target(), None);
    assert!(overlay.highlight(HighlightRole::Selected).is_none());
    assert!(overlay.highlight(HighlightRole::Target).is_none());
    assert!(overlay.marks().is_empty());
}

#[test]
fn shift_during_the_session_requests_the_grace_window() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);

    engine.key_down(&shift(), &bounds, &mut overlay);
    engine.key_up(&alt(), 1000);
    assert_eq!(engine.next_deadline(), Some(1000 + DISMISS_GRACE_DELAY));

    // One tick before the deadline nothing happens.
    engine.advance(1000 + DISMISS_GRACE_DELAY - 1, &mut overlay);
    assert_eq!(engine.selected(), Some(&1));

    let reaction = engine.advance(1000 + DISMISS_GRACE_DELAY, &mut overlay);
    assert_eq!(reaction.scroll, Some(ScrollControl::Unlock));
    assert_eq!(engine.selected(), None);
}

#[test]
fn shift_held_on_the_arming_press_also_counts() {
    let mut engine = started_engine();
    let mut overlay = RecordingOverlay::new();
    engine.pointer_move(&[1]);

    engine.key_down(
        &KeyInput {
            key: "Alt",
            shift: true,
        },
        &bounds,
        &mut overlay,
    );
    engine.key_up(&alt(), 0);
    assert_eq!(engine.next_deadline(), Some(DISMISS_GRACE_DELAY));
}

#[test]
fn shift_while_idle_does_not_arm_a_grace_window() {
    let mut engine = started_engine();
    let mut overlay = RecordingOverlay::new();

    // Shift pressed with no session armed is ignored entirely.
    engine.key_down(&shift(), &bounds, &mut overlay);
    engine.pointer_move(&[1]);
    engine.key_down(&alt(), &bounds, &mut overlay);
    engine.key_up(&alt(), 100);

    // The release schedules an immediate teardown, not a grace window.
    assert_eq!(engine.next_deadline(), Some(100));
}

#[test]
fn rearming_during_grace_cancels_teardown_and_reselects() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);

    engine.key_down(&shift(), &bounds, &mut overlay);
    engine.key_up(&alt(), 0);
    assert!(engine.next_deadline().is_some());

    // Hover something else and re-arm before the grace window elapses.
    engine.pointer_move(&[3]);
    let reaction = engine.key_down(&alt(), &bounds, &mut overlay);

    // The old session tore down synchronously, the new one armed: the net
    // scroll effect is none, and the selection is fresh.
    assert_eq!(reaction.scroll, None);
    assert!(reaction.prevent_default);
    assert!(engine.is_armed());
    assert_eq!(engine.selected(), Some(&3));
    assert_eq!(engine.target(), None);
    assert!(engine.next_deadline().is_none());

    // The cancelled timer never fires.
    engine.advance(u64::MAX, &mut overlay);
    assert_eq!(engine.selected(), Some(&3));
}

#[test]
fn grace_flag_resets_with_each_session() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);

    // First session requests the grace window and is torn down.
    engine.key_down(&shift(), &bounds, &mut overlay);
    engine.key_up(&alt(), 0);
    engine.advance(DISMISS_GRACE_DELAY, &mut overlay);

    // The next session releases without shift: immediate teardown again.
    engine.pointer_move(&[1]);
    engine.key_down(&alt(), &bounds, &mut overlay);
    engine.key_up(&alt(), 10_000);
    assert_eq!(engine.next_deadline(), Some(10_000));
}

#[test]
fn releasing_other_keys_schedules_nothing() {
    let mut engine = started_engine();
    let _overlay = armed_over(&mut engine, 1);

    engine.key_up(&shift(), 100);
    assert!(engine.next_deadline().is_none());
    assert!(engine.is_armed());

    // Releasing the hotkey while not armed is equally inert.
    engine.key_up(&alt(), 100);
    engine.key_up(&alt(), 200);
    assert_eq!(engine.next_deadline(), Some(100));
}

#[test]
fn selection_and_target_never_alias() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);

    engine.pointer_move_immediate(&[2], &bounds, &mut overlay);
    assert_ne!(engine.selected(), engine.target());

    // A move back onto the selection never promotes it to target.
    assert!(engine.pointer_move(&[1]).is_none());
    assert_eq!(engine.target(), Some(&2));
}

#[test]
fn stop_tears_down_and_stops_consuming_events() {
    let mut engine = started_engine();
    let mut overlay = armed_over(&mut engine, 1);
    engine.pointer_move_immediate(&[2], &bounds, &mut overlay);

    let reaction = engine.stop(&mut overlay);
    assert_eq!(reaction.scroll, Some(ScrollControl::Unlock));
    assert!(!engine.is_started());
    assert!(overlay.highlight(HighlightRole::Selected).is_none());
    assert!(overlay.marks().is_empty());

    // Events after stop are ignored.
    let reaction = engine.key_down(&alt(), &bounds, &mut overlay);
    assert_eq!(reaction, Reaction::default());
    assert!(engine.pointer_move(&[1]).is_none());
}

#[test]
fn stop_before_start_is_inert() {
    let mut engine: SpacingEngine<u32> = SpacingEngine::new(SpacingOptions::default());
    let mut overlay = RecordingOverlay::new();
    assert_eq!(engine.stop(&mut overlay), Reaction::default());
    assert!(overlay.ops().is_empty());
}

#[test]
fn custom_hotkey_is_honored() {
    let mut engine = SpacingEngine::new(SpacingOptions {
        hot_key: String::from("Control"),
        ..SpacingOptions::default()
    });
    engine.start(true).unwrap();
    let mut overlay = RecordingOverlay::new();
    engine.pointer_move(&[1]);

    assert!(!engine.key_down(&alt(), &bounds, &mut overlay).prevent_default);
    assert!(!engine.is_armed());

    let reaction = engine.key_down(
        &KeyInput {
            key: "Control",
            shift: false,
        },
        &bounds,
        &mut overlay,
    );
    assert!(reaction.prevent_default);
    assert!(engine.is_armed());
}
