mod common;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use common::{Call, MockPicker, attach, changes, count_changes, init_logging, values};
use pickwire::prelude::*;

// ============================================================================
// Adding and removing
// ============================================================================

#[test]
fn test_add_builds_serialized_value() {
    init_logging();
    let selector = Selector::new(SelectorConfig::default());
    let count = count_changes(&selector);

    assert!(selector.add_selection("Denmark", "DK").unwrap());
    assert!(selector.add_selection("Germany", "DE").unwrap());

    assert_eq!(selector.value(), "Denmark=DK;Germany=DE");
    assert_eq!(changes(&count), 2);
}

#[test]
fn test_duplicate_value_is_ignored() {
    let selector = Selector::new(SelectorConfig::default());
    let count = count_changes(&selector);

    assert!(selector.add_selection("Denmark", "DK").unwrap());
    assert!(!selector.add_selection("Danmark", "DK").unwrap());

    assert_eq!(selector.len(), 1);
    assert_eq!(selector.selections()[0].title, "Denmark");
    assert_eq!(changes(&count), 1);
}

#[test]
fn test_remove_unknown_value_is_silent() {
    let selector = Selector::new(SelectorConfig::default());
    selector.add_selection("a", "a").unwrap();
    let count = count_changes(&selector);

    assert!(!selector.remove_selection("zz").unwrap());
    assert_eq!(changes(&count), 0);
    assert_eq!(values(&selector), vec!["a"]);
}

#[test]
fn test_remove_fires_one_change() {
    let selector = Selector::new(SelectorConfig::default());
    selector.add_selection("a", "a").unwrap();
    selector.add_selection("b", "b").unwrap();
    let count = count_changes(&selector);

    assert!(selector.remove_selection("a").unwrap());
    assert_eq!(values(&selector), vec!["b"]);
    assert_eq!(changes(&count), 1);
}

#[test]
fn test_clear_fires_one_change() {
    let selector = Selector::new(SelectorConfig::default());
    for value in ["a", "b", "c"] {
        selector.add_selection(value, value).unwrap();
    }
    let count = count_changes(&selector);

    assert_eq!(selector.clear_selections().unwrap(), 3);
    assert!(selector.is_empty());
    assert_eq!(changes(&count), 1);
}

#[test]
fn test_clear_except_keeps_matching() {
    let selector = Selector::new(SelectorConfig::default());
    for value in ["a", "b", "c"] {
        selector.add_selection(value, value).unwrap();
    }

    let removed = selector.clear_selections_except(|r| r.value == "b").unwrap();
    assert_eq!(removed, 2);
    assert_eq!(values(&selector), vec!["b"]);
}

#[test]
fn test_max_selections() {
    let selector = Selector::new(SelectorConfig::default().max_selections(2));
    assert!(selector.add_selection("a", "a").unwrap());
    assert!(selector.add_selection("b", "b").unwrap());
    assert!(!selector.add_selection("c", "c").unwrap());
    assert_eq!(selector.len(), 2);
}

#[test]
fn test_callback_can_be_removed() {
    let selector = Selector::new(SelectorConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = selector.on_change(move |s| sink.lock().unwrap().push(s.value()));

    selector.add_selection("a", "a").unwrap();
    assert!(selector.remove_on_change(id));
    selector.add_selection("b", "b").unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["a".to_string()]);
    assert!(!selector.remove_on_change(id));
}

// ============================================================================
// Single mode
// ============================================================================

#[test]
fn test_single_mode_replaces_with_one_change() {
    let selector = Selector::new(SelectorConfig::single());
    selector.add_selection("A", "a").unwrap();
    let count = count_changes(&selector);

    assert!(selector.add_selection("B", "b").unwrap());

    assert_eq!(values(&selector), vec!["b"]);
    assert_eq!(changes(&count), 1);
}

#[test]
fn test_single_mode_syncs_picker() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::single());
    attach(&selector, &picker);

    selector.add_selection("a", "a").unwrap();
    selector.add_selection("b", "b").unwrap();

    assert_eq!(picker.selected_values(), vec!["b"]);
    assert_eq!(
        picker.updates(),
        vec![
            Call::Update("a".into(), true),
            Call::Update("a".into(), false),
            Call::Update("b".into(), true),
        ]
    );
}

#[test]
fn test_single_mode_veto_restores_previous() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::single());
    attach(&selector, &picker);
    selector.add_selection("a", "a").unwrap();
    picker.refuse("b");
    let count = count_changes(&selector);

    assert!(!selector.add_selection("b", "b").unwrap());

    assert_eq!(values(&selector), vec!["a"]);
    assert_eq!(picker.selected_values(), vec!["a"]);
    assert_eq!(changes(&count), 0);
}

#[test]
fn test_single_mode_refused_clear_aborts_add() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::single());
    attach(&selector, &picker);
    selector.add_selection("a", "a").unwrap();
    picker.refuse("a");

    assert!(!selector.add_selection("b", "b").unwrap());
    assert_eq!(values(&selector), vec!["a"]);
    assert!(!picker.updates().contains(&Call::Update("b".into(), true)));
}

#[test]
fn test_single_mode_failed_forward_restores_previous() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::single());
    attach(&selector, &picker);
    selector.add_selection("a", "a").unwrap();
    picker.fail_on("b");
    let count = count_changes(&selector);

    let err = selector.add_selection("b", "b").unwrap_err();

    assert!(matches!(err, SelectorError::Picker(PickerError::Failed { .. })));
    assert_eq!(values(&selector), vec!["a"]);
    assert_eq!(picker.selected_values(), vec!["a"]);
    assert_eq!(selector.sync_state(), SyncState::Idle);
    assert_eq!(changes(&count), 0);
}

#[test]
fn test_picker_select_evicts_in_single_mode() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::single());
    attach(&selector, &picker);
    selector.add_selection("a", "a").unwrap();
    picker.clear_calls();
    let count = count_changes(&selector);

    // A multi-select picker leaves "a" selected on its side.
    assert!(picker.user_select("b", true));

    assert_eq!(values(&selector), vec!["b"]);
    assert_eq!(picker.selected_values(), vec!["b"]);
    assert_eq!(picker.updates(), vec![Call::Update("a".into(), false)]);
    assert_eq!(changes(&count), 1);
}

#[test]
fn test_failed_eviction_is_retried() {
    init_logging();
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::single());
    attach(&selector, &picker);
    selector.add_selection("a", "a").unwrap();
    picker.fail_on("a");
    let count = count_changes(&selector);

    assert!(picker.user_select("b", true));
    assert_eq!(values(&selector), vec!["b"]);
    assert_eq!(picker.selected_values(), vec!["a", "b"]);
    assert_eq!(selector.sync_state(), SyncState::Idle);
    assert_eq!(changes(&count), 1);

    picker.fail(false);
    assert!(picker.user_select("c", true));
    assert_eq!(values(&selector), vec!["c"]);
    assert_eq!(picker.selected_values(), vec!["c"]);
}

// ============================================================================
// Picker sync
// ============================================================================

#[test]
fn test_add_forwards_to_picker() {
    let picker = MockPicker::with_entries(&[("Denmark", "DK"), ("Germany", "DE")]);
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);

    selector.add_selection("Denmark", "DK").unwrap();
    selector.remove_selection("DK").unwrap();

    assert_eq!(
        picker.updates(),
        vec![Call::Update("DK".into(), true), Call::Update("DK".into(), false)]
    );
    assert!(picker.selected_values().is_empty());
}

#[test]
fn test_unknown_value_rejected_by_picker() {
    let picker = MockPicker::with_entries(&[("Denmark", "DK")]);
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);
    let count = count_changes(&selector);

    assert!(!selector.add_selection("Atlantis", "AT").unwrap());
    assert!(selector.is_empty());
    assert_eq!(changes(&count), 0);
}

#[test]
fn test_invalid_record_is_not_forwarded() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);

    assert!(selector.add_selection_with_validity("old", "old", false).unwrap());
    assert!(picker.updates().is_empty());
    assert_eq!(selector.value(), "");

    assert!(selector.remove_selection("old").unwrap());
    assert!(picker.updates().is_empty());
}

#[test]
fn test_picker_change_is_not_forwarded_back() {
    init_logging();
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);
    let count = count_changes(&selector);

    assert!(picker.user_select("a", true));
    assert!(picker.user_select("a", false));

    assert!(picker.updates().is_empty());
    assert!(selector.is_empty());
    assert_eq!(changes(&count), 2);
}

#[test]
fn test_picker_burst_fires_one_change() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);
    let count = count_changes(&selector);

    assert!(picker.user_burst(&[("a", true), ("b", true), ("c", true)]));

    assert_eq!(values(&selector), vec!["a", "b", "c"]);
    assert_eq!(changes(&count), 1);
}

#[test]
fn test_burst_that_nets_out_fires_nothing() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);
    selector.add_selection("a", "a").unwrap();
    let count = count_changes(&selector);

    picker.user_burst(&[("a", false), ("a", true)]);

    assert_eq!(values(&selector), vec!["a"]);
    assert_eq!(changes(&count), 0);
}

#[test]
fn test_host_vetoes_picker_select_when_full() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default().max_selections(1));
    attach(&selector, &picker);
    selector.add_selection("a", "a").unwrap();

    assert!(!picker.user_select("b", true));
    assert_eq!(picker.selected_values(), vec!["a"]);
    assert_eq!(values(&selector), vec!["a"]);
}

#[test]
fn test_listener_veto_keeps_both_sides_unchanged() {
    let picker = MockPicker::accepting_all();
    picker.subscribe(Arc::new(
        FnListener::new().on_changing(|change| change.value != "pinned"),
    ));
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);

    assert!(!selector.add_selection("pinned", "pinned").unwrap());
    assert!(selector.is_empty());
    assert!(picker.selected_values().is_empty());
}

#[test]
fn test_sync_state_during_forwarding() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);

    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    let watched = selector.clone();
    picker.subscribe(Arc::new(FnListener::new().on_changed(move |_| {
        sink.lock().unwrap().push(watched.sync_state());
    })));

    selector.add_selection("a", "a").unwrap();
    picker.user_select("b", true);

    assert_eq!(
        *observed.lock().unwrap(),
        vec![SyncState::ApplyingFromHost, SyncState::Idle]
    );
    assert_eq!(selector.sync_state(), SyncState::Idle);
}

#[test]
fn test_attach_preloads_valid_selections() {
    let selector = Selector::new(SelectorConfig::default());
    selector.add_selection("a", "a").unwrap();
    selector.add_selection_with_validity("x", "x", false).unwrap();
    selector.add_selection("b", "b").unwrap();

    let picker = MockPicker::accepting_all();
    attach(&selector, &picker);

    assert_eq!(
        picker.calls(),
        vec![Call::SetSelections(vec!["a".into(), "b".into()])]
    );
    assert_eq!(values(&selector), vec!["a", "x", "b"]);
}

#[test]
fn test_attach_marks_unheld_values_invalid() {
    let selector = Selector::new(SelectorConfig::default());
    selector.add_selection("A", "a").unwrap();
    selector.add_selection("Ghost", "ghost").unwrap();
    let count = count_changes(&selector);

    let picker = MockPicker::with_entries(&[("A", "a")]);
    attach(&selector, &picker);

    assert_eq!(values(&selector), vec!["a", "ghost"]);
    assert!(!selector.selections()[1].valid);
    assert_eq!(selector.value(), "A=a");
    assert_eq!(picker.selected_values(), vec!["a"]);
    assert_eq!(changes(&count), 1);
}

#[test]
fn test_picker_select_revalidates_invalid_entry() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    selector.add_selection_with_validity("X", "x", false).unwrap();
    attach(&selector, &picker);
    let count = count_changes(&selector);

    assert!(picker.user_select("x", true));

    assert_eq!(values(&selector), vec!["x"]);
    assert_eq!(selector.value(), "X=x");
    assert_eq!(changes(&count), 1);
}

#[test]
fn test_detach_unsubscribes() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);
    assert_eq!(picker.listener_count(), 1);

    selector.set_picker(None).unwrap();
    assert_eq!(picker.listener_count(), 0);
    assert!(selector.picker().is_none());

    picker.user_select("a", true);
    assert!(selector.is_empty());
}

#[test]
fn test_dropping_selector_unsubscribes() {
    let picker = MockPicker::accepting_all();
    {
        let selector = Selector::new(SelectorConfig::default());
        attach(&selector, &picker);
        assert_eq!(picker.listener_count(), 1);
    }
    assert_eq!(picker.listener_count(), 0);
}

// ============================================================================
// Mode
// ============================================================================

#[test]
fn test_set_mode_clears_then_notifies_once() {
    let selector = Selector::new(SelectorConfig::default());
    selector.add_selection("a", "a").unwrap();
    selector.add_selection("b", "b").unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    selector.on_change(move |s| sink.lock().unwrap().push((s.config().mode, s.len())));

    assert!(selector.set_mode(SelectionMode::Single).unwrap());

    assert_eq!(*seen.lock().unwrap(), vec![(SelectionMode::Single, 0)]);
}

#[test]
fn test_set_mode_keeps_mode_when_clear_is_refused() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);
    selector.add_selection("a", "a").unwrap();
    selector.add_selection("b", "b").unwrap();
    picker.refuse("b");

    assert!(!selector.set_mode(SelectionMode::Single).unwrap());

    assert_eq!(selector.config().mode, SelectionMode::Multi);
    assert_eq!(values(&selector), vec!["b"]);
    assert_eq!(picker.selected_values(), vec!["b"]);

    assert!(selector.add_selection("C", "c").unwrap());
    assert_eq!(values(&selector), vec!["b", "c"]);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_picker_error_is_propagated() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);
    picker.fail(true);

    let err = selector.add_selection("a", "a").unwrap_err();
    assert!(matches!(err, SelectorError::Picker(PickerError::Failed { .. })));
    assert!(selector.is_empty());
    assert_eq!(selector.sync_state(), SyncState::Idle);

    picker.fail(false);
    assert!(selector.add_selection("a", "a").unwrap());
}

#[test]
fn test_panic_releases_sync_latch() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);
    picker.panic_on_update(true);

    let result = catch_unwind(AssertUnwindSafe(|| selector.add_selection("a", "a")));
    assert!(result.is_err());
    assert_eq!(selector.sync_state(), SyncState::Idle);

    picker.panic_on_update(false);
    let count = count_changes(&selector);
    assert!(selector.add_selection("a", "a").unwrap());
    assert_eq!(changes(&count), 1);
}

// ============================================================================
// Serialized value
// ============================================================================

#[test]
fn test_set_value_round_trip() {
    let selector = Selector::new(SelectorConfig::default());
    selector.set_value("x;y;z").unwrap();
    assert_eq!(values(&selector), vec!["x", "y", "z"]);
    assert_eq!(selector.value(), "x;y;z");
}

#[test]
fn test_set_value_fires_one_change() {
    let selector = Selector::new(SelectorConfig::default());
    selector.add_selection("old", "old").unwrap();
    let count = count_changes(&selector);

    selector.set_value("Denmark=DK;Germany=DE").unwrap();

    assert_eq!(values(&selector), vec!["DK", "DE"]);
    assert_eq!(changes(&count), 1);
}

#[test]
fn test_set_same_value_fires_nothing() {
    let selector = Selector::new(SelectorConfig::default());
    selector.set_value("a;b").unwrap();
    let count = count_changes(&selector);

    selector.set_value("a;b").unwrap();
    assert_eq!(changes(&count), 0);
}

#[test]
fn test_set_value_keeps_rejected_as_invalid() {
    let picker = MockPicker::with_entries(&[("Denmark", "DK")]);
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);

    selector.set_value("Denmark=DK;Gone=GN").unwrap();

    let records = selector.selections();
    assert_eq!(records.len(), 2);
    assert!(records[0].valid);
    assert!(!records[1].valid);
    assert_eq!(selector.value(), "Denmark=DK");
}

#[test]
fn test_dirty_tracking() {
    let selector = Selector::new(SelectorConfig::default());
    selector.set_value("a").unwrap();
    assert!(selector.is_dirty());

    selector.mark_clean();
    assert!(!selector.is_dirty());

    selector.add_selection("b", "b").unwrap();
    assert!(selector.is_dirty());
    selector.remove_selection("b").unwrap();
    assert!(!selector.is_dirty());
}

// ============================================================================
// Surface
// ============================================================================

#[test]
fn test_open_and_close_notify_picker() {
    let picker = MockPicker::accepting_all();
    let selector = Selector::new(SelectorConfig::default());
    attach(&selector, &picker);
    picker.clear_calls();

    assert!(selector.open());
    assert!(!selector.open());
    assert!(selector.close());
    assert!(!selector.close());

    assert_eq!(picker.calls(), vec![Call::Show, Call::Hide]);
}

#[test]
fn test_redraw_flag() {
    let selector = Selector::new(SelectorConfig::default());
    selector.clear_redraw();
    assert!(!selector.needs_redraw());

    selector.add_selection("a", "a").unwrap();
    assert!(selector.needs_redraw());
}
