mod common;

use std::sync::Arc;

use common::{Call, MockPicker, attach};
use pickwire::prelude::*;

fn pair() -> (Arc<SurfaceCoordinator>, Selector, Selector) {
    let coordinator = Arc::new(SurfaceCoordinator::new());
    let first = Selector::with_coordinator(SelectorConfig::default(), Arc::clone(&coordinator));
    let second = Selector::with_coordinator(SelectorConfig::default(), Arc::clone(&coordinator));
    (coordinator, first, second)
}

#[test]
fn test_opening_one_closes_the_other() {
    let (coordinator, first, second) = pair();
    let picker = MockPicker::accepting_all();
    attach(&first, &picker);
    picker.clear_calls();

    first.open();
    assert_eq!(coordinator.open_id(), Some(first.id().to_string()));

    second.open();
    assert!(!first.is_open());
    assert!(second.is_open());
    assert_eq!(coordinator.open_id(), Some(second.id().to_string()));
    assert_eq!(picker.calls(), vec![Call::Show, Call::Hide]);
}

#[test]
fn test_close_releases_coordinator() {
    let (coordinator, first, _second) = pair();
    first.open();
    first.close();
    assert_eq!(coordinator.open_id(), None);
}

#[test]
fn test_reopening_same_selector_keeps_it_open() {
    let (coordinator, first, _second) = pair();
    first.open();
    first.close();
    first.open();
    assert!(first.is_open());
    assert_eq!(coordinator.open_id(), Some(first.id().to_string()));
}

#[test]
fn test_dropped_selector_releases_coordinator() {
    let (coordinator, first, second) = pair();
    first.open();
    drop(first);
    assert_eq!(coordinator.open_id(), None);

    second.open();
    assert!(second.is_open());
}

#[test]
fn test_uncoordinated_selectors_are_independent() {
    let first = Selector::new(SelectorConfig::default());
    let second = Selector::new(SelectorConfig::default());
    first.open();
    second.open();
    assert!(first.is_open());
    assert!(second.is_open());
}
