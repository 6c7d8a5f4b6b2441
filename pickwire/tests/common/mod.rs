//! Shared test helpers.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::LevelFilter;
use pickwire::picker::{ItemChange, ListenerId, Picker, PickerEvents, PickerListener};
use pickwire::{PickerError, SelectionRecord, Selector};

pub fn init_logging() {
    let _ = simplelog::TestLogger::init(LevelFilter::Trace, simplelog::Config::default());
}

/// A call the selector made into the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Update(String, bool),
    SetSelections(Vec<String>),
    Show,
    Hide,
    Input(String),
}

#[derive(Default)]
struct MockState {
    /// Known entries; None accepts any value (title = value).
    entries: Option<Vec<(String, String)>>,
    selected: Vec<SelectionRecord>,
    calls: Vec<Call>,
    refuse: HashSet<String>,
    fail: bool,
    fail_on: HashSet<String>,
    panic: bool,
}

/// Picker double that records calls and echoes changes synchronously, the
/// way a real picker does.
#[derive(Default)]
pub struct MockPicker {
    events: PickerEvents,
    state: Mutex<MockState>,
}

impl MockPicker {
    /// Knows every value.
    pub fn accepting_all() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_entries(entries: &[(&str, &str)]) -> Arc<Self> {
        let picker = Self::default();
        picker.lock().entries = Some(
            entries
                .iter()
                .map(|(title, value)| (title.to_string(), value.to_string()))
                .collect(),
        );
        Arc::new(picker)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refuse any toggle of `value` (returns `Ok(false)`).
    pub fn refuse(&self, value: &str) {
        self.lock().refuse.insert(value.to_string());
    }

    /// Make `update_item_selection` return an error. `false` also clears
    /// [`MockPicker::fail_on`].
    pub fn fail(&self, fail: bool) {
        let mut state = self.lock();
        state.fail = fail;
        if !fail {
            state.fail_on.clear();
        }
    }

    /// Make `update_item_selection` return an error for `value` only.
    pub fn fail_on(&self, value: &str) {
        self.lock().fail_on.insert(value.to_string());
    }

    /// Make `update_item_selection` panic.
    pub fn panic_on_update(&self, panic: bool) {
        self.lock().panic = panic;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn updates(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Update(..)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn selected_values(&self) -> Vec<String> {
        self.lock().selected.iter().map(|r| r.value.clone()).collect()
    }

    pub fn listener_count(&self) -> usize {
        self.events.len()
    }

    fn title_of(&self, value: &str) -> Option<String> {
        let state = self.lock();
        match &state.entries {
            None => Some(value.to_string()),
            Some(entries) => entries
                .iter()
                .find(|(_, v)| v == value)
                .map(|(title, _)| title.clone()),
        }
    }

    fn is_selected(&self, value: &str) -> bool {
        self.lock().selected.iter().any(|r| r.value == value)
    }

    /// Simulate the user toggling entries in the picker's own surface.
    pub fn user_burst(&self, changes: &[(&str, bool)]) -> bool {
        let changes: Vec<ItemChange> = changes
            .iter()
            .filter_map(|(value, selected)| {
                self.title_of(value)
                    .map(|title| ItemChange::new(title, *value, *selected))
            })
            .collect();
        self.run_burst(&changes)
    }

    pub fn user_select(&self, value: &str, selected: bool) -> bool {
        self.user_burst(&[(value, selected)])
    }

    fn run_burst(&self, changes: &[ItemChange]) -> bool {
        self.events.fire_burst(changes, |change| {
            let mut state = self.lock();
            if change.selected {
                if !state.selected.iter().any(|r| r.value == change.value) {
                    state
                        .selected
                        .push(SelectionRecord::new(change.title.clone(), change.value.clone()));
                }
            } else {
                state.selected.retain(|r| r.value != change.value);
            }
        })
    }
}

impl Picker for MockPicker {
    fn id(&self) -> String {
        "mock".to_string()
    }

    fn selections(&self) -> Vec<SelectionRecord> {
        self.lock().selected.clone()
    }

    fn set_selections(&self, items: &[SelectionRecord]) -> Result<(), PickerError> {
        let known: Vec<SelectionRecord> = items
            .iter()
            .filter(|item| self.title_of(&item.value).is_some())
            .cloned()
            .collect();
        let mut state = self.lock();
        state.calls.push(Call::SetSelections(
            items.iter().map(|item| item.value.clone()).collect(),
        ));
        state.selected = known;
        Ok(())
    }

    fn update_item_selection(&self, value: &str, selected: bool) -> Result<bool, PickerError> {
        let (fail, panic, refused) = {
            let mut state = self.lock();
            state.calls.push(Call::Update(value.to_string(), selected));
            (
                state.fail || state.fail_on.contains(value),
                state.panic,
                state.refuse.contains(value),
            )
        };
        if panic {
            panic!("mock picker exploded on '{value}'");
        }
        if fail {
            return Err(PickerError::failed("mock", format!("cannot toggle '{value}'")));
        }
        let Some(title) = self.title_of(value) else {
            return Ok(false);
        };
        if refused {
            return Ok(false);
        }
        if self.is_selected(value) == selected {
            return Ok(true);
        }
        Ok(self.run_burst(&[ItemChange::new(title, value, selected)]))
    }

    fn subscribe(&self, listener: Arc<dyn PickerListener>) -> ListenerId {
        self.events.subscribe(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    fn on_show(&self) {
        self.lock().calls.push(Call::Show);
    }

    fn on_hide(&self) {
        self.lock().calls.push(Call::Hide);
    }

    fn on_input_changed(&self, text: &str) {
        self.lock().calls.push(Call::Input(text.to_string()));
    }
}

/// Counts `on_change` notifications.
pub fn count_changes(selector: &Selector) -> Arc<Mutex<usize>> {
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    selector.on_change(move |_| {
        *counter.lock().unwrap() += 1;
    });
    count
}

pub fn changes(count: &Arc<Mutex<usize>>) -> usize {
    *count.lock().unwrap()
}

pub fn values(selector: &Selector) -> Vec<String> {
    selector.selections().into_iter().map(|r| r.value).collect()
}

/// Attach `picker` to `selector`.
pub fn attach<P: Picker + 'static>(selector: &Selector, picker: &Arc<P>) {
    let picker: Arc<dyn Picker> = picker.clone();
    selector.set_picker(Some(picker)).unwrap();
}
