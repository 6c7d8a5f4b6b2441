//! Listener registry shared by picker implementations.

use std::sync::{Arc, PoisonError, RwLock};

use super::{ItemChange, ListenerId, PickerListener};

type ChangingFn = Box<dyn Fn(&ItemChange) -> bool + Send + Sync>;
type ChangedFn = Box<dyn Fn(&ItemChange) + Send + Sync>;
type CompleteFn = Box<dyn Fn() + Send + Sync>;

/// Registered listeners plus the firing rules of the picker contract.
#[derive(Default)]
pub struct PickerEvents {
    listeners: RwLock<Vec<(ListenerId, Arc<dyn PickerListener>)>>,
}

impl std::fmt::Debug for PickerEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickerEvents")
            .field("listeners", &self.len())
            .finish()
    }
}

impl PickerEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn PickerListener>) -> ListenerId {
        let id = ListenerId::next();
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .map(|g| g.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Listeners may subscribe or unsubscribe while being called.
    fn snapshot(&self) -> Vec<Arc<dyn PickerListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    /// Fire *changing*. Every listener is asked; any `false` vetoes.
    pub fn fire_changing(&self, change: &ItemChange) -> bool {
        let mut allowed = true;
        for listener in self.snapshot() {
            if !listener.on_item_selection_changing(change) {
                allowed = false;
            }
        }
        allowed
    }

    pub fn fire_changed(&self, change: &ItemChange) {
        for listener in self.snapshot() {
            listener.on_item_selection_changed(change);
        }
    }

    pub fn fire_complete(&self) {
        for listener in self.snapshot() {
            listener.on_item_selection_complete();
        }
    }

    /// Run a burst of related changes atomically.
    ///
    /// `changes` carry the target state of each entry. *changing* fires for
    /// all of them first; a single veto cancels the whole burst. Otherwise
    /// each change is applied through `apply` and followed by its *changed*,
    /// and *complete* fires once at the end. Returns whether the burst ran.
    pub fn fire_burst<F>(&self, changes: &[ItemChange], mut apply: F) -> bool
    where
        F: FnMut(&ItemChange),
    {
        if changes.is_empty() {
            return true;
        }

        for change in changes {
            if !self.fire_changing(&change.flipped()) {
                log::debug!("[picker] change of '{}' vetoed, burst dropped", change.value);
                return false;
            }
        }

        for change in changes {
            apply(change);
            self.fire_changed(change);
        }
        self.fire_complete();
        true
    }
}

/// A [`PickerListener`] assembled from closures.
///
/// ```ignore
/// let pinned = FnListener::new().on_changing(|change| change.value != "pinned");
/// picker.subscribe(Arc::new(pinned));
/// ```
#[derive(Default)]
pub struct FnListener {
    changing: Option<ChangingFn>,
    changed: Option<ChangedFn>,
    complete: Option<CompleteFn>,
}

impl FnListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_changing(mut self, f: impl Fn(&ItemChange) -> bool + Send + Sync + 'static) -> Self {
        self.changing = Some(Box::new(f));
        self
    }

    pub fn on_changed(mut self, f: impl Fn(&ItemChange) + Send + Sync + 'static) -> Self {
        self.changed = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

impl PickerListener for FnListener {
    fn on_item_selection_changing(&self, change: &ItemChange) -> bool {
        self.changing.as_ref().is_none_or(|f| f(change))
    }

    fn on_item_selection_changed(&self, change: &ItemChange) {
        if let Some(f) = &self.changed {
            f(change);
        }
    }

    fn on_item_selection_complete(&self) {
        if let Some(f) = &self.complete {
            f();
        }
    }
}
