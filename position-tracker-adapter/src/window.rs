use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use position_tracker::{
    Error, EventKind, EventTarget, Listener, ListenerId, ListenerOptions, TrackerResult,
};

struct Registration {
    kind: EventKind,
    id: ListenerId,
    listener: Listener,
    options: ListenerOptions,
}

/// An in-memory window: holds registered listeners and fires them on
/// [`ManualWindow::dispatch`].
#[derive(Default)]
pub struct ManualWindow {
    registrations: RefCell<Vec<Registration>>,
    next_id: Cell<u64>,
    refused: Cell<Option<EventKind>>,
}

impl ManualWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires every listener registered for `kind` and returns how many ran.
    ///
    /// Listeners added or removed by a listener take effect from the next dispatch.
    pub fn dispatch(&self, kind: EventKind) -> usize {
        let listeners: Vec<Listener> = self
            .registrations
            .borrow()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| Rc::clone(&r.listener))
            .collect();
        atrace!(kind = %kind, listeners = listeners.len(), "ManualWindow::dispatch");
        for listener in &listeners {
            listener();
        }
        listeners.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    pub fn listener_ids(&self, kind: EventKind) -> Vec<ListenerId> {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.id)
            .collect()
    }

    pub fn listener_options(&self, id: ListenerId) -> Option<ListenerOptions> {
        self.registrations
            .borrow()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.options)
    }

    pub fn is_passive(&self, id: ListenerId) -> bool {
        self.listener_options(id).is_some_and(|o| o.passive)
    }

    /// Makes registrations for `kind` fail until reset with `None`.
    pub fn refuse_registrations(&self, kind: Option<EventKind>) {
        self.refused.set(kind);
    }
}

impl EventTarget for ManualWindow {
    fn add_event_listener(
        &self,
        kind: EventKind,
        listener: Listener,
        options: ListenerOptions,
    ) -> TrackerResult<ListenerId> {
        if self.refused.get() == Some(kind) {
            return Err(Error::listener(kind, "registration refused by host"));
        }
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0.wrapping_add(1));
        self.registrations.borrow_mut().push(Registration {
            kind,
            id,
            listener,
            options,
        });
        Ok(id)
    }

    fn remove_event_listener(&self, kind: EventKind, id: ListenerId) {
        self.registrations
            .borrow_mut()
            .retain(|r| !(r.kind == kind && r.id == id));
    }
}

impl fmt::Debug for ManualWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualWindow")
            .field("resize_listeners", &self.listener_count(EventKind::Resize))
            .field("scroll_listeners", &self.listener_count(EventKind::Scroll))
            .finish_non_exhaustive()
    }
}
