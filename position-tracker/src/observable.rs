use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

type Subscriber<T> = Rc<dyn Fn(&Rc<T>)>;

struct Inner<T> {
    value: RefCell<Rc<T>>,
    subscribers: RefCell<Vec<(u64, Subscriber<T>)>>,
    next_id: Cell<u64>,
}

impl<T> Inner<T> {
    fn is_subscribed(&self, id: u64) -> bool {
        self.subscribers.borrow().iter().any(|(sid, _)| *sid == id)
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
    }
}

/// A value cell that replaces its value only when it changes and notifies subscribers when it
/// does.
///
/// The value is held behind an `Rc`: as long as no change is observed, [`Observable::get`]
/// keeps returning the same allocation, so consumers can use `Rc::ptr_eq` as a cheap "did it
/// change" check.
pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(Rc::new(value)),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> Rc<T> {
        Rc::clone(&self.inner.value.borrow())
    }

    /// Stores `value` and notifies subscribers, unless it equals the current value.
    ///
    /// Returns whether the value was replaced.
    pub fn replace_if_changed(&self, value: T) -> bool {
        if **self.inner.value.borrow() == value {
            return false;
        }
        let next = Rc::new(value);
        *self.inner.value.borrow_mut() = Rc::clone(&next);
        self.notify(&next);
        true
    }

    /// Computes the next value from the current one, then applies it like
    /// [`Observable::replace_if_changed`].
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let current = self.get();
        self.replace_if_changed(f(&current))
    }

    /// Registers `f` to run after every replacement.
    ///
    /// The subscription ends when the returned [`Subscription`] is dropped.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&Rc<T>) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.wrapping_add(1));
        self.inner.subscribers.borrow_mut().push((id, Rc::new(f)));

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.unsubscribe(id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn notify(&self, value: &Rc<T>) {
        // Snapshot so callbacks may subscribe, unsubscribe, read or write the cell reentrantly.
        let snapshot: Vec<(u64, Subscriber<T>)> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(id, f)| (*id, Rc::clone(f)))
            .collect();

        for (id, f) in snapshot {
            // A subscriber replaced the value; the nested notify already delivered the newer
            // one to everyone still subscribed.
            if !Rc::ptr_eq(&self.get(), value) {
                return;
            }
            if self.inner.is_subscribed(id) {
                f(value);
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

/// Keeps an [`Observable`] subscription alive.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
