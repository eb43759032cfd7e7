use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use crate::{
    Completion, Element, EventKind, EventTarget, FrameCoalescer, FrameScheduler, Listener,
    ListenerId, ListenerOptions, Observable, Rect, Subscription, TrackerOptions, TrackerResult,
    TrackerState,
};

/// Everything that lives exactly as long as one element association.
struct Attachment<E: ?Sized> {
    element: Rc<E>,
    coalescer: FrameCoalescer,
    // Cleared on detach so a frame scheduled before teardown does not write stale geometry.
    live: Rc<Cell<bool>>,
    listeners: Vec<(EventKind, ListenerId)>,
}

/// Tracks the on-screen bounding rectangle of one element at a time.
///
/// This type is headless:
/// - It does not hold any UI objects beyond the element handle it was given.
/// - The host supplies a [`FrameScheduler`] and a window-like [`EventTarget`].
/// - The current rectangle is exposed as an [`Observable`], replaced only when it changes.
///
/// While an element is attached, `resize` and `scroll` events request a recomputation through a
/// [`FrameCoalescer`], so any number of events within one frame cost a single geometry query.
pub struct PositionTracker<E: ?Sized + 'static = dyn Element> {
    scheduler: Rc<dyn FrameScheduler>,
    window: Rc<dyn EventTarget>,
    options: TrackerOptions,
    rect: Observable<Rect>,
    attachment: Option<Attachment<E>>,
    on_change: Option<Subscription>,
}

impl<E: Element + ?Sized + 'static> PositionTracker<E> {
    pub fn new(
        scheduler: Rc<dyn FrameScheduler>,
        window: Rc<dyn EventTarget>,
        options: TrackerOptions,
    ) -> Self {
        pdebug!(
            listen_resize = options.listen_resize,
            listen_scroll = options.listen_scroll,
            passive_scroll = options.passive_scroll,
            "PositionTracker::new"
        );
        let rect = Observable::new(options.initial_rect);
        let on_change = subscribe_on_change(&rect, &options);
        Self {
            scheduler,
            window,
            options,
            rect,
            attachment: None,
            on_change,
        }
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    /// Replaces the options. A live association is torn down and re-established so the new
    /// listener flags take effect; the held rectangle is kept.
    pub fn set_options(&mut self, options: TrackerOptions) -> TrackerResult<()> {
        self.on_change = subscribe_on_change(&self.rect, &options);
        self.options = options;
        ptrace!("PositionTracker::set_options");

        match self.attachment.as_ref().map(|a| Rc::clone(&a.element)) {
            Some(element) => self.attach(element),
            None => Ok(()),
        }
    }

    /// The current rectangle.
    ///
    /// The same `Rc` is returned until a recomputation observes a change.
    pub fn rect(&self) -> Rc<Rect> {
        self.rect.get()
    }

    pub fn subscriber_count(&self) -> usize {
        self.rect.subscriber_count()
    }

    /// Registers `f` to run after every change of the rectangle.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&Rc<Rect>) + 'static) -> Subscription {
        self.rect.subscribe(f)
    }

    pub fn state(&self) -> TrackerState {
        if self.attachment.is_some() {
            TrackerState::Attached
        } else {
            TrackerState::Unattached
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn element(&self) -> Option<&Rc<E>> {
        self.attachment.as_ref().map(|a| &a.element)
    }

    /// Associates the tracker with `element`, or with nothing.
    ///
    /// Passing the element that is already attached (same `Rc` allocation) changes nothing.
    /// Otherwise the current association is torn down first, then the new one is set up.
    /// `None` leaves the tracker unattached at its last known rectangle.
    pub fn set_element(&mut self, element: Option<Rc<E>>) -> TrackerResult<()> {
        let unchanged = match (&self.attachment, &element) {
            (Some(current), Some(next)) => Rc::ptr_eq(&current.element, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(());
        }

        match element {
            Some(element) => self.attach(element),
            None => {
                self.detach();
                Ok(())
            }
        }
    }

    /// Attaches to `element`: requests an initial coalesced recomputation, then registers the
    /// coalesced recomputation for `resize` and (passive) `scroll`.
    ///
    /// Any previous association is detached first. If a listener fails to register, the ones
    /// already registered are removed again and the tracker stays unattached.
    pub fn attach(&mut self, element: Rc<E>) -> TrackerResult<()> {
        self.detach();

        let live = Rc::new(Cell::new(true));
        let coalescer = {
            let element = Rc::clone(&element);
            let rect = self.rect.clone();
            let live = Rc::clone(&live);
            FrameCoalescer::new(Rc::clone(&self.scheduler), move || {
                if !live.get() {
                    ptrace!("PositionTracker: ignoring frame from a detached element");
                    return Ok(());
                }
                recompute(&*element, &rect).map(|_| ())
            })
        };

        let _ = coalescer.invoke();

        let on_event = coalescer.clone();
        let listener: Listener = Rc::new(move || {
            let _ = on_event.invoke();
        });

        let mut wanted = Vec::with_capacity(2);
        if self.options.listen_resize {
            wanted.push((EventKind::Resize, ListenerOptions::default()));
        }
        if self.options.listen_scroll {
            wanted.push((EventKind::Scroll, self.options.scroll_listener_options()));
        }

        let mut listeners = Vec::with_capacity(wanted.len());
        for (kind, listener_options) in wanted {
            match self
                .window
                .add_event_listener(kind, Rc::clone(&listener), listener_options)
            {
                Ok(id) => listeners.push((kind, id)),
                Err(err) => {
                    pwarn!(kind = %kind, error = %err, "PositionTracker: listener registration failed");
                    for (kind, id) in listeners {
                        self.window.remove_event_listener(kind, id);
                    }
                    live.set(false);
                    return Err(err);
                }
            }
        }

        pdebug!(listeners = listeners.len(), "PositionTracker::attach");
        self.attachment = Some(Attachment {
            element,
            coalescer,
            live,
            listeners,
        });
        Ok(())
    }

    /// Requests a coalesced recomputation, as a `resize`/`scroll` event would.
    ///
    /// Returns `None` when no element is attached.
    pub fn request_update(&self) -> Option<Completion> {
        self.attachment.as_ref().map(|a| a.coalescer.invoke())
    }

    /// Recomputes right away, bypassing the frame coalescer.
    ///
    /// Returns whether the rectangle changed. Without an element this does nothing and returns
    /// `Ok(false)`.
    pub fn recompute_now(&self) -> TrackerResult<bool> {
        match &self.attachment {
            Some(attachment) => recompute(&*attachment.element, &self.rect),
            None => Ok(false),
        }
    }

    /// Whether a coalesced recomputation is waiting for the next frame.
    pub fn is_update_pending(&self) -> bool {
        self.attachment
            .as_ref()
            .is_some_and(|a| a.coalescer.is_pending())
    }
}

impl<E: ?Sized + 'static> PositionTracker<E> {
    /// Removes the listeners of the current association, if any.
    ///
    /// A frame that was already scheduled still fires, but no longer touches the rectangle.
    pub fn detach(&mut self) {
        let Some(attachment) = self.attachment.take() else {
            return;
        };
        for (kind, id) in &attachment.listeners {
            self.window.remove_event_listener(*kind, *id);
        }
        attachment.live.set(false);
        pdebug!(
            listeners = attachment.listeners.len(),
            "PositionTracker::detach"
        );
    }
}

impl<E: ?Sized + 'static> Drop for PositionTracker<E> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<E: ?Sized + 'static> fmt::Debug for PositionTracker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionTracker")
            .field("options", &self.options)
            .field("rect", &self.rect)
            .field("on_change", &self.on_change.is_some())
            .field("attached", &self.attachment.is_some())
            .field(
                "listeners",
                &self.attachment.as_ref().map_or(0, |a| a.listeners.len()),
            )
            .finish_non_exhaustive()
    }
}

fn recompute<E: Element + ?Sized>(element: &E, rect: &Observable<Rect>) -> TrackerResult<bool> {
    let next = element.bounding_client_rect()?;
    let changed = rect.replace_if_changed(next);
    ptrace!(changed, "PositionTracker: recomputed");
    Ok(changed)
}

fn subscribe_on_change(rect: &Observable<Rect>, options: &TrackerOptions) -> Option<Subscription> {
    let on_change = options.on_change.clone()?;
    Some(rect.subscribe(move |next| on_change(&**next)))
}
