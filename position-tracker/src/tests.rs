use crate::*;

use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::future::Future;
use core::pin::Pin;
use core::sync::atomic::{AtomicUsize, Ordering};
use core::task::{Context, Poll, Waker};
use std::sync::Arc;
use std::task::Wake;

#[derive(Default)]
struct FakeScheduler {
    queue: RefCell<Vec<FrameCallback>>,
    next_id: Cell<u64>,
}

impl FrameScheduler for FakeScheduler {
    fn request_animation_frame(&self, callback: FrameCallback) -> FrameId {
        self.queue.borrow_mut().push(callback);
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        FrameId(id)
    }
}

impl FakeScheduler {
    /// Fires the callbacks queued before this frame; new requests wait for the next one.
    fn run_frame(&self) -> usize {
        let batch = core::mem::take(&mut *self.queue.borrow_mut());
        let n = batch.len();
        for callback in batch {
            callback();
        }
        n
    }

    fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

#[derive(Default)]
struct FakeWindow {
    listeners: RefCell<Vec<(EventKind, ListenerId, Listener, ListenerOptions)>>,
    next_id: Cell<u64>,
    refuse: Cell<Option<EventKind>>,
    registrations: Cell<usize>,
}

impl EventTarget for FakeWindow {
    fn add_event_listener(
        &self,
        kind: EventKind,
        listener: Listener,
        options: ListenerOptions,
    ) -> TrackerResult<ListenerId> {
        if self.refuse.get() == Some(kind) {
            return Err(Error::listener(kind, "refused"));
        }
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.registrations.set(self.registrations.get() + 1);
        self.listeners
            .borrow_mut()
            .push((kind, id, listener, options));
        Ok(id)
    }

    fn remove_event_listener(&self, kind: EventKind, id: ListenerId) {
        self.listeners
            .borrow_mut()
            .retain(|(k, i, _, _)| !(*k == kind && *i == id));
    }
}

impl FakeWindow {
    fn dispatch(&self, kind: EventKind) -> usize {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(k, _, _, _)| *k == kind)
            .map(|(_, _, l, _)| Rc::clone(l))
            .collect();
        for listener in &snapshot {
            listener();
        }
        snapshot.len()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(k, _, _, _)| *k == kind)
            .count()
    }

    fn options_for(&self, kind: EventKind) -> Option<ListenerOptions> {
        self.listeners
            .borrow()
            .iter()
            .find(|(k, _, _, _)| *k == kind)
            .map(|(_, _, _, o)| *o)
    }
}

struct FakeElement {
    rect: Cell<Rect>,
    queries: Cell<usize>,
    detached: Cell<bool>,
}

impl FakeElement {
    fn new(rect: Rect) -> Rc<Self> {
        Rc::new(Self {
            rect: Cell::new(rect),
            queries: Cell::new(0),
            detached: Cell::new(false),
        })
    }
}

impl Element for FakeElement {
    fn bounding_client_rect(&self) -> TrackerResult<Rect> {
        self.queries.set(self.queries.get() + 1);
        if self.detached.get() {
            return Err(Error::Detached);
        }
        Ok(self.rect.get())
    }
}

fn rect(x: f64, y: f64, top: f64, left: f64, bottom: f64, right: f64) -> Rect {
    Rect {
        x,
        y,
        top,
        left,
        bottom,
        right,
    }
}

fn setup(
    options: TrackerOptions,
) -> (
    Rc<FakeScheduler>,
    Rc<FakeWindow>,
    PositionTracker<FakeElement>,
) {
    let scheduler = Rc::new(FakeScheduler::default());
    let window = Rc::new(FakeWindow::default());
    let tracker = PositionTracker::new(scheduler.clone(), window.clone(), options);
    (scheduler, window, tracker)
}

fn counting_coalescer(scheduler: &Rc<FakeScheduler>) -> (FrameCoalescer, Rc<Cell<usize>>) {
    let runs = Rc::new(Cell::new(0usize));
    let coalescer = FrameCoalescer::new(scheduler.clone(), {
        let runs = Rc::clone(&runs);
        move || {
            runs.set(runs.get() + 1);
            Ok(())
        }
    });
    (coalescer, runs)
}

#[test]
fn coalescer_runs_once_per_frame_for_any_number_of_calls() {
    let scheduler = Rc::new(FakeScheduler::default());
    let (coalescer, runs) = counting_coalescer(&scheduler);

    for n in 1..=8usize {
        let before = runs.get();
        for _ in 0..n {
            let _ = coalescer.invoke();
        }
        assert_eq!(scheduler.pending(), 1, "n={n}");
        assert!(coalescer.is_pending());

        scheduler.run_frame();
        assert_eq!(runs.get(), before + 1, "n={n}");
        assert!(!coalescer.is_pending());
    }
    assert_eq!(coalescer.executions(), 8);
}

#[test]
fn coalescer_callers_share_the_pending_completion() {
    let scheduler = Rc::new(FakeScheduler::default());
    let (coalescer, _runs) = counting_coalescer(&scheduler);

    let a = coalescer.invoke();
    let b = coalescer.invoke();
    let c = coalescer.clone().invoke();
    assert!(a.ptr_eq(&b));
    assert!(a.ptr_eq(&c));
    assert!(!a.is_resolved());

    scheduler.run_frame();
    assert_eq!(a.result(), Some(Ok(())));
    assert_eq!(c.result(), Some(Ok(())));

    let next = coalescer.invoke();
    assert!(!next.ptr_eq(&a));
    assert!(!next.is_resolved());
}

#[test]
fn coalescer_clears_its_window_before_running_the_operation() {
    let scheduler = Rc::new(FakeScheduler::default());
    let slot: Rc<RefCell<Option<FrameCoalescer>>> = Rc::new(RefCell::new(None));
    let seen_pending = Rc::new(Cell::new(true));
    let reentrant = Rc::new(RefCell::new(None::<Completion>));

    let coalescer = FrameCoalescer::new(scheduler.clone(), {
        let slot = Rc::clone(&slot);
        let seen_pending = Rc::clone(&seen_pending);
        let reentrant = Rc::clone(&reentrant);
        move || {
            let me = slot.borrow().clone().unwrap();
            seen_pending.set(me.is_pending());
            if reentrant.borrow().is_none() {
                *reentrant.borrow_mut() = Some(me.invoke());
            }
            Ok(())
        }
    });
    *slot.borrow_mut() = Some(coalescer.clone());

    let first = coalescer.invoke();
    assert_eq!(scheduler.run_frame(), 1);
    assert!(!seen_pending.get());
    assert!(first.is_resolved());

    // The reentrant call opened a new window for the next frame.
    let second = reentrant.borrow().clone().unwrap();
    assert!(!second.ptr_eq(&first));
    assert!(!second.is_resolved());
    assert_eq!(scheduler.pending(), 1);

    scheduler.run_frame();
    assert!(second.is_resolved());
    assert_eq!(coalescer.executions(), 2);

    slot.borrow_mut().take();
}

#[test]
fn coalescer_isolates_a_failing_operation() {
    let scheduler = Rc::new(FakeScheduler::default());
    let fail = Rc::new(Cell::new(true));
    let coalescer = FrameCoalescer::new(scheduler.clone(), {
        let fail = Rc::clone(&fail);
        move || {
            if fail.get() {
                Err(Error::operation("boom"))
            } else {
                Ok(())
            }
        }
    });

    let failed = coalescer.invoke();
    scheduler.run_frame();
    assert_eq!(failed.result(), Some(Err(Error::operation("boom"))));
    assert!(!coalescer.is_pending());

    fail.set(false);
    let ok = coalescer.invoke();
    assert_eq!(scheduler.pending(), 1);
    scheduler.run_frame();
    assert_eq!(ok.result(), Some(Ok(())));
    assert_eq!(coalescer.executions(), 2);
}

#[derive(Default)]
struct CountingWaker(AtomicUsize);

impl Wake for CountingWaker {
    fn wake(self: Arc<Self>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn completion_wakes_its_waiter_and_runs_callbacks() {
    let scheduler = Rc::new(FakeScheduler::default());
    let (coalescer, _runs) = counting_coalescer(&scheduler);

    let counter = Arc::new(CountingWaker::default());
    let waker = Waker::from(Arc::clone(&counter));
    let mut cx = Context::from_waker(&waker);

    let mut fut = coalescer.invoke();
    assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Pending);
    // Polling again with the same waker does not register it twice.
    assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Pending);
    assert_eq!(counter.0.load(Ordering::SeqCst), 0);

    let early = Rc::new(Cell::new(false));
    fut.on_resolve({
        let early = Rc::clone(&early);
        move |r| early.set(r.is_ok())
    });
    assert!(!early.get());

    scheduler.run_frame();
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    assert!(early.get());
    assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Ready(Ok(())));

    let late = Rc::new(Cell::new(false));
    fut.on_resolve({
        let late = Rc::clone(&late);
        move |_| late.set(true)
    });
    assert!(late.get());
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}

#[test]
fn observable_keeps_its_value_when_nothing_changed() {
    let cell = Observable::new(rect(1.0, 2.0, 2.0, 1.0, 3.0, 4.0));
    let notified = Rc::new(Cell::new(0usize));
    let _sub = cell.subscribe({
        let notified = Rc::clone(&notified);
        move |_| notified.set(notified.get() + 1)
    });

    let before = cell.get();
    assert!(!cell.replace_if_changed(rect(1.0, 2.0, 2.0, 1.0, 3.0, 4.0)));
    assert!(Rc::ptr_eq(&before, &cell.get()));
    assert_eq!(notified.get(), 0);

    assert!(cell.update(|r| Rect { right: r.right + 1.0, ..*r }));
    assert!(!Rc::ptr_eq(&before, &cell.get()));
    assert_eq!(cell.get().right, 5.0);
    assert_eq!(notified.get(), 1);
}

#[test]
fn observable_subscription_ends_on_drop_and_during_notify() {
    let cell = Observable::new(0u32);
    let hits = Rc::new(RefCell::new(Vec::new()));

    let second: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let _first = cell.subscribe({
        let hits = Rc::clone(&hits);
        let second = Rc::clone(&second);
        move |v| {
            hits.borrow_mut().push(("first", **v));
            // Unsubscribing a later subscriber mid-notify prevents its call.
            second.borrow_mut().take();
        }
    });
    *second.borrow_mut() = Some(cell.subscribe({
        let hits = Rc::clone(&hits);
        move |v| hits.borrow_mut().push(("second", **v))
    }));
    assert_eq!(cell.subscriber_count(), 2);

    cell.replace_if_changed(1);
    assert_eq!(*hits.borrow(), [("first", 1)]);
    assert_eq!(cell.subscriber_count(), 1);

    drop(_first);
    assert_eq!(cell.subscriber_count(), 0);
    cell.replace_if_changed(2);
    assert_eq!(hits.borrow().len(), 1);
}

#[test]
fn observable_write_during_notify_delivers_the_latest_value_last() {
    let cell = Observable::new(0u32);
    let a_saw = Rc::new(RefCell::new(Vec::new()));
    let b_saw = Rc::new(RefCell::new(Vec::new()));

    let _a = cell.subscribe({
        let cell = cell.clone();
        let a_saw = Rc::clone(&a_saw);
        move |v| {
            a_saw.borrow_mut().push(**v);
            if **v == 1 {
                cell.replace_if_changed(2);
            }
        }
    });
    let _b = cell.subscribe({
        let b_saw = Rc::clone(&b_saw);
        move |v| b_saw.borrow_mut().push(**v)
    });

    assert!(cell.replace_if_changed(1));
    assert_eq!(*cell.get(), 2);
    assert_eq!(*a_saw.borrow(), [1, 2]);
    assert_eq!(*b_saw.borrow(), [2]);
    assert_eq!(b_saw.borrow().last().copied(), Some(*cell.get()));
}

#[test]
fn nan_fields_always_count_as_changed() {
    let cell = Observable::new(Rect::default());
    let nan = Rect {
        x: f64::NAN,
        ..Rect::default()
    };
    assert!(cell.replace_if_changed(nan));
    assert!(cell.replace_if_changed(nan));
}

#[test]
fn rect_from_origin_size_fills_edges() {
    let r = Rect::from_origin_size(10.0, 20.0, 100.0, 100.0);
    assert_eq!(r, rect(10.0, 20.0, 20.0, 10.0, 120.0, 110.0));
    assert_eq!(r.width(), 100.0);
    assert_eq!(r.height(), 100.0);
}

#[test]
fn tracker_without_element_never_queries_or_listens() {
    let initial = rect(1.0, 1.0, 1.0, 1.0, 2.0, 2.0);
    let (scheduler, window, mut tracker) =
        setup(TrackerOptions::new().with_initial_rect(initial));

    tracker.set_element(None).unwrap();
    assert_eq!(tracker.state(), TrackerState::Unattached);
    assert!(tracker.request_update().is_none());
    assert_eq!(tracker.recompute_now(), Ok(false));
    assert_eq!(window.registrations.get(), 0);
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(*tracker.rect(), initial);
}

#[test]
fn tracker_measures_on_the_first_frame_after_attach() {
    let (scheduler, window, mut tracker) = setup(TrackerOptions::new());
    assert_eq!(*tracker.rect(), Rect::default());

    let el = FakeElement::new(rect(10.0, 20.0, 20.0, 10.0, 120.0, 110.0));
    tracker.set_element(Some(el.clone())).unwrap();
    assert!(tracker.is_attached());
    assert!(tracker.is_update_pending());
    assert_eq!(el.queries.get(), 0);
    assert_eq!(window.count(EventKind::Resize), 1);
    assert_eq!(window.count(EventKind::Scroll), 1);
    assert_eq!(
        window.options_for(EventKind::Scroll),
        Some(ListenerOptions::PASSIVE)
    );
    assert_eq!(
        window.options_for(EventKind::Resize),
        Some(ListenerOptions::default())
    );

    scheduler.run_frame();
    assert_eq!(el.queries.get(), 1);
    assert_eq!(*tracker.rect(), rect(10.0, 20.0, 20.0, 10.0, 120.0, 110.0));
}

#[test]
fn tracker_only_notifies_on_real_changes() {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let (scheduler, window, mut tracker) = setup(TrackerOptions::new().with_on_change({
        let changes = Rc::clone(&changes);
        move |r: &Rect| changes.borrow_mut().push(*r)
    }));

    let el = FakeElement::new(rect(10.0, 20.0, 20.0, 10.0, 120.0, 110.0));
    tracker.attach(el.clone()).unwrap();
    scheduler.run_frame();
    let held = tracker.rect();

    window.dispatch(EventKind::Scroll);
    scheduler.run_frame();
    assert_eq!(el.queries.get(), 2);
    assert!(Rc::ptr_eq(&held, &tracker.rect()));
    assert_eq!(changes.borrow().len(), 1);

    el.rect.set(rect(10.0, 5.0, 5.0, 10.0, 105.0, 110.0));
    window.dispatch(EventKind::Resize);
    scheduler.run_frame();
    assert_eq!(*tracker.rect(), rect(10.0, 5.0, 5.0, 10.0, 105.0, 110.0));
    assert_eq!(changes.borrow().len(), 2);
    assert_eq!(changes.borrow()[1], rect(10.0, 5.0, 5.0, 10.0, 105.0, 110.0));
}

#[test]
fn tracker_keeps_one_listener_pair_across_element_changes() {
    let (scheduler, window, mut tracker) = setup(TrackerOptions::new());
    let elements: Vec<Rc<FakeElement>> = (0..4)
        .map(|i| FakeElement::new(Rect::from_origin_size(i as f64, 0.0, 1.0, 1.0)))
        .collect();

    for round in 0..3 {
        for el in &elements {
            tracker.set_element(Some(el.clone())).unwrap();
            assert!(window.count(EventKind::Resize) <= 1, "round={round}");
            assert!(window.count(EventKind::Scroll) <= 1, "round={round}");
            // Same element again is a no-op.
            tracker.set_element(Some(el.clone())).unwrap();
            assert_eq!(window.count(EventKind::Resize), 1);
            scheduler.run_frame();
        }
        tracker.set_element(None).unwrap();
        assert_eq!(window.count(EventKind::Resize), 0);
        assert_eq!(window.count(EventKind::Scroll), 0);
    }
    assert_eq!(window.registrations.get(), 3 * 4 * 2);
}

#[test]
fn tracker_ignores_frames_scheduled_before_detach() {
    let (scheduler, _window, mut tracker) = setup(TrackerOptions::new());
    let old = FakeElement::new(rect(1.0, 1.0, 1.0, 1.0, 2.0, 2.0));
    let new = FakeElement::new(rect(5.0, 5.0, 5.0, 5.0, 6.0, 6.0));

    tracker.attach(old.clone()).unwrap();
    tracker.attach(new.clone()).unwrap();
    assert_eq!(scheduler.pending(), 2);

    scheduler.run_frame();
    assert_eq!(old.queries.get(), 0);
    assert_eq!(new.queries.get(), 1);
    assert_eq!(*tracker.rect(), rect(5.0, 5.0, 5.0, 5.0, 6.0, 6.0));

    tracker.detach();
    assert_eq!(tracker.state(), TrackerState::Unattached);
    assert_eq!(*tracker.rect(), rect(5.0, 5.0, 5.0, 5.0, 6.0, 6.0));
}

#[test]
fn tracker_rolls_back_when_a_listener_is_refused() {
    let (scheduler, window, mut tracker) = setup(TrackerOptions::new());
    window.refuse.set(Some(EventKind::Scroll));

    let el = FakeElement::new(rect(1.0, 1.0, 1.0, 1.0, 2.0, 2.0));
    let err = tracker.set_element(Some(el.clone())).unwrap_err();
    assert_eq!(err, Error::listener(EventKind::Scroll, "refused"));
    assert!(err.to_string().contains("scroll"));
    assert!(!tracker.is_attached());
    assert_eq!(window.count(EventKind::Resize), 0);

    scheduler.run_frame();
    assert_eq!(el.queries.get(), 0);
    assert_eq!(*tracker.rect(), Rect::default());
}

#[test]
fn tracker_reports_geometry_failures_through_the_completion() {
    let (scheduler, _window, mut tracker) = setup(TrackerOptions::new());
    let el = FakeElement::new(rect(1.0, 1.0, 1.0, 1.0, 2.0, 2.0));
    tracker.attach(el.clone()).unwrap();
    scheduler.run_frame();

    el.detached.set(true);
    let completion = tracker.request_update().unwrap();
    scheduler.run_frame();
    assert_eq!(completion.result(), Some(Err(Error::Detached)));
    assert_eq!(tracker.recompute_now(), Err(Error::Detached));
    assert_eq!(*tracker.rect(), rect(1.0, 1.0, 1.0, 1.0, 2.0, 2.0));

    el.detached.set(false);
    el.rect.set(rect(3.0, 3.0, 3.0, 3.0, 4.0, 4.0));
    assert_eq!(tracker.recompute_now(), Ok(true));
    assert_eq!(tracker.recompute_now(), Ok(false));
}

#[test]
fn tracker_set_options_reattaches_with_new_listener_flags() {
    let (scheduler, window, mut tracker) = setup(TrackerOptions::new());
    let el = FakeElement::new(rect(1.0, 1.0, 1.0, 1.0, 2.0, 2.0));
    tracker.attach(el.clone()).unwrap();
    scheduler.run_frame();

    tracker
        .set_options(
            tracker
                .options()
                .clone()
                .with_listen_scroll(false)
                .with_passive_scroll(false),
        )
        .unwrap();
    assert!(tracker.is_attached());
    assert!(Rc::ptr_eq(tracker.element().unwrap(), &el));
    assert_eq!(window.count(EventKind::Resize), 1);
    assert_eq!(window.count(EventKind::Scroll), 0);
    assert_eq!(window.dispatch(EventKind::Scroll), 0);
}

#[test]
fn dropping_the_tracker_removes_its_listeners() {
    let (scheduler, window, mut tracker) = setup(TrackerOptions::new());
    let el = FakeElement::new(rect(1.0, 1.0, 1.0, 1.0, 2.0, 2.0));
    tracker.attach(el.clone()).unwrap();
    let sub = tracker.subscribe(|_| {});
    assert_eq!(tracker.subscriber_count(), 1);
    sub.unsubscribe();
    assert_eq!(tracker.subscriber_count(), 0);

    drop(tracker);
    assert_eq!(window.count(EventKind::Resize), 0);
    assert_eq!(window.count(EventKind::Scroll), 0);

    // The already-scheduled frame still fires, harmlessly.
    assert_eq!(scheduler.run_frame(), 1);
    assert_eq!(el.queries.get(), 0);
}

#[test]
fn on_change_can_be_cleared_without_naming_a_closure_type() {
    let calls = Rc::new(Cell::new(0usize));
    let options = TrackerOptions::new().with_on_change({
        let calls = Rc::clone(&calls);
        move |_: &Rect| calls.set(calls.get() + 1)
    });
    assert!(options.on_change.is_some());

    let (scheduler, _window, mut tracker) = setup(options.without_on_change());
    assert_eq!(tracker.subscriber_count(), 0);

    let el = FakeElement::new(rect(1.0, 1.0, 1.0, 1.0, 2.0, 2.0));
    tracker.attach(el).unwrap();
    scheduler.run_frame();
    assert_eq!(*tracker.rect(), rect(1.0, 1.0, 1.0, 1.0, 2.0, 2.0));
    assert_eq!(calls.get(), 0);
}

#[test]
fn consumers_only_observe_the_rect_written_by_geometry_queries() {
    let (scheduler, _window, mut tracker) =
        setup(TrackerOptions::new().with_on_change(|_: &Rect| {}));
    assert_eq!(tracker.subscriber_count(), 1);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sub = tracker.subscribe({
        let seen = Rc::clone(&seen);
        move |r| seen.borrow_mut().push(**r)
    });
    assert_eq!(tracker.subscriber_count(), 2);

    let el = FakeElement::new(rect(4.0, 4.0, 4.0, 4.0, 8.0, 8.0));
    tracker.attach(el.clone()).unwrap();
    scheduler.run_frame();
    assert_eq!(*seen.borrow(), [rect(4.0, 4.0, 4.0, 4.0, 8.0, 8.0)]);
    assert_eq!(el.queries.get(), 1);

    sub.unsubscribe();
    assert_eq!(tracker.subscriber_count(), 1);
}
