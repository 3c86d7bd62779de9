//! The waiting-interval scheduler.
//!
//! `setInterval` queues the next run whether or not the previous one finished. A waiting interval
//! instead arms a single one-shot timer, and only arms the next one after the handler has
//! returned. Firings of one interval therefore never overlap or pile up behind a slow handler or
//! a throttled host, and the gap before each firing comes from a caller-supplied
//! [`DelayList`](crate::DelayList) rather than a fixed period.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::delay::{take_next_delay, DelayList};
use crate::host::OneShotTimer;
use crate::registry::{IntervalId, Registry};
use crate::{HandlerError, Result};

/// What an interval handler may return.
///
/// `()` always continues. `Err` halts the interval: it is not re-armed, and its registry entry
/// stays until [`WaitingIntervals::cancel`] is called.
pub trait FiringOutcome {
    fn into_result(self) -> std::result::Result<(), HandlerError>;
}

impl FiringOutcome for () {
    fn into_result(self) -> std::result::Result<(), HandlerError> {
        Ok(())
    }
}

impl<E: fmt::Display> FiringOutcome for std::result::Result<(), E> {
    fn into_result(self) -> std::result::Result<(), HandlerError> {
        self.map_err(|err| HandlerError(err.to_string()))
    }
}

type Handler<A> = Box<dyn FnMut(&A) -> std::result::Result<(), HandlerError>>;

/// Everything one interval owns across re-arms. Moved from each host callback into the next.
struct Task<A, D> {
    handler: Handler<A>,
    args: A,
    delays: D,
}

struct Inner<T: OneShotTimer> {
    timer: T,
    registry: RefCell<Registry<T::Handle>>,
    last_id: Cell<u64>,
}

impl<T: OneShotTimer> Inner<T> {
    fn allocate_id(&self) -> IntervalId {
        let next = self.last_id.get() + 1;
        self.last_id.set(next);
        IntervalId::from_raw(next)
    }

    fn is_registered(&self, id: IntervalId) -> bool {
        self.registry.borrow().contains(id)
    }
}

impl<T: OneShotTimer> Drop for Inner<T> {
    fn drop(&mut self) {
        for (_, handle) in self.registry.get_mut().drain() {
            self.timer.cancel(handle);
        }
    }
}

/// Registry of waiting intervals over one host timer.
///
/// Clones share the registry and the id counter. Dropping the last clone cancels every armed
/// timer; callbacks that still reach the host afterwards do nothing.
pub struct WaitingIntervals<T: OneShotTimer> {
    inner: Rc<Inner<T>>,
}

impl<T: OneShotTimer> Clone for WaitingIntervals<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: OneShotTimer + fmt::Debug> fmt::Debug for WaitingIntervals<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitingIntervals")
            .field("timer", &self.inner.timer)
            .field("active", &self.inner.registry.borrow().len())
            .field("last_id", &self.inner.last_id.get())
            .finish()
    }
}

impl<T: OneShotTimer + 'static> WaitingIntervals<T> {
    pub fn new(timer: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                timer,
                registry: RefCell::new(Registry::new()),
                last_id: Cell::new(0),
            }),
        }
    }

    pub fn timer(&self) -> &T {
        &self.inner.timer
    }

    /// Schedules `handler` to run repeatedly, waiting for each delay taken from `delays`.
    ///
    /// The id is returned before anything fires. On every firing `handler` receives `args`; once
    /// it returns, the next timer is armed with the next delay (see
    /// [`take_next_delay`](crate::take_next_delay)). `delays` is consumed in place, so a caller
    /// sharing it (e.g. through a [`DelaySequence`](crate::DelaySequence) clone) sees it shrink.
    ///
    /// Every call allocates a fresh id, even one that fails. Fails with
    /// [`IntervalError::EmptyDelays`](crate::IntervalError::EmptyDelays) if `delays` is empty, or
    /// with the host's error if the first timer cannot be armed; nothing is registered then.
    pub fn schedule<F, A, D, R>(&self, handler: F, delays: D, args: A) -> Result<IntervalId>
    where
        F: FnMut(&A) -> R + 'static,
        R: FiringOutcome,
        A: 'static,
        D: DelayList + 'static,
    {
        let id = self.inner.allocate_id();

        let mut handler = handler;
        let mut task = Task {
            handler: Box::new(move |args: &A| handler(args).into_result()),
            args,
            delays,
        };

        let delay = take_next_delay(&mut task.delays)?;
        arm(&self.inner, id, task, delay)?;
        debug!(interval = %id, ?delay, "scheduled waiting interval");
        Ok(id)
    }

    /// Cancels the armed timer for `id` and forgets the interval.
    ///
    /// Unknown and already-cancelled ids are ignored; the caller cannot tell the cases apart.
    pub fn cancel(&self, id: IntervalId) {
        let handle = self.inner.registry.borrow_mut().remove(id);
        if let Some(handle) = handle {
            self.inner.timer.cancel(handle);
            debug!(interval = %id, "cancelled waiting interval");
        }
    }

    /// Whether `id` still has a registry entry. Halted intervals stay registered until cancelled.
    pub fn is_scheduled(&self, id: IntervalId) -> bool {
        self.inner.is_registered(id)
    }

    /// Number of registered intervals.
    pub fn len(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.borrow().is_empty()
    }
}

fn arm<T, A, D>(
    inner: &Rc<Inner<T>>,
    id: IntervalId,
    task: Task<A, D>,
    delay: Duration,
) -> Result<()>
where
    T: OneShotTimer + 'static,
    A: 'static,
    D: DelayList + 'static,
{
    let weak = Rc::downgrade(inner);
    let handle = inner
        .timer
        .arm(Box::new(move || fire(weak, id, task)), delay)?;
    inner.registry.borrow_mut().insert(id, handle);
    trace!(interval = %id, ?delay, ?handle, "armed");
    Ok(())
}

fn fire<T, A, D>(inner: Weak<Inner<T>>, id: IntervalId, mut task: Task<A, D>)
where
    T: OneShotTimer + 'static,
    A: 'static,
    D: DelayList + 'static,
{
    let Some(inner) = inner.upgrade() else {
        return;
    };
    // A host may dispatch a callback it had already dequeued when the interval was cancelled.
    if !inner.is_registered(id) {
        trace!(interval = %id, "dropping firing of a cancelled interval");
        return;
    }

    trace!(interval = %id, "firing");
    if let Err(err) = (task.handler)(&task.args) {
        warn!(interval = %id, "{err}; interval halted");
        return;
    }

    if !inner.is_registered(id) {
        debug!(interval = %id, "interval cancelled by its own handler");
        return;
    }
    if task.delays.is_empty() {
        return;
    }

    let delay = match take_next_delay(&mut task.delays) {
        Ok(delay) => delay,
        Err(err) => {
            warn!(interval = %id, "{err}; interval halted");
            return;
        }
    };
    if let Err(err) = arm(&inner, id, task, delay) {
        warn!(interval = %id, "failed to re-arm: {err}; interval halted");
    }
}
