use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::{OneShotTimer, TimerCallback};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManualTimerHandle(u64);

/// Deterministic host driven by an explicit virtual clock.
///
/// Nothing fires until [`ManualTimer::advance`] (or [`ManualTimer::advance_to`]) moves the clock
/// past a deadline. Timers sharing a deadline fire in the order they were armed. Clones share the
/// same clock and queue.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Rc<RefCell<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    last_handle: u64,
    queue: BTreeMap<(Duration, u64), TimerCallback>,
    deadlines: HashMap<u64, Duration>,
    armed: Vec<Duration>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since construction.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of armed timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.state
            .borrow()
            .queue
            .keys()
            .next()
            .map(|&(deadline, _)| deadline)
    }

    /// Every delay passed to `arm`, in arming order.
    pub fn armed_delays(&self) -> Vec<Duration> {
        self.state.borrow().armed.clone()
    }

    /// Moves the clock forward by `by`, firing everything that comes due. Returns the number of
    /// callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        self.advance_to(target)
    }

    /// Moves the clock to `target` (never backwards), firing everything due at or before it.
    ///
    /// Callbacks armed while advancing fire in the same call if their deadline is within
    /// `target`, so a zero-delay timer that re-arms itself never returns control.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        while self.fire_next_due(target) {
            fired += 1;
        }

        let mut state = self.state.borrow_mut();
        if state.now < target {
            state.now = target;
        }
        fired
    }

    /// Fires the earliest armed timer, jumping the clock to its deadline. Returns `false` if
    /// nothing is armed.
    pub fn fire_next(&self) -> bool {
        self.fire_next_due(Duration::MAX)
    }

    fn fire_next_due(&self, limit: Duration) -> bool {
        let callback = {
            let mut state = self.state.borrow_mut();
            let Some(entry) = state.queue.first_entry() else {
                return false;
            };
            if entry.key().0 > limit {
                return false;
            }
            let ((deadline, handle), callback) = entry.remove_entry();
            state.deadlines.remove(&handle);
            state.now = state.now.max(deadline);
            callback
        };

        callback();
        true
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualTimer")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

impl OneShotTimer for ManualTimer {
    type Handle = ManualTimerHandle;

    fn arm(&self, callback: TimerCallback, delay: Duration) -> Result<ManualTimerHandle> {
        let mut state = self.state.borrow_mut();
        state.last_handle += 1;
        let handle = state.last_handle;
        let deadline = state.now.saturating_add(delay);

        state.queue.insert((deadline, handle), callback);
        state.deadlines.insert(handle, deadline);
        state.armed.push(delay);
        Ok(ManualTimerHandle(handle))
    }

    fn cancel(&self, handle: ManualTimerHandle) {
        let callback = {
            let mut state = self.state.borrow_mut();
            match state.deadlines.remove(&handle.0) {
                Some(deadline) => state.queue.remove(&(deadline, handle.0)),
                None => None,
            }
        };
        // Dropped outside the borrow: the callback may own state that touches this timer.
        drop(callback);
    }
}
