use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::AbortHandle;

use super::{OneShotTimer, TimerCallback};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokioTimerHandle(u64);

/// Native host that runs each armed timer as a `spawn_local` task.
///
/// # Panics
///
/// [`OneShotTimer::arm`] panics when called outside a [`tokio::task::LocalSet`], because the
/// callbacks are not `Send`.
#[derive(Debug, Clone, Default)]
pub struct TokioTimer {
    tasks: Rc<RefCell<LocalTasks>>,
}

#[derive(Debug, Default)]
struct LocalTasks {
    last_handle: u64,
    armed: HashMap<u64, AbortHandle>,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().armed.len()
    }
}

impl OneShotTimer for TokioTimer {
    type Handle = TokioTimerHandle;

    fn arm(&self, callback: TimerCallback, delay: Duration) -> Result<TokioTimerHandle> {
        let handle = {
            let mut tasks = self.tasks.borrow_mut();
            tasks.last_handle += 1;
            tasks.last_handle
        };

        let tasks = Rc::clone(&self.tasks);
        let join = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            tasks.borrow_mut().armed.remove(&handle);
            callback();
        });

        self.tasks
            .borrow_mut()
            .armed
            .insert(handle, join.abort_handle());
        Ok(TokioTimerHandle(handle))
    }

    fn cancel(&self, handle: TokioTimerHandle) {
        let task = self.tasks.borrow_mut().armed.remove(&handle.0);
        if let Some(task) = task {
            task.abort();
        }
    }
}
