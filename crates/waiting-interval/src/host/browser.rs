use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use super::{OneShotTimer, TimerCallback};
use crate::{IntervalError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrowserTimerHandle(i32);

impl BrowserTimerHandle {
    /// The id `setTimeout` returned.
    pub fn raw(self) -> i32 {
        self.0
    }
}

/// `setTimeout`/`clearTimeout` on the current global scope (window or worker).
///
/// Each armed timer owns a JS closure that is kept alive here until it fires or is cancelled.
#[derive(Clone, Default)]
pub struct BrowserTimer {
    closures: Rc<RefCell<ArmedClosures>>,
}

#[derive(Default)]
struct ArmedClosures {
    armed: HashMap<i32, Closure<dyn FnMut()>>,
    // The closure that fired most recently. It may still be on the JS stack when it asks to be
    // released, so it is only dropped once the next one fires.
    spent: Option<Closure<dyn FnMut()>>,
}

impl ArmedClosures {
    fn retire(&mut self, raw: i32) -> Option<Closure<dyn FnMut()>> {
        let closure = self.armed.remove(&raw);
        std::mem::replace(&mut self.spent, closure)
    }
}

impl BrowserTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.closures.borrow().armed.len()
    }
}

impl std::fmt::Debug for BrowserTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserTimer")
            .field("pending", &self.pending())
            .finish()
    }
}

enum GlobalScope {
    Window(web_sys::Window),
    Worker(web_sys::WorkerGlobalScope),
}

impl GlobalScope {
    fn current() -> Result<Self> {
        let global = js_sys::global();
        if let Some(window) = global.dyn_ref::<web_sys::Window>() {
            return Ok(Self::Window(window.clone()));
        }
        match global.dyn_into::<web_sys::WorkerGlobalScope>() {
            Ok(worker) => Ok(Self::Worker(worker)),
            Err(_) => Err(IntervalError::Host(
                "global scope is neither a Window nor a WorkerGlobalScope".into(),
            )),
        }
    }

    fn set_timeout(&self, handler: &js_sys::Function, millis: i32) -> Result<i32> {
        let res = match self {
            Self::Window(window) => {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(handler, millis)
            }
            Self::Worker(worker) => {
                worker.set_timeout_with_callback_and_timeout_and_arguments_0(handler, millis)
            }
        };
        res.map_err(|err| IntervalError::Host(describe_js_error(&err)))
    }

    fn clear_timeout(&self, raw: i32) {
        match self {
            Self::Window(window) => window.clear_timeout_with_handle(raw),
            Self::Worker(worker) => worker.clear_timeout_with_handle(raw),
        }
    }
}

thread_local! {
    static UNCAUGHT: RefCell<Option<JsValue>> = const { RefCell::new(None) };
}

/// Hands `err` back to the event loop once the current timer callback has finished, so it is
/// reported the way any exception thrown from a `setTimeout` callback is.
pub(crate) fn rethrow_after_callback(err: JsValue) {
    UNCAUGHT.with(|slot| *slot.borrow_mut() = Some(err));
}

fn take_uncaught() -> Option<JsValue> {
    UNCAUGHT.with(|slot| slot.borrow_mut().take())
}

fn delay_to_millis(delay: Duration) -> i32 {
    i32::try_from(delay.as_millis()).unwrap_or(i32::MAX)
}

pub(crate) fn describe_js_error(err: &JsValue) -> String {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return e.message().into();
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

impl OneShotTimer for BrowserTimer {
    type Handle = BrowserTimerHandle;

    fn arm(&self, callback: TimerCallback, delay: Duration) -> Result<BrowserTimerHandle> {
        let scope = GlobalScope::current()?;

        // The closure needs its own timeout id to release itself, which only exists once
        // `setTimeout` has returned.
        let id_slot = Rc::new(Cell::new(None::<i32>));
        let closures = Rc::clone(&self.closures);
        let fired_id = Rc::clone(&id_slot);
        let mut callback = Some(callback);
        let closure = Closure::<dyn FnMut()>::new(move || {
            if let Some(raw) = fired_id.get() {
                let previous = closures.borrow_mut().retire(raw);
                drop(previous);
            }
            if let Some(callback) = callback.take() {
                callback();
            }
            if let Some(err) = take_uncaught() {
                wasm_bindgen::throw_val(err);
            }
        });

        let raw = scope.set_timeout(closure.as_ref().unchecked_ref(), delay_to_millis(delay))?;
        id_slot.set(Some(raw));
        self.closures.borrow_mut().armed.insert(raw, closure);
        Ok(BrowserTimerHandle(raw))
    }

    fn cancel(&self, handle: BrowserTimerHandle) {
        let closure = self.closures.borrow_mut().armed.remove(&handle.0);
        if closure.is_none() {
            return;
        }
        match GlobalScope::current() {
            Ok(scope) => scope.clear_timeout(handle.0),
            Err(err) => tracing::warn!("failed to clear timeout {}: {err}", handle.0),
        }
        drop(closure);
    }
}
