//! Page-wide waiting intervals for wasm32 builds, plus the JS-facing exports.
//!
//! Mirrors the classic browser helper: one registry per JS realm, ids handed out from a counter
//! that is never reset, and a JS `Array` of millisecond delays consumed in place.

use std::time::Duration;

use js_sys::{Array, Function};
use wasm_bindgen::prelude::*;

use crate::delay::DelayList;
use crate::host::browser::{describe_js_error, rethrow_after_callback};
use crate::host::BrowserTimer;
use crate::scheduler::{FiringOutcome, WaitingIntervals};
use crate::{IntervalId, Result};

thread_local! {
    static INTERVALS: WaitingIntervals<BrowserTimer> = WaitingIntervals::new(BrowserTimer::new());
}

/// [`WaitingIntervals::schedule`] on the page-wide registry.
pub fn set_waiting_interval<F, A, D, R>(handler: F, delays: D, args: A) -> Result<IntervalId>
where
    F: FnMut(&A) -> R + 'static,
    R: FiringOutcome,
    A: 'static,
    D: DelayList + 'static,
{
    INTERVALS.with(|intervals| intervals.schedule(handler, delays, args))
}

/// [`WaitingIntervals::cancel`] on the page-wide registry.
pub fn clear_waiting_interval(id: IntervalId) {
    INTERVALS.with(|intervals| intervals.cancel(id));
}

/// A JS array of millisecond delays, drained in place.
///
/// Entries that are not finite, non-negative numbers count as a zero delay, matching how
/// `setTimeout` treats them.
#[derive(Debug, Clone)]
pub struct JsDelays(Array);

impl JsDelays {
    pub fn new(delays: Array) -> Self {
        Self(delays)
    }

    pub fn array(&self) -> &Array {
        &self.0
    }
}

fn delay_from_js(value: JsValue) -> Duration {
    match value.as_f64() {
        Some(ms) if ms.is_finite() && ms > 0.0 => {
            Duration::from_secs_f64(ms.min(f64::from(i32::MAX)) / 1000.0)
        }
        _ => Duration::ZERO,
    }
}

impl DelayList for JsDelays {
    fn len(&self) -> usize {
        self.0.length() as usize
    }

    fn pop_last(&mut self) -> Option<Duration> {
        if self.0.length() == 0 {
            return None;
        }
        Some(delay_from_js(self.0.pop()))
    }

    fn first(&self) -> Option<Duration> {
        if self.0.length() == 0 {
            return None;
        }
        Some(delay_from_js(self.0.get(0)))
    }
}

/// `setWaitingInterval(handler, delays, args?)`.
///
/// `handler` is called with a single argument, a fresh copy of the `args` array (empty when
/// omitted), never with the elements spread. `delays` is mutated in place. If `handler` throws,
/// the interval stops firing but keeps its id registered until `clearWaitingInterval` is called,
/// and the exception is rethrown from the timer callback so the page reports it as uncaught.
///
/// Throws a `TypeError` when `args` is given but is not an array.
#[wasm_bindgen(js_name = setWaitingInterval)]
pub fn set_waiting_interval_js(
    handler: Function,
    delays: Array,
    args: JsValue,
) -> std::result::Result<f64, JsValue> {
    let args = if args.is_undefined() || args.is_null() {
        Array::new()
    } else {
        args.dyn_into::<Array>().map_err(|_| {
            JsValue::from(js_sys::TypeError::new(
                "setWaitingInterval: args must be an array",
            ))
        })?
    };
    let id = set_waiting_interval(
        move |args: &Array| -> std::result::Result<(), String> {
            let fresh = args.slice(0, args.length());
            handler
                .call1(&JsValue::UNDEFINED, &fresh)
                .map(drop)
                .map_err(|err| {
                    let message = describe_js_error(&err);
                    rethrow_after_callback(err);
                    message
                })
        },
        JsDelays::new(delays),
        args,
    )
    .map_err(|err| JsValue::from(js_sys::Error::new(&err.to_string())))?;
    Ok(id.get() as f64)
}

/// `clearWaitingInterval(id)`. Anything that is not a known id is ignored.
#[wasm_bindgen(js_name = clearWaitingInterval)]
pub fn clear_waiting_interval_js(id: JsValue) {
    let Some(raw) = id.as_f64() else {
        return;
    };
    if raw.is_finite() && raw >= 1.0 && raw.fract() == 0.0 && raw <= 9_007_199_254_740_991.0 {
        clear_waiting_interval(IntervalId::from_raw(raw as u64));
    }
}
