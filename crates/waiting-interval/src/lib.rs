//! Recurring callbacks driven by a sequence of delays, without overlapping runs.
//!
//! A waiting interval behaves like `setInterval` with two differences:
//!
//! - the next run is only armed after the handler returns, so a slow handler or a throttled host
//!   delays the schedule instead of queueing runs behind each other;
//! - the gap before each run is taken from a caller-supplied delay list, consumed from the end and
//!   repeating its last element. `[16, 8, 4, 2]` yields `2, 4, 8, 16, 16, 16, ...`.
//!
//! ```ignore
//! let timer = ManualTimer::new();
//! let intervals = WaitingIntervals::new(timer.clone());
//! let id = intervals.schedule(|_: &()| poll(), DelaySequence::from_millis([16, 8, 4, 2]), ())?;
//! timer.advance(Duration::from_millis(14)); // fires at 2, 6 and 14
//! intervals.cancel(id);
//! ```
//!
//! Timing itself is delegated to a [`host::OneShotTimer`]: `setTimeout` on wasm32
//! ([`host::BrowserTimer`]), Tokio local tasks natively ([`host::TokioTimer`]), or a virtual clock
//! ([`host::ManualTimer`]).

mod delay;
mod error;
pub mod host;
mod registry;
mod scheduler;

#[cfg(target_arch = "wasm32")]
mod web;

pub use crate::delay::{take_next_delay, DelayList, DelaySequence};
pub use crate::error::{HandlerError, IntervalError, Result};
pub use crate::registry::{IntervalId, Registry};
pub use crate::scheduler::{FiringOutcome, WaitingIntervals};

#[cfg(target_arch = "wasm32")]
pub use crate::web::{
    clear_waiting_interval, clear_waiting_interval_js, set_waiting_interval,
    set_waiting_interval_js, JsDelays,
};
