//! Host one-shot timer primitives.
//!
//! The scheduler never measures time itself. It asks a [`OneShotTimer`] to run a callback once
//! after a delay, and to forget a callback that has not run yet. In the browser that is
//! `setTimeout`/`clearTimeout`; on native targets a Tokio local task; in tests a virtual clock that
//! only moves when told to.

use std::fmt;
use std::time::Duration;

use crate::Result;

mod manual;
pub use manual::{ManualTimer, ManualTimerHandle};

#[cfg(all(feature = "tokio", not(target_arch = "wasm32")))]
mod native;
#[cfg(all(feature = "tokio", not(target_arch = "wasm32")))]
pub use native::{TokioTimer, TokioTimerHandle};

#[cfg(target_arch = "wasm32")]
pub(crate) mod browser;
#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserTimer, BrowserTimerHandle};

/// Work handed to the host, run at most once.
pub type TimerCallback = Box<dyn FnOnce()>;

/// A host capable of running a callback once after a delay.
///
/// Hosts are single-threaded and use interior mutability: callbacks routinely arm the next timer
/// while the host is still dispatching the current one, so neither method may hold internal
/// borrows while user code runs.
pub trait OneShotTimer {
    /// Opaque identifier of one armed timer. Not stable across re-arms.
    type Handle: Copy + Eq + fmt::Debug;

    /// Runs `callback` once, no earlier than `delay` from now. Never runs it synchronously.
    fn arm(&self, callback: TimerCallback, delay: Duration) -> Result<Self::Handle>;

    /// Drops a callback that has not fired yet. Unknown or already-fired handles are ignored.
    fn cancel(&self, handle: Self::Handle);
}
