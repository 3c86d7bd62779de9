//! Delay sequences and the tail-consumption policy that drives re-arming.
//!
//! A waiting interval does not copy the delays it is given: every firing consumes the sequence
//! *in place*, popping from the end until a single element is left, which is then reused for every
//! later firing. `[16, 8, 4, 2]` therefore yields the delays `2, 4, 8, 16, 16, 16, ...` and leaves
//! the caller's sequence as `[16]`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::{IntervalError, Result};

/// Storage the consumption policy can drain from the tail.
pub trait DelayList {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns the last delay.
    fn pop_last(&mut self) -> Option<Duration>;

    /// Returns the first delay without removing it.
    fn first(&self) -> Option<Duration>;
}

impl DelayList for Vec<Duration> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn pop_last(&mut self) -> Option<Duration> {
        self.pop()
    }

    fn first(&self) -> Option<Duration> {
        self.as_slice().first().copied()
    }
}

/// Returns the delay for the next firing and shrinks `delays` accordingly.
///
/// With more than one element left the last one is removed and returned. With exactly one left it
/// is returned and kept, so it becomes the steady-state delay. The sequence never drops below one
/// element through this function.
///
/// Fails with [`IntervalError::EmptyDelays`] when `delays` is empty. The scheduler never reaches
/// this on its own re-arm path, but direct callers can.
pub fn take_next_delay<L: DelayList + ?Sized>(delays: &mut L) -> Result<Duration> {
    match delays.len() {
        0 => Err(IntervalError::EmptyDelays),
        1 => delays.first().ok_or(IntervalError::EmptyDelays),
        _ => delays.pop_last().ok_or(IntervalError::EmptyDelays),
    }
}

/// A delay list shared between the caller and a scheduled interval.
///
/// Cloning yields another handle to the *same* list, so a caller can keep one clone and observe
/// the interval consuming it.
#[derive(Debug, Clone, Default)]
pub struct DelaySequence(Rc<RefCell<Vec<Duration>>>);

impl DelaySequence {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self(Rc::new(RefCell::new(delays)))
    }

    pub fn from_millis(millis: impl IntoIterator<Item = u64>) -> Self {
        Self::new(millis.into_iter().map(Duration::from_millis).collect())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Copy of the delays currently left.
    pub fn snapshot(&self) -> Vec<Duration> {
        self.0.borrow().clone()
    }

    pub fn to_millis(&self) -> Vec<u64> {
        self.0
            .borrow()
            .iter()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .collect()
    }
}

impl From<Vec<Duration>> for DelaySequence {
    fn from(delays: Vec<Duration>) -> Self {
        Self::new(delays)
    }
}

impl DelayList for DelaySequence {
    fn len(&self) -> usize {
        DelaySequence::len(self)
    }

    fn pop_last(&mut self) -> Option<Duration> {
        self.0.borrow_mut().pop()
    }

    fn first(&self) -> Option<Duration> {
        self.0.borrow().as_slice().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn consumes_from_the_tail_then_repeats_the_last_element() {
        let mut delays = vec![ms(16), ms(8), ms(4), ms(2)];

        let taken: Vec<Duration> = (0..7)
            .map(|_| take_next_delay(&mut delays).unwrap())
            .collect();

        assert_eq!(
            taken,
            vec![ms(2), ms(4), ms(8), ms(16), ms(16), ms(16), ms(16)]
        );
        assert_eq!(delays, vec![ms(16)]);
    }

    #[test]
    fn length_never_drops_below_one() {
        let mut delays = vec![ms(5), ms(3)];
        for _ in 0..10 {
            take_next_delay(&mut delays).unwrap();
            assert!(!delays.is_empty());
        }
    }

    #[test]
    fn single_element_is_returned_without_mutation() {
        let mut delays = vec![ms(250)];
        assert_eq!(take_next_delay(&mut delays), Ok(ms(250)));
        assert_eq!(take_next_delay(&mut delays), Ok(ms(250)));
        assert_eq!(delays, vec![ms(250)]);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let mut delays: Vec<Duration> = Vec::new();
        assert_eq!(
            take_next_delay(&mut delays),
            Err(IntervalError::EmptyDelays)
        );
    }

    #[test]
    fn shared_sequence_is_consumed_in_place() {
        let caller = DelaySequence::from_millis([16, 8, 4, 2]);
        let mut consumer = caller.clone();

        assert_eq!(take_next_delay(&mut consumer), Ok(ms(2)));
        assert_eq!(take_next_delay(&mut consumer), Ok(ms(4)));

        assert_eq!(caller.to_millis(), vec![16, 8]);
        assert_eq!(caller.len(), 2);
    }

    #[test]
    fn shared_sequence_keeps_its_last_element() {
        let mut delays = DelaySequence::from_millis([40]);

        assert_eq!(DelayList::first(&delays), Some(ms(40)));
        assert_eq!(take_next_delay(&mut delays), Ok(ms(40)));
        assert_eq!(take_next_delay(&mut delays), Ok(ms(40)));
        assert_eq!(delays.to_millis(), vec![40]);
    }
}
