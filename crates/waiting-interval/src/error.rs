pub type Result<T> = std::result::Result<T, IntervalError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    /// The delay-consumption policy was handed an empty sequence.
    #[error("delay sequence cannot be empty")]
    EmptyDelays,
    #[error("host timer failed: {0}")]
    Host(String),
}

/// Failure reported by an interval handler. Halts rescheduling for that interval.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("interval handler failed: {0}")]
pub struct HandlerError(pub String);
