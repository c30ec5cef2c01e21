use thiserror::Error;

/// Rejected state machine transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkoutError {
    #[error("workout already started")]
    AlreadyStarted,

    #[error("workout is not in progress")]
    NotActive,

    #[error("{0} is a rest day, there is no workout to start")]
    RestDay(String),
}
