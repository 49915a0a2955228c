use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session duration must be at least one minute")]
    InvalidDuration,
}
