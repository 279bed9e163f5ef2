//! The closed status set surfaced by every fallible operation in the
//! context tree, plus the owned error type that carries one.

use thiserror::Error;

/// Closed status set returned by every core operation (spec §7).
///
/// `Status` never appears as `Ok` inside [`MoldError`] — a successful
/// operation returns `Ok(value)` directly rather than wrapping a status
/// code, so every status reachable through an `Err` is a genuine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    InvalidArgument,
    InvalidContext,
    WrongContext,
    WrongValueType,
    ContextInWrongState,
    DestroyedContext,
    BadContextObject,
    TooFewArguments,
    Exists,
    ConflictingVersion,
    RestrictionViolated,
    MoldMissing,
    DefaultMissing,
    ElementsInvalid,
    FatalContext,
    NotExist,
    Exhausted,
    NoMemory,
    Permission,
    NoCanDo,
    Conflict,
    InternalError,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::InvalidArgument => "invalid argument",
            Status::InvalidContext => "invalid context",
            Status::WrongContext => "wrong context",
            Status::WrongValueType => "wrong value type",
            Status::ContextInWrongState => "context in wrong state",
            Status::DestroyedContext => "destroyed context",
            Status::BadContextObject => "bad context object",
            Status::TooFewArguments => "too few arguments",
            Status::Exists => "exists",
            Status::ConflictingVersion => "conflicting version",
            Status::RestrictionViolated => "restriction violated",
            Status::MoldMissing => "mold missing",
            Status::DefaultMissing => "default missing",
            Status::ElementsInvalid => "elements invalid",
            Status::FatalContext => "fatal context",
            Status::NotExist => "not exist",
            Status::Exhausted => "exhausted",
            Status::NoMemory => "no memory",
            Status::Permission => "permission",
            Status::NoCanDo => "no can do",
            Status::Conflict => "conflict",
            Status::InternalError => "internal error",
        };
        f.write_str(name)
    }
}

/// An error produced by a core operation: a [`Status`] plus a human
/// readable message. Contexts keep the message of their most recent
/// failure (spec §7, "every context may carry a formatted error message").
#[derive(Debug, Clone, Error)]
#[error("{status}: {message}")]
pub struct MoldError {
    pub status: Status,
    pub message: String,
}

impl MoldError {
    #[must_use]
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MoldError>;

/// Shorthand for building a [`MoldError`] with a formatted message.
macro_rules! bail {
    ($status:expr, $($arg:tt)*) => {
        return Err($crate::error::MoldError::new($status, format!($($arg)*)))
    };
}

pub(crate) use bail;
