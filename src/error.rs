use std::error;
use std::fmt;
use std::result;

/// A type alias for results with this crate's compile-time error type.
pub type Result<T> = result::Result<T, Error>;

/// An error that occurred while compiling a state machine into a scanner.
///
/// Errors of this kind are only produced at compile time. Once a scanner has
/// been built, running it over input can never fail: every `(state, byte)`
/// pair has a defined transition, including the dead sink.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The kind of error that occurred.
///
/// Note that this enum may grow additional variants, so new variants are not
/// considered a breaking change.
#[derive(Clone, Debug)]
pub enum ErrorKind {
    /// Determinization exceeded the configured state ceiling. The limit that
    /// was in effect is attached. Either raise the limit or fall back to the
    /// slow scanner, which runs the machine without determinizing it.
    FsmTooLarge {
        /// The state ceiling that was in effect.
        limit: usize,
    },
    /// A relocatable transition table grew so large that a row offset no
    /// longer fits in an entry's shift field. Use the non-relocatable layout
    /// or the slow scanner instead.
    ScannerTooLarge,
    /// An operation would have produced a scanner tracking more patterns
    /// than its per-transition action word can encode.
    ActionOverflow {
        /// The number of patterns that would have been tracked.
        count: usize,
    },
    /// The product of two glued scanners exceeded the caller's state budget.
    /// Callers typically fall back to driving both scanners as a pair.
    GlueTooLarge {
        /// The state budget that was in effect.
        limit: usize,
    },
}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub(crate) fn fsm_too_large(limit: usize) -> Error {
        Error { kind: ErrorKind::FsmTooLarge { limit } }
    }

    pub(crate) fn scanner_too_large() -> Error {
        Error { kind: ErrorKind::ScannerTooLarge }
    }

    pub(crate) fn action_overflow(count: usize) -> Error {
        Error { kind: ErrorKind::ActionOverflow { count } }
    }

    pub(crate) fn glue_too_large(limit: usize) -> Error {
        Error { kind: ErrorKind::GlueTooLarge { limit } }
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::FsmTooLarge { limit } => write!(
                f,
                "determinization exceeded the state limit of {}",
                limit,
            ),
            ErrorKind::ScannerTooLarge => write!(
                f,
                "transition table too large for a relocatable shift field",
            ),
            ErrorKind::ActionOverflow { count } => write!(
                f,
                "scanner would track {} patterns, which exceeds the \
                 per-transition action limit of {}",
                count,
                crate::scanner::MAX_PATTERNS,
            ),
            ErrorKind::GlueTooLarge { limit } => write!(
                f,
                "glued scanner exceeded the product state limit of {}",
                limit,
            ),
        }
    }
}
