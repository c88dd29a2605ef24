//! Results of interactive decisions.
//!
//! Locking a directory and restoring an autosave can both be handed to a
//! caller-supplied callback. The callback answers with a [`Response`]; the
//! operation reports back an [`Outcome`], where backing out is an ordinary
//! result rather than an error.

/// Answer given by a lock or restore callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Override the lock / restore the autosave.
    Accept,
    /// Keep the lock (open fails) / drop the autosave.
    Decline,
    /// Abort the whole operation without touching anything.
    Cancel,
}

impl Response {
    /// Maps a yes/no answer, `true` being [`Response::Accept`].
    pub fn from_bool(accept: bool) -> Self {
        if accept {
            Response::Accept
        } else {
            Response::Decline
        }
    }
}

/// Result of an operation the user may cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a canceled operation must be handled"]
pub enum Outcome<T> {
    /// The operation ran to completion.
    Completed(T),
    /// A callback answered [`Response::Cancel`]; nothing was changed.
    Canceled,
}

impl<T> Outcome<T> {
    pub fn is_canceled(&self) -> bool {
        matches!(self, Outcome::Canceled)
    }

    /// Converts into `Some(value)` on completion, `None` if canceled.
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Canceled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Canceled => Outcome::Canceled,
        }
    }
}
