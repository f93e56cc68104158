//! Save/delete notification hooks.
//!
//! A listener is connected to one [`Signal`] of one record type under a
//! dispatch uid. Connecting the same uid twice is a no-op, so callers can
//! wire listeners from code that may run more than once.

use docsync_types::Record;

/// Error type returned by listeners.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Point in a record's lifecycle at which listeners run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// After a record has been written
    PostSave,
    /// Before a record is removed
    PreDelete,
}

/// Notification handed to listeners.
#[derive(Debug, Clone, Copy)]
pub struct RecordEvent<'a> {
    pub signal: Signal,
    pub record: &'a Record,
    /// True when the save inserted a new record
    pub created: bool,
}

/// Receiver of record notifications.
pub trait RecordListener: Send + Sync {
    fn notify(&self, event: &RecordEvent<'_>) -> Result<(), ListenerError>;
}

impl<F> RecordListener for F
where
    F: Fn(&RecordEvent<'_>) -> Result<(), ListenerError> + Send + Sync,
{
    fn notify(&self, event: &RecordEvent<'_>) -> Result<(), ListenerError> {
        self(event)
    }
}
