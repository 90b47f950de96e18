//! Structured notification channel.
//!
//! The session reports human-readable status to an injected sink instead of
//! popping modal dialogs: recovery outcomes, connection downgrades, and
//! submission rejections all arrive here. Callers that want the old
//! fire-and-forget behavior use [`TracingSink`]; tests use [`MemorySink`].

use std::fmt;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Everything the session reports out-of-band.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The remote system could not be reached at open; the session is
    /// permanently offline.
    ConnectFailed { reason: String },
    /// Error recovery could not run; the session stays usable.
    RecoveryUnavailable { reason: String },
    Recovery(RecoveryNotice),
    /// The host rejected an invoice submission. Reported before the
    /// structured error is raised to the caller.
    SubmitRejected {
        status_code: i32,
        status_message: String,
    },
}

/// Outcomes of the error-recovery handshake.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryNotice {
    IdMismatch,
    ChecksumFailed,
    NoStoredResponse,
    IdTooLong,
    StoreFailed,
    /// The unacknowledged request was processed successfully.
    LastRequestSucceeded { txn_number: Option<i64> },
    /// Processed with a warning; treated as success.
    LastRequestWarned,
    /// The stored request had failed; it will be re-issued.
    LastRequestFailed,
    /// The saved request was re-issued and committed.
    Resubmitted { txn_number: Option<i64> },
    /// Recovery is complete; the current transaction may proceed.
    Proceeding,
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Self::ConnectFailed { .. }
            | Self::RecoveryUnavailable { .. }
            | Self::SubmitRejected { .. } => Severity::Error,
            Self::Recovery(recovery) => match recovery {
                RecoveryNotice::IdMismatch
                | RecoveryNotice::ChecksumFailed
                | RecoveryNotice::NoStoredResponse
                | RecoveryNotice::IdTooLong
                | RecoveryNotice::StoreFailed
                | RecoveryNotice::LastRequestFailed => Severity::Error,
                _ => Severity::Info,
            },
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed { reason } => {
                write!(f, "Cannot connect to the accounting system: {reason}")
            }
            Self::RecoveryUnavailable { reason } => {
                write!(f, "Error recovery did not succeed: {reason}")
            }
            Self::SubmitRejected {
                status_code,
                status_message,
            } => write!(
                f,
                "Unsuccessful response when saving invoice: {status_code} {status_message}"
            ),
            Self::Recovery(recovery) => recovery.fmt(f),
        }
    }
}

impl fmt::Display for RecoveryNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdMismatch => write!(
                f,
                "The old message set ID does not match any stored IDs and no new message set ID is provided."
            ),
            Self::ChecksumFailed => write!(
                f,
                "Invalid checksum. The new message set ID matches the currently stored ID but the checksum fails."
            ),
            Self::NoStoredResponse => write!(f, "No stored response was found."),
            Self::IdTooLong => write!(
                f,
                "Invalid message set ID, greater than 24 characters was given."
            ),
            Self::StoreFailed => write!(f, "Unable to store response."),
            Self::LastRequestSucceeded { txn_number: Some(n) } => write!(
                f,
                "Last request was processed successfully. Transaction number = {n}"
            ),
            Self::LastRequestSucceeded { txn_number: None } => {
                write!(f, "Last request was processed successfully.")
            }
            Self::LastRequestWarned => write!(
                f,
                "There was a warning but the last request was processed successfully."
            ),
            Self::LastRequestFailed => write!(f, "Error processing last request."),
            Self::Resubmitted { txn_number: Some(n) } => write!(
                f,
                "The saved request has been successfully submitted. Transaction number = {n}"
            ),
            Self::Resubmitted { txn_number: None } => {
                write!(f, "The saved request has been successfully submitted.")
            }
            Self::Proceeding => write!(f, "Proceeding with current transaction."),
        }
    }
}

/// Sink for session notifications.
pub trait NotificationSink {
    fn notify(&self, notice: Notice);
}

/// Default sink: forwards notices to `tracing` at their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notice: Notice) {
        match notice.severity() {
            Severity::Info => tracing::info!(target: "qbx.session", "{notice}"),
            Severity::Error => tracing::error!(target: "qbx.session", "{notice}"),
        }
    }
}

/// Test sink that records every notice.
#[derive(Debug, Default)]
pub struct MemorySink {
    notices: Mutex<Vec<Notice>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn contains(&self, notice: &Notice) -> bool {
        self.notices.lock().iter().any(|n| n == notice)
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<S> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}
