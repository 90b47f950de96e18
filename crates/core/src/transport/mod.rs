//! Automation-channel transport abstraction.
//!
//! The session talks to the accounting product through this trait: a
//! blocking, exclusively owned handle covering the connection lifecycle, the
//! message-set exchange, and the host-side error-recovery surface. Exactly
//! one implementation is live per session; the session acquires it at open
//! and releases it once at disposal.

use qbx_protocol::{RecoveryStatus, RequestSet, ResponseSet};

mod fake;
mod pipe;

pub use fake::{FakeTransport, FakeTransportBuilder, FakeTransportController};
pub use pipe::PipeTransport;

/// Failures in the underlying channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The channel could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The remote side reported a channel-level failure.
    #[error("channel error: {0}")]
    Remote(String),

    /// The remote side closed the channel.
    #[error("channel closed")]
    Closed,
}

/// Blocking surface of the local automation channel.
///
/// Every call blocks the calling thread until the remote system responds;
/// there is no cancellation or timeout at this layer.
pub trait Transport {
    /// Establishes the transport connection under the caller's application
    /// identity.
    fn open_connection(&mut self, app_id: &str, app_name: &str) -> Result<(), TransportError>;

    /// Begins the logical session on an open connection.
    fn begin_session(&mut self) -> Result<(), TransportError>;

    /// Ends the logical session.
    fn end_session(&mut self) -> Result<(), TransportError>;

    /// Closes the transport connection.
    fn close_connection(&mut self) -> Result<(), TransportError>;

    /// Submits one request set and blocks for its response set.
    fn do_requests(&mut self, set: &RequestSet) -> Result<ResponseSet, TransportError>;

    /// Registers the recovery identifier the host uses to key the saved
    /// message set.
    fn set_recovery_id(&mut self, id: &str) -> Result<(), TransportError>;

    /// Whether the host holds recovery information for the registered
    /// identifier.
    fn has_recovery_info(&mut self) -> Result<bool, TransportError>;

    /// Fetches the host-recorded recovery status for the last message set.
    fn recovery_status(&mut self) -> Result<RecoveryStatus, TransportError>;

    /// Fetches the last message set exactly as the host saved it.
    fn saved_request(&mut self) -> Result<RequestSet, TransportError>;

    /// Clears the recovery marker for the registered identifier.
    fn clear_recovery(&mut self) -> Result<(), TransportError>;
}
