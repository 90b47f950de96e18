// qbx: session client for a desktop accounting product's local automation
// channel.
//
// The session translates domain objects (customers, invoices) into versioned
// message sets, submits them over the channel, and recovers state after
// partial failures. Wire types live in `qbx-protocol`.

pub mod error;
pub mod model;
pub mod notify;
pub mod session;
pub mod transport;
pub mod version;

pub use error::{Error, Result};
pub use model::{Address, Customer, InvoiceLine};
pub use notify::{MemorySink, Notice, NotificationSink, RecoveryNotice, Severity, TracingSink};
pub use session::{Customers, Session, SessionConfig};
pub use transport::{FakeTransport, PipeTransport, Transport, TransportError};

/// Sentinel returned by write operations on an offline session.
pub const OFFLINE: &str = "OFFLINE";

/// Sentinel returned when no submitted invoice resolves to a numeric
/// reference number.
pub const NOT_AVAILABLE: &str = "n/a";
