//! Fake transport for unit testing the session without a live host.
//!
//! Provides an in-memory channel with scripted responses. Host queries are
//! answered automatically from a configured version list; every other
//! request set pops the next scripted response set. A controller inspects
//! recorded request sets and scripts the recovery surface.
//!
//! # Example
//!
//! ```ignore
//! let (transport, control) = FakeTransport::builder()
//!     .supported_versions(["1.0", "4.0"])
//!     .build();
//! control.enqueue(customer_list_response);
//! let mut session = Session::open(transport, config, sink);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use qbx_protocol::{
    HostRet, RecoveryStatus, Request, RequestSet, Response, ResponseDetail, ResponseSet,
};

use super::{Transport, TransportError};

#[derive(Default)]
struct Shared {
    connect_error: Option<String>,
    supported_versions: Vec<String>,
    queued: VecDeque<ResponseSet>,
    sent: Vec<RequestSet>,
    recovery_id: Option<String>,
    recovery: Option<(RecoveryStatus, Option<RequestSet>)>,
    connection_open: bool,
    session_open: bool,
    end_session_calls: usize,
    close_connection_calls: usize,
}

/// Builder for [`FakeTransport`].
#[derive(Default)]
pub struct FakeTransportBuilder {
    supported_versions: Vec<String>,
    connect_error: Option<String>,
}

impl FakeTransportBuilder {
    /// Versions the fake host reports to a host query.
    pub fn supported_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    /// Makes `open_connection` fail, simulating an unreachable host.
    pub fn refuse_connection(mut self, reason: impl Into<String>) -> Self {
        self.connect_error = Some(reason.into());
        self
    }

    pub fn build(self) -> (FakeTransport, FakeTransportController) {
        let shared = Arc::new(Mutex::new(Shared {
            connect_error: self.connect_error,
            supported_versions: self.supported_versions,
            ..Shared::default()
        }));
        (
            FakeTransport {
                shared: Arc::clone(&shared),
            },
            FakeTransportController { shared },
        )
    }
}

/// In-memory transport with scripted responses.
pub struct FakeTransport {
    shared: Arc<Mutex<Shared>>,
}

impl FakeTransport {
    pub fn builder() -> FakeTransportBuilder {
        FakeTransportBuilder::default()
    }
}

/// Controller for scripting the fake and inspecting what was sent.
pub struct FakeTransportController {
    shared: Arc<Mutex<Shared>>,
}

impl FakeTransportController {
    /// Queues the response set returned by the next non-host-query exchange.
    pub fn enqueue(&self, response: ResponseSet) {
        self.shared.lock().queued.push_back(response);
    }

    /// Queues a response set containing a single response.
    pub fn enqueue_single(&self, response: Response) {
        self.enqueue(ResponseSet {
            responses: vec![response],
        });
    }

    /// Every request set passed to `do_requests`, in order, host queries
    /// included.
    pub fn requests(&self) -> Vec<RequestSet> {
        self.shared.lock().sent.clone()
    }

    /// The recovery identifier the session registered, if any.
    pub fn recovery_id(&self) -> Option<String> {
        self.shared.lock().recovery_id.clone()
    }

    /// Scripts host-side recovery state for the next open.
    pub fn set_recovery(&self, status: RecoveryStatus, saved: Option<RequestSet>) {
        self.shared.lock().recovery = Some((status, saved));
    }

    /// Whether the host still holds recovery state.
    pub fn recovery_pending(&self) -> bool {
        self.shared.lock().recovery.is_some()
    }

    pub fn connection_open(&self) -> bool {
        self.shared.lock().connection_open
    }

    pub fn session_open(&self) -> bool {
        self.shared.lock().session_open
    }

    pub fn end_session_calls(&self) -> usize {
        self.shared.lock().end_session_calls
    }

    pub fn close_connection_calls(&self) -> usize {
        self.shared.lock().close_connection_calls
    }
}

impl Transport for FakeTransport {
    fn open_connection(&mut self, _app_id: &str, _app_name: &str) -> Result<(), TransportError> {
        let mut shared = self.shared.lock();
        if let Some(reason) = &shared.connect_error {
            return Err(TransportError::Connect(reason.clone()));
        }
        shared.connection_open = true;
        Ok(())
    }

    fn begin_session(&mut self) -> Result<(), TransportError> {
        let mut shared = self.shared.lock();
        if !shared.connection_open {
            return Err(TransportError::Remote("no open connection".to_string()));
        }
        shared.session_open = true;
        Ok(())
    }

    fn end_session(&mut self) -> Result<(), TransportError> {
        let mut shared = self.shared.lock();
        shared.session_open = false;
        shared.end_session_calls += 1;
        Ok(())
    }

    fn close_connection(&mut self) -> Result<(), TransportError> {
        let mut shared = self.shared.lock();
        shared.connection_open = false;
        shared.close_connection_calls += 1;
        Ok(())
    }

    fn do_requests(&mut self, set: &RequestSet) -> Result<ResponseSet, TransportError> {
        let mut shared = self.shared.lock();
        shared.sent.push(set.clone());

        // Host queries are answered from the configured version list so
        // every test doesn't have to script negotiation by hand.
        if let [Request::HostQuery] = set.requests.as_slice() {
            return Ok(ResponseSet {
                responses: vec![Response {
                    status_code: 0,
                    status_message: String::new(),
                    detail: Some(ResponseDetail::HostInfo(HostRet {
                        supported_qbxml_versions: shared.supported_versions.clone(),
                    })),
                }],
            });
        }

        shared
            .queued
            .pop_front()
            .ok_or_else(|| TransportError::Remote("no scripted response for request set".to_string()))
    }

    fn set_recovery_id(&mut self, id: &str) -> Result<(), TransportError> {
        self.shared.lock().recovery_id = Some(id.to_string());
        Ok(())
    }

    fn has_recovery_info(&mut self) -> Result<bool, TransportError> {
        Ok(self.shared.lock().recovery.is_some())
    }

    fn recovery_status(&mut self) -> Result<RecoveryStatus, TransportError> {
        self.shared
            .lock()
            .recovery
            .as_ref()
            .map(|(status, _)| status.clone())
            .ok_or_else(|| TransportError::Remote("no recovery status scripted".to_string()))
    }

    fn saved_request(&mut self) -> Result<RequestSet, TransportError> {
        self.shared
            .lock()
            .recovery
            .as_ref()
            .and_then(|(_, saved)| saved.clone())
            .ok_or_else(|| TransportError::Remote("no saved request scripted".to_string()))
    }

    fn clear_recovery(&mut self) -> Result<(), TransportError> {
        self.shared.lock().recovery = None;
        Ok(())
    }
}
