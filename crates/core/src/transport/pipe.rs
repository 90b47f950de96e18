//! Pipe transport to a bridge process.
//!
//! The accounting product's automation interface is reachable only through a
//! vendor bridge executable. This transport spawns the bridge and speaks
//! newline-delimited JSON over its stdin/stdout: one request line, one reply
//! line, strictly in order. Replies carry `ok` plus either `result` or
//! `error`.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use qbx_protocol::{RecoveryStatus, RequestSet, ResponseSet};

use super::{Transport, TransportError};

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BridgeRequest<'a> {
    OpenConnection { app_id: &'a str, app_name: &'a str },
    BeginSession,
    EndSession,
    CloseConnection,
    DoRequests { set: &'a RequestSet },
    SetRecoveryId { id: &'a str },
    HasRecoveryInfo,
    RecoveryStatus,
    SavedRequest,
    ClearRecovery,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct BridgeReply<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

/// Blocking JSON-lines transport over a bridge child process.
pub struct PipeTransport {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl PipeTransport {
    /// Spawns the bridge executable and attaches to its pipes.
    pub fn spawn(program: &str, args: &[&str]) -> Result<Self, TransportError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| TransportError::Connect(format!("failed to spawn {program}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Connect("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Connect("bridge stdout unavailable".to_string()))?;

        debug!(target: "qbx.transport", program, "bridge process spawned");

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn exchange<T: DeserializeOwned>(
        &mut self,
        request: &BridgeRequest<'_>,
    ) -> Result<BridgeReply<T>, TransportError> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;

        let mut reply = String::new();
        let read = self.stdout.read_line(&mut reply)?;
        if read == 0 {
            return Err(TransportError::Closed);
        }
        Ok(serde_json::from_str(&reply)?)
    }

    fn call<T: DeserializeOwned>(
        &mut self,
        request: &BridgeRequest<'_>,
    ) -> Result<T, TransportError> {
        let reply: BridgeReply<T> = self.exchange(request)?;
        if reply.ok {
            reply
                .result
                .ok_or_else(|| TransportError::Remote("bridge reply missing result".to_string()))
        } else {
            Err(TransportError::Remote(
                reply
                    .error
                    .unwrap_or_else(|| "unspecified bridge error".to_string()),
            ))
        }
    }

    fn call_unit(&mut self, request: &BridgeRequest<'_>) -> Result<(), TransportError> {
        let reply: BridgeReply<serde_json::Value> = self.exchange(request)?;
        if reply.ok {
            Ok(())
        } else {
            Err(TransportError::Remote(
                reply
                    .error
                    .unwrap_or_else(|| "unspecified bridge error".to_string()),
            ))
        }
    }
}

impl Transport for PipeTransport {
    fn open_connection(&mut self, app_id: &str, app_name: &str) -> Result<(), TransportError> {
        self.call_unit(&BridgeRequest::OpenConnection { app_id, app_name })
    }

    fn begin_session(&mut self) -> Result<(), TransportError> {
        self.call_unit(&BridgeRequest::BeginSession)
    }

    fn end_session(&mut self) -> Result<(), TransportError> {
        self.call_unit(&BridgeRequest::EndSession)
    }

    fn close_connection(&mut self) -> Result<(), TransportError> {
        self.call_unit(&BridgeRequest::CloseConnection)
    }

    fn do_requests(&mut self, set: &RequestSet) -> Result<ResponseSet, TransportError> {
        self.call(&BridgeRequest::DoRequests { set })
    }

    fn set_recovery_id(&mut self, id: &str) -> Result<(), TransportError> {
        self.call_unit(&BridgeRequest::SetRecoveryId { id })
    }

    fn has_recovery_info(&mut self) -> Result<bool, TransportError> {
        self.call(&BridgeRequest::HasRecoveryInfo)
    }

    fn recovery_status(&mut self) -> Result<RecoveryStatus, TransportError> {
        self.call(&BridgeRequest::RecoveryStatus)
    }

    fn saved_request(&mut self) -> Result<RequestSet, TransportError> {
        self.call(&BridgeRequest::SavedRequest)
    }

    fn clear_recovery(&mut self) -> Result<(), TransportError> {
        self.call_unit(&BridgeRequest::ClearRecovery)
    }
}

impl Drop for PipeTransport {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            warn!(target: "qbx.transport", "failed to kill bridge process: {e}");
        }
        let _ = self.child.wait();
    }
}
