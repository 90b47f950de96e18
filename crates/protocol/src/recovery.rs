//! Error-recovery status types.
//!
//! The host stores the last message set and its response keyed by a
//! caller-supplied recovery identifier. After a crash or disconnect the
//! client fetches this status to learn whether the unacknowledged request
//! was committed.

use serde::{Deserialize, Serialize};

use crate::message::Response;

/// Recovery status for the last stored message set.
///
/// `message_set_status_code` reports on the recovery metadata itself; when it
/// carries none of the known metadata codes the stored `responses` describe
/// the actual outcome of the last request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStatus {
    pub message_set_status_code: String,
    pub responses: Vec<Response>,
}

impl RecoveryStatus {
    /// The metadata-level code, if the status carries one.
    ///
    /// `None` means the metadata is sound and the stored response list should
    /// be inspected instead.
    pub fn code(&self) -> Option<RecoveryCode> {
        RecoveryCode::from_code(&self.message_set_status_code)
    }
}

/// Message-set-level recovery status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryCode {
    /// "600": the old message set ID matches no stored ID and no new one was
    /// provided.
    IdMismatch,
    /// "9001": new message set ID matches the stored ID but the checksum
    /// fails.
    ChecksumFailed,
    /// "9002": no stored response was found.
    NoStoredResponse,
    /// "9004": message set ID longer than 24 characters.
    IdTooLong,
    /// "9005": the host was unable to store the response.
    StoreFailed,
}

impl RecoveryCode {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "600" => Some(Self::IdMismatch),
            "9001" => Some(Self::ChecksumFailed),
            "9002" => Some(Self::NoStoredResponse),
            "9004" => Some(Self::IdTooLong),
            "9005" => Some(Self::StoreFailed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_variants() {
        assert_eq!(RecoveryCode::from_code("600"), Some(RecoveryCode::IdMismatch));
        assert_eq!(
            RecoveryCode::from_code("9001"),
            Some(RecoveryCode::ChecksumFailed)
        );
        assert_eq!(
            RecoveryCode::from_code("9002"),
            Some(RecoveryCode::NoStoredResponse)
        );
        assert_eq!(RecoveryCode::from_code("9004"), Some(RecoveryCode::IdTooLong));
        assert_eq!(
            RecoveryCode::from_code("9005"),
            Some(RecoveryCode::StoreFailed)
        );
    }

    #[test]
    fn other_codes_fall_through_to_response_inspection() {
        let status = RecoveryStatus {
            message_set_status_code: "0".to_string(),
            responses: Vec::new(),
        };
        assert_eq!(status.code(), None);
    }
}
