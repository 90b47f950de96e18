//! Error taxonomy for the session component.
//!
//! Conditions that prevent a correct answer are raised through [`Error`];
//! recoverable/informational conditions (connection downgrade, recovery
//! outcomes) are absorbed and reported through the notification sink instead.

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure in the underlying automation channel.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The host rejected an invoice-add request.
    #[error(
        "invoice submission rejected: internal reference: {internal_reference}, \
         customer name: {customer_name}, status code: {status_code}, \
         message: {status_message}"
    )]
    AddInvoice {
        internal_reference: String,
        customer_name: String,
        status_code: i32,
        status_message: String,
    },

    /// The post-submission invoice-number lookup produced no usable result.
    #[error("invoice number lookup failed: {message}, status code: {status_code}")]
    InvoiceNumber { message: String, status_code: i32 },

    /// A response carried a detail payload of the wrong shape.
    ///
    /// The protocol's shape is trusted once the version is negotiated, so
    /// this indicates a contract violation rather than a runtime condition.
    #[error("unexpected response detail: expected {expected}, got {got}")]
    UnexpectedDetail {
        expected: &'static str,
        got: &'static str,
    },

    /// The response list carried no entry at index 0.
    #[error("response set was empty")]
    EmptyResponse,
}
