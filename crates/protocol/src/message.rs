//! Message-set envelope types.
//!
//! Every exchange with the accounting product is one request set in, one
//! response set out. A request set is stamped with the negotiated protocol
//! version, a region code, and an error-handling mode; the response set
//! carries an ordered response list with one entry per request.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AddressBlock, CustomerRet, HostRet, InvoiceRet, ItemRet};

/// A qbXML protocol version as negotiated with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QbxmlVersion {
    pub major: u16,
    pub minor: u16,
}

impl QbxmlVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for QbxmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Per-request-set error-handling mode.
///
/// `Stop` aborts the set at the first failing request; `Continue` processes
/// the remaining requests and reports each outcome in the response list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    Stop,
    Continue,
}

/// Attributes stamped on every request set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSetAttributes {
    pub version: QbxmlVersion,
    /// Region code, e.g. "US".
    pub country: String,
    pub on_error: OnError,
}

/// One logical request/response exchange unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSet {
    pub attributes: MessageSetAttributes,
    pub requests: Vec<Request>,
}

impl RequestSet {
    pub fn new(attributes: MessageSetAttributes) -> Self {
        Self {
            attributes,
            requests: Vec::new(),
        }
    }
}

/// The request kinds this client issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Capability query; the host answers with its supported versions.
    HostQuery,
    CustomerQuery(CustomerQueryRq),
    ItemQuery,
    InvoiceQuery(InvoiceQueryRq),
    InvoiceAdd(InvoiceAddRq),
}

/// Customer list query. An empty `full_names` list is unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerQueryRq {
    pub full_names: Vec<String>,
}

/// Invoice query filtered by entity name and a transaction-date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceQueryRq {
    pub entity_full_name: String,
    pub from_txn_date: NaiveDateTime,
    pub to_txn_date: NaiveDateTime,
    pub include_line_items: bool,
}

/// Invoice-add request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceAddRq {
    pub customer_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_ref: Option<String>,
    pub txn_date: NaiveDate,
    pub bill_address: AddressBlock,
    pub po_number: String,
    pub lines: Vec<InvoiceLineAdd>,
}

/// One invoice line entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineAdd {
    pub service_date: NaiveDate,
    pub item_ref: String,
    pub desc: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Response set; the response list is ordered to match the request list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseSet {
    pub responses: Vec<Response>,
}

/// One response from the host.
///
/// Status code 0 is success, positive codes are warnings or query-level
/// conditions, negative codes are failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status_code: i32,
    pub status_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ResponseDetail>,
}

/// Discriminated union over the known response-detail kinds.
///
/// Adjacently tagged: the list-carrying variants cannot use internal
/// tagging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResponseDetail {
    HostInfo(HostRet),
    CustomerList(Vec<CustomerRet>),
    ItemList(Vec<ItemRet>),
    InvoiceList(Vec<InvoiceRet>),
    /// Single invoice record, returned by an invoice-add.
    Invoice(InvoiceRet),
}

impl ResponseDetail {
    /// Stable name of the detail kind, used in "unexpected detail" errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HostInfo(_) => "host_info",
            Self::CustomerList(_) => "customer_list",
            Self::ItemList(_) => "item_list",
            Self::InvoiceList(_) => "invoice_list",
            Self::Invoice(_) => "invoice",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_tags_are_stable() {
        let value = serde_json::to_value(&Request::HostQuery).unwrap();
        assert_eq!(value, serde_json::json!({ "type": "host_query" }));

        let value = serde_json::to_value(&Request::CustomerQuery(CustomerQueryRq {
            full_names: vec!["ACME".to_string()],
        }))
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "type": "customer_query", "full_names": ["ACME"] })
        );
    }

    #[test]
    fn response_detail_roundtrips_through_json() {
        let detail = ResponseDetail::InvoiceList(vec![InvoiceRet {
            ref_number: Some("42".to_string()),
            txn_number: Some(7),
        }]);
        let json = serde_json::to_string(&detail).unwrap();
        let back: ResponseDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(back, detail);
        assert_eq!(back.kind(), "invoice_list");
    }

    #[test]
    fn version_displays_as_major_dot_minor() {
        assert_eq!(QbxmlVersion::new(4, 0).to_string(), "4.0");
        assert_eq!(QbxmlVersion::new(1, 1).to_string(), "1.1");
    }

    #[test]
    fn absent_detail_is_omitted_from_the_wire() {
        let response = Response {
            status_code: 0,
            status_message: String::new(),
            detail: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "status_code": 0, "status_message": "" })
        );
    }
}
