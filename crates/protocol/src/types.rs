//! Remote record shapes returned inside response details.
//!
//! Field presence follows the host: anything the host may omit is an
//! `Option`. Canonicalization (e.g. the "empty address is all empty strings"
//! rule) happens in the domain layer, not here.

use serde::{Deserialize, Serialize};

/// Address block as stored by the host. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Customer record as returned by a customer query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_address: Option<AddressBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship_address: Option<AddressBlock>,
}

/// Invoice record. `ref_number` is the caller-visible invoice number;
/// `txn_number` is the host's internal identifier for the committed
/// transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_number: Option<i64>,
}

/// Item record, discriminated by item kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemRet {
    Service(ServiceItemRet),
    Inventory(BasicItemRet),
    NonInventory(BasicItemRet),
    OtherCharge(BasicItemRet),
}

/// Service item: the only kind the session currently surfaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceItemRet {
    pub full_name: String,
    pub is_active: bool,
    /// Full name of the associated sales/purchase account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_ref: Option<String>,
}

/// Minimal shape shared by the item kinds the session drops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicItemRet {
    pub full_name: String,
    pub is_active: bool,
}

/// Host capability record answering a host query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostRet {
    pub supported_qbxml_versions: Vec<String>,
}
