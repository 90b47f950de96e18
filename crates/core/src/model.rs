//! Domain value types crossing the session boundary.
//!
//! These are plain records: the session maps remote records into them and
//! never mutates them after a read.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Postal address. "No address" is modeled as all-empty fields, never as a
/// missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address1: String,
    pub address2: String,
    pub address3: String,
    pub address4: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// The canonical empty-but-valid address.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Formats the address for display: non-blank address lines joined by
    /// line breaks, then city/state/postal code each followed by a space on
    /// one line, then the country on its own line.
    pub fn formatted(&self) -> String {
        let mut out = String::new();
        for line in [&self.address1, &self.address2, &self.address3, &self.address4] {
            if !line.trim().is_empty() {
                out.push_str(line);
                out.push('\n');
            }
        }
        for part in [&self.city, &self.state, &self.postal_code] {
            if !part.trim().is_empty() {
                out.push_str(part);
                out.push(' ');
            }
        }
        if !self.country.trim().is_empty() {
            out.push('\n');
            out.push_str(&self.country);
        }
        out
    }
}

/// Customer record.
///
/// Invariant: `billing_address` and `shipping_address` are never "absent" -
/// when the remote record carries only one, both fields adopt it, and when it
/// carries neither, both are [`Address::empty`]. The session's mapping layer
/// upholds this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Identity key; matched case- and whitespace-sensitively against remote
    /// records.
    pub name: String,
    pub phone: String,
    pub billing_address: Address,
    pub shipping_address: Address,
    /// Link to the remote "cash sale" customer, when one exists.
    pub cash_sale_customer_id: Option<i32>,
    pub is_cash_flow_finance: bool,
}

impl Customer {
    /// A shell with only the name populated, as returned by offline lookups.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One invoice line. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    name: String,
    description: String,
    rate: Decimal,
    quantity: Decimal,
    item_ref: String,
}

impl InvoiceLine {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        rate: Decimal,
        quantity: Decimal,
        item_ref: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            rate,
            quantity,
            item_ref: item_ref.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// The remote item reference resolving the billable item.
    pub fn item_ref(&self) -> &str {
        &self.item_ref
    }

    /// Line amount as submitted: the rate rounded to 2 decimal places.
    ///
    /// This deliberately mirrors the rate rather than computing
    /// rate × quantity; the host applies the quantity itself. Changing this
    /// would alter the financial totals submitted to the remote system.
    pub fn amount(&self) -> Decimal {
        self.rate.round_dp(2)
    }
}
