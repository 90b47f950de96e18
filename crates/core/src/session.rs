//! Session over the accounting product's automation channel.
//!
//! The session owns the transport exclusively for its lifetime. Opening it
//! connects, registers the recovery identifier, negotiates the protocol
//! version, and runs the error-recovery handshake; closing it clears the
//! recovery marker and releases the connection. When the host cannot be
//! reached at open the session downgrades to offline permanently: writes
//! return the [`OFFLINE`] sentinel and reads return empty results, with no
//! outbound calls attempted.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use qbx_protocol::{
    AddressBlock, CustomerQueryRq, CustomerRet, InvoiceAddRq, InvoiceLineAdd, InvoiceQueryRq,
    MessageSetAttributes, OnError, QbxmlVersion, RecoveryCode, Request, RequestSet, Response,
    ResponseDetail, ResponseSet,
};

use crate::error::{Error, Result};
use crate::model::{Address, Customer, InvoiceLine};
use crate::notify::{Notice, NotificationSink, RecoveryNotice};
use crate::transport::Transport;
use crate::version;
use crate::{NOT_AVAILABLE, OFFLINE};

/// Session identity and protocol region.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Application id presented when opening the connection.
    pub app_id: String,
    /// Application name presented when opening the connection.
    pub app_name: String,
    /// Stable recovery identifier, fixed per deployment. The host keys its
    /// saved message set by this value.
    pub recovery_id: Uuid,
    /// Region code stamped on every request set.
    pub country: String,
}

impl SessionConfig {
    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>, recovery_id: Uuid) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: app_name.into(),
            recovery_id,
            country: "US".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Offline,
    Online { version: QbxmlVersion },
}

/// A live (or permanently offline) session with the accounting product.
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    sink: Box<dyn NotificationSink>,
    state: State,
    closed: bool,
}

impl<T: Transport> Session<T> {
    /// Opens a session: connects, registers the recovery identifier,
    /// negotiates the protocol version, and runs error recovery.
    ///
    /// Never fails: if the host cannot be reached (or no version can be
    /// negotiated) the failure is reported through the sink and the session
    /// comes up offline. An offline session never retries and never
    /// re-promotes to online.
    pub fn open(transport: T, config: SessionConfig, sink: Box<dyn NotificationSink>) -> Self {
        let mut session = Self {
            transport,
            config,
            sink,
            state: State::Offline,
            closed: false,
        };

        match session.connect() {
            Ok(negotiated) => {
                info!(target: "qbx.session", version = %negotiated, "session online");
                session.state = State::Online {
                    version: negotiated,
                };
                session.run_error_recovery();
            }
            Err(e) => {
                warn!(target: "qbx.session", "session offline: {e}");
                session.sink.notify(Notice::ConnectFailed {
                    reason: e.to_string(),
                });
            }
        }

        session
    }

    pub fn is_online(&self) -> bool {
        matches!(self.state, State::Online { .. })
    }

    /// The negotiated protocol version, when online.
    pub fn version(&self) -> Option<QbxmlVersion> {
        match self.state {
            State::Online { version } => Some(version),
            State::Offline => None,
        }
    }

    fn connect(&mut self) -> Result<QbxmlVersion> {
        self.transport
            .open_connection(&self.config.app_id, &self.config.app_name)?;
        self.transport.begin_session()?;
        self.transport
            .set_recovery_id(&format!("{{{}}}", self.config.recovery_id))?;
        self.negotiate()
    }

    /// Queries host capabilities and selects the protocol version used for
    /// the rest of the session. The capability query itself is issued at the
    /// baseline version.
    fn negotiate(&mut self) -> Result<QbxmlVersion> {
        let set = RequestSet {
            attributes: MessageSetAttributes {
                version: QbxmlVersion::new(1, 0),
                country: self.config.country.clone(),
                on_error: OnError::Stop,
            },
            requests: vec![Request::HostQuery],
        };
        let response = first_response(self.transport.do_requests(&set)?)?;
        let supported = match response.detail {
            Some(ResponseDetail::HostInfo(host)) => host.supported_qbxml_versions,
            other => return Err(unexpected("host_info", other)),
        };
        let negotiated = version::negotiate(&supported);
        debug!(target: "qbx.session", supported = ?supported, negotiated = %negotiated, "version negotiated");
        Ok(negotiated)
    }

    fn request_set(&self, version: QbxmlVersion, on_error: OnError) -> RequestSet {
        RequestSet::new(MessageSetAttributes {
            version,
            country: self.config.country.clone(),
            on_error,
        })
    }

    /// Runs the error-recovery handshake for a previous unacknowledged
    /// request. Never fails: transport errors are absorbed and reported so
    /// the session stays usable. Idempotent - once the marker is cleared a
    /// second run finds nothing to recover.
    fn run_error_recovery(&mut self) {
        if !self.is_online() {
            return;
        }
        if let Err(e) = self.try_error_recovery() {
            self.sink.notify(Notice::RecoveryUnavailable {
                reason: e.to_string(),
            });
        }
    }

    fn try_error_recovery(&mut self) -> Result<()> {
        if !self.transport.has_recovery_info()? {
            return Ok(());
        }
        debug!(target: "qbx.session", "recovery info present, running error recovery");

        let status = self.transport.recovery_status()?;
        match status.code() {
            Some(RecoveryCode::IdMismatch) => self.notify_recovery(RecoveryNotice::IdMismatch),
            Some(RecoveryCode::ChecksumFailed) => {
                self.notify_recovery(RecoveryNotice::ChecksumFailed);
            }
            Some(RecoveryCode::NoStoredResponse) => {
                self.notify_recovery(RecoveryNotice::NoStoredResponse);
            }
            Some(RecoveryCode::IdTooLong) => self.notify_recovery(RecoveryNotice::IdTooLong),
            Some(RecoveryCode::StoreFailed) => self.notify_recovery(RecoveryNotice::StoreFailed),
            None => {
                let stored = status.responses.first().ok_or(Error::EmptyResponse)?;
                if stored.status_code == 0 {
                    let txn_number = invoice_txn_number(stored.detail.as_ref());
                    self.notify_recovery(RecoveryNotice::LastRequestSucceeded { txn_number });
                } else if stored.status_code > 0 {
                    self.notify_recovery(RecoveryNotice::LastRequestWarned);
                } else {
                    self.notify_recovery(RecoveryNotice::LastRequestFailed);
                    self.resubmit_saved_request()?;
                }
            }
        }

        self.transport.clear_recovery()?;
        self.notify_recovery(RecoveryNotice::Proceeding);
        Ok(())
    }

    /// Re-issues the saved prior request verbatim to obtain a definitive
    /// outcome for a write whose delivery state was unknown.
    fn resubmit_saved_request(&mut self) -> Result<()> {
        let saved = self.transport.saved_request()?;
        let response = first_response(self.transport.do_requests(&saved)?)?;
        if response.status_code == 0 {
            let txn_number = invoice_txn_number(response.detail.as_ref());
            self.notify_recovery(RecoveryNotice::Resubmitted { txn_number });
        }
        Ok(())
    }

    fn notify_recovery(&self, notice: RecoveryNotice) {
        self.sink.notify(Notice::Recovery(notice));
    }

    /// Submits one invoice and returns the invoice number the host assigned.
    ///
    /// `internal_reference` is used only for error correlation; it is not
    /// sent to the host. Offline sessions return [`OFFLINE`] without
    /// contacting the host.
    ///
    /// Not safe to retry blindly after a failure with unknown delivery
    /// state - the error-recovery handshake on the next open resolves that.
    pub fn add_invoice(
        &mut self,
        customer: &Customer,
        invoice_date: NaiveDate,
        internal_reference: &str,
        lines: &[InvoiceLine],
        template_ref: Option<&str>,
    ) -> Result<String> {
        let State::Online { version } = self.state else {
            debug!(target: "qbx.session", "offline, invoice not submitted");
            return Ok(OFFLINE.to_string());
        };

        self.run_error_recovery();

        let mut set = self.request_set(version, OnError::Continue);
        set.requests.push(Request::InvoiceAdd(InvoiceAddRq {
            customer_ref: customer.name.clone(),
            template_ref: template_ref
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            txn_date: invoice_date,
            bill_address: address_block(&customer.billing_address),
            po_number: String::new(),
            lines: lines
                .iter()
                .map(|line| InvoiceLineAdd {
                    service_date: invoice_date,
                    item_ref: line.item_ref().to_string(),
                    desc: line.description().to_string(),
                    quantity: line.quantity(),
                    rate: line.rate().round_dp(2),
                    amount: line.amount(),
                })
                .collect(),
        }));

        let response = first_response(self.transport.do_requests(&set)?)?;
        if response.status_code != 0 {
            self.sink.notify(Notice::SubmitRejected {
                status_code: response.status_code,
                status_message: response.status_message.clone(),
            });
            return Err(Error::AddInvoice {
                internal_reference: internal_reference.to_string(),
                customer_name: customer.name.clone(),
                status_code: response.status_code,
                status_message: response.status_message,
            });
        }

        info!(target: "qbx.session", customer = %customer.name, "invoice submitted");
        self.latest_invoice_number(version, &customer.name, invoice_date)
    }

    /// Resolves the invoice number the host assigned to the invoice just
    /// added.
    ///
    /// The host does not return the number from the add itself, so this
    /// re-queries by exact customer name over the invoice date's full
    /// calendar day and picks the numerically greatest reference number -
    /// the host assigns ascending sequential numbers, so the largest match
    /// is the one just created regardless of result order.
    fn latest_invoice_number(
        &mut self,
        version: QbxmlVersion,
        name: &str,
        invoice_date: NaiveDate,
    ) -> Result<String> {
        let from = invoice_date.and_time(NaiveTime::MIN);
        let to = (invoice_date + Duration::days(1)).and_time(NaiveTime::MIN) - Duration::seconds(1);

        let mut set = self.request_set(version, OnError::Continue);
        set.requests.push(Request::InvoiceQuery(InvoiceQueryRq {
            entity_full_name: name.to_string(),
            from_txn_date: from,
            to_txn_date: to,
            include_line_items: false,
        }));

        let response = first_response(self.transport.do_requests(&set)?)?;
        if response.status_code == 1 {
            return Err(Error::InvoiceNumber {
                message: "No invoices match the query filter used".to_string(),
                status_code: 1,
            });
        }

        let invoices = match response.detail {
            Some(ResponseDetail::InvoiceList(list)) if !list.is_empty() => list,
            _ => {
                return Err(Error::InvoiceNumber {
                    message: "No invoices returned".to_string(),
                    status_code: -1,
                });
            }
        };

        let latest = invoices
            .iter()
            .filter_map(|invoice| invoice.ref_number.as_deref())
            .filter_map(|n| n.parse::<i64>().ok())
            .max();

        Ok(latest.map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string()))
    }

    /// Lists every customer known to the host.
    ///
    /// The bulk result is fetched eagerly by the remote call; the returned
    /// iterator maps one record per step, so a consumer stopping early skips
    /// the remaining mapping work only. Offline sessions yield nothing.
    pub fn customers(&mut self) -> Result<Customers> {
        let State::Online { version } = self.state else {
            return Ok(Customers {
                inner: Vec::new().into_iter(),
            });
        };

        let mut set = self.request_set(version, OnError::Stop);
        set.requests
            .push(Request::CustomerQuery(CustomerQueryRq::default()));

        let response = first_response(self.transport.do_requests(&set)?)?;
        let records = match response.detail {
            Some(ResponseDetail::CustomerList(list)) => list,
            other => return Err(unexpected("customer_list", other)),
        };

        Ok(Customers {
            inner: records.into_iter(),
        })
    }

    /// Looks up one customer by exact name.
    ///
    /// Offline sessions return a shell with only the name populated, never
    /// `None`. Online, a miss is `Ok(None)`.
    pub fn customer(&mut self, name: &str) -> Result<Option<Customer>> {
        let State::Online { version } = self.state else {
            return Ok(Some(Customer::named(name)));
        };

        let mut set = self.request_set(version, OnError::Stop);
        set.requests.push(Request::CustomerQuery(CustomerQueryRq {
            full_names: vec![name.to_string()],
        }));

        let response = first_response(self.transport.do_requests(&set)?)?;
        let records = match response.detail {
            Some(ResponseDetail::CustomerList(list)) => list,
            _ => return Ok(None),
        };

        Ok(records
            .into_iter()
            .next()
            .map(|record| map_customer(name, record)))
    }

    /// Item references for billable items, keyed by full item name, valued
    /// by the associated sales/purchase account's full name.
    ///
    /// Only active, service-type items are returned; other item kinds are
    /// currently dropped. Later duplicates for the same name overwrite
    /// earlier ones.
    pub fn item_refs(&mut self) -> Result<HashMap<String, String>> {
        let State::Online { version } = self.state else {
            return Ok(HashMap::new());
        };

        let mut set = self.request_set(version, OnError::Stop);
        set.requests.push(Request::ItemQuery);

        let response = first_response(self.transport.do_requests(&set)?)?;
        let items = match response.detail {
            Some(ResponseDetail::ItemList(list)) => list,
            other => return Err(unexpected("item_list", other)),
        };

        let mut refs = HashMap::new();
        for item in items {
            let qbx_protocol::ItemRet::Service(service) = item else {
                continue;
            };
            if !service.is_active {
                continue;
            }
            if let Some(account) = service.account_ref {
                refs.insert(service.full_name, account);
            }
        }
        Ok(refs)
    }

    /// Releases the session: clears the recovery marker, ends the logical
    /// session, and closes the connection. Idempotent - a second call (and
    /// any call on an offline session) is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed || !self.is_online() {
            return Ok(());
        }
        self.closed = true;
        self.transport.clear_recovery()?;
        self.transport.end_session()?;
        self.transport.close_connection()?;
        info!(target: "qbx.session", "session closed");
        Ok(())
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(target: "qbx.session", "error closing session: {e}");
        }
    }
}

/// Lazy mapping iterator over an eagerly fetched customer list.
#[derive(Debug)]
pub struct Customers {
    inner: std::vec::IntoIter<CustomerRet>,
}

impl Iterator for Customers {
    type Item = Customer;

    fn next(&mut self) -> Option<Customer> {
        self.inner.next().map(|record| map_customer("", record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Customers {}

fn first_response(set: ResponseSet) -> Result<Response> {
    set.responses.into_iter().next().ok_or(Error::EmptyResponse)
}

fn unexpected(expected: &'static str, got: Option<ResponseDetail>) -> Error {
    Error::UnexpectedDetail {
        expected,
        got: got.as_ref().map_or("none", ResponseDetail::kind),
    }
}

fn invoice_txn_number(detail: Option<&ResponseDetail>) -> Option<i64> {
    match detail {
        Some(ResponseDetail::Invoice(invoice)) => invoice.txn_number,
        _ => None,
    }
}

fn map_customer(fallback_name: &str, record: CustomerRet) -> Customer {
    let name = record
        .full_name
        .unwrap_or_else(|| fallback_name.to_string());
    let phone = record.phone.unwrap_or_default();

    let billing = record.bill_address.map(map_address);
    let shipping = record.ship_address.map(map_address);
    // Each address falls back to the other, and both fall back to the
    // canonical empty address.
    let (billing, shipping) = match (billing, shipping) {
        (Some(billing), Some(shipping)) => (billing, shipping),
        (Some(billing), None) => (billing.clone(), billing),
        (None, Some(shipping)) => (shipping.clone(), shipping),
        (None, None) => (Address::empty(), Address::empty()),
    };

    Customer {
        name,
        phone,
        billing_address: billing,
        shipping_address: shipping,
        cash_sale_customer_id: None,
        is_cash_flow_finance: false,
    }
}

fn map_address(block: AddressBlock) -> Address {
    Address {
        address1: block.addr1.unwrap_or_default(),
        address2: block.addr2.unwrap_or_default(),
        address3: block.addr3.unwrap_or_default(),
        address4: block.addr4.unwrap_or_default(),
        city: block.city.unwrap_or_default(),
        state: block.state.unwrap_or_default(),
        postal_code: block.postal_code.unwrap_or_default(),
        country: block.country.unwrap_or_default(),
    }
}

/// Full billing address as submitted: all eight fields, even when blank.
fn address_block(address: &Address) -> AddressBlock {
    AddressBlock {
        addr1: Some(address.address1.clone()),
        addr2: Some(address.address2.clone()),
        addr3: Some(address.address3.clone()),
        addr4: Some(address.address4.clone()),
        city: Some(address.city.clone()),
        state: Some(address.state.clone()),
        postal_code: Some(address.postal_code.clone()),
        country: Some(address.country.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(city: &str) -> AddressBlock {
        AddressBlock {
            city: Some(city.to_string()),
            ..AddressBlock::default()
        }
    }

    #[test]
    fn billing_only_record_adopts_billing_for_shipping() {
        let customer = map_customer(
            "",
            CustomerRet {
                full_name: Some("ACME".to_string()),
                bill_address: Some(block("Austin")),
                ..CustomerRet::default()
            },
        );
        assert_eq!(customer.shipping_address, customer.billing_address);
        assert_eq!(customer.billing_address.city, "Austin");
    }

    #[test]
    fn shipping_only_record_adopts_shipping_for_billing() {
        let customer = map_customer(
            "",
            CustomerRet {
                full_name: Some("ACME".to_string()),
                ship_address: Some(block("Dallas")),
                ..CustomerRet::default()
            },
        );
        assert_eq!(customer.billing_address, customer.shipping_address);
        assert_eq!(customer.shipping_address.city, "Dallas");
    }

    #[test]
    fn record_with_no_addresses_gets_the_canonical_empty_address() {
        let customer = map_customer(
            "",
            CustomerRet {
                full_name: Some("ACME".to_string()),
                ..CustomerRet::default()
            },
        );
        assert!(customer.billing_address.is_empty());
        assert!(customer.shipping_address.is_empty());
    }

    #[test]
    fn missing_full_name_falls_back_to_the_queried_name() {
        let customer = map_customer("Queried Name", CustomerRet::default());
        assert_eq!(customer.name, "Queried Name");
        assert_eq!(customer.phone, "");
    }

    #[test]
    fn address_block_carries_every_field_even_when_blank() {
        let sent = address_block(&Address::empty());
        assert_eq!(sent.addr1.as_deref(), Some(""));
        assert_eq!(sent.country.as_deref(), Some(""));
    }
}
