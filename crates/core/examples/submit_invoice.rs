//! Submits one invoice through a bridge process.
//!
//! Usage: `cargo run --example submit_invoice -- <bridge-executable>`

use chrono::Local;
use rust_decimal::Decimal;
use uuid::Uuid;

use qbx::{Customer, InvoiceLine, PipeTransport, Session, SessionConfig, TracingSink};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let bridge = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: submit_invoice <bridge-executable>"))?;

    let transport = PipeTransport::spawn(&bridge, &[])?;
    let config = SessionConfig::new(
        "qbx-example",
        "qbx example client",
        Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8")?,
    );
    let mut session = Session::open(transport, config, Box::new(TracingSink));

    if !session.is_online() {
        println!("accounting system unreachable; nothing submitted");
        return Ok(());
    }

    let customer = session
        .customer("ACME Pty Ltd")?
        .ok_or_else(|| anyhow::anyhow!("customer not found"))?;

    let lines = vec![InvoiceLine::new(
        "Consulting",
        "Weekly retainer",
        Decimal::new(150_00, 2),
        Decimal::new(1, 0),
        "SVC:Consulting",
    )];

    let number = session.add_invoice(
        &customer,
        Local::now().date_naive(),
        "EXAMPLE-1",
        &lines,
        None,
    )?;
    println!("invoice submitted, number = {number}");

    session.close()?;
    Ok(())
}
