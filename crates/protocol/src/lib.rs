//! Wire types for the qbXML message-set protocol.
//!
//! This crate contains the serde-serializable types exchanged with the
//! desktop accounting product over the local automation channel. These types
//! represent the "protocol layer" - the shapes of data as they appear on the
//! wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with protocol: Match the qbXML message-set schema
//! * Stable: Changes only when the wire protocol changes
//!
//! The session API and domain value types are built on top of these types in
//! `qbx`.

pub mod message;
pub mod recovery;
pub mod types;

pub use message::*;
pub use recovery::*;
pub use types::*;
