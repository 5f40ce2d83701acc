#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core wire types for the ILP connector.
//!
//! This crate provides the codecs and data types shared by the connector's
//! protocol and settlement layers. It is pure and synchronous: it maps
//! between in-memory values and byte buffers / JSON, and performs no I/O.
//!
//! # Modules
//!
//! - [`address`] - ILP address grammar and validation
//! - [`packet`] - OER codec for ILPv4 Prepare/Fulfill/Reject packets
//! - [`btp`] - BTP binary framing codec
//! - [`claim`] - Payment-channel claim message types (XRP/EVM/Aptos)
//! - [`timestamp`] - ILP packet timestamp and claim ISO-8601 timestamp formats
//! - [`util`] - Helper types (decimal amounts, OER variable-length integers)

pub mod address;
pub mod btp;
pub mod claim;
pub mod oer;
pub mod packet;
pub mod timestamp;
pub mod util;

pub use address::{Address, AddressError};
pub use btp::{BtpError, BtpMessage};
pub use claim::{validate as validate_claim, AptosClaim, ClaimMessage, EvmClaim, InvalidClaim, XrpClaim};
pub use packet::{IlpPacket, InvalidPacket};
