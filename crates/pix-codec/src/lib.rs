#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Codec for PIX instant-payment QR payloads.
//!
//! A payload is a compact, self-describing run of tag-length-value fields in
//! the EMV QR Code family, terminated by a CRC-16 checksum that scanners use
//! to catch transcription errors. Everything here is a pure function over
//! immutable inputs: no I/O, no shared state, no randomness.
//!
//! # Modules
//!
//! - [`tlv`] - Field encoder: `TAG + LENGTH + VALUE` units and one-level groups
//! - [`payload`] - Payload assembler: [`PaymentRequest`] to ordered fields
//! - [`crc`] - Checksum engine: CRC-16/CCITT-FALSE over the payload
//! - [`verify`] - Checksum verification and decoding of own payloads
//! - [`amount`] - Fixed-point transaction amounts
//! - [`text`] - ASCII folding and truncation of free-text values
//!
//! # Example
//!
//! ```rust
//! use pix_codec::{PaymentRequest, PixAmount, assemble_and_checksum, decode};
//!
//! let request = PaymentRequest::new("+5511999998888", "Loja do Joao", "RIO DE JANEIRO")
//!     .with_amount(PixAmount::parse("1234").unwrap())
//!     .with_reference_label("TX42");
//! let payload = assemble_and_checksum(&request).unwrap();
//! assert_eq!(
//!     payload.as_str(),
//!     "00020101021126360014BR.GOV.BCB.PIX0114+551199999888852040000530398654071234.005802BR5912Loja do Joao6014RIO DE JANEIRO62080504TX4263044AD6"
//! );
//! assert_eq!(decode(payload.as_str()).unwrap().into_request(), request);
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation of assembly, verification and decoding

pub mod amount;
pub mod crc;
pub mod payload;
pub mod text;
pub mod tlv;
pub mod verify;

pub use amount::{AmountError, PixAmount};
pub use crc::Checksum;
pub use payload::{Payload, PayloadError, PaymentRequest, assemble, assemble_and_checksum};
pub use tlv::{Field, FieldError, Tag};
pub use verify::{ChecksumMismatch, DecodeError, DecodedPayload, decode, verify};
