//! Integrity checks and decoding of payloads minted by [`crate::payload`].
//!
//! [`verify`] only confirms that the trailing checksum matches the rest of the
//! payload. It says nothing about who produced the payload or whether its
//! contents make business sense. [`decode`] verifies first and then reads the
//! fields back into a [`DecodedPayload`].

use serde::Serialize;
use std::collections::HashSet;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::amount::{AmountError, PixAmount};
use crate::crc::{CHECKSUM_LEN, Checksum, crc16_ccitt_false};
use crate::payload::{PIX_GUI, PaymentRequest, tags};
use crate::tlv::{EncodedField, FieldError, Tag, parse_fields};

/// The trailing checksum does not match the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Checksum mismatch: payload carries {claimed:?}, computed {computed}")]
pub struct ChecksumMismatch {
    /// The last four characters of the payload, as found.
    pub claimed: String,
    /// The checksum of everything before them.
    pub computed: Checksum,
}

/// Recomputes the checksum over everything but the last four characters and
/// compares it with them.
///
/// Comparison is exact: the checksum is always written in uppercase, so a
/// lowercase digit counts as tampering.
#[cfg_attr(feature = "telemetry", instrument(name = "pix.verify", skip_all, err))]
pub fn verify(payload: &str) -> Result<(), ChecksumMismatch> {
    let bytes = payload.as_bytes();
    let split = bytes.len().saturating_sub(CHECKSUM_LEN);
    let (prefix, claimed) = bytes.split_at(split);
    let computed = Checksum(crc16_ccitt_false(prefix));
    if claimed == computed.to_string().as_bytes() {
        Ok(())
    } else {
        Err(ChecksumMismatch {
            claimed: String::from_utf8_lossy(claimed).into_owned(),
            computed,
        })
    }
}

/// Errors raised while decoding a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Checksum(#[from] ChecksumMismatch),
    #[error("Malformed payload: {0}")]
    Malformed(#[from] FieldError),
    #[error("Required field {0} is missing")]
    MissingField(Tag),
    #[error("Field {0} appears more than once")]
    DuplicateField(Tag),
    #[error("Field {tag} has unexpected value {value:?}")]
    UnexpectedValue { tag: Tag, value: String },
    #[error("Invalid transaction amount: {0}")]
    Amount(#[from] AmountError),
}

/// The request-level contents of a verified payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedPayload {
    pub beneficiary_key: String,
    pub merchant_name: String,
    pub merchant_city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<PixAmount>,
    pub reference_label: String,
    pub checksum: Checksum,
}

impl DecodedPayload {
    /// Rebuilds a request that assembles back to an equivalent payload.
    pub fn into_request(self) -> PaymentRequest {
        PaymentRequest {
            beneficiary_key: self.beneficiary_key,
            merchant_name: self.merchant_name,
            merchant_city: self.merchant_city,
            amount: self.amount,
            reference_label: self.reference_label,
        }
    }
}

/// Verifies `payload` and reads its fields back.
///
/// Only the fields this crate emits are interpreted; unknown tags are skipped.
#[cfg_attr(feature = "telemetry", instrument(name = "pix.decode", skip_all, err))]
pub fn decode(payload: &str) -> Result<DecodedPayload, DecodeError> {
    verify(payload)?;
    let fields = parse_fields(payload)?;

    let mut seen = HashSet::new();
    for field in &fields {
        if !seen.insert(field.tag()) {
            return Err(DecodeError::DuplicateField(field.tag()));
        }
    }

    let account = find(&fields, tags::MERCHANT_ACCOUNT_INFORMATION)?.subfields()?;
    let gui = find(&account, tags::merchant_account::GLOBALLY_UNIQUE_IDENTIFIER)?;
    if !gui.value().eq_ignore_ascii_case(PIX_GUI) {
        return Err(DecodeError::UnexpectedValue {
            tag: gui.tag(),
            value: gui.value().to_string(),
        });
    }
    let beneficiary_key = find(&account, tags::merchant_account::BENEFICIARY_KEY)?;

    let amount = fields
        .iter()
        .find(|f| f.tag() == tags::TRANSACTION_AMOUNT)
        .map(|f| PixAmount::parse(f.value()))
        .transpose()?;

    let reference_label = match fields
        .iter()
        .find(|f| f.tag() == tags::ADDITIONAL_DATA_FIELD_TEMPLATE)
    {
        Some(group) => group
            .subfields()?
            .into_iter()
            .find(|f| f.tag() == tags::additional_data::REFERENCE_LABEL)
            .map(|f| f.value().to_string())
            .unwrap_or_default(),
        None => String::new(),
    };

    let checksum = find(&fields, tags::CRC)?
        .value()
        .parse::<Checksum>()
        .map_err(|e| DecodeError::UnexpectedValue {
            tag: tags::CRC,
            value: e.0,
        })?;

    Ok(DecodedPayload {
        beneficiary_key: beneficiary_key.value().to_string(),
        merchant_name: find(&fields, tags::MERCHANT_NAME)?.value().to_string(),
        merchant_city: find(&fields, tags::MERCHANT_CITY)?.value().to_string(),
        amount,
        reference_label,
        checksum,
    })
}

fn find(fields: &[EncodedField], tag: Tag) -> Result<&EncodedField, DecodeError> {
    fields
        .iter()
        .find(|f| f.tag() == tag)
        .ok_or(DecodeError::MissingField(tag))
}
