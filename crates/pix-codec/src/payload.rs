//! Payload assembly.
//!
//! A payload is a fixed, ordered run of top-level fields followed by the
//! checksum field:
//!
//! | Tag | Field                          | Value                              |
//! |-----|--------------------------------|------------------------------------|
//! | 00  | Payload Format Indicator       | `01`                               |
//! | 01  | Point of Initiation Method     | `11` (static)                      |
//! | 26  | Merchant Account Information   | group: `00` GUI, `01` key          |
//! | 52  | Merchant Category Code         | `0000`                             |
//! | 53  | Transaction Currency           | `986`                              |
//! | 54  | Transaction Amount             | `0.00` form, omitted if open       |
//! | 58  | Country Code                   | `BR`                               |
//! | 59  | Merchant Name                  | up to 25 characters                |
//! | 60  | Merchant City                  | up to 15 characters                |
//! | 62  | Additional Data Field Template | group: `05` reference label        |
//! | 63  | CRC                            | four hex digits                    |
//!
//! The order is part of the wire contract and never varies.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::amount::PixAmount;
use crate::crc::{CHECKSUM_FIELD_HEADER, CHECKSUM_LEN, Checksum};
use crate::text;
use crate::tlv::{self, Field, FieldError, MAX_VALUE_LEN, Tag};

/// Top-level and nested tags used by the payload.
pub mod tags {
    use crate::tlv::Tag;

    pub const PAYLOAD_FORMAT_INDICATOR: Tag = Tag::new(0);
    pub const POINT_OF_INITIATION_METHOD: Tag = Tag::new(1);
    pub const MERCHANT_ACCOUNT_INFORMATION: Tag = Tag::new(26);
    pub const MERCHANT_CATEGORY_CODE: Tag = Tag::new(52);
    pub const TRANSACTION_CURRENCY: Tag = Tag::new(53);
    pub const TRANSACTION_AMOUNT: Tag = Tag::new(54);
    pub const COUNTRY_CODE: Tag = Tag::new(58);
    pub const MERCHANT_NAME: Tag = Tag::new(59);
    pub const MERCHANT_CITY: Tag = Tag::new(60);
    pub const ADDITIONAL_DATA_FIELD_TEMPLATE: Tag = Tag::new(62);
    pub const CRC: Tag = crate::crc::CHECKSUM_TAG;

    /// Sub-fields of [`MERCHANT_ACCOUNT_INFORMATION`].
    pub mod merchant_account {
        use crate::tlv::Tag;

        pub const GLOBALLY_UNIQUE_IDENTIFIER: Tag = Tag::new(0);
        pub const BENEFICIARY_KEY: Tag = Tag::new(1);
    }

    /// Sub-fields of [`ADDITIONAL_DATA_FIELD_TEMPLATE`].
    pub mod additional_data {
        use crate::tlv::Tag;

        pub const REFERENCE_LABEL: Tag = Tag::new(5);
    }
}

pub const PAYLOAD_FORMAT_VERSION: &str = "01";
pub const STATIC_INITIATION: &str = "11";
pub const PIX_GUI: &str = "BR.GOV.BCB.PIX";
pub const MERCHANT_CATEGORY_UNCLASSIFIED: &str = "0000";
pub const CURRENCY_BRL: &str = "986";
pub const COUNTRY_BR: &str = "BR";

pub const MAX_MERCHANT_NAME_LEN: usize = 25;
pub const MAX_MERCHANT_CITY_LEN: usize = 15;
pub const MAX_REFERENCE_LABEL_LEN: usize = 25;

/// Everything needed to mint one payload.
///
/// Text fields may be longer than the wire allows; they are truncated during
/// assembly, never escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub beneficiary_key: String,
    pub merchant_name: String,
    pub merchant_city: String,
    /// Fixed amount. `None` produces an open-amount payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<PixAmount>,
    /// Free-text note or transaction id.
    #[serde(default)]
    pub reference_label: String,
}

impl PaymentRequest {
    pub fn new(
        beneficiary_key: impl Into<String>,
        merchant_name: impl Into<String>,
        merchant_city: impl Into<String>,
    ) -> Self {
        Self {
            beneficiary_key: beneficiary_key.into(),
            merchant_name: merchant_name.into(),
            merchant_city: merchant_city.into(),
            amount: None,
            reference_label: String::new(),
        }
    }

    pub fn with_amount(mut self, amount: PixAmount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_reference_label(mut self, reference_label: impl Into<String>) -> Self {
        self.reference_label = reference_label.into();
        self
    }
}

/// Errors raised while assembling a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// A value still exceeds the TLV budget after truncation.
    #[error("Field {tag} value is {len} bytes, longer than the {MAX_VALUE_LEN} byte limit")]
    FieldTooLong { tag: Tag, len: usize },
    /// The request is missing or carries unusable identifying data.
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Field(FieldError),
}

impl From<FieldError> for PayloadError {
    fn from(value: FieldError) -> Self {
        match value {
            FieldError::FieldTooLong { tag, len } => PayloadError::FieldTooLong { tag, len },
            other => PayloadError::Field(other),
        }
    }
}

/// A complete payload, checksum included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload {
    text: String,
    checksum: Checksum,
}

impl Payload {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// The trailing checksum this payload was completed with.
    pub fn checksum(&self) -> Checksum {
        self.checksum
    }
}

impl Display for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for Payload {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<Payload> for String {
    fn from(value: Payload) -> Self {
        value.text
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        crate::verify::verify(&text).map_err(serde::de::Error::custom)?;
        // A verified payload ends with four uppercase hex digits.
        let checksum = text[text.len() - CHECKSUM_LEN..]
            .parse()
            .map_err(serde::de::Error::custom)?;
        Ok(Payload { text, checksum })
    }
}

/// Builds the ordered field list for `request`, checksum field excluded.
pub fn fields(request: &PaymentRequest) -> Result<Vec<Field>, PayloadError> {
    if request.beneficiary_key.is_empty() {
        return Err(PayloadError::InvalidRequest(
            "beneficiary key is empty".to_string(),
        ));
    }
    text::require_ascii(&request.beneficiary_key).map_err(|c| {
        PayloadError::InvalidRequest(format!("beneficiary key contains {c:?}"))
    })?;
    let merchant_name = clean_text("merchant name", &request.merchant_name, MAX_MERCHANT_NAME_LEN)?;
    let merchant_city = clean_text("merchant city", &request.merchant_city, MAX_MERCHANT_CITY_LEN)?;
    let reference_label = clean_text(
        "reference label",
        &request.reference_label,
        MAX_REFERENCE_LABEL_LEN,
    )?;

    let mut fields = vec![
        Field::leaf(tags::PAYLOAD_FORMAT_INDICATOR, PAYLOAD_FORMAT_VERSION),
        Field::leaf(tags::POINT_OF_INITIATION_METHOD, STATIC_INITIATION),
        Field::group(
            tags::MERCHANT_ACCOUNT_INFORMATION,
            vec![
                Field::leaf(tags::merchant_account::GLOBALLY_UNIQUE_IDENTIFIER, PIX_GUI),
                Field::leaf(
                    tags::merchant_account::BENEFICIARY_KEY,
                    request.beneficiary_key.as_str(),
                ),
            ],
        ),
        Field::leaf(tags::MERCHANT_CATEGORY_CODE, MERCHANT_CATEGORY_UNCLASSIFIED),
        Field::leaf(tags::TRANSACTION_CURRENCY, CURRENCY_BRL),
    ];
    if let Some(amount) = request.amount {
        fields.push(Field::leaf(tags::TRANSACTION_AMOUNT, amount.to_string()));
    }
    fields.extend([
        Field::leaf(tags::COUNTRY_CODE, COUNTRY_BR),
        Field::leaf(tags::MERCHANT_NAME, merchant_name),
        Field::leaf(tags::MERCHANT_CITY, merchant_city),
        // Emitted even when the label is empty; some scanners choke on a payload without it.
        Field::group(
            tags::ADDITIONAL_DATA_FIELD_TEMPLATE,
            vec![Field::leaf(
                tags::additional_data::REFERENCE_LABEL,
                reference_label,
            )],
        ),
    ]);
    Ok(fields)
}

/// Assembles the un-checksummed payload.
///
/// The result ends with the checksum field's tag and length (`6304`), ready
/// for [`append_checksum`](crate::crc::append_checksum).
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "pix.payload.assemble", skip_all, err)
)]
pub fn assemble(request: &PaymentRequest) -> Result<String, PayloadError> {
    let mut payload = tlv::serialize(&fields(request)?)?;
    payload.push_str(CHECKSUM_FIELD_HEADER);
    Ok(payload)
}

/// Assembles a payload and completes it with its checksum.
///
/// ```rust
/// use pix_codec::{PaymentRequest, PixAmount, assemble_and_checksum, verify};
///
/// let request = PaymentRequest::new("test@pagamentos.com", "Sistema de Pagamentos", "SAO PAULO")
///     .with_amount(PixAmount::parse("10.50").unwrap())
///     .with_reference_label("Pedido 123");
/// let payload = assemble_and_checksum(&request).unwrap();
/// assert!(payload.as_str().ends_with("6304DF73"));
/// assert!(verify(payload.as_str()).is_ok());
/// ```
pub fn assemble_and_checksum(request: &PaymentRequest) -> Result<Payload, PayloadError> {
    let prefix = assemble(request)?;
    let checksum = Checksum::of(&prefix);
    let payload = Payload {
        text: format!("{prefix}{checksum}"),
        checksum,
    };
    #[cfg(feature = "telemetry")]
    tracing::debug!(checksum = %payload.checksum(), len = payload.as_str().len(), "Payload assembled");
    Ok(payload)
}

fn clean_text(field: &str, value: &str, max: usize) -> Result<String, PayloadError> {
    let ascii = text::to_ascii(value)
        .map_err(|c| PayloadError::InvalidRequest(format!("{field} contains {c:?}")))?;
    Ok(text::truncate(&ascii, max).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::parse_fields;

    fn sample() -> PaymentRequest {
        PaymentRequest::new("test@pagamentos.com", "Sistema de Pagamentos", "SAO PAULO")
            .with_amount(PixAmount::parse("10.50").unwrap())
            .with_reference_label("Pedido 123")
    }

    fn top_level_tags(payload: &str) -> Vec<u8> {
        parse_fields(payload)
            .unwrap()
            .iter()
            .map(|f| f.tag().id())
            .collect()
    }

    #[test]
    fn test_known_payload() {
        let payload = assemble_and_checksum(&sample()).unwrap();
        assert_eq!(
            payload.as_str(),
            "00020101021126410014BR.GOV.BCB.PIX0119test@pagamentos.com520400005303986540510.505802BR5921Sistema de Pagamentos6009SAO PAULO62140510Pedido 1236304DF73"
        );
        assert_eq!(payload.checksum(), Checksum(0xDF73));
    }

    #[test]
    fn test_assemble_ends_with_checksum_header() {
        let prefix = assemble(&sample()).unwrap();
        assert!(prefix.ends_with("6304"));
        assert!(prefix.starts_with("000201010211"));
    }

    #[test]
    fn test_canonical_field_order() {
        let payload = assemble_and_checksum(&sample()).unwrap();
        assert_eq!(
            top_level_tags(payload.as_str()),
            vec![0, 1, 26, 52, 53, 54, 58, 59, 60, 62, 63]
        );
    }

    #[test]
    fn test_open_amount_omits_amount_field() {
        let request = PaymentRequest::new("+5511999998888", "Loja do Joao", "RIO DE JANEIRO")
            .with_reference_label("TX42");
        let payload = assemble_and_checksum(&request).unwrap();
        let tags = top_level_tags(payload.as_str());
        assert!(!tags.contains(&54));
        assert_eq!(tags, vec![0, 1, 26, 52, 53, 58, 59, 60, 62, 63]);
    }

    #[test]
    fn test_empty_reference_keeps_additional_data_group() {
        let request = PaymentRequest::new("test@pagamentos.com", "Sistema de Pagamentos", "SAO PAULO");
        let payload = assemble_and_checksum(&request).unwrap();
        assert_eq!(
            payload.as_str(),
            "00020101021126410014BR.GOV.BCB.PIX0119test@pagamentos.com5204000053039865802BR5921Sistema de Pagamentos6009SAO PAULO6204050063042A84"
        );
        assert!(payload.as_str().contains("62040500"));
    }

    #[test]
    fn test_merchant_name_truncation_boundary() {
        let exact = "A".repeat(25);
        let request = PaymentRequest::new("key", exact.clone(), "CITY");
        let payload = assemble(&request).unwrap();
        assert!(payload.contains(&format!("5925{exact}60")));

        let long = format!("{exact}B");
        let request = PaymentRequest::new("key", long, "CITY");
        let payload = assemble(&request).unwrap();
        assert!(payload.contains(&format!("5925{exact}60")));
        assert!(!payload.contains("AB"));
    }

    #[test]
    fn test_city_and_reference_truncation() {
        let request = PaymentRequest::new("key", "NAME", "CIDADE MUITO COMPRIDA")
            .with_reference_label("r".repeat(40));
        let payload = assemble(&request).unwrap();
        assert!(payload.contains("6015CIDADE MUITO CO62"));
        assert!(payload.contains(&format!("62290525{}6304", "r".repeat(25))));
    }

    #[test]
    fn test_empty_beneficiary_key_is_rejected() {
        let request = PaymentRequest::new("", "NAME", "CITY");
        assert!(matches!(
            assemble(&request),
            Err(PayloadError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_non_ascii_key_is_rejected() {
        let request = PaymentRequest::new("joão@example.com", "NAME", "CITY");
        assert!(matches!(
            assemble(&request),
            Err(PayloadError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_accented_text_is_folded() {
        let request = PaymentRequest::new("key", "Padaria Pão de Açúcar", "São Paulo")
            .with_reference_label("Doação");
        let payload = assemble(&request).unwrap();
        assert!(payload.contains("5921Padaria Pao de Acucar"));
        assert!(payload.contains("6009Sao Paulo"));
        assert!(payload.contains("0506Doacao"));
        assert!(payload.is_ascii());
    }

    #[test]
    fn test_unmappable_text_is_rejected() {
        let request = PaymentRequest::new("key", "Loja 🚀", "CITY");
        assert!(matches!(
            assemble(&request),
            Err(PayloadError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_oversized_key_propagates_field_too_long() {
        let request = PaymentRequest::new("k".repeat(78), "NAME", "CITY");
        let err = assemble(&request).unwrap_err();
        assert_eq!(
            err,
            PayloadError::FieldTooLong {
                tag: tags::MERCHANT_ACCOUNT_INFORMATION,
                len: 100
            }
        );
        let request = PaymentRequest::new("k".repeat(77), "NAME", "CITY");
        assert!(assemble(&request).is_ok());
    }

    #[test]
    fn test_deterministic() {
        let a = assemble_and_checksum(&sample()).unwrap();
        let b = assemble_and_checksum(&sample()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_request_serde() {
        let json = r#"{"beneficiary_key":"k","merchant_name":"N","merchant_city":"C","amount":"5"}"#;
        let request: PaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.amount.unwrap().to_string(), "5.00");
        assert_eq!(request.reference_label, "");
    }

    #[test]
    fn test_payload_deserialize_verifies_checksum() {
        let text = assemble_and_checksum(&sample()).unwrap().into_string();
        let json = serde_json::to_string(&text).unwrap();
        let payload: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload.as_str(), text);
        assert_eq!(payload.checksum(), Checksum(0xDF73));

        let tampered = serde_json::to_string(&text.replace("Pedido 123", "Pedido 124")).unwrap();
        assert!(serde_json::from_str::<Payload>(&tampered).is_err());
    }
}
