//! Tag-length-value field encoding.
//!
//! Every PIX payload is a flat run of `TAG + LENGTH + VALUE` units where the
//! tag and length are both two ASCII decimal digits. Two top-level fields
//! (merchant account information and additional data) carry a run of
//! already-encoded sub-fields as their value, one level deep.
//!
//! ```rust
//! use pix_codec::tlv::{Field, Tag};
//!
//! let group = Field::group(
//!     Tag::new(62),
//!     vec![Field::leaf(Tag::new(5), "TX42")],
//! );
//! assert_eq!(group.encode().unwrap().to_string(), "62080504TX42");
//! ```

use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Largest value a single TLV unit can carry, bounded by the two-digit length.
pub const MAX_VALUE_LEN: usize = 99;

/// A two-digit field tag, `00` through `99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(u8);

impl Tag {
    /// Creates a tag from its numeric id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is above 99. Intended for constants; use
    /// [`Tag::from_str`] for untrusted input.
    pub const fn new(id: u8) -> Self {
        assert!(id < 100, "tag id must fit in two decimal digits");
        Self(id)
    }

    pub fn id(&self) -> u8 {
        self.0
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for Tag {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_two_digits(s)
            .map(|id| Tag(id as u8))
            .ok_or_else(|| FieldError::InvalidTag(s.to_string()))
    }
}

/// Errors raised while encoding or splitting TLV fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The value does not fit the two-digit length prefix.
    #[error("Field {tag} value is {len} bytes, longer than the {MAX_VALUE_LEN} byte limit")]
    FieldTooLong { tag: Tag, len: usize },
    /// A group was placed inside another group.
    #[error("Field {tag} nests a group inside a group")]
    NestingTooDeep { tag: Tag },
    /// The tag is not exactly two ASCII digits.
    #[error("Invalid tag {0:?}")]
    InvalidTag(String),
    /// The length prefix is not exactly two ASCII digits.
    #[error("Invalid length prefix at byte {offset}")]
    InvalidLength { offset: usize },
    /// Input ended in the middle of a field.
    #[error("Unexpected end of input at byte {offset}")]
    Truncated { offset: usize },
}

/// A single serialized TLV unit.
///
/// The length prefix is derived from the value, so it always matches the
/// value's byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedField {
    tag: Tag,
    value: String,
}

impl EncodedField {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Byte length of the value, as written in the length prefix.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Splits the value of a group field into its sub-fields.
    pub fn subfields(&self) -> Result<Vec<EncodedField>, FieldError> {
        parse_fields(&self.value)
    }
}

impl Display for EncodedField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}{}", self.tag, self.value.len(), self.value)
    }
}

/// Encodes one field as `tag + zero-padded length + value`.
///
/// Values are never truncated here; anything over [`MAX_VALUE_LEN`] bytes is
/// returned as [`FieldError::FieldTooLong`].
pub fn encode_field(tag: Tag, value: &str) -> Result<EncodedField, FieldError> {
    if value.len() > MAX_VALUE_LEN {
        return Err(FieldError::FieldTooLong {
            tag,
            len: value.len(),
        });
    }
    Ok(EncodedField {
        tag,
        value: value.to_string(),
    })
}

/// Encodes a group whose value is the concatenation of `inner` fields.
///
/// The outer length covers the whole serialized sub-payload, not any single
/// inner field.
pub fn encode_group(tag: Tag, inner: &[EncodedField]) -> Result<EncodedField, FieldError> {
    let value: String = inner.iter().map(|field| field.to_string()).collect();
    encode_field(tag, &value)
}

/// Logical field tree: a plain value or a one-level group of plain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Leaf { tag: Tag, value: String },
    Group { tag: Tag, fields: Vec<Field> },
}

impl Field {
    pub fn leaf(tag: Tag, value: impl Into<String>) -> Self {
        Field::Leaf {
            tag,
            value: value.into(),
        }
    }

    pub fn group(tag: Tag, fields: Vec<Field>) -> Self {
        Field::Group { tag, fields }
    }

    pub fn tag(&self) -> Tag {
        match self {
            Field::Leaf { tag, .. } | Field::Group { tag, .. } => *tag,
        }
    }

    /// Serializes this field, recursing into group members.
    pub fn encode(&self) -> Result<EncodedField, FieldError> {
        match self {
            Field::Leaf { tag, value } => encode_field(*tag, value),
            Field::Group { tag, fields } => {
                let inner = fields
                    .iter()
                    .map(|field| match field {
                        Field::Leaf { tag, value } => encode_field(*tag, value),
                        Field::Group { tag: nested, .. } => {
                            Err(FieldError::NestingTooDeep { tag: *nested })
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                encode_group(*tag, &inner)
            }
        }
    }
}

/// Serializes an ordered list of fields into one string.
pub fn serialize(fields: &[Field]) -> Result<String, FieldError> {
    let mut out = String::new();
    for field in fields {
        out.push_str(&field.encode()?.to_string());
    }
    Ok(out)
}

/// Splits a TLV string into its top-level fields.
///
/// Group values are left as-is; call [`EncodedField::subfields`] on them.
pub fn parse_fields(input: &str) -> Result<Vec<EncodedField>, FieldError> {
    let mut fields = Vec::new();
    let mut offset = 0;
    while offset < input.len() {
        let tag_str = input
            .get(offset..offset + 2)
            .ok_or(FieldError::Truncated { offset })?;
        let tag = Tag::from_str(tag_str)?;
        let len = input
            .get(offset + 2..offset + 4)
            .ok_or(FieldError::Truncated { offset: offset + 2 })
            .and_then(|s| {
                parse_two_digits(s).ok_or(FieldError::InvalidLength { offset: offset + 2 })
            })?;
        let start = offset + 4;
        let value = input
            .get(start..start + len)
            .ok_or(FieldError::Truncated { offset: start })?;
        fields.push(EncodedField {
            tag,
            value: value.to_string(),
        });
        offset = start + len;
    }
    Ok(fields)
}

fn parse_two_digits(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(((bytes[0] - b'0') * 10 + (bytes[1] - b'0')) as usize)
}
