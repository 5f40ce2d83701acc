//! OER codec for ILPv4 Prepare/Fulfill/Reject packets.
//!
//! Every packet is a one-byte type tag followed by an OER length-prefixed
//! body (see [`crate::oer`] for the variable-length-integer length prefix
//! rule). `encode` is total over validated packets; `decode` rejects
//! malformed input with a structured [`InvalidPacket`].

use crate::address::Address;
use crate::oer::{self, OerError, Reader};
use crate::timestamp::{IlpTimestamp, IlpTimestampError};

const TYPE_PREPARE: u8 = 12;
const TYPE_FULFILL: u8 = 13;
const TYPE_REJECT: u8 = 14;

/// The three ILPv4 packet types, as a discriminated union over the wire `type` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IlpPacket {
    Prepare(Prepare),
    Fulfill(Fulfill),
    Reject(Reject),
}

/// A conditional transfer offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepare {
    pub amount: u64,
    pub destination: Address,
    /// SHA-256 hash of the fulfillment preimage. Exactly 32 bytes.
    pub execution_condition: [u8; 32],
    pub expires_at: IlpTimestamp,
    pub data: Vec<u8>,
}

/// Proof that a [`Prepare`] was honored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfill {
    /// Preimage of the corresponding Prepare's `execution_condition`. Exactly 32 bytes.
    pub fulfillment: [u8; 32],
    pub data: Vec<u8>,
}

/// A 3-ASCII-character ILP error code, e.g. `F00`, `T01`, `R00`.
///
/// The code space (`Fxx` final, `Txx` temporary/retryable, `Rxx`
/// relative/protocol) is an open registry per RFC-0027, so this is a
/// validated newtype rather than a closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode([u8; 3]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Final,
    Temporary,
    Relative,
}

impl ErrorCode {
    pub fn parse(bytes: [u8; 3]) -> Result<Self, InvalidPacket> {
        if !bytes.is_ascii() {
            return Err(InvalidPacket::NonAsciiErrorCode);
        }
        Ok(ErrorCode(bytes))
    }

    pub fn as_bytes(&self) -> [u8; 3] {
        self.0
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).expect("validated ASCII on construction")
    }

    pub fn class(&self) -> Option<ErrorClass> {
        match self.0[0] {
            b'F' => Some(ErrorClass::Final),
            b'T' => Some(ErrorClass::Temporary),
            b'R' => Some(ErrorClass::Relative),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rejection of a [`Prepare`], carrying a machine-readable code and human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reject {
    pub code: ErrorCode,
    pub triggered_by: Address,
    pub message: String,
    pub data: Vec<u8>,
}

/// Structured decode/validation failure for the ILP codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPacket {
    #[error("buffer is empty")]
    EmptyBuffer,
    #[error("unknown packet type tag {0}")]
    UnknownTypeTag(u8),
    #[error("truncated buffer: {0}")]
    Truncated(&'static str),
    #[error("trailing bytes after packet body")]
    TrailingBytes,
    #[error("error code bytes are not ASCII")]
    NonAsciiErrorCode,
    #[error("invalid address in packet: {0}")]
    InvalidAddress(#[from] crate::address::AddressError),
    #[error("message field is not valid UTF-8")]
    InvalidUtf8Message,
    #[error("triggeredBy field is not valid UTF-8")]
    InvalidUtf8TriggeredBy,
    #[error("expiresAt timestamp is invalid: {0}")]
    InvalidTimestamp(#[from] IlpTimestampError),
}

impl From<OerError> for InvalidPacket {
    fn from(_: OerError) -> Self {
        InvalidPacket::Truncated("OER field")
    }
}

impl IlpPacket {
    /// Encodes this packet into its canonical wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            IlpPacket::Prepare(p) => encode_envelope(TYPE_PREPARE, &p.encode_body()),
            IlpPacket::Fulfill(f) => encode_envelope(TYPE_FULFILL, &f.encode_body()),
            IlpPacket::Reject(r) => encode_envelope(TYPE_REJECT, &r.encode_body()),
        }
    }

    /// Decodes a packet from its canonical wire bytes.
    pub fn decode(buf: &[u8]) -> Result<Self, InvalidPacket> {
        if buf.is_empty() {
            return Err(InvalidPacket::EmptyBuffer);
        }
        let mut reader = Reader::new(buf);
        let tag = reader.read_u8().map_err(|_| InvalidPacket::EmptyBuffer)?;
        let body = reader
            .read_var_octets()
            .map_err(|_| InvalidPacket::Truncated("packet body length"))?;
        if !reader.is_empty() {
            return Err(InvalidPacket::TrailingBytes);
        }
        match tag {
            TYPE_PREPARE => Ok(IlpPacket::Prepare(Prepare::decode_body(body)?)),
            TYPE_FULFILL => Ok(IlpPacket::Fulfill(Fulfill::decode_body(body)?)),
            TYPE_REJECT => Ok(IlpPacket::Reject(Reject::decode_body(body)?)),
            other => Err(InvalidPacket::UnknownTypeTag(other)),
        }
    }
}

fn encode_envelope(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + body.len() + 3);
    out.push(tag);
    oer::write_var_octets(body, &mut out);
    out
}

impl Prepare {
    fn encode_body(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.amount.to_be_bytes());
        out.extend_from_slice(self.expires_at.to_wire_string().as_bytes());
        out.extend_from_slice(&self.execution_condition);
        oer::write_var_octets(self.destination.as_str().as_bytes(), &mut out);
        oer::write_var_octets(&self.data, &mut out);
        out
    }

    fn decode_body(body: &[u8]) -> Result<Self, InvalidPacket> {
        let mut reader = Reader::new(body);
        let amount = reader
            .read_uint_be(8)
            .map_err(|_| InvalidPacket::Truncated("amount"))?;
        let expires_raw = reader
            .read_fixed(17)
            .map_err(|_| InvalidPacket::Truncated("expiresAt"))?;
        let expires_str = std::str::from_utf8(expires_raw)
            .map_err(|_| InvalidPacket::Truncated("expiresAt"))?;
        let expires_at = IlpTimestamp::parse(expires_str)?;
        let condition_bytes = reader
            .read_fixed(32)
            .map_err(|_| InvalidPacket::Truncated("executionCondition"))?;
        let mut execution_condition = [0u8; 32];
        execution_condition.copy_from_slice(condition_bytes);
        let destination_bytes = reader
            .read_var_octets()
            .map_err(|_| InvalidPacket::Truncated("destination"))?;
        let destination_str = std::str::from_utf8(destination_bytes)
            .map_err(|_| InvalidPacket::Truncated("destination"))?;
        let destination = Address::parse(destination_str)?;
        let data = reader
            .read_var_octets()
            .map_err(|_| InvalidPacket::Truncated("data"))?
            .to_vec();
        if !reader.is_empty() {
            return Err(InvalidPacket::TrailingBytes);
        }
        Ok(Prepare {
            amount,
            destination,
            execution_condition,
            expires_at,
            data,
        })
    }
}

impl Fulfill {
    fn encode_body(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.fulfillment);
        oer::write_var_octets(&self.data, &mut out);
        out
    }

    fn decode_body(body: &[u8]) -> Result<Self, InvalidPacket> {
        let mut reader = Reader::new(body);
        let fulfillment_bytes = reader
            .read_fixed(32)
            .map_err(|_| InvalidPacket::Truncated("fulfillment"))?;
        let mut fulfillment = [0u8; 32];
        fulfillment.copy_from_slice(fulfillment_bytes);
        let data = reader
            .read_var_octets()
            .map_err(|_| InvalidPacket::Truncated("data"))?
            .to_vec();
        if !reader.is_empty() {
            return Err(InvalidPacket::TrailingBytes);
        }
        Ok(Fulfill { fulfillment, data })
    }
}

impl Reject {
    fn encode_body(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.code.as_bytes());
        oer::write_var_octets(self.triggered_by.as_str().as_bytes(), &mut out);
        oer::write_var_octets(self.message.as_bytes(), &mut out);
        oer::write_var_octets(&self.data, &mut out);
        out
    }

    fn decode_body(body: &[u8]) -> Result<Self, InvalidPacket> {
        let mut reader = Reader::new(body);
        let code_bytes = reader
            .read_fixed(3)
            .map_err(|_| InvalidPacket::Truncated("code"))?;
        let code = ErrorCode::parse([code_bytes[0], code_bytes[1], code_bytes[2]])?;
        let triggered_by_bytes = reader
            .read_var_octets()
            .map_err(|_| InvalidPacket::Truncated("triggeredBy"))?;
        let triggered_by_str = std::str::from_utf8(triggered_by_bytes)
            .map_err(|_| InvalidPacket::InvalidUtf8TriggeredBy)?;
        let triggered_by = Address::parse(triggered_by_str)?;
        let message_bytes = reader
            .read_var_octets()
            .map_err(|_| InvalidPacket::Truncated("message"))?;
        let message = std::str::from_utf8(message_bytes)
            .map_err(|_| InvalidPacket::InvalidUtf8Message)?
            .to_string();
        let data = reader
            .read_var_octets()
            .map_err(|_| InvalidPacket::Truncated("data"))?
            .to_vec();
        if !reader.is_empty() {
            return Err(InvalidPacket::TrailingBytes);
        }
        Ok(Reject {
            code,
            triggered_by,
            message,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_prepare() -> Prepare {
        Prepare {
            amount: 1000,
            destination: Address::parse("g.alice").unwrap(),
            execution_condition: [0u8; 32],
            expires_at: IlpTimestamp::parse("20251231235959999").unwrap(),
            data: Vec::new(),
        }
    }

    #[test]
    fn test_prepare_round_trip() {
        let packet = IlpPacket::Prepare(sample_prepare());
        let encoded = packet.encode();
        let decoded = IlpPacket::decode(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_prepare_truncated_at_byte_9_is_invalid() {
        let packet = IlpPacket::Prepare(sample_prepare());
        let encoded = packet.encode();
        let truncated = &encoded[..9];
        assert!(IlpPacket::decode(truncated).is_err());
    }

    #[test]
    fn test_fulfill_round_trip() {
        let packet = IlpPacket::Fulfill(Fulfill {
            fulfillment: [7u8; 32],
            data: b"hello".to_vec(),
        });
        let encoded = packet.encode();
        let decoded = IlpPacket::decode(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_reject_round_trip() {
        let packet = IlpPacket::Reject(Reject {
            code: ErrorCode::parse(*b"F00").unwrap(),
            triggered_by: Address::parse("g.bob").unwrap(),
            message: "insufficient liquidity".to_string(),
            data: Vec::new(),
        });
        let encoded = packet.encode();
        let decoded = IlpPacket::decode(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_reject_error_code_class() {
        let code = ErrorCode::parse(*b"T01").unwrap();
        assert_eq!(code.class(), Some(ErrorClass::Temporary));
    }

    #[test]
    fn test_unknown_type_tag_is_invalid() {
        let mut buf = Vec::new();
        buf.push(99u8);
        oer::write_var_octets(&[], &mut buf);
        assert!(matches!(
            IlpPacket::decode(&buf),
            Err(InvalidPacket::UnknownTypeTag(99))
        ));
    }

    #[test]
    fn test_empty_buffer_is_invalid() {
        assert!(matches!(
            IlpPacket::decode(&[]),
            Err(InvalidPacket::EmptyBuffer)
        ));
    }

    #[test]
    fn test_trailing_bytes_is_invalid() {
        let packet = IlpPacket::Prepare(sample_prepare());
        let mut encoded = packet.encode();
        encoded.push(0xFF);
        assert!(matches!(
            IlpPacket::decode(&encoded),
            Err(InvalidPacket::TrailingBytes)
        ));
    }

    #[test]
    fn test_non_ascii_message_is_invalid() {
        let mut buf = Vec::new();
        buf.push(TYPE_REJECT);
        let mut body = Vec::new();
        body.extend_from_slice(b"F00");
        oer::write_var_octets(b"g.bob", &mut body);
        oer::write_var_octets(&[0xFF, 0xFE], &mut body); // invalid UTF-8
        oer::write_var_octets(&[], &mut body);
        oer::write_var_octets(&body, &mut buf);
        assert!(matches!(
            IlpPacket::decode(&buf),
            Err(InvalidPacket::InvalidUtf8Message)
        ));
    }
}
