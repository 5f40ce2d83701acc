//! BTP (Bilateral Transfer Protocol) binary framing codec.
//!
//! Wire layout: 1-byte message type, 4-byte big-endian request id, then a
//! body that differs by type: an `Error` message carries four
//! length-prefixed fields (code, name, triggeredAt as u8-length strings,
//! data as u32-length bytes); every other type carries a protocol-data
//! array followed by an optional embedded ILP packet.

use crate::oer::{OerError, Reader};

/// BTP message type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtpMessageType {
    Message,
    Response,
    Error,
    /// Any other value, preserved verbatim (the codec does not interpret it
    /// beyond distinguishing `Error` from everything else).
    Other(u8),
}

impl BtpMessageType {
    fn from_tag(tag: u8) -> Result<Self, BtpError> {
        match tag {
            6 => Ok(BtpMessageType::Message),
            1 => Ok(BtpMessageType::Response),
            2 => Ok(BtpMessageType::Error),
            // BTP reserves a handful of additional control types (Transfer, etc.);
            // anything else is preserved as-is rather than rejected, since the
            // codec's job is framing, not protocol-type policing.
            other if other != 0 => Ok(BtpMessageType::Other(other)),
            _ => Err(BtpError::new("F00", "Invalid BTP message type")),
        }
    }

    fn to_tag(self) -> u8 {
        match self {
            BtpMessageType::Message => 6,
            BtpMessageType::Response => 1,
            BtpMessageType::Error => 2,
            BtpMessageType::Other(tag) => tag,
        }
    }

    fn is_error(self) -> bool {
        matches!(self, BtpMessageType::Error)
    }
}

/// A single protocol-data entry carried in a non-error BTP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDataEntry {
    pub protocol_name: String,
    pub content_type: u16,
    pub data: Vec<u8>,
}

/// The error-specific body of a BTP `Error` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtpErrorBody {
    pub code: String,
    pub name: String,
    pub triggered_at: String,
    pub data: Vec<u8>,
}

/// The body of a non-error BTP message: side-band protocol data plus an
/// optional embedded ILP packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtpMessageBody {
    pub protocol_data: Vec<ProtocolDataEntry>,
    /// `None` means the ILP packet field was absent (wire length 0).
    pub ilp_packet: Option<Vec<u8>>,
}

/// Either shape a BTP message body can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BtpBody {
    Error(BtpErrorBody),
    Message(BtpMessageBody),
}

/// A parsed BTP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtpMessage {
    pub message_type: BtpMessageType,
    pub request_id: u32,
    pub body: BtpBody,
}

/// The BTP protocol's own error family. Every framing/truncation defect is
/// reported as `BtpError::new("F00", reason)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("BTP error {code}: {reason}")]
pub struct BtpError {
    pub code: String,
    pub reason: String,
}

impl BtpError {
    pub fn new(code: impl Into<String>, reason: impl Into<String>) -> Self {
        BtpError {
            code: code.into(),
            reason: reason.into(),
        }
    }
}

impl From<OerError> for BtpError {
    fn from(_: OerError) -> Self {
        BtpError::new("F00", "BTP message too short")
    }
}

const MIN_HEADER_LEN: usize = 1 + 4;

impl BtpMessage {
    /// Parses a BTP message from its wire bytes.
    pub fn parse(buf: &[u8]) -> Result<Self, BtpError> {
        if buf.len() < MIN_HEADER_LEN {
            return Err(BtpError::new("F00", "BTP message too short"));
        }
        let mut reader = Reader::new(buf);
        let tag = reader.read_u8()?;
        let message_type = BtpMessageType::from_tag(tag)?;
        let request_id = reader.read_uint_be(4)? as u32;
        let body = if message_type.is_error() {
            BtpBody::Error(parse_error_body(&mut reader)?)
        } else {
            BtpBody::Message(parse_message_body(&mut reader)?)
        };
        Ok(BtpMessage {
            message_type,
            request_id,
            body,
        })
    }

    /// Serializes this message into its canonical wire bytes.
    pub fn serialize(&self) -> Vec<u8> {
        match &self.body {
            BtpBody::Error(err) => serialize_error(self.message_type, self.request_id, err),
            BtpBody::Message(msg) => serialize_message(self.message_type, self.request_id, msg),
        }
    }
}

fn read_len_prefixed_string(reader: &mut Reader<'_>, field: &'static str) -> Result<String, BtpError> {
    let len = reader.read_u8().map_err(|_| BtpError::new("F00", field))? as usize;
    let bytes = reader.read_fixed(len).map_err(|_| BtpError::new("F00", field))?;
    String::from_utf8(bytes.to_vec()).map_err(|_| BtpError::new("F00", field))
}

fn parse_error_body(reader: &mut Reader<'_>) -> Result<BtpErrorBody, BtpError> {
    let code = read_len_prefixed_string(reader, "error code")?;
    let name = read_len_prefixed_string(reader, "error name")?;
    let triggered_at = read_len_prefixed_string(reader, "error triggeredAt")?;
    let data_len = reader
        .read_uint_be(4)
        .map_err(|_| BtpError::new("F00", "error data length"))? as usize;
    let data = reader
        .read_fixed(data_len)
        .map_err(|_| BtpError::new("F00", "error data"))?
        .to_vec();
    Ok(BtpErrorBody {
        code,
        name,
        triggered_at,
        data,
    })
}

fn parse_message_body(reader: &mut Reader<'_>) -> Result<BtpMessageBody, BtpError> {
    let count = reader
        .read_u8()
        .map_err(|_| BtpError::new("F00", "protocol data count"))?;
    let mut protocol_data = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_len = reader
            .read_u8()
            .map_err(|_| BtpError::new("F00", "protocol data name length"))? as usize;
        let protocol_name = reader
            .read_fixed(name_len)
            .map_err(|_| BtpError::new("F00", "protocol data name"))?;
        let protocol_name = String::from_utf8(protocol_name.to_vec())
            .map_err(|_| BtpError::new("F00", "protocol data name"))?;
        let content_type = reader
            .read_uint_be(2)
            .map_err(|_| BtpError::new("F00", "protocol data content type"))? as u16;
        let data_len = reader
            .read_uint_be(4)
            .map_err(|_| BtpError::new("F00", "protocol data length"))? as usize;
        let data = reader
            .read_fixed(data_len)
            .map_err(|_| BtpError::new("F00", "protocol data"))?
            .to_vec();
        protocol_data.push(ProtocolDataEntry {
            protocol_name,
            content_type,
            data,
        });
    }
    let ilp_len = reader
        .read_uint_be(4)
        .map_err(|_| BtpError::new("F00", "ILP packet length"))? as usize;
    let ilp_packet = if ilp_len == 0 {
        None
    } else {
        Some(
            reader
                .read_fixed(ilp_len)
                .map_err(|_| BtpError::new("F00", "ILP packet"))?
                .to_vec(),
        )
    };
    Ok(BtpMessageBody {
        protocol_data,
        ilp_packet,
    })
}

fn serialize_error(message_type: BtpMessageType, request_id: u32, body: &BtpErrorBody) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(message_type.to_tag());
    out.extend_from_slice(&request_id.to_be_bytes());
    write_len_prefixed_string(&body.code, &mut out);
    write_len_prefixed_string(&body.name, &mut out);
    write_len_prefixed_string(&body.triggered_at, &mut out);
    out.extend_from_slice(&(body.data.len() as u32).to_be_bytes());
    out.extend_from_slice(&body.data);
    out
}

fn serialize_message(
    message_type: BtpMessageType,
    request_id: u32,
    body: &BtpMessageBody,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(message_type.to_tag());
    out.extend_from_slice(&request_id.to_be_bytes());
    out.push(body.protocol_data.len() as u8);
    for entry in &body.protocol_data {
        out.push(entry.protocol_name.len() as u8);
        out.extend_from_slice(entry.protocol_name.as_bytes());
        out.extend_from_slice(&entry.content_type.to_be_bytes());
        out.extend_from_slice(&(entry.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&entry.data);
    }
    match &body.ilp_packet {
        Some(packet) => {
            out.extend_from_slice(&(packet.len() as u32).to_be_bytes());
            out.extend_from_slice(packet);
        }
        None => out.extend_from_slice(&0u32.to_be_bytes()),
    }
    out
}

fn write_len_prefixed_string(s: &str, out: &mut Vec<u8>) {
    out.push(s.len() as u8);
    out.extend_from_slice(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_with_protocol_data_and_no_ilp_packet() {
        let mut buf = Vec::new();
        buf.push(1u8); // Response
        buf.extend_from_slice(&7u32.to_be_bytes());
        buf.push(1u8); // one protocol data entry
        buf.push(4u8); // name length
        buf.extend_from_slice(b"auth");
        buf.extend_from_slice(&2u16.to_be_bytes()); // contentType
        buf.extend_from_slice(&4u32.to_be_bytes()); // data length
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&0u32.to_be_bytes()); // ilp packet absent

        let parsed = BtpMessage::parse(&buf).unwrap();
        assert_eq!(parsed.request_id, 7);
        assert_eq!(parsed.message_type, BtpMessageType::Response);
        match parsed.body {
            BtpBody::Message(msg) => {
                assert_eq!(msg.protocol_data.len(), 1);
                assert_eq!(msg.protocol_data[0].protocol_name, "auth");
                assert_eq!(msg.protocol_data[0].content_type, 2);
                assert_eq!(msg.protocol_data[0].data, b"data");
                assert_eq!(msg.ilp_packet, None);
            }
            BtpBody::Error(_) => panic!("expected Message body"),
        }
    }

    #[test]
    fn test_too_short_buffer_is_btp_error() {
        let buf = [0u8; 4];
        let err = BtpMessage::parse(&buf).unwrap_err();
        assert_eq!(err.code, "F00");
        assert_eq!(err.reason, "BTP message too short");
    }

    #[test]
    fn test_invalid_type_is_btp_error() {
        let mut buf = Vec::new();
        buf.push(0u8); // reserved/invalid
        buf.extend_from_slice(&1u32.to_be_bytes());
        let err = BtpMessage::parse(&buf).unwrap_err();
        assert_eq!(err.code, "F00");
        assert_eq!(err.reason, "Invalid BTP message type");
    }

    #[test]
    fn test_round_trip_message_with_ilp_packet() {
        let msg = BtpMessage {
            message_type: BtpMessageType::Message,
            request_id: 42,
            body: BtpBody::Message(BtpMessageBody {
                protocol_data: vec![ProtocolDataEntry {
                    protocol_name: "payment-channel-claim".to_string(),
                    content_type: 1,
                    data: b"{}".to_vec(),
                }],
                ilp_packet: Some(vec![1, 2, 3]),
            }),
        };
        let bytes = msg.serialize();
        let parsed = BtpMessage::parse(&bytes).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_round_trip_error_message() {
        let msg = BtpMessage {
            message_type: BtpMessageType::Error,
            request_id: 9,
            body: BtpBody::Error(BtpErrorBody {
                code: "F00".to_string(),
                name: "NotAcceptedError".to_string(),
                triggered_at: "2026-01-01T00:00:00.000Z".to_string(),
                data: b"oops".to_vec(),
            }),
        };
        let bytes = msg.serialize();
        let parsed = BtpMessage::parse(&bytes).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_truncated_protocol_data_is_btp_error() {
        let mut buf = Vec::new();
        buf.push(6u8);
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.push(1u8); // claims one entry
        buf.push(10u8); // name length 10 but nothing follows
        let err = BtpMessage::parse(&buf).unwrap_err();
        assert_eq!(err.code, "F00");
    }

    #[test]
    fn test_zero_length_ilp_packet_is_absent() {
        let msg = BtpMessage {
            message_type: BtpMessageType::Message,
            request_id: 1,
            body: BtpBody::Message(BtpMessageBody {
                protocol_data: vec![],
                ilp_packet: None,
            }),
        };
        let bytes = msg.serialize();
        let parsed = BtpMessage::parse(&bytes).unwrap();
        assert_eq!(parsed.body, msg.body);
    }
}
