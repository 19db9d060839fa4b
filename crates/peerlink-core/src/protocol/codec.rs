// ============================================
// File: crates/peerlink-core/src/protocol/codec.rs
// ============================================
//! # Protocol Codec
//!
//! ## Creation Reason
//! Encodes and decodes the newline-delimited text protocol spoken between
//! peers and with the directory.
//!
//! ## Main Functionality
//! - `Codec` trait: Generic encode/decode interface
//! - `LineCodec`: Implementation for every message type
//! - `put_line` / `take_line`: Line framing helpers over `bytes`
//!
//! ## Parsing Strategy
//! 1. Split one line off the buffer (`\n`, tolerating a preceding `\r`)
//! 2. Reject lines over `MAX_LINE_LEN` and non-UTF-8 input
//! 3. Dispatch on the tag or command word
//! 4. Validate identities and integers field by field
//!
//! ## ⚠️ Important Note for Next Developer
//! - Directory commands are case-insensitive, envelope tags are not
//! - The final line of a buffer may omit its terminator
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::{Buf, BufMut, Bytes, BytesMut};
use peerlink_common::error::CommonError;
use peerlink_common::types::PeerId;

use crate::crypto::keys::PublicKey;
use crate::error::{CoreError, Result};
use crate::protocol::messages::{
    DirectoryRequest, DirectoryResponse, Envelope, EnvelopeKind, HandshakeAck,
    HandshakeOffer, SealedMessage, ACK_FAIL, ACK_OK, CMD_GETKEY, CMD_REGISTER,
    MAX_LINE_LEN, REPLY_ERROR, REPLY_KEY, REPLY_NOTFOUND, REPLY_OK,
};

// ============================================
// Codec Trait
// ============================================

/// Trait for encoding and decoding protocol messages.
///
/// # Type Parameters
/// * `T` - The message type to encode/decode
pub trait Codec<T> {
    /// Appends the encoded lines of `msg` to `buf`.
    fn encode(&self, msg: &T, buf: &mut BytesMut);

    /// Decodes one message, consuming its lines from `buf`.
    ///
    /// # Errors
    /// Protocol errors when the lines are malformed.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// Line Helpers
// ============================================

/// Appends `line` and a terminator.
pub fn put_line(buf: &mut BytesMut, line: &str) {
    buf.reserve(line.len() + 1);
    buf.put_slice(line.as_bytes());
    buf.put_u8(b'\n');
}

/// Splits the next line off `buf`, without its terminator.
///
/// # Errors
/// - `MalformedMessage` when `buf` is empty or not UTF-8
/// - `LineTooLong` when the line exceeds [`MAX_LINE_LEN`]
pub fn take_line(buf: &mut Bytes) -> Result<String> {
    if buf.is_empty() {
        return Err(CoreError::malformed("unexpected end of message"));
    }
    let mut line = match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => {
            let line = buf.split_to(pos);
            buf.advance(1);
            line
        }
        None => buf.split_to(buf.len()),
    };
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    if line.len() > MAX_LINE_LEN {
        return Err(CoreError::LineTooLong {
            max: MAX_LINE_LEN,
            actual: line.len(),
        });
    }
    String::from_utf8(line.to_vec()).map_err(|_| CoreError::malformed("line is not valid UTF-8"))
}

fn parse_u64(field: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| CoreError::malformed(format!("{field} is not an unsigned integer")))
}

fn parse_peer(value: &str) -> Result<PeerId> {
    Ok(PeerId::new(value).map_err(CommonError::from)?)
}

fn parse_key(modulus: &str, exponent: &str) -> Result<PublicKey> {
    Ok(PublicKey::new(
        parse_u64("modulus", modulus)?,
        parse_u64("exponent", exponent)?,
    ))
}

// ============================================
// LineCodec
// ============================================

/// Codec implementation for all protocol messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineCodec;

impl LineCodec {
    /// Creates a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Encodes `msg` into a fresh buffer.
    #[must_use]
    pub fn to_bytes<T>(&self, msg: &T) -> Bytes
    where
        Self: Codec<T>,
    {
        let mut buf = BytesMut::new();
        self.encode(msg, &mut buf);
        buf.freeze()
    }

    /// Decodes `msg` from a complete set of lines.
    ///
    /// # Errors
    /// Protocol errors from [`Codec::decode`].
    pub fn from_lines<T>(&self, lines: &[String]) -> Result<T>
    where
        Self: Codec<T>,
    {
        let mut buf = BytesMut::new();
        for line in lines {
            put_line(&mut buf, line);
        }
        self.decode(&mut buf.freeze())
    }
}

// ============================================
// Envelope Codec
// ============================================

impl Codec<Envelope> for LineCodec {
    fn encode(&self, msg: &Envelope, buf: &mut BytesMut) {
        put_line(buf, msg.kind().as_tag());
        put_line(buf, msg.sender().as_str());
        match msg {
            Envelope::Handshake { offer, .. } => {
                put_line(
                    buf,
                    &format!("{} {}", offer.encrypted_secret, offer.encrypted_signature),
                );
            }
            Envelope::Data { message, .. } => {
                put_line(buf, &message.ciphertext);
                put_line(buf, &message.signature.to_string());
            }
        }
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Envelope> {
        let tag = take_line(buf)?;
        let kind = EnvelopeKind::from_tag(&tag).ok_or(CoreError::UnknownTag(tag))?;
        let sender = parse_peer(take_line(buf)?.trim())?;

        match kind {
            EnvelopeKind::Handshake => {
                let line = take_line(buf)?;
                let mut parts = line.split_whitespace();
                let (Some(secret), Some(signature), None) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    return Err(CoreError::malformed(
                        "handshake line needs exactly two integers",
                    ));
                };
                Ok(Envelope::Handshake {
                    sender,
                    offer: HandshakeOffer {
                        encrypted_secret: parse_u64("encrypted secret", secret)?,
                        encrypted_signature: parse_u64("encrypted signature", signature)?,
                    },
                })
            }
            EnvelopeKind::Data => {
                let ciphertext = take_line(buf)?;
                let signature = parse_u64("signature", take_line(buf)?.trim())?;
                Ok(Envelope::Data {
                    sender,
                    message: SealedMessage {
                        ciphertext,
                        signature,
                    },
                })
            }
        }
    }
}

// ============================================
// HandshakeAck Codec
// ============================================

impl Codec<HandshakeAck> for LineCodec {
    fn encode(&self, msg: &HandshakeAck, buf: &mut BytesMut) {
        put_line(buf, msg.as_line());
    }

    fn decode(&self, buf: &mut Bytes) -> Result<HandshakeAck> {
        let line = take_line(buf)?;
        match line.trim() {
            ACK_OK => Ok(HandshakeAck::Accepted),
            ACK_FAIL => Ok(HandshakeAck::Rejected),
            other => Err(CoreError::UnknownTag(other.to_string())),
        }
    }
}

// ============================================
// Directory Codecs
// ============================================

impl Codec<DirectoryRequest> for LineCodec {
    fn encode(&self, msg: &DirectoryRequest, buf: &mut BytesMut) {
        let line = match msg {
            DirectoryRequest::Register { peer, key } => {
                format!("{CMD_REGISTER} {peer} {} {}", key.modulus, key.exponent)
            }
            DirectoryRequest::GetKey { peer } => format!("{CMD_GETKEY} {peer}"),
        };
        put_line(buf, &line);
    }

    fn decode(&self, buf: &mut Bytes) -> Result<DirectoryRequest> {
        let line = take_line(buf)?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((command, args)) = parts.split_first() else {
            return Err(CoreError::malformed("empty request"));
        };

        match command.to_ascii_uppercase().as_str() {
            CMD_REGISTER => match args {
                [peer, modulus, exponent] => Ok(DirectoryRequest::Register {
                    peer: parse_peer(peer)?,
                    key: parse_key(modulus, exponent)?,
                }),
                _ => Err(CoreError::malformed("REGISTER takes identity, modulus and exponent")),
            },
            CMD_GETKEY => match args {
                [peer] => Ok(DirectoryRequest::GetKey {
                    peer: parse_peer(peer)?,
                }),
                _ => Err(CoreError::malformed("GETKEY takes exactly one identity")),
            },
            _ => Err(CoreError::UnknownTag((*command).to_string())),
        }
    }
}

impl Codec<DirectoryResponse> for LineCodec {
    fn encode(&self, msg: &DirectoryResponse, buf: &mut BytesMut) {
        match msg {
            DirectoryResponse::Ok => put_line(buf, REPLY_OK),
            DirectoryResponse::Key { peer, key } => put_line(
                buf,
                &format!("{REPLY_KEY} {peer} {} {}", key.modulus, key.exponent),
            ),
            DirectoryResponse::NotFound => put_line(buf, REPLY_NOTFOUND),
            DirectoryResponse::Error => put_line(buf, REPLY_ERROR),
        }
    }

    fn decode(&self, buf: &mut Bytes) -> Result<DirectoryResponse> {
        let line = take_line(buf)?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [REPLY_OK] => Ok(DirectoryResponse::Ok),
            [REPLY_NOTFOUND] => Ok(DirectoryResponse::NotFound),
            [REPLY_ERROR] => Ok(DirectoryResponse::Error),
            [REPLY_KEY, peer, modulus, exponent] => Ok(DirectoryResponse::Key {
                peer: parse_peer(peer)?,
                key: parse_key(modulus, exponent)?,
            }),
            [] => Err(CoreError::malformed("empty reply")),
            [other, ..] => Err(CoreError::UnknownTag((*other).to_string())),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str) -> PeerId {
        PeerId::new(name).unwrap()
    }

    fn decode<T>(text: &str) -> Result<T>
    where
        LineCodec: Codec<T>,
    {
        LineCodec::new().decode(&mut Bytes::copy_from_slice(text.as_bytes()))
    }

    #[test]
    fn test_handshake_envelope_wire_format() {
        let envelope = Envelope::Handshake {
            sender: peer("Alice"),
            offer: HandshakeOffer {
                encrypted_secret: 1234,
                encrypted_signature: 5678,
            },
        };
        let bytes = LineCodec::new().to_bytes(&envelope);
        assert_eq!(&bytes[..], b"HANDSHAKE\nAlice\n1234 5678\n");
        assert_eq!(decode::<Envelope>("HANDSHAKE\nAlice\n1234 5678\n").unwrap(), envelope);
    }

    #[test]
    fn test_data_envelope_wire_format() {
        let envelope = Envelope::Data {
            sender: peer("Bob"),
            message: SealedMessage {
                ciphertext: "Khoor, Zruog!".into(),
                signature: 99,
            },
        };
        let bytes = LineCodec::new().to_bytes(&envelope);
        assert_eq!(&bytes[..], b"DATA\nBob\nKhoor, Zruog!\n99\n");
        assert_eq!(decode::<Envelope>("DATA\nBob\nKhoor, Zruog!\n99").unwrap(), envelope);
    }

    #[test]
    fn test_data_envelope_keeps_ciphertext_whitespace() {
        let envelope: Envelope = decode("DATA\nBob\n  spaced  out \n7\n").unwrap();
        match envelope {
            Envelope::Data { message, .. } => assert_eq!(message.ciphertext, "  spaced  out "),
            Envelope::Handshake { .. } => panic!("expected data envelope"),
        }
    }

    #[test]
    fn test_envelope_errors() {
        assert!(matches!(decode::<Envelope>("PING\nAlice\n"), Err(CoreError::UnknownTag(t)) if t == "PING"));
        assert!(decode::<Envelope>("HANDSHAKE\nAlice\n12\n").unwrap_err().is_protocol_error());
        assert!(decode::<Envelope>("HANDSHAKE\nAlice\n1 2 3\n").is_err());
        assert!(decode::<Envelope>("HANDSHAKE\nAlice\n-1 2\n").is_err());
        assert!(decode::<Envelope>("DATA\nBob\nhello\n").is_err());
        assert!(decode::<Envelope>("DATA\nBob\nhello\nabc\n").is_err());
        assert!(decode::<Envelope>("HANDSHAKE\n\n1 2\n").is_err());
        assert!(matches!(
            decode::<Envelope>("DATA\nAlice\tB\nhello\n7\n"),
            Err(CoreError::Common(CommonError::InvalidPeerId(_)))
        ));
    }

    #[test]
    fn test_take_line_limits() {
        let long = format!("{}\n", "x".repeat(MAX_LINE_LEN + 1));
        let mut buf = Bytes::from(long);
        assert!(matches!(take_line(&mut buf), Err(CoreError::LineTooLong { .. })));

        let mut buf = Bytes::from_static(b"a\r\nb");
        assert_eq!(take_line(&mut buf).unwrap(), "a");
        assert_eq!(take_line(&mut buf).unwrap(), "b");
        assert!(take_line(&mut buf).is_err());

        let mut buf = Bytes::from_static(b"\xff\xfe\n");
        assert!(take_line(&mut buf).is_err());
    }

    #[test]
    fn test_ack_codec() {
        let codec = LineCodec::new();
        assert_eq!(&codec.to_bytes(&HandshakeAck::Accepted)[..], b"HS_OK\n");
        assert_eq!(&codec.to_bytes(&HandshakeAck::Rejected)[..], b"HS_FAIL\n");
        assert_eq!(decode::<HandshakeAck>("HS_OK\n").unwrap(), HandshakeAck::Accepted);
        assert_eq!(decode::<HandshakeAck>("HS_FAIL").unwrap(), HandshakeAck::Rejected);
        assert!(decode::<HandshakeAck>("MAYBE\n").is_err());
    }

    #[test]
    fn test_directory_request_codec() {
        let register = DirectoryRequest::Register {
            peer: peer("Alice"),
            key: PublicKey::new(11_021, 17),
        };
        let codec = LineCodec::new();
        assert_eq!(&codec.to_bytes(&register)[..], b"REGISTER Alice 11021 17\n");
        assert_eq!(decode::<DirectoryRequest>("REGISTER Alice 11021 17\n").unwrap(), register);
        assert_eq!(decode::<DirectoryRequest>("register Alice 11021 17").unwrap(), register);

        let get = DirectoryRequest::GetKey { peer: peer("Bob") };
        assert_eq!(&codec.to_bytes(&get)[..], b"GETKEY Bob\n");
        assert_eq!(decode::<DirectoryRequest>("GetKey Bob\n").unwrap(), get);
    }

    #[test]
    fn test_directory_request_errors() {
        assert!(decode::<DirectoryRequest>("\n").is_err());
        assert!(decode::<DirectoryRequest>("REGISTER Alice 11021\n").is_err());
        assert!(decode::<DirectoryRequest>("REGISTER Alice eleven 17\n").is_err());
        assert!(decode::<DirectoryRequest>("GETKEY\n").is_err());
        assert!(decode::<DirectoryRequest>("GETKEY Alice Bob\n").is_err());
        assert!(matches!(
            decode::<DirectoryRequest>("DELETE Alice\n"),
            Err(CoreError::UnknownTag(_))
        ));
    }

    #[test]
    fn test_directory_response_codec() {
        let codec = LineCodec::new();
        let key = DirectoryResponse::Key {
            peer: peer("Bob"),
            key: PublicKey::new(12_317, 17),
        };
        assert_eq!(&codec.to_bytes(&key)[..], b"KEY Bob 12317 17\n");
        assert_eq!(decode::<DirectoryResponse>("KEY Bob 12317 17\n").unwrap(), key);
        assert_eq!(decode::<DirectoryResponse>("OK\n").unwrap(), DirectoryResponse::Ok);
        assert_eq!(decode::<DirectoryResponse>("NOTFOUND\n").unwrap(), DirectoryResponse::NotFound);
        assert_eq!(decode::<DirectoryResponse>("ERROR\n").unwrap(), DirectoryResponse::Error);
        assert!(decode::<DirectoryResponse>("KEY Bob 12317\n").is_err());
        assert!(decode::<DirectoryResponse>("\n").is_err());
    }

    #[test]
    fn test_from_lines() {
        let lines = vec!["DATA".to_string(), "Bob".to_string(), "Ifmmp".to_string(), "5".to_string()];
        let envelope: Envelope = LineCodec::new().from_lines(&lines).unwrap();
        assert_eq!(envelope.kind(), EnvelopeKind::Data);
        assert_eq!(envelope.sender().as_str(), "Bob");
    }
}
