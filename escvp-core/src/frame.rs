//! ESC/VP.net frame structure and encoding/decoding

use std::fmt;

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::{
    constants::{PROTOCOL_ID, PROTOCOL_VERSION},
    error::{Error, Result},
    frame_type::{FrameType, Status},
};

/// Attribute record attached to a frame
///
/// # Layout
///
/// ```text
/// ┌────────┬────────┬──────────────────────────────┐
/// │   ID   │  Attr  │            Info              │
/// │ 1 byte │ 1 byte │ 16 bytes (14 significant)    │
/// └────────┴────────┴──────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubHeader {
    pub id: u8,
    pub attr: u8,
    /// ASCII text, at most [`SubHeader::INFO_SIZE`] bytes on the wire
    pub info: String,
}

impl SubHeader {
    /// Encoded size of one sub-header block
    pub const SIZE: usize = 18;

    /// Significant bytes of the info field
    pub const INFO_SIZE: usize = 14;

    pub fn new(id: u8, attr: u8, info: impl Into<String>) -> Self {
        Self {
            id,
            attr,
            info: info.into(),
        }
    }

    fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u8(self.id);
        buf.put_u8(self.attr);

        let mut info = [0u8; Self::SIZE - 2];
        let text = self
            .info
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .take(Self::INFO_SIZE);
        for (slot, byte) in info.iter_mut().zip(text) {
            *slot = byte;
        }
        buf.put_slice(&info);
    }

    fn decode(block: &[u8]) -> Self {
        let info = &block[2..2 + Self::INFO_SIZE];
        let end = info.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Self {
            id: block[0],
            attr: block[1],
            info: String::from_utf8_lossy(&info[..end]).into_owned(),
        }
    }
}

/// ESC/VP.net frame
///
/// # Frame Structure
///
/// ```text
/// ┌──────────────┬─────────┬────────┬──────────┬────────┬─────────┬──────────────┐
/// │ Protocol ID  │ Version │  Type  │ Reserved │ Status │  Count  │ Sub-headers  │
/// │  10 bytes    │ 1 byte  │ 1 byte │ 2 bytes  │ 1 byte │ 1 byte  │ 18 × Count   │
/// │ "ESC/VP.net" │  0x10   │        │  0x0000  │        │         │              │
/// └──────────────┴─────────┴────────┴──────────┴────────┴─────────┴──────────────┘
/// ```
///
/// # Examples
///
/// ```
/// use escvp_core::{Frame, FrameType, Status};
///
/// let hello = Frame::hello();
/// let encoded = hello.encode();
/// assert_eq!(encoded.len(), Frame::BASE_SIZE);
///
/// let decoded = Frame::decode(&encoded).unwrap();
/// assert_eq!(decoded.frame_type, FrameType::Hello);
/// assert_eq!(decoded.status, Status::Request);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub status: Status,
    pub sub_headers: Vec<SubHeader>,
}

impl Frame {
    /// Base record size in bytes
    pub const BASE_SIZE: usize = 16;

    /// The count field is a single byte
    pub const MAX_SUB_HEADERS: usize = u8::MAX as usize;

    /// Create a frame without sub-headers
    pub fn new(frame_type: FrameType, status: Status) -> Self {
        Self {
            frame_type,
            status,
            sub_headers: Vec::new(),
        }
    }

    /// Discovery request
    pub fn hello() -> Self {
        Self::new(FrameType::Hello, Status::Request)
    }

    /// Command session handshake request
    pub fn connect() -> Self {
        Self::new(FrameType::Connect, Status::Request)
    }

    /// Append a sub-header
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManySubHeaders`] once the frame already carries
    /// [`Frame::MAX_SUB_HEADERS`] entries.
    pub fn with_sub_header(mut self, sub_header: SubHeader) -> Result<Self> {
        if self.sub_headers.len() >= Self::MAX_SUB_HEADERS {
            return Err(Error::TooManySubHeaders {
                max: Self::MAX_SUB_HEADERS,
            });
        }
        self.sub_headers.push(sub_header);
        Ok(self)
    }

    /// `true` for a projector's answer to discovery
    pub fn is_hello_ok(&self) -> bool {
        self.frame_type == FrameType::Hello && self.status.is_ok()
    }

    /// Encoded size of this frame
    pub fn size(&self) -> usize {
        Self::BASE_SIZE + SubHeader::SIZE * self.sub_headers.len()
    }

    /// Encode frame to bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_slice(PROTOCOL_ID);
        buf.put_u8(PROTOCOL_VERSION);
        buf.put_u8(self.frame_type.into());
        buf.put_u16(0);
        buf.put_u8(self.status.into());
        // with_sub_header caps the count at u8::MAX
        buf.put_u8(self.sub_headers.len() as u8);

        for sub_header in &self.sub_headers {
            sub_header.encode_into(&mut buf);
        }

        buf
    }

    /// Decode a frame from bytes
    ///
    /// Returns `None` when the buffer is not an ESC/VP.net frame: shorter
    /// than [`Frame::BASE_SIZE`], carrying another protocol id or version,
    /// or declaring more sub-headers than the buffer holds. Broadcast
    /// segments carry unrelated traffic, so this is an expected outcome
    /// rather than an error.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let total = match Self::frame_len(buf) {
            Some(total) => total,
            None => {
                trace!(len = buf.len(), "Not an ESC/VP.net frame");
                return None;
            }
        };
        if buf.len() < total {
            trace!(expected = total, actual = buf.len(), "Truncated frame");
            return None;
        }

        let sub_headers = buf[Self::BASE_SIZE..total]
            .chunks_exact(SubHeader::SIZE)
            .map(SubHeader::decode)
            .collect();

        Some(Self {
            frame_type: FrameType::from(buf[11]),
            status: Status::from(buf[14]),
            sub_headers,
        })
    }

    /// Total length declared by the base record at the start of `buf`
    ///
    /// `None` when `buf` does not start with a complete, matching base record.
    pub fn frame_len(buf: &[u8]) -> Option<usize> {
        if buf.len() < Self::BASE_SIZE
            || &buf[..PROTOCOL_ID.len()] != PROTOCOL_ID
            || buf[10] != PROTOCOL_VERSION
        {
            return None;
        }
        Some(Self::BASE_SIZE + SubHeader::SIZE * buf[15] as usize)
    }

    /// `true` while `buf` could still grow into a frame
    pub fn is_prefix(buf: &[u8]) -> bool {
        let id_len = buf.len().min(PROTOCOL_ID.len());
        if buf[..id_len] != PROTOCOL_ID[..id_len] {
            return false;
        }
        buf.len() <= PROTOCOL_ID.len() || buf[10] == PROTOCOL_VERSION
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("frame_type", &self.frame_type)
            .field("status", &self.status)
            .field("sub_headers", &self.sub_headers)
            .field("wire", &hex::encode(self.encode()))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[{}/{}](sub_headers={})",
            self.frame_type,
            self.status,
            self.sub_headers.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, SubHeader};
    use crate::error::Error;
    use crate::frame_type::{FrameType, Status};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_hello_layout() {
        let encoded = Frame::hello().encode();

        assert_eq!(encoded.len(), Frame::BASE_SIZE);
        assert_eq!(&encoded[..10], b"ESC/VP.net");
        assert_eq!(encoded[10], 0x10);
        assert_eq!(encoded[11], 0x01);
        assert_eq!(&encoded[12..14], &[0, 0]);
        assert_eq!(encoded[14], 0x00);
        assert_eq!(encoded[15], 0);
    }

    #[test]
    fn test_connect_layout() {
        let encoded = Frame::connect().encode();
        assert_eq!(encoded[11], 0x03);
        assert_eq!(encoded[14], 0x00);
    }

    #[test]
    fn test_sub_header_layout() {
        let frame = Frame::new(FrameType::Hello, Status::Ok)
            .with_sub_header(SubHeader::new(0x01, 0x02, "EB-1780W"))
            .unwrap();
        let encoded = frame.encode();

        assert_eq!(encoded.len(), Frame::BASE_SIZE + SubHeader::SIZE);
        assert_eq!(encoded[15], 1);
        assert_eq!(encoded[16], 0x01);
        assert_eq!(encoded[17], 0x02);
        assert_eq!(&encoded[18..26], b"EB-1780W");
        assert!(encoded[26..34].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_info_truncated_to_significant_bytes() {
        let frame = Frame::hello()
            .with_sub_header(SubHeader::new(1, 0, "ABCDEFGHIJKLMNOPQRS"))
            .unwrap();
        let encoded = frame.encode();

        assert_eq!(&encoded[18..32], b"ABCDEFGHIJKLMN");
        assert_eq!(&encoded[32..34], &[0, 0]);

        let decoded = Frame::decode(&encoded).unwrap();
        assert_eq!(decoded.sub_headers[0].info, "ABCDEFGHIJKLMN");
    }

    #[test]
    fn test_decode_multiple_sub_headers() {
        let frame = Frame::new(FrameType::Connect, Status::Ok)
            .with_sub_header(SubHeader::new(1, 0, "first"))
            .unwrap()
            .with_sub_header(SubHeader::new(2, 7, "second"))
            .unwrap();

        let decoded = Frame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_too_short() {
        assert!(Frame::decode(&[]).is_none());
        assert!(Frame::decode(&Frame::hello().encode()[..15]).is_none());
    }

    #[test]
    fn test_decode_corrupted_protocol_id() {
        let mut encoded = Frame::hello().encode();
        encoded[3] = b'X';
        assert!(Frame::decode(&encoded).is_none());
    }

    #[test]
    fn test_decode_wrong_version() {
        let mut encoded = Frame::hello().encode();
        encoded[10] = 0x20;
        assert!(Frame::decode(&encoded).is_none());
    }

    #[test]
    fn test_decode_sub_header_overrun() {
        let mut encoded = Frame::hello().encode();
        encoded[15] = 2;
        encoded.extend_from_slice(&[0u8; SubHeader::SIZE]);
        assert!(Frame::decode(&encoded).is_none());
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut encoded = Frame::new(FrameType::Hello, Status::Ok).encode();
        encoded.extend_from_slice(b"junk");

        let decoded = Frame::decode(&encoded).unwrap();
        assert!(decoded.is_hello_ok());
    }

    #[test]
    fn test_decode_unknown_codes() {
        let mut encoded = Frame::hello().encode();
        encoded[11] = 0x02;
        encoded[14] = 0x41;

        let decoded = Frame::decode(&encoded).unwrap();
        assert_eq!(decoded.frame_type, FrameType::Unknown(0x02));
        assert_eq!(decoded.status, Status::Unauthorized);
    }

    #[test]
    fn test_too_many_sub_headers() {
        let mut frame = Frame::hello();
        for i in 0..Frame::MAX_SUB_HEADERS {
            frame = frame.with_sub_header(SubHeader::new(i as u8, 0, "")).unwrap();
        }
        assert_eq!(frame.encode()[15], 255);

        let result = frame.with_sub_header(SubHeader::new(0, 0, ""));
        assert!(matches!(result, Err(Error::TooManySubHeaders { max: 255 })));
    }

    #[test]
    fn test_frame_len_and_prefix() {
        let frame = Frame::hello()
            .with_sub_header(SubHeader::new(1, 0, "x"))
            .unwrap();
        let encoded = frame.encode();

        assert_eq!(Frame::frame_len(&encoded[..16]), Some(34));
        assert_eq!(Frame::frame_len(&encoded[..8]), None);
        assert!(Frame::is_prefix(&encoded[..4]));
        assert!(Frame::is_prefix(&encoded[..12]));
        assert!(!Frame::is_prefix(b"PWR=01"));
        assert!(Frame::is_prefix(b""));
    }

    fn sub_header_strategy() -> impl Strategy<Value = SubHeader> {
        (any::<u8>(), any::<u8>(), "[ -~]{0,20}")
            .prop_map(|(id, attr, info)| SubHeader::new(id, attr, info))
    }

    proptest! {
        #[test]
        fn prop_encode_decode(
            frame_type in any::<u8>(),
            status in any::<u8>(),
            sub_headers in prop::collection::vec(sub_header_strategy(), 0..8),
        ) {
            let mut frame = Frame::new(FrameType::from(frame_type), Status::from(status));
            for sub_header in &sub_headers {
                frame = frame.with_sub_header(sub_header.clone()).unwrap();
            }

            let encoded = frame.encode();
            prop_assert_eq!(encoded.len(), 16 + 18 * sub_headers.len());

            let decoded = Frame::decode(&encoded).unwrap();
            prop_assert_eq!(decoded.frame_type, frame.frame_type);
            prop_assert_eq!(decoded.status, frame.status);
            prop_assert_eq!(decoded.sub_headers.len(), sub_headers.len());
            for (got, sent) in decoded.sub_headers.iter().zip(&sub_headers) {
                prop_assert_eq!(got.id, sent.id);
                prop_assert_eq!(got.attr, sent.attr);
                let significant: String = sent.info.chars().take(SubHeader::INFO_SIZE).collect();
                prop_assert_eq!(got.info.trim_end_matches('\0'), significant.trim_end_matches('\0'));
            }
        }
    }
}
