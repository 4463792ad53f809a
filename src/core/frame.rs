//! The on-wire frame: fixed header, variable payload, trailing CRC-16.

use bytes::{BufMut, BytesMut};

use crate::core::constants::{
    FRAME_MAGIC, FRAME_OVERHEAD, FRAME_VERSION, MAX_PAYLOAD_LEN, SubsystemId,
};
use crate::core::crc::{crc8, crc16};
use crate::error::CoreError;

/// A complete on-wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub subsystem: SubsystemId,
    pub message_id: u16,
    /// Low 24 bits significant; the top byte is always zero.
    pub message_type: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(subsystem: SubsystemId, message_id: u16, message_type: u32, payload: Vec<u8>) -> Self {
        Self {
            subsystem,
            message_id,
            message_type,
            payload,
        }
    }

    /// Serializes this frame into its wire representation.
    ///
    /// A payload over 242 bytes is a programming error on the caller's part, not a condition this
    /// crate can recover from at runtime, so it is asserted rather than returned as an `Err`.
    pub fn serialize(&self) -> Vec<u8> {
        debug_assert!(
            self.payload.len() <= MAX_PAYLOAD_LEN,
            "frame payload of {} bytes exceeds the {}-byte limit",
            self.payload.len(),
            MAX_PAYLOAD_LEN
        );

        let mut buf = BytesMut::with_capacity(FRAME_OVERHEAD + self.payload.len());
        buf.put_u8(FRAME_MAGIC);
        buf.put_u8((FRAME_OVERHEAD + self.payload.len()) as u8);
        buf.put_u8(FRAME_VERSION);
        let header_crc = crc8(&buf[0..3]);
        buf.put_u8(header_crc);

        buf.put_u16(u16::from(self.subsystem));
        buf.put_u16(self.message_id);

        let type_bytes = self.message_type.to_be_bytes();
        buf.put_slice(&type_bytes[1..4]);

        buf.put_slice(&self.payload);

        let full_crc = crc16(&buf);
        buf.put_u16_le(full_crc);

        buf.to_vec()
    }

    /// Parses a frame from `bytes`, trusting the declared length and rejecting anything that
    /// fails validation. A longer actual buffer than the declared length is tolerated; only the
    /// declared prefix is consumed.
    pub fn parse(bytes: &[u8]) -> Result<Frame, CoreError> {
        if bytes.len() < FRAME_OVERHEAD {
            return Err(CoreError::ParseReject);
        }
        if bytes[0] != FRAME_MAGIC {
            return Err(CoreError::ParseReject);
        }

        let length = bytes[1] as usize;
        if length < FRAME_OVERHEAD || length > bytes.len() {
            return Err(CoreError::ParseReject);
        }

        if bytes[2] != FRAME_VERSION {
            return Err(CoreError::ParseReject);
        }

        let header_crc = bytes[3];
        if crc8(&bytes[0..3]) != header_crc {
            return Err(CoreError::ParseReject);
        }

        let body = &bytes[0..length - 2];
        let provided_crc = u16::from_le_bytes([bytes[length - 2], bytes[length - 1]]);
        if crc16(body) != provided_crc {
            return Err(CoreError::ParseReject);
        }

        let subsystem = SubsystemId::from(u16::from_be_bytes([bytes[4], bytes[5]]));
        let message_id = u16::from_be_bytes([bytes[6], bytes[7]]);
        let message_type = u32::from_be_bytes([0, bytes[8], bytes[9], bytes[10]]);
        let payload = bytes[11..length - 2].to_vec();

        Ok(Frame {
            subsystem,
            message_id,
            message_type,
            payload,
        })
    }
}

/// 1-byte length prefix followed by UTF-8 bytes. Errs rather than silently truncating a string
/// whose encoding doesn't fit in a byte.
pub fn pack_short_string(s: &str) -> Result<Vec<u8>, CoreError> {
    let bytes = s.as_bytes();
    if bytes.len() > u8::MAX as usize {
        return Err(CoreError::StringTooLong(bytes.len()));
    }
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    Ok(out)
}

/// 2-byte little-endian length prefix followed by UTF-8 bytes.
pub fn pack_url(s: &str) -> Result<Vec<u8>, CoreError> {
    let bytes = s.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(CoreError::StringTooLong(bytes.len()));
    }
    let mut out = Vec::with_capacity(2 + bytes.len());
    out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_seed_scenario_a() {
        let frame = Frame::new(SubsystemId::Pairer, 0x0400, 0xC00746, vec![0x00]);
        let bytes = frame.serialize();
        assert_eq!(bytes.len(), 14);
        assert_eq!(&bytes[0..3], &[0x55, 0x0E, 0x04]);
        assert_eq!(bytes[3], crc8(&bytes[0..3]));
        assert_eq!(&bytes[4..6], &[0x02, 0x07]);
        assert_eq!(&bytes[6..8], &[0x04, 0x00]);
        assert_eq!(&bytes[8..11], &[0xC0, 0x07, 0x46]);
        assert_eq!(bytes[11], 0x00);
        let expected_crc = crc16(&bytes[0..12]).to_le_bytes();
        assert_eq!(&bytes[12..14], &expected_crc);

        let parsed = Frame::parse(&bytes).expect("valid frame parses");
        assert_eq!(parsed, frame);
    }

    #[test]
    fn pack_short_string_seed_scenario_b() {
        assert_eq!(
            pack_short_string("Hello").unwrap(),
            vec![0x05, 0x48, 0x65, 0x6C, 0x6C, 0x6F]
        );
    }

    #[test]
    fn pack_url_seed_scenario_c() {
        let expected = vec![
            0x12, 0x00, 0x68, 0x74, 0x74, 0x70, 0x3A, 0x2F, 0x2F, 0x65, 0x78, 0x61, 0x6D, 0x70,
            0x6C, 0x65, 0x2E, 0x63, 0x6F, 0x6D,
        ];
        assert_eq!(pack_url("http://example.com").unwrap(), expected);
    }

    #[test]
    fn pack_short_string_rejects_oversized_input() {
        let too_long = "x".repeat(256);
        assert!(matches!(
            pack_short_string(&too_long),
            Err(CoreError::StringTooLong(256))
        ));
    }

    #[test]
    fn serialized_length_matches_payload_size_for_every_size() {
        for n in 0..=MAX_PAYLOAD_LEN {
            let frame = Frame::new(SubsystemId::Streamer, 0, 0, vec![0u8; n]);
            assert_eq!(frame.serialize().len(), n + FRAME_OVERHEAD);
        }
    }

    #[test]
    fn bad_crc_is_rejected_seed_scenario_f() {
        let frame = Frame::new(SubsystemId::Pairer, 0x0400, 0xC00746, vec![0x00]);
        let mut bytes = frame.serialize();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(Frame::parse(&bytes), Err(CoreError::ParseReject)));
    }

    #[test]
    fn parse_rejects_short_buffers_and_bad_magic() {
        assert!(Frame::parse(&[0x55, 0x0D]).is_err());
        let mut bytes = Frame::new(SubsystemId::Status, 0, 0, vec![]).serialize();
        bytes[0] = 0x00;
        assert!(Frame::parse(&bytes).is_err());
    }

    #[test]
    fn parse_tolerates_trailing_garbage_beyond_declared_length() {
        let frame = Frame::new(SubsystemId::Configurer, 1, message_type_const(), vec![1, 2, 3]);
        let mut bytes = frame.serialize();
        bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        let parsed = Frame::parse(&bytes).expect("parses despite trailing bytes");
        assert_eq!(parsed, frame);
    }

    fn message_type_const() -> u32 {
        crate::core::constants::message_type::CONFIGURE
    }

    #[test]
    fn unknown_subsystem_round_trips() {
        let frame = Frame::new(SubsystemId::from(0xBEEF), 1, 1, vec![]);
        let bytes = frame.serialize();
        let parsed = Frame::parse(&bytes).unwrap();
        assert_eq!(parsed.subsystem, SubsystemId::Unknown(0xBEEF));
    }
}
