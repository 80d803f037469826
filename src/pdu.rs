//! AVRCP PDU Codec
//!
//! This module implements the binary framing shared by every AVRCP control
//! message: the four-byte PDU header (PDU id, packet type, parameter length),
//! the vendor-dependent operand layout carrying the 24-bit company id, the
//! pass-through operand layout, and the three-byte browsing channel header.
//!
//! The codec is stateless; fragmentation state lives in
//! [`crate::continuing`] and session routing in [`crate::session`].

use crate::AvrcpError;
use crate::constants::COMPANY_ID_LENGTH;

/// AVRCP packet type, the fragmentation marker in the PDU header (2 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
#[repr(u8)]
pub enum PacketType {
    /// Complete message in a single PDU
    Single = 0x00,
    /// First fragment of a continuing response
    Start = 0x01,
    /// Middle fragment of a continuing response
    Continue = 0x02,
    /// Final fragment of a continuing response
    End = 0x03,
}

impl PacketType {
    /// Extract the packet type from the header flags byte
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x01 => Self::Start,
            0x02 => Self::Continue,
            0x03 => Self::End,
            _ => Self::Single,
        }
    }
}

/// AV/C command and response codes (ctype field, framed by the transport)
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
#[repr(u8)]
pub enum CommandCode {
    /// Control command
    Control = 0x00,
    /// Status command
    Status = 0x01,
    /// Specific inquiry command
    SpecificInquiry = 0x02,
    /// Notify command
    Notify = 0x03,
    /// General inquiry command
    GeneralInquiry = 0x04,
    /// Response: not implemented
    NotImplemented = 0x08,
    /// Response: accepted
    Accepted = 0x09,
    /// Response: rejected
    Rejected = 0x0A,
    /// Response: in transition
    InTransition = 0x0B,
    /// Response: stable
    Stable = 0x0C,
    /// Response: changed
    Changed = 0x0D,
    /// Response: interim
    Interim = 0x0F,
}

impl CommandCode {
    /// Convert from raw ctype value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Control),
            0x01 => Some(Self::Status),
            0x02 => Some(Self::SpecificInquiry),
            0x03 => Some(Self::Notify),
            0x04 => Some(Self::GeneralInquiry),
            0x08 => Some(Self::NotImplemented),
            0x09 => Some(Self::Accepted),
            0x0A => Some(Self::Rejected),
            0x0B => Some(Self::InTransition),
            0x0C => Some(Self::Stable),
            0x0D => Some(Self::Changed),
            0x0F => Some(Self::Interim),
            _ => None,
        }
    }

    /// Whether this code marks a response frame (codes 0x08 and above)
    #[must_use]
    pub const fn is_response(self) -> bool {
        (self as u8) >= 0x08
    }
}

/// AVRCP status codes surfaced to the peer in rejection and reply payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
#[repr(u8)]
pub enum Status {
    /// Command not recognized by any handler
    InvalidCommand = 0x00,
    /// Parameter not recognized or out of sequence
    InvalidParam = 0x01,
    /// Referenced parameter does not exist
    ParamNotFound = 0x02,
    /// Target-side failure while handling a valid command
    InternalError = 0x03,
    /// Operation completed without error
    Success = 0x04,
    /// Requested item is outside the valid range
    OutOfBounds = 0x0B,
    /// Referenced media player id does not exist
    InvalidPlayerId = 0x11,
    /// Referenced player does not support browsing
    PlayerNotBrowsable = 0x12,
    /// No media players are available
    NoAvailablePlayers = 0x15,
    /// Addressed player changed since the request was issued
    AddressedPlayerChanged = 0x16,
}

impl Status {
    /// Convert from raw wire value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::InvalidCommand),
            0x01 => Some(Self::InvalidParam),
            0x02 => Some(Self::ParamNotFound),
            0x03 => Some(Self::InternalError),
            0x04 => Some(Self::Success),
            0x0B => Some(Self::OutOfBounds),
            0x11 => Some(Self::InvalidPlayerId),
            0x12 => Some(Self::PlayerNotBrowsable),
            0x15 => Some(Self::NoAvailablePlayers),
            0x16 => Some(Self::AddressedPlayerChanged),
            _ => None,
        }
    }
}

/// Read a big-endian 24-bit integer (company id encoding)
#[must_use]
pub fn read_u24(src: &[u8; 3]) -> u32 {
    (u32::from(src[0]) << 16) | (u32::from(src[1]) << 8) | u32::from(src[2])
}

/// Write a big-endian 24-bit integer; values above 2^24 - 1 are masked
#[allow(clippy::cast_possible_truncation)]
pub fn write_u24(dst: &mut [u8; 3], value: u32) {
    dst[0] = ((value & 0x00FF_0000) >> 16) as u8;
    dst[1] = ((value & 0x0000_FF00) >> 8) as u8;
    dst[2] = (value & 0x0000_00FF) as u8;
}

/// AVRCP PDU Header
///
/// Every vendor-dependent message carries this four-byte header after the
/// company id: PDU id, packet type flags, and big-endian parameter length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct PduHeader {
    /// PDU identifier
    pub pdu_id: u8,
    /// Fragmentation marker
    pub packet_type: PacketType,
    /// Length of the parameter bytes following the header
    pub parameter_length: u16,
}

impl PduHeader {
    /// Size of the PDU header in bytes
    pub const SIZE: usize = 4;

    /// Create a new PDU header
    #[must_use]
    pub const fn new(pdu_id: u8, packet_type: PacketType, parameter_length: u16) -> Self {
        Self {
            pdu_id,
            packet_type,
            parameter_length,
        }
    }

    /// Encode header to bytes
    #[must_use]
    pub fn encode(&self) -> [u8; 4] {
        let len = self.parameter_length.to_be_bytes();
        [self.pdu_id, self.packet_type as u8, len[0], len[1]]
    }

    /// Decode header from bytes
    ///
    /// # Errors
    /// Returns `AvrcpError::MalformedPdu` if fewer than four bytes are given
    pub fn decode(data: &[u8]) -> Result<Self, AvrcpError> {
        if data.len() < Self::SIZE {
            return Err(AvrcpError::MalformedPdu);
        }

        Ok(Self {
            pdu_id: data[0],
            packet_type: PacketType::from_bits(data[1]),
            parameter_length: u16::from_be_bytes([data[2], data[3]]),
        })
    }
}

/// A decoded AVRCP PDU: header fields plus a view of the parameter bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvrcpPdu<'a> {
    /// PDU identifier
    pub pdu_id: u8,
    /// Fragmentation marker
    pub packet_type: PacketType,
    /// Parameter bytes
    pub params: &'a [u8],
}

impl<'a> AvrcpPdu<'a> {
    /// Decode a PDU, requiring the declared parameter length to match the
    /// bytes actually present
    ///
    /// # Errors
    /// Returns `AvrcpError::MalformedPdu` on a truncated header or a
    /// parameter length that disagrees with the available bytes
    pub fn decode(data: &'a [u8]) -> Result<Self, AvrcpError> {
        let header = PduHeader::decode(data)?;
        let params = &data[PduHeader::SIZE..];
        if params.len() != header.parameter_length as usize {
            return Err(AvrcpError::MalformedPdu);
        }

        Ok(Self {
            pdu_id: header.pdu_id,
            packet_type: header.packet_type,
            params,
        })
    }

    /// Encode a PDU into `buf`, returning the encoded length
    ///
    /// # Errors
    /// Returns `AvrcpError::PayloadTooLarge` if the parameters exceed the
    /// 16-bit length field, `AvrcpError::BufferOverflow` if `buf` is too small
    pub fn encode(
        pdu_id: u8,
        packet_type: PacketType,
        params: &[u8],
        buf: &mut [u8],
    ) -> Result<usize, AvrcpError> {
        let parameter_length =
            u16::try_from(params.len()).map_err(|_| AvrcpError::PayloadTooLarge)?;
        let total = PduHeader::SIZE + params.len();
        if buf.len() < total {
            return Err(AvrcpError::BufferOverflow);
        }

        let header = PduHeader::new(pdu_id, packet_type, parameter_length);
        buf[..PduHeader::SIZE].copy_from_slice(&header.encode());
        buf[PduHeader::SIZE..total].copy_from_slice(params);
        Ok(total)
    }
}

/// A decoded vendor-dependent operand block: company id plus AVRCP PDU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorPdu<'a> {
    /// 24-bit company identifier
    pub company_id: u32,
    /// The AVRCP PDU following the company id
    pub pdu: AvrcpPdu<'a>,
}

impl<'a> VendorPdu<'a> {
    /// Bytes preceding the PDU parameters in vendor-dependent operands
    pub const HEADER_SIZE: usize = COMPANY_ID_LENGTH + PduHeader::SIZE;

    /// Decode vendor-dependent operands
    ///
    /// # Errors
    /// Returns `AvrcpError::MalformedPdu` on truncation or length mismatch
    pub fn decode(operands: &'a [u8]) -> Result<Self, AvrcpError> {
        if operands.len() < COMPANY_ID_LENGTH {
            return Err(AvrcpError::MalformedPdu);
        }

        let company_id = read_u24(&[operands[0], operands[1], operands[2]]);
        let pdu = AvrcpPdu::decode(&operands[COMPANY_ID_LENGTH..])?;
        Ok(Self { company_id, pdu })
    }

    /// Encode vendor-dependent operands into `buf`, returning the length
    ///
    /// # Errors
    /// Returns `AvrcpError::BufferOverflow` if `buf` cannot hold the frame,
    /// `AvrcpError::PayloadTooLarge` if the parameters exceed the length field
    pub fn encode(
        company_id: u32,
        pdu_id: u8,
        packet_type: PacketType,
        params: &[u8],
        buf: &mut [u8],
    ) -> Result<usize, AvrcpError> {
        if buf.len() < COMPANY_ID_LENGTH {
            return Err(AvrcpError::BufferOverflow);
        }

        let mut company = [0u8; 3];
        write_u24(&mut company, company_id);
        buf[..COMPANY_ID_LENGTH].copy_from_slice(&company);
        let pdu_len = AvrcpPdu::encode(pdu_id, packet_type, params, &mut buf[COMPANY_ID_LENGTH..])?;
        Ok(COMPANY_ID_LENGTH + pdu_len)
    }
}

/// A decoded pass-through operand block
///
/// The first operand byte packs the seven-bit operation id with the state
/// bit (0 = pressed, 1 = released); the second byte is the length of the
/// trailing operation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassthroughFrame<'a> {
    /// Physical operation identifier (7 bits)
    pub op: u8,
    /// True on the press transition, false on release
    pub pressed: bool,
    /// Operation data (empty for plain button operations)
    pub data: &'a [u8],
}

impl<'a> PassthroughFrame<'a> {
    /// Size of the fixed pass-through operand prefix
    pub const HEADER_SIZE: usize = 2;

    /// Decode pass-through operands
    ///
    /// # Errors
    /// Returns `AvrcpError::MalformedPdu` on truncation or a data length
    /// that disagrees with the available bytes
    pub fn decode(operands: &'a [u8]) -> Result<Self, AvrcpError> {
        if operands.len() < Self::HEADER_SIZE {
            return Err(AvrcpError::MalformedPdu);
        }

        let data = &operands[Self::HEADER_SIZE..];
        if data.len() != operands[1] as usize {
            return Err(AvrcpError::MalformedPdu);
        }

        Ok(Self {
            op: operands[0] & 0x7F,
            pressed: operands[0] & 0x80 == 0,
            data,
        })
    }

    /// Encode pass-through operands into `buf`, returning the length
    ///
    /// # Errors
    /// Returns `AvrcpError::BufferOverflow` if `buf` is too small,
    /// `AvrcpError::PayloadTooLarge` if the data exceeds the length byte
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, AvrcpError> {
        let data_len = u8::try_from(self.data.len()).map_err(|_| AvrcpError::PayloadTooLarge)?;
        let total = Self::HEADER_SIZE + self.data.len();
        if buf.len() < total {
            return Err(AvrcpError::BufferOverflow);
        }

        buf[0] = self.op | if self.pressed { 0x00 } else { 0x80 };
        buf[1] = data_len;
        buf[Self::HEADER_SIZE..total].copy_from_slice(self.data);
        Ok(total)
    }
}

/// A decoded browsing channel PDU
///
/// Browsing PDUs carry no packet type; fragmentation never occurs on the
/// browsing channel, so the header is PDU id plus big-endian length only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowsingPdu<'a> {
    /// PDU identifier
    pub pdu_id: u8,
    /// Parameter bytes
    pub params: &'a [u8],
}

impl<'a> BrowsingPdu<'a> {
    /// Size of the browsing header in bytes
    pub const HEADER_SIZE: usize = 3;

    /// Decode a browsing PDU
    ///
    /// # Errors
    /// Returns `AvrcpError::MalformedPdu` on truncation or length mismatch
    pub fn decode(data: &'a [u8]) -> Result<Self, AvrcpError> {
        if data.len() < Self::HEADER_SIZE {
            return Err(AvrcpError::MalformedPdu);
        }

        let params = &data[Self::HEADER_SIZE..];
        if params.len() != u16::from_be_bytes([data[1], data[2]]) as usize {
            return Err(AvrcpError::MalformedPdu);
        }

        Ok(Self {
            pdu_id: data[0],
            params,
        })
    }

    /// Encode a browsing PDU into `buf`, returning the length
    ///
    /// # Errors
    /// Returns `AvrcpError::PayloadTooLarge` if the parameters exceed the
    /// length field, `AvrcpError::BufferOverflow` if `buf` is too small
    pub fn encode(pdu_id: u8, params: &[u8], buf: &mut [u8]) -> Result<usize, AvrcpError> {
        let parameter_length =
            u16::try_from(params.len()).map_err(|_| AvrcpError::PayloadTooLarge)?;
        let total = Self::HEADER_SIZE + params.len();
        if buf.len() < total {
            return Err(AvrcpError::BufferOverflow);
        }

        buf[0] = pdu_id;
        buf[1..3].copy_from_slice(&parameter_length.to_be_bytes());
        buf[Self::HEADER_SIZE..total].copy_from_slice(params);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{AVRCP_GET_CAPABILITIES, AVRCP_REGISTER_NOTIFICATION, IEEEID_BTSIG};

    #[test]
    fn test_pdu_header_roundtrip() {
        let header = PduHeader::new(AVRCP_GET_CAPABILITIES, PacketType::Single, 0x0102);
        let encoded = header.encode();

        assert_eq!(encoded, [0x10, 0x00, 0x01, 0x02]);
        assert_eq!(PduHeader::decode(&encoded).unwrap(), header);
    }

    #[test]
    fn test_pdu_header_truncated() {
        assert_eq!(
            PduHeader::decode(&[0x10, 0x00, 0x01]),
            Err(AvrcpError::MalformedPdu)
        );
    }

    #[test]
    fn test_pdu_decode_length_mismatch() {
        // Header declares 4 parameter bytes but only 2 follow
        let data = [0x10, 0x00, 0x00, 0x04, 0xAA, 0xBB];
        assert_eq!(AvrcpPdu::decode(&data), Err(AvrcpError::MalformedPdu));
    }

    #[test]
    fn test_pdu_roundtrip() {
        let params = [0x01, 0x02, 0x03];
        let mut buf = [0u8; 16];
        let len =
            AvrcpPdu::encode(AVRCP_REGISTER_NOTIFICATION, PacketType::Start, &params, &mut buf)
                .unwrap();

        let pdu = AvrcpPdu::decode(&buf[..len]).unwrap();
        assert_eq!(pdu.pdu_id, AVRCP_REGISTER_NOTIFICATION);
        assert_eq!(pdu.packet_type, PacketType::Start);
        assert_eq!(pdu.params, &params);
    }

    #[test]
    fn test_u24_roundtrip() {
        for value in [0u32, 1, IEEEID_BTSIG, 0x00AB_CDEF, 0x00FF_FFFF] {
            let mut buf = [0u8; 3];
            write_u24(&mut buf, value);
            assert_eq!(read_u24(&buf), value);
        }
    }

    #[test]
    fn test_u24_big_endian_layout() {
        let mut buf = [0u8; 3];
        write_u24(&mut buf, IEEEID_BTSIG);
        assert_eq!(buf, [0x00, 0x19, 0x58]);
    }

    #[test]
    fn test_packet_type_from_bits_masks_high_bits() {
        assert_eq!(PacketType::from_bits(0x00), PacketType::Single);
        assert_eq!(PacketType::from_bits(0x01), PacketType::Start);
        assert_eq!(PacketType::from_bits(0xFE), PacketType::Continue);
        assert_eq!(PacketType::from_bits(0xFF), PacketType::End);
    }

    #[test]
    fn test_command_code_classification() {
        assert!(!CommandCode::Control.is_response());
        assert!(!CommandCode::Notify.is_response());
        assert!(CommandCode::Interim.is_response());
        assert!(CommandCode::Rejected.is_response());
        assert_eq!(CommandCode::from_u8(0x0F), Some(CommandCode::Interim));
        assert_eq!(CommandCode::from_u8(0x05), None);
    }

    #[test]
    fn test_vendor_pdu_roundtrip() {
        let params = [0x0D, 0x00, 0x00, 0x00, 0x00];
        let mut buf = [0u8; 32];
        let len = VendorPdu::encode(
            IEEEID_BTSIG,
            AVRCP_REGISTER_NOTIFICATION,
            PacketType::Single,
            &params,
            &mut buf,
        )
        .unwrap();

        let vendor = VendorPdu::decode(&buf[..len]).unwrap();
        assert_eq!(vendor.company_id, IEEEID_BTSIG);
        assert_eq!(vendor.pdu.pdu_id, AVRCP_REGISTER_NOTIFICATION);
        assert_eq!(vendor.pdu.params, &params);
    }

    #[test]
    fn test_vendor_pdu_truncated_company() {
        assert_eq!(
            VendorPdu::decode(&[0x00, 0x19]),
            Err(AvrcpError::MalformedPdu)
        );
    }

    #[test]
    fn test_passthrough_roundtrip() {
        let frame = PassthroughFrame {
            op: 0x44,
            pressed: true,
            data: &[],
        };
        let mut buf = [0u8; 8];
        let len = frame.encode(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[0x44, 0x00]);

        let decoded = PassthroughFrame::decode(&buf[..len]).unwrap();
        assert_eq!(decoded.op, 0x44);
        assert!(decoded.pressed);
    }

    #[test]
    fn test_passthrough_release_bit() {
        let decoded = PassthroughFrame::decode(&[0xC4, 0x00]).unwrap();
        assert_eq!(decoded.op, 0x44);
        assert!(!decoded.pressed);
    }

    #[test]
    fn test_passthrough_bad_data_length() {
        assert_eq!(
            PassthroughFrame::decode(&[0x44, 0x02, 0xAA]),
            Err(AvrcpError::MalformedPdu)
        );
    }

    #[test]
    fn test_browsing_pdu_roundtrip() {
        let params = [0x00, 0x01];
        let mut buf = [0u8; 16];
        let len = BrowsingPdu::encode(0x70, &params, &mut buf).unwrap();

        let pdu = BrowsingPdu::decode(&buf[..len]).unwrap();
        assert_eq!(pdu.pdu_id, 0x70);
        assert_eq!(pdu.params, &params);
    }

    #[test]
    fn test_status_wire_values() {
        assert_eq!(Status::InvalidCommand as u8, 0x00);
        assert_eq!(Status::OutOfBounds as u8, 0x0B);
        assert_eq!(Status::AddressedPlayerChanged as u8, 0x16);
        assert_eq!(Status::from_u8(0x15), Some(Status::NoAvailablePlayers));
        assert_eq!(Status::from_u8(0x17), None);
    }
}
