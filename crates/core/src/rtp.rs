//! RTP packet model and wire serialization (RFC 3550 §5.1).

/// RTP protocol version, always 2.
const RTP_VERSION: u8 = 2;

/// Fixed RTP header length. Padding, extension, and CSRC are never used,
/// so the header is always exactly 12 bytes.
pub const RTP_HEADER_LEN: usize = 12;

/// Snapshot of one packet's RTP fixed header.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             SSRC                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    /// Marker bit; for H.264 it flags the last packet of a coded picture
    /// (RFC 6184 §5.1).
    pub marker: bool,
    /// RTP payload type (7-bit, RFC 3551).
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    /// Synchronization source identifier (RFC 3550 §8.1).
    pub ssrc: u32,
}

impl RtpHeader {
    /// Serialize the 12-byte fixed header, network byte order.
    pub fn serialize(&self) -> [u8; RTP_HEADER_LEN] {
        let mut header = [0u8; RTP_HEADER_LEN];
        header[0] = RTP_VERSION << 6;
        header[1] = ((self.marker as u8) << 7) | self.payload_type;
        header[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        header[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        header[8..12].copy_from_slice(&self.ssrc.to_be_bytes());
        header
    }
}

/// Mutable RTP header state owned by the packetizer.
///
/// Manages the wrapping sequence number (incremented on every stamped
/// packet) and the wrapping 32-bit timestamp (advanced once per source
/// NAL, so all fragments of one NAL share a timestamp).
#[derive(Debug)]
pub struct RtpHeaderState {
    payload_type: u8,
    ssrc: u32,
    sequence: u16,
    timestamp: u32,
}

impl RtpHeaderState {
    pub fn new(payload_type: u8, ssrc: u32) -> Self {
        tracing::debug!(
            payload_type,
            ssrc = format_args!("{:#010X}", ssrc),
            "RTP header state created"
        );
        Self {
            payload_type,
            ssrc,
            sequence: 0,
            timestamp: 0,
        }
    }

    /// Sequence number the next stamped packet will carry.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Current timestamp value.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Advance the timestamp by `increment` ticks of the 90 kHz clock,
    /// wrapping on overflow.
    pub fn advance_timestamp(&mut self, increment: u32) {
        self.timestamp = self.timestamp.wrapping_add(increment);
    }

    /// Take a header snapshot for one packet and advance the sequence
    /// number.
    pub fn stamp(&mut self, marker: bool) -> RtpHeader {
        let header = RtpHeader {
            marker,
            payload_type: self.payload_type,
            sequence: self.sequence,
            timestamp: self.timestamp,
            ssrc: self.ssrc,
        };
        self.sequence = self.sequence.wrapping_add(1);
        header
    }

    #[cfg(test)]
    pub(crate) fn set_sequence(&mut self, sequence: u16) {
        self.sequence = sequence;
    }
}

/// Payload of one RTP packet, as a byte range into the shared source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketPayload {
    /// Single NAL unit mode (RFC 6184 §5.6): the whole NAL, header byte
    /// included, is the RTP payload.
    SingleNal { offset: u64, len: u64 },
    /// One FU-A fragment (RFC 6184 §5.8): FU indicator and FU header
    /// bytes, then a slice of the NAL payload (header byte excluded).
    FuA {
        indicator: u8,
        fu_header: u8,
        offset: u64,
        len: u64,
    },
}

/// One RTP packet descriptor: a stamped header plus a payload range.
///
/// Owns no payload bytes; [`wire_bytes`](Self::wire_bytes) reads them
/// positionally from the source at send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpPacket {
    pub header: RtpHeader,
    pub payload: PacketPayload,
}

impl RtpPacket {
    /// Total datagram size on the wire.
    pub fn wire_len(&self) -> usize {
        match self.payload {
            PacketPayload::SingleNal { len, .. } => RTP_HEADER_LEN + len as usize,
            PacketPayload::FuA { len, .. } => RTP_HEADER_LEN + 2 + len as usize,
        }
    }

    /// Serialize header and payload into one UDP datagram.
    ///
    /// Payload bytes are copied verbatim from `source` — emulation
    /// prevention bytes included, per the pass-through contract.
    pub fn wire_bytes(&self, source: &[u8]) -> Vec<u8> {
        let mut wire = Vec::with_capacity(self.wire_len());
        wire.extend_from_slice(&self.header.serialize());
        match self.payload {
            PacketPayload::SingleNal { offset, len } => {
                wire.extend_from_slice(&source[offset as usize..(offset + len) as usize]);
            }
            PacketPayload::FuA {
                indicator,
                fu_header,
                offset,
                len,
            } => {
                wire.push(indicator);
                wire.push(fu_header);
                wire.extend_from_slice(&source[offset as usize..(offset + len) as usize]);
            }
        }
        wire
    }
}
