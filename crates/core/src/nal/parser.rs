//! Annex B byte-stream scanner (stage 1).

use crate::source::ByteSource;

use super::{NalHeader, NalKind, NalUnit};

/// Lazy scanner over an Annex B byte stream.
///
/// Yields [`NalUnit`] descriptors in stream order without copying payload
/// bytes. Start codes are `00 00 01` or `00 00 00 01`, with the longer form
/// matched first at any given position. Bytes before the first start code
/// are skipped; trailing bytes after the last start code belong to the last
/// unit. A start code at end of file with no header byte after it yields
/// nothing — the scanner never produces a partial unit.
#[derive(Debug)]
pub struct AnnexBParser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> AnnexBParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Length of the start code at `at`, if one begins there.
    fn start_code_len(data: &[u8], at: usize) -> Option<usize> {
        if data[at..].starts_with(&[0, 0, 0, 1]) {
            Some(4)
        } else if data[at..].starts_with(&[0, 0, 1]) {
            Some(3)
        } else {
            None
        }
    }
}

impl Iterator for AnnexBParser<'_> {
    type Item = NalUnit;

    fn next(&mut self) -> Option<NalUnit> {
        let data = self.data;

        // Skip to the next start code.
        let mut pos = self.pos;
        let sc_len = loop {
            if pos >= data.len() {
                self.pos = pos;
                return None;
            }
            match Self::start_code_len(data, pos) {
                Some(len) => break len,
                None => pos += 1,
            }
        };

        // The byte after the start code is the NAL header. A start code
        // with nothing after it is not a unit.
        let start_off = pos + sc_len;
        if start_off >= data.len() {
            self.pos = data.len();
            return None;
        }
        let header = NalHeader::from_byte(data[start_off]);

        // Scan to the next start code (not consumed) or end of file.
        let mut end_off = start_off + 1;
        while end_off < data.len() && Self::start_code_len(data, end_off).is_none() {
            end_off += 1;
        }

        self.pos = end_off;
        Some(NalUnit {
            header,
            start_off: start_off as u64,
            end_off: end_off as u64,
        })
    }
}

/// Locate the first SPS (type 7) and PPS (type 8) in the input, for the
/// SDP `sprop-parameter-sets` attribute. Stops as soon as both are found.
pub fn scan_parameter_sets(source: &ByteSource) -> (Option<NalUnit>, Option<NalUnit>) {
    let mut sps = None;
    let mut pps = None;
    for nal in AnnexBParser::new(source.as_slice()) {
        match nal.header.kind() {
            NalKind::Sps if sps.is_none() => sps = Some(nal),
            NalKind::Pps if pps.is_none() => pps = Some(nal),
            _ => {}
        }
        if sps.is_some() && pps.is_some() {
            break;
        }
    }
    (sps, pps)
}
