//! SDP companion description (RFC 4566 / RFC 8866).
//!
//! Players have no RTSP DESCRIBE to ask for session parameters, so the
//! streamer writes them to a file instead:
//!
//! ```text
//! v=0                                  ← protocol version
//! o=- 0 0 IN IP4 <host>                ← origin
//! s=H264 RTP stream                    ← session name
//! c=IN IP4 <host>                      ← connection address
//! t=0 0                                ← timing (live stream)
//! m=video <port> RTP/AVP 96            ← media description
//! a=rtpmap:96 H264/90000               ← codec / clock rate
//! a=fmtp:96 packetization-mode=1; sprop-parameter-sets=<SPS>,<PPS>
//! ```
//!
//! `sprop-parameter-sets` (RFC 6184 §8.1) carries the base64 of the raw
//! SPS and PPS NAL units so a decoder can start before the first in-band
//! parameter sets arrive. The `a=fmtp` line is omitted entirely when the
//! input contains no SPS/PPS.

use std::net::IpAddr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::config::{StreamConfig, CLOCK_RATE};
use crate::error::Result;
use crate::nal::scan_parameter_sets;
use crate::source::ByteSource;

/// Generate the SDP text for a stream delivered to `host:port`.
///
/// `sps` and `pps` are raw NAL unit bytes, header byte included. Both are
/// needed for the `a=fmtp` line; with either missing the line is dropped
/// and players fall back to in-band parameter sets.
pub fn generate(
    host: IpAddr,
    port: u16,
    payload_type: u8,
    sps: Option<&[u8]>,
    pps: Option<&[u8]>,
) -> String {
    let mut sdp: Vec<String> = Vec::new();

    sdp.push("v=0".to_string());
    sdp.push(format!("o=- 0 0 IN IP4 {}", host));
    sdp.push("s=H264 RTP stream".to_string());
    sdp.push(format!("c=IN IP4 {}", host));
    sdp.push("t=0 0".to_string());
    sdp.push(format!("m=video {} RTP/AVP {}", port, payload_type));
    sdp.push(format!("a=rtpmap:{} H264/{}", payload_type, CLOCK_RATE));
    if let (Some(sps), Some(pps)) = (sps, pps) {
        sdp.push(format!(
            "a=fmtp:{} packetization-mode=1; sprop-parameter-sets={},{}",
            payload_type,
            STANDARD.encode(sps),
            STANDARD.encode(pps),
        ));
    }

    tracing::debug!("SDP: {}", sdp.join(" | "));

    format!("{}\r\n", sdp.join("\r\n"))
}

/// Scan the input for its first SPS and PPS and generate the SDP for the
/// configured destination.
pub fn describe(source: &ByteSource, config: &StreamConfig) -> String {
    let (sps, pps) = scan_parameter_sets(source);
    let slice_of = |unit: crate::nal::NalUnit| source.slice(unit.start_off, unit.size());
    generate(
        config.dest.ip(),
        config.dest.port(),
        config.payload_type,
        sps.map(slice_of),
        pps.map(slice_of),
    )
}

/// Persist the session description to the configured SDP path.
///
/// A configuration without an SDP path skips the write entirely.
pub fn write_file(source: &ByteSource, config: &StreamConfig) -> Result<()> {
    if let Some(path) = &config.sdp_path {
        std::fs::write(path, describe(source, config))?;
        tracing::info!(path = %path.display(), "SDP written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn localhost() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    #[test]
    fn full_description_with_parameter_sets() {
        let sdp = generate(
            localhost(),
            5004,
            96,
            Some(&[0x67, 0x42, 0x00, 0x1E][..]),
            Some(&[0x68, 0xCE][..]),
        );
        assert!(sdp.starts_with("v=0\r\n"));
        assert!(sdp.contains("o=- 0 0 IN IP4 127.0.0.1\r\n"));
        assert!(sdp.contains("s=H264 RTP stream\r\n"));
        assert!(sdp.contains("c=IN IP4 127.0.0.1\r\n"));
        assert!(sdp.contains("t=0 0\r\n"));
        assert!(sdp.contains("m=video 5004 RTP/AVP 96\r\n"));
        assert!(sdp.contains("a=rtpmap:96 H264/90000\r\n"));
        assert!(sdp.contains(
            "a=fmtp:96 packetization-mode=1; sprop-parameter-sets=Z0IAHg==,aM4="
        ));
        assert!(sdp.ends_with("\r\n"));

        // rtpmap must precede fmtp (RFC 6184 §8.2.1).
        let rtpmap_idx = sdp.find("a=rtpmap").unwrap();
        let fmtp_idx = sdp.find("a=fmtp").unwrap();
        assert!(rtpmap_idx < fmtp_idx);
    }

    #[test]
    fn fmtp_omitted_without_parameter_sets() {
        let sdp = generate(localhost(), 5004, 96, None, None);
        assert!(sdp.contains("a=rtpmap:96 H264/90000\r\n"));
        assert!(!sdp.contains("a=fmtp"));
    }

    #[test]
    fn fmtp_requires_both_sps_and_pps() {
        let sdp = generate(localhost(), 5004, 96, Some(&[0x67, 0x42][..]), None);
        assert!(!sdp.contains("a=fmtp"));
    }

    #[test]
    fn media_line_tracks_destination_port() {
        let sdp = generate(localhost(), 6000, 96, None, None);
        assert!(sdp.contains("m=video 6000 RTP/AVP 96\r\n"));
    }

    #[test]
    fn write_file_honors_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.h264");
        std::fs::write(&input, [0u8, 0, 1, 0x67, 0x42, 0, 0, 1, 0x68, 0xCE]).unwrap();
        let source = ByteSource::open(&input).unwrap();
        let sdp_path = dir.path().join("out.sdp");

        let config = StreamConfig::new(input, 30)
            .unwrap()
            .with_sdp_path(sdp_path.clone());
        write_file(&source, &config).unwrap();

        let text = std::fs::read_to_string(&sdp_path).unwrap();
        assert!(text.contains("a=rtpmap:96 H264/90000\r\n"));
        assert!(text.contains("sprop-parameter-sets=Z0I=,aM4="));
    }

    #[test]
    fn write_file_skips_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.h264");
        std::fs::write(&input, [0u8, 0, 1, 0x67, 0x42]).unwrap();
        let source = ByteSource::open(&input).unwrap();

        let config = StreamConfig::new(input, 30).unwrap().without_sdp();
        write_file(&source, &config).unwrap();
        assert!(!dir.path().join("stream.sdp").exists());
    }
}
