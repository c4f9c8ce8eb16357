//! Stream configuration and derived RTP parameters.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use rand::Rng;

use crate::error::{Result, StreamError};

/// RTP media clock rate for H.264 (RFC 6184 §8.2.1).
pub const CLOCK_RATE: u32 = 90_000;

/// Dynamic RTP payload type used for H.264 (RFC 3551 §6).
pub const DEFAULT_PAYLOAD_TYPE: u8 = 96;

/// Default frame rate when none is given on the command line.
pub const DEFAULT_FPS: u32 = 30;

/// Default delivery target: local RTP port 5004.
pub const DEFAULT_DEST: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5004);

/// Default UDP payload budget committed to by the sender.
pub const DEFAULT_MTU: usize = 1500;

/// Default synchronization source identifier.
pub const DEFAULT_SSRC: u32 = 0x0006_6E64;

/// Default SDP companion file, written next to wherever the streamer runs.
pub const DEFAULT_SDP_PATH: &str = "stream.sdp";

/// Minimum usable MTU: 12-byte RTP header, 2 FU-A bytes, 1 payload byte.
const MIN_MTU: usize = 15;

/// Validated configuration consumed by the pipeline.
///
/// Built from parsed command-line arguments by the CLI, or directly by
/// library users. Construction validates everything up front so the
/// pipeline itself never re-checks parameters.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Path to the Annex B H.264 elementary stream.
    pub input: PathBuf,
    /// Frame rate used to derive the RTP timestamp step. `1..=90000`.
    pub fps: u32,
    /// UDP destination for RTP packets.
    pub dest: SocketAddr,
    /// Maximum UDP payload per packet, including the 12-byte RTP header.
    pub mtu: usize,
    /// RTP synchronization source identifier.
    pub ssrc: u32,
    /// RTP payload type.
    pub payload_type: u8,
    /// Where to write the SDP companion, `None` to skip it.
    pub sdp_path: Option<PathBuf>,
}

impl StreamConfig {
    /// Create a configuration with defaults for everything but the input
    /// path and frame rate.
    ///
    /// Fails with [`StreamError::InvalidFps`] when `fps` is zero or exceeds
    /// the 90 kHz clock rate (the timestamp step would round to zero).
    pub fn new(input: PathBuf, fps: u32) -> Result<Self> {
        let config = Self {
            input,
            fps,
            dest: DEFAULT_DEST,
            mtu: DEFAULT_MTU,
            ssrc: DEFAULT_SSRC,
            payload_type: DEFAULT_PAYLOAD_TYPE,
            sdp_path: Some(PathBuf::from(DEFAULT_SDP_PATH)),
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the destination address.
    pub fn with_dest(mut self, dest: SocketAddr) -> Self {
        self.dest = dest;
        self
    }

    /// Replace the MTU. Re-validates, since a tiny MTU cannot carry even a
    /// one-byte FU-A fragment.
    pub fn with_mtu(mut self, mtu: usize) -> Result<Self> {
        self.mtu = mtu;
        self.validate()?;
        Ok(self)
    }

    /// Pick a random SSRC per RFC 3550 §8.1 instead of the fixed default.
    pub fn with_random_ssrc(mut self) -> Self {
        self.ssrc = rand::rng().random::<u32>();
        self
    }

    /// Replace the SDP output path.
    pub fn with_sdp_path(mut self, path: PathBuf) -> Self {
        self.sdp_path = Some(path);
        self
    }

    /// Skip the SDP companion file entirely.
    pub fn without_sdp(mut self) -> Self {
        self.sdp_path = None;
        self
    }

    /// RTP timestamp ticks per source NAL at the configured frame rate.
    ///
    /// Always non-zero: `fps` is validated against [`CLOCK_RATE`].
    pub fn timestamp_step(&self) -> u32 {
        CLOCK_RATE / self.fps
    }

    /// Largest NAL (header byte included) that still fits a single-NAL packet.
    pub fn single_nal_limit(&self) -> usize {
        self.mtu - 12
    }

    fn validate(&self) -> Result<()> {
        if self.fps == 0 || self.fps > CLOCK_RATE {
            return Err(StreamError::InvalidFps(self.fps));
        }
        if self.mtu < MIN_MTU {
            return Err(StreamError::InvalidMtu(self.mtu));
        }
        Ok(())
    }
}
