//! # rtpstream — localhost H.264 RTP streamer
//!
//! A Rust library for streaming a raw Annex B H.264 elementary stream from a
//! file to a UDP destination as RTP, paced on the 90 kHz media clock, with a
//! companion SDP description for standard players.
//!
//! ## Protocol references
//!
//! | RFC | Topic | How this crate uses it |
//! |-----|-------|----------------------|
//! | [RFC 3550](https://tools.ietf.org/html/rfc3550) | RTP | Packet header format, SSRC, sequence/timestamp semantics |
//! | [RFC 4566](https://tools.ietf.org/html/rfc4566) | SDP | Session description written next to the stream |
//! | [RFC 6184](https://tools.ietf.org/html/rfc6184) | H.264 RTP payload | Single NAL unit mode, FU-A fragmentation, sprop-parameter-sets |
//!
//! ## Architecture
//!
//! Three stages run on their own OS threads, joined by bounded queues, all
//! sharing one read-only memory map of the input file:
//!
//! ```text
//! ┌────────────┐  NAL descriptors   ┌────────────┐  RTP descriptors  ┌────────────┐
//! │ NAL Parser │ ─── nal queue ───▶ │ Packetizer │ ── packet queue ─▶│ RTP Sender │
//! └────────────┘                    └────────────┘                   └────────────┘
//!       │                                                                  │
//!       └───────────── shared read-only byte source (mmap) ────────────────┘
//! ```
//!
//! Descriptors carry `(offset, length)` ranges into the byte source instead of
//! payload bytes, so NAL payloads are only touched once, when the sender
//! serializes them onto the wire.
//!
//! ## Quick start
//!
//! ```no_run
//! use rtpstream::{pipeline, StreamConfig};
//!
//! let config = StreamConfig::new("input.h264".into(), 30).unwrap();
//! let summary = pipeline::run(&config).unwrap();
//! println!("sent {} packets", summary.packets);
//! ```
//!
//! ## Crate layout
//!
//! - [`config`] — [`StreamConfig`] and derived RTP parameters.
//! - [`source`] — [`ByteSource`], the shared memory-mapped input view.
//! - [`nal`] — NAL unit model and the Annex B scanner.
//! - [`queue`] — bounded inter-stage channels with close-on-drop.
//! - [`packetizer`] — RFC 6184 single-NAL / FU-A packetization state machine.
//! - [`rtp`] — RTP header state and wire serialization.
//! - [`sender`] — paced UDP delivery on the 90 kHz clock.
//! - [`pipeline`] — stage orchestration, cancellation, summary.
//! - [`sdp`] — SDP companion generation.
//! - [`error`] — [`StreamError`] enum and [`Result`] alias.

pub mod config;
pub mod error;
pub mod nal;
pub mod packetizer;
pub mod pipeline;
pub mod queue;
pub mod rtp;
pub mod sdp;
pub mod sender;
pub mod source;

pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use nal::{NalHeader, NalKind, NalUnit};
pub use pipeline::StreamSummary;
pub use source::ByteSource;
