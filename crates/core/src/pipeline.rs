//! Pipeline orchestration: three stages, two queues, one shared source.
//!
//! The parser, packetizer, and sender each run on their own OS thread and
//! communicate only through the bounded queues. Termination and
//! cancellation both ride on queue closure: a stage that finishes (or
//! fails) drops its queue endpoints, downstream drains to end-of-stream,
//! and upstream observes a closed `put` and stops producing.

use std::sync::Arc;
use std::thread;

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::nal::AnnexBParser;
use crate::packetizer::Packetizer;
use crate::queue;
use crate::sender::RtpSender;
use crate::source::ByteSource;

/// Totals observed across one pipeline run.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamSummary {
    /// NAL units scanned from the input.
    pub nals: u64,
    /// RTP packets delivered.
    pub packets: u64,
    /// UDP payload bytes delivered, RTP headers included.
    pub bytes: u64,
}

/// Open the input and stream it to the configured destination.
///
/// Returns once the whole file has been sent (or an error cancelled the
/// run). Configuration is validated at construction, so the only failures
/// here are I/O: opening the input, binding the socket, sending.
pub fn run(config: &StreamConfig) -> Result<StreamSummary> {
    let source = Arc::new(ByteSource::open(&config.input)?);
    run_with_source(config, source)
}

/// Stream an already-opened byte source. Split out so the SDP scan and the
/// pipeline can share one mapping of the input.
pub fn run_with_source(config: &StreamConfig, source: Arc<ByteSource>) -> Result<StreamSummary> {
    let sender = RtpSender::bind(config.dest, source.clone())?;
    let (nal_tx, nal_rx) = queue::bounded(queue::DEFAULT_CAPACITY);
    let (pkt_tx, pkt_rx) = queue::bounded(queue::DEFAULT_CAPACITY);

    tracing::info!(
        input = %config.input.display(),
        dest = %config.dest,
        fps = config.fps,
        mtu = config.mtu,
        "pipeline starting"
    );

    let data = source.as_slice();
    thread::scope(|scope| {
        let parse_stage = scope.spawn(move || {
            let mut nals = 0u64;
            for nal in AnnexBParser::new(data) {
                nals += 1;
                if nal_tx.put(nal).is_err() {
                    tracing::debug!("NAL queue closed downstream, parser stopping");
                    break;
                }
            }
            tracing::debug!(nals, "parser finished");
            nals
        });

        let packetize_stage = scope.spawn(move || {
            let mut packets = 0u64;
            for packet in Packetizer::new(nal_rx.into_iter(), config) {
                packets += 1;
                if pkt_tx.put(packet).is_err() {
                    tracing::debug!("packet queue closed downstream, packetizer stopping");
                    break;
                }
            }
            tracing::debug!(packets, "packetizer finished");
            packets
        });

        let send_stage = scope.spawn(move || sender.run(pkt_rx));

        let nals = parse_stage
            .join()
            .map_err(|_| StreamError::StagePanicked("parser"))?;
        packetize_stage
            .join()
            .map_err(|_| StreamError::StagePanicked("packetizer"))?;
        let stats = send_stage
            .join()
            .map_err(|_| StreamError::StagePanicked("sender"))??;

        Ok(StreamSummary {
            nals,
            packets: stats.packets,
            bytes: stats.bytes,
        })
    })
}
