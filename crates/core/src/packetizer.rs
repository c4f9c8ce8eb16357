//! RFC 6184 packetization (stage 2).
//!
//! Turns the parser's NAL descriptors into RTP packet descriptors:
//! single NAL unit mode when a whole NAL fits the MTU, FU-A fragmentation
//! otherwise, with SPS/PPS caching so parameter sets can be replayed ahead
//! of every IDR and periodically for late joiners of the one-way stream.

use crate::config::StreamConfig;
use crate::nal::{NalKind, NalUnit};
use crate::rtp::{PacketPayload, RtpHeaderState, RtpPacket, RTP_HEADER_LEN};

/// FU-A payload type carried in the FU indicator (RFC 6184 §5.4).
const FU_A_TYPE: u8 = 28;

/// Wire overhead of one FU-A fragment: RTP header plus the FU indicator
/// and FU header bytes.
const FU_A_OVERHEAD: usize = RTP_HEADER_LEN + 2;

/// Replay cached parameter sets after this many non-parameter packets.
const PARAM_RESEND_INTERVAL: u32 = 100;

/// In-progress FU-A fragmentation of one source NAL.
#[derive(Debug, Clone, Copy)]
struct Fragmentation {
    nal: NalUnit,
    /// Payload bytes already emitted, header byte excluded.
    offset: u64,
}

/// What to do with a NAL just fetched from the queue.
enum Fetched {
    /// Emit it now.
    Emit(NalUnit),
    /// Parameter-set replay was scheduled; the NAL waits until the
    /// pending SPS/PPS have gone out.
    AfterParams,
}

/// H.264 RTP packetizer (RFC 6184).
///
/// Pulls NAL descriptors from `input` (the NAL queue, or any iterator in
/// tests) and yields RTP packet descriptors. The input ending is the only
/// termination condition; queue closure surfaces as iterator exhaustion.
///
/// Per-packet state: the sequence number advances on every packet, the
/// timestamp advances by `90000 / fps` per emitted NAL (replayed parameter
/// sets count as emissions), and all fragments of one NAL share that NAL's
/// timestamp. The marker bit is set on the single packet of a VCL NAL and
/// on the final fragment of a fragmented VCL NAL, never on non-VCL data.
#[derive(Debug)]
pub struct Packetizer<I> {
    input: I,
    header: RtpHeaderState,
    /// Largest NAL that still rides in one single-NAL packet.
    single_nal_limit: usize,
    /// Payload bytes per FU-A fragment.
    fragment_limit: usize,
    timestamp_step: u32,
    current: Option<Fragmentation>,
    /// Fetched NAL parked while pending parameter sets drain.
    deferred: Option<NalUnit>,
    cached_sps: Option<NalUnit>,
    cached_pps: Option<NalUnit>,
    pending_sps: bool,
    pending_pps: bool,
    packets_since_param_resend: u32,
}

impl<I> Packetizer<I>
where
    I: Iterator<Item = NalUnit>,
{
    pub fn new(input: I, config: &StreamConfig) -> Self {
        Self {
            input,
            header: RtpHeaderState::new(config.payload_type, config.ssrc),
            single_nal_limit: config.single_nal_limit(),
            fragment_limit: config.mtu - FU_A_OVERHEAD,
            timestamp_step: config.timestamp_step(),
            current: None,
            deferred: None,
            cached_sps: None,
            cached_pps: None,
            pending_sps: false,
            pending_pps: false,
            packets_since_param_resend: 0,
        }
    }

    /// Per-NAL processing on fetch: parameter sets update the cache, an
    /// IDR schedules a replay of whatever is cached, and everything else
    /// ticks the periodic-resend counter.
    fn classify(&mut self, nal: NalUnit) -> Fetched {
        match nal.header.kind() {
            NalKind::Sps => {
                self.cached_sps = Some(nal);
                Fetched::Emit(nal)
            }
            NalKind::Pps => {
                self.cached_pps = Some(nal);
                Fetched::Emit(nal)
            }
            NalKind::SliceIdr => {
                self.pending_sps = self.cached_sps.is_some();
                self.pending_pps = self.cached_pps.is_some();
                if self.pending_sps || self.pending_pps {
                    tracing::trace!("IDR reached, replaying cached parameter sets");
                    self.deferred = Some(nal);
                    Fetched::AfterParams
                } else {
                    Fetched::Emit(nal)
                }
            }
            _ => {
                self.packets_since_param_resend += 1;
                if self.packets_since_param_resend >= PARAM_RESEND_INTERVAL
                    && (self.cached_sps.is_some() || self.cached_pps.is_some())
                {
                    self.pending_sps = self.cached_sps.is_some();
                    self.pending_pps = self.cached_pps.is_some();
                    tracing::trace!("periodic parameter-set replay");
                    self.deferred = Some(nal);
                    Fetched::AfterParams
                } else {
                    Fetched::Emit(nal)
                }
            }
        }
    }

    /// Emit a NAL: advance the timestamp, then produce either a single-NAL
    /// packet or the first FU-A fragment.
    fn emit(&mut self, nal: NalUnit) -> RtpPacket {
        self.header.advance_timestamp(self.timestamp_step);
        if nal.size() as usize <= self.single_nal_limit {
            RtpPacket {
                header: self.header.stamp(nal.header.is_vcl()),
                payload: PacketPayload::SingleNal {
                    offset: nal.start_off,
                    len: nal.size(),
                },
            }
        } else {
            tracing::trace!(
                kind = nal.header.kind().bits(),
                size = nal.size(),
                "NAL exceeds single-packet budget, fragmenting"
            );
            self.fragment(nal, 0)
        }
    }

    /// Produce the FU-A fragment starting at `offset` into the NAL payload
    /// and remember the continuation, if any.
    fn fragment(&mut self, nal: NalUnit, offset: u64) -> RtpPacket {
        let payload_total = nal.payload_len();
        let remaining = payload_total - offset;
        let take = remaining.min(self.fragment_limit as u64);

        let start = offset == 0;
        let end = offset + take == payload_total;
        let indicator = (nal.header.byte() & 0x60) | FU_A_TYPE;
        let fu_header =
            ((start as u8) << 7) | ((end as u8) << 6) | nal.header.kind().bits();

        self.current = if end {
            None
        } else {
            Some(Fragmentation {
                nal,
                offset: offset + take,
            })
        };

        RtpPacket {
            header: self.header.stamp(end && nal.header.is_vcl()),
            payload: PacketPayload::FuA {
                indicator,
                fu_header,
                offset: nal.start_off + 1 + offset,
                len: take,
            },
        }
    }
}

impl<I> Iterator for Packetizer<I>
where
    I: Iterator<Item = NalUnit>,
{
    type Item = RtpPacket;

    /// Scheduling priority: an in-flight fragmentation first, then pending
    /// SPS, then pending PPS, then the NAL parked behind them, then the
    /// next NAL from the input.
    fn next(&mut self) -> Option<RtpPacket> {
        loop {
            if let Some(frag) = self.current.take() {
                return Some(self.fragment(frag.nal, frag.offset));
            }
            if self.pending_sps {
                self.pending_sps = false;
                if let Some(sps) = self.cached_sps {
                    self.packets_since_param_resend = 0;
                    return Some(self.emit(sps));
                }
                continue;
            }
            if self.pending_pps {
                self.pending_pps = false;
                if let Some(pps) = self.cached_pps {
                    self.packets_since_param_resend = 0;
                    return Some(self.emit(pps));
                }
                continue;
            }
            if let Some(nal) = self.deferred.take() {
                return Some(self.emit(nal));
            }
            let nal = self.input.next()?;
            match self.classify(nal) {
                Fetched::Emit(nal) => return Some(self.emit(nal)),
                Fetched::AfterParams => continue,
            }
        }
    }
}
