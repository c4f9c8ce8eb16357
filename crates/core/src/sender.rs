//! Paced UDP delivery (stage 4).

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::CLOCK_RATE;
use crate::error::Result;
use crate::queue::QueueReceiver;
use crate::rtp::RtpPacket;
use crate::source::ByteSource;

/// Totals reported once the send loop finishes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SendStats {
    pub packets: u64,
    pub bytes: u64,
}

/// Media-clock pacer.
///
/// Sleeps between packets so that wire timing tracks the 90 kHz timestamp
/// deltas: a step of 3000 ticks becomes a 33.3 ms gap. Deltas of zero
/// (fragments of one NAL) and deltas of a full second or more (a
/// discontinuity, not a real gap) pass through without sleeping.
#[derive(Debug)]
struct Pacer {
    previous_timestamp: Option<u32>,
    anchor: Instant,
}

impl Pacer {
    fn new() -> Self {
        Self {
            previous_timestamp: None,
            anchor: Instant::now(),
        }
    }

    /// Block until `timestamp` is due, then re-anchor for the next packet.
    fn pace(&mut self, timestamp: u32) {
        if let Some(previous) = self.previous_timestamp {
            let delta_ticks = timestamp.wrapping_sub(previous);
            if delta_ticks > 0 && delta_ticks < CLOCK_RATE {
                let target = Duration::from_nanos(
                    u64::from(delta_ticks) * 1_000_000_000 / u64::from(CLOCK_RATE),
                );
                let elapsed = self.anchor.elapsed();
                if target > elapsed {
                    thread::sleep(target - elapsed);
                }
            }
        }
        self.anchor = Instant::now();
        self.previous_timestamp = Some(timestamp);
    }
}

/// UDP transport for outbound RTP packet delivery.
///
/// Binds a single ephemeral socket (`0.0.0.0:0`) and owns it for the whole
/// stream; every packet goes to the one configured destination. Payload
/// bytes are read positionally from the shared byte source at send time,
/// independent of the parser's scan position.
pub struct RtpSender {
    socket: UdpSocket,
    dest: SocketAddr,
    source: Arc<ByteSource>,
}

impl RtpSender {
    /// Bind an ephemeral UDP socket for outbound RTP.
    pub fn bind(dest: SocketAddr, source: Arc<ByteSource>) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        tracing::debug!(local = %socket.local_addr()?, %dest, "UDP sender bound");
        Ok(Self {
            socket,
            dest,
            source,
        })
    }

    /// Consume packet descriptors until the queue is closed and drained,
    /// sending each as one paced UDP datagram.
    ///
    /// A send failure is fatal: this is one-way UDP to a local peer, so
    /// there is nothing to retry against. Packets already sent stay valid.
    pub fn run(&self, packets: QueueReceiver<RtpPacket>) -> Result<SendStats> {
        let mut stats = SendStats::default();
        let mut pacer = Pacer::new();
        let data = self.source.as_slice();

        for packet in packets {
            pacer.pace(packet.header.timestamp);
            let wire = packet.wire_bytes(data);
            self.socket.send_to(&wire, self.dest)?;
            stats.packets += 1;
            stats.bytes += wire.len() as u64;
            tracing::trace!(
                seq = packet.header.sequence,
                ts = packet.header.timestamp,
                len = wire.len(),
                "packet sent"
            );
        }

        tracing::info!(
            packets = stats.packets,
            bytes = stats.bytes,
            "stream delivered"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use crate::rtp::{PacketPayload, RtpHeader};
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn pacer_sleeps_for_timestamp_delta() {
        let mut pacer = Pacer::new();
        pacer.pace(0);
        let before = Instant::now();
        pacer.pace(1800); // 20 ms at 90 kHz
        assert!(
            before.elapsed() >= Duration::from_millis(15),
            "expected a ~20 ms pacing sleep"
        );
    }

    #[test]
    fn pacer_skips_zero_delta() {
        let mut pacer = Pacer::new();
        pacer.pace(3000);
        let before = Instant::now();
        pacer.pace(3000); // same NAL, next fragment
        assert!(before.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn pacer_skips_discontinuity() {
        let mut pacer = Pacer::new();
        pacer.pace(0);
        let before = Instant::now();
        pacer.pace(90_000); // a full second: sanity filter drops it
        assert!(before.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn pacer_first_packet_is_immediate() {
        let mut pacer = Pacer::new();
        let before = Instant::now();
        pacer.pace(50_000);
        assert!(before.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn sends_wire_bytes_to_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.h264");
        File::create(&path)
            .unwrap()
            .write_all(&[0, 0, 1, 0x65, 0xAA, 0xBB])
            .unwrap();
        let source = Arc::new(ByteSource::open(&path).unwrap());

        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();

        let sender = RtpSender::bind(receiver.local_addr().unwrap(), source).unwrap();
        let (tx, rx) = queue::bounded(4);
        tx.put(RtpPacket {
            header: RtpHeader {
                marker: true,
                payload_type: 96,
                sequence: 0,
                timestamp: 3000,
                ssrc: 0x0006_6E64,
            },
            payload: PacketPayload::SingleNal { offset: 3, len: 3 },
        })
        .unwrap();
        tx.close();

        let stats = sender.run(rx).unwrap();
        assert_eq!(stats.packets, 1);
        assert_eq!(stats.bytes, 15);

        let mut buf = [0u8; 64];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(n, 15);
        assert_eq!(&buf[12..15], &[0x65, 0xAA, 0xBB]);
        assert_eq!(buf[1] & 0x80, 0x80, "marker bit on the wire");
    }
}
