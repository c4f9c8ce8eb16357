use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use rtpstream::{pipeline, sdp, ByteSource, StreamConfig};

#[derive(Parser)]
#[command(
    name = "rtpstream",
    about = "Stream an Annex B H.264 file over RTP/UDP to a local player"
)]
struct Args {
    /// Input file containing a raw Annex B H.264 elementary stream
    input: PathBuf,

    /// Frame rate used to pace delivery (1..=90000)
    #[arg(default_value_t = rtpstream::config::DEFAULT_FPS)]
    fps: u32,

    /// RTP destination address
    #[arg(long, default_value_t = rtpstream::config::DEFAULT_DEST)]
    dest: SocketAddr,

    /// Maximum UDP payload per packet, RTP header included
    #[arg(long, default_value_t = rtpstream::config::DEFAULT_MTU)]
    mtu: usize,

    /// Where to write the SDP session description
    #[arg(long, default_value = rtpstream::config::DEFAULT_SDP_PATH)]
    sdp: PathBuf,

    /// Skip writing the SDP file
    #[arg(long)]
    no_sdp: bool,

    /// Use a random SSRC instead of the fixed default
    #[arg(long)]
    random_ssrc: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match stream(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "streaming failed");
            ExitCode::FAILURE
        }
    }
}

fn stream(args: Args) -> rtpstream::Result<()> {
    // Configuration errors surface before any file or socket is touched.
    let mut config = StreamConfig::new(args.input, args.fps)?
        .with_dest(args.dest)
        .with_mtu(args.mtu)?
        .with_sdp_path(args.sdp);
    if args.no_sdp {
        config = config.without_sdp();
    }
    if args.random_ssrc {
        config = config.with_random_ssrc();
    }

    let source = Arc::new(ByteSource::open(&config.input)?);
    sdp::write_file(&source, &config)?;

    let summary = pipeline::run_with_source(&config, source)?;
    tracing::info!(
        nals = summary.nals,
        packets = summary.packets,
        bytes = summary.bytes,
        "done"
    );
    Ok(())
}
