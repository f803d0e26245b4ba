use anyhow::Result;
use clap::Parser;
use log::info;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use spectrum_visualizer::audio::device::list_input_devices;
use spectrum_visualizer::audio::{
    frame_channel, AudioChunk, ChunkPipeline, FrameReceiver, FrequencyBandMapper, LiveSource,
    SpectrumAnalyzer, SyntheticCapture, SyntheticSource,
};
use spectrum_visualizer::cli::{Args, SYNTHETIC_SAMPLE_RATE};
use spectrum_visualizer::render::{
    BandLayout, JsonFrameExporter, RenderLoop, Renderer, TerminalRenderer,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_devices {
        list_input_devices()?;
        return Ok(());
    }

    args.validate()?;
    info!("Starting spectrum visualizer");

    if args.test_mode {
        match &args.output {
            Some(path) => record_synthetic(&args, path),
            None => run_synthetic(&args).await,
        }
    } else {
        run_live(&args).await
    }
}

fn build_pipeline(
    args: &Args,
    sample_rate: f32,
) -> Result<(ChunkPipeline, FrameReceiver, BandLayout)> {
    let mapper = FrequencyBandMapper::new(args.spectrum_config(sample_rate))?;
    info!(
        "{} bands of {:.1} Hz from {} Hz, {}-point FFT",
        mapper.band_count(),
        mapper.delta_f(),
        args.low_hz(),
        mapper.fft_size()
    );

    let layout = BandLayout::new(&mapper, args.cmap);
    let (publisher, receiver) = frame_channel(mapper.band_count());
    let pipeline = ChunkPipeline::new(SpectrumAnalyzer::new(mapper, args.gain), publisher);
    Ok((pipeline, receiver, layout))
}

async fn run_live(args: &Args) -> Result<()> {
    let source = LiveSource::open(args.device.as_ref(), args.samplerate)?;
    let (pipeline, receiver, layout) = build_pipeline(args, source.sample_rate())?;

    let mut render_loop = RenderLoop::new(receiver, TerminalRenderer::new(), &layout)?;
    // Held until the end of this scope: dropping it closes the stream on every exit path.
    let _capture = source.start(pipeline)?;

    drive(&mut render_loop, args.interval).await
}

async fn run_synthetic(args: &Args) -> Result<()> {
    let sample_rate = args.samplerate.unwrap_or(SYNTHETIC_SAMPLE_RATE);
    let (pipeline, receiver, layout) = build_pipeline(args, sample_rate)?;

    let mut render_loop = RenderLoop::new(receiver, TerminalRenderer::new(), &layout)?;
    let source = SyntheticSource::for_interval(sample_rate, args.interval);
    let _capture = SyntheticCapture::spawn(source, pipeline, interval(args.interval), None)?;

    drive(&mut render_loop, args.interval).await
}

/// Fixed-length synthetic run with producer and consumer in lockstep, so every
/// generated chunk becomes exactly one recorded frame.
fn record_synthetic(args: &Args, path: &std::path::Path) -> Result<()> {
    let sample_rate = args.samplerate.unwrap_or(SYNTHETIC_SAMPLE_RATE);
    let total_frames = SyntheticSource::chunk_count(args.duration, args.interval);
    let (mut pipeline, receiver, layout) = build_pipeline(args, sample_rate)?;

    info!("Generating {}s test data ({} frames)...", args.duration, total_frames);

    let exporter = JsonFrameExporter::new(
        args.spectrum_config(sample_rate),
        args.gain,
        args.interval,
        total_frames,
    );
    let mut render_loop = RenderLoop::new(receiver, exporter, &layout)?;
    let mut source = SyntheticSource::for_interval(sample_rate, args.interval);
    let mut buffer = Vec::with_capacity(source.frames());

    for _ in 0..total_frames {
        source.fill_next(&mut buffer);
        pipeline.process(&AudioChunk::new(&buffer));
        render_loop.tick()?;
    }

    info!("Saving frames to {}...", path.display());
    render_loop.into_renderer().save(path)?;
    Ok(())
}

fn interval(interval_ms: f32) -> Duration {
    Duration::from_secs_f32(interval_ms / 1000.0)
}

/// Tick the render loop on a fixed timer until Ctrl-C.
async fn drive<R: Renderer>(render_loop: &mut RenderLoop<R>, interval_ms: f32) -> Result<()> {
    let mut ticker = tokio::time::interval(interval(interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Rendering every {} ms, press Ctrl+C to exit", interval_ms);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => render_loop.tick()?,
            result = &mut ctrl_c => {
                result?;
                break;
            }
        }
    }

    info!(
        "Stopping after {} ticks ({} fresh frames)",
        render_loop.ticks(),
        render_loop.fresh_frames()
    );
    Ok(())
}
