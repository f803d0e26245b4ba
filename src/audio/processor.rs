use anyhow::Result;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::device::{device_name, resolve_input_device};
use super::{
    AudioChunk, DeviceError, DeviceSelector, FramePublisher, SpectrumAnalyzer, SyntheticSource,
};

/// Producer-side work for one chunk: analyze, then publish.
///
/// Lives inside whichever context delivers audio (the device callback or the
/// synthetic thread), so `process` never blocks and does not allocate once the
/// frame pool has warmed up.
pub struct ChunkPipeline {
    analyzer: SpectrumAnalyzer,
    publisher: FramePublisher,
    skipped: u64,
}

impl ChunkPipeline {
    pub fn new(analyzer: SpectrumAnalyzer, publisher: FramePublisher) -> Self {
        debug_assert_eq!(analyzer.band_count(), publisher.band_count());
        Self {
            analyzer,
            publisher,
            skipped: 0,
        }
    }

    /// Returns whether a frame was published.
    pub fn process(&mut self, chunk: &AudioChunk) -> bool {
        let mut frame = self.publisher.spare_frame();
        match self.analyzer.analyze_into(chunk, &mut frame) {
            Ok(()) => {
                self.publisher.publish(frame);
                true
            }
            Err(e) => {
                self.skipped += 1;
                debug!("Skipping publish: {}", e);
                false
            }
        }
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// An opened (not yet running) input device.
pub struct LiveSource {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl LiveSource {
    /// Open the selected (or default) input device, optionally forcing a sample rate.
    pub fn open(
        selector: Option<&DeviceSelector>,
        sample_rate: Option<f32>,
    ) -> Result<Self, DeviceError> {
        let device = resolve_input_device(selector)?;

        let default_config = device.default_input_config().map_err(|e| DeviceError::Config {
            device: device_name(&device),
            reason: e.to_string(),
        })?;
        info!("Audio config: {:?}", default_config);

        let sample_format = default_config.sample_format();
        let mut config: StreamConfig = default_config.into();
        if let Some(rate) = sample_rate {
            config.sample_rate = cpal::SampleRate(rate.round() as u32);
        }

        Ok(Self {
            device,
            config,
            sample_format,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate.0 as f32
    }

    pub fn name(&self) -> String {
        device_name(&self.device)
    }

    /// Start streaming; every device callback becomes one analyzed chunk.
    pub fn start(self, pipeline: ChunkPipeline) -> Result<LiveCapture, DeviceError> {
        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(pipeline),
            SampleFormat::I16 => self.build_stream::<i16>(pipeline),
            SampleFormat::U16 => self.build_stream::<u16>(pipeline),
            other => Err(DeviceError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream.play().map_err(|e| DeviceError::Stream {
            device: self.name(),
            reason: e.to_string(),
        })?;

        info!(
            "Capturing from {} ({} ch, {} Hz)",
            self.name(),
            self.config.channels,
            self.config.sample_rate.0
        );

        Ok(LiveCapture {
            stream,
            device_name: self.name(),
        })
    }

    fn build_stream<T>(&self, mut pipeline: ChunkPipeline) -> Result<Stream, DeviceError>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let channels = self.config.channels as usize;
        let mut mono: Vec<f32> = Vec::with_capacity(8192);

        self.device
            .build_input_stream(
                &self.config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    downmix(data, channels, &mut mono);
                    pipeline.process(&AudioChunk::new(&mono));
                },
                |err| {
                    warn!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| DeviceError::Stream {
                device: self.name(),
                reason: e.to_string(),
            })
    }
}

/// A running input stream. Dropping it closes the stream and releases the device.
pub struct LiveCapture {
    stream: Stream,
    device_name: String,
}

impl LiveCapture {
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for LiveCapture {
    fn drop(&mut self) {
        if let Err(e) = self.stream.pause() {
            debug!("Pausing stream before release failed: {}", e);
        }
        info!("Released audio device: {}", self.device_name);
    }
}

/// Average interleaved frames into `mono`, reusing its allocation.
pub fn downmix<T>(data: &[T], channels: usize, mono: &mut Vec<f32>)
where
    T: Sample,
    f32: FromSample<T>,
{
    mono.clear();
    if channels <= 1 {
        mono.extend(data.iter().map(|&s| s.to_sample::<f32>()));
    } else {
        mono.extend(data.chunks_exact(channels).map(|frame| {
            frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32
        }));
    }
}

/// Paced generator thread feeding synthetic chunks through a pipeline.
/// Stopped and joined on drop.
pub struct SyntheticCapture {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyntheticCapture {
    /// Generate one chunk per `interval`, up to `limit` chunks when given.
    pub fn spawn(
        mut source: SyntheticSource,
        mut pipeline: ChunkPipeline,
        interval: Duration,
        limit: Option<usize>,
    ) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("synthetic-audio".to_string())
            .spawn(move || {
                let mut buffer = Vec::with_capacity(source.frames());
                let mut next_tick = Instant::now();
                let mut produced = 0usize;

                while !stop_flag.load(Ordering::Relaxed)
                    && limit.map_or(true, |max| produced < max)
                {
                    source.fill_next(&mut buffer);
                    pipeline.process(&AudioChunk::new(&buffer));
                    produced += 1;

                    next_tick += interval;
                    if let Some(wait) = next_tick.checked_duration_since(Instant::now()) {
                        thread::sleep(wait);
                    }
                }

                debug!(
                    "Synthetic source stopped after {} chunks ({} skipped)",
                    produced,
                    pipeline.skipped()
                );
            })?;

        info!("Synthetic audio running at one chunk every {:?}", interval);

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for SyntheticCapture {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Synthetic audio thread panicked");
            }
        }
    }
}
