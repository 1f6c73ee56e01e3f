//! Audio output engine
//!
//! Wraps the process-wide audio hardware behind an explicit start/stop
//! lifecycle. Mixed blocks travel from the frame loop to the device callback
//! through a bounded [`BufferQueue`]; the callback never blocks and renders
//! silence when it starves, reporting the underrun for telemetry.

use crate::config::IrisPulseWorldDesc;
use crate::error::{IrisPulseError, Result};
use crate::events::IrisPulseEvent;
use crate::mixer::AudioBuffer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::Sender;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Bounded FIFO of mixed blocks between the frame loop and the output
/// callback.
///
/// `push` applies the back-pressure policy: when the queue is full the
/// oldest pending block is dropped so fresh audio keeps flowing instead of
/// building latency. The callback side uses `try_pop`, which returns `None`
/// rather than waiting on the lock.
pub struct BufferQueue {
    inner: Mutex<VecDeque<AudioBuffer>>,
    capacity: usize,
}

impl BufferQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Enqueue a mixed block. Returns true if a pending block had to be
    /// dropped to make room.
    pub fn push(&self, buffer: AudioBuffer) -> bool {
        let mut queue = match self.inner.lock() {
            Ok(queue) => queue,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut dropped = false;
        while queue.len() >= self.capacity {
            queue.pop_front();
            dropped = true;
        }
        queue.push_back(buffer);
        dropped
    }

    /// Non-blocking pop for the device callback: `None` on an empty queue or
    /// when the frame loop currently holds the lock.
    pub fn try_pop(&self) -> Option<AudioBuffer> {
        self.inner.try_lock().ok()?.pop_front()
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(queue) => queue.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Audio engine that owns the output stream and drains the block queue
pub struct IrisPulseEngine {
    desc: IrisPulseWorldDesc,
    queue: Arc<BufferQueue>,
    events: Sender<IrisPulseEvent>,
    stream: Option<cpal::Stream>,
    is_running: Arc<AtomicBool>,
    frames_processed: Arc<AtomicUsize>,
    underruns: Arc<AtomicUsize>,
}

impl IrisPulseEngine {
    /// Create a new audio engine draining `queue`, reporting underruns on
    /// `events`.
    pub fn new(
        desc: IrisPulseWorldDesc,
        queue: Arc<BufferQueue>,
        events: Sender<IrisPulseEvent>,
    ) -> Result<Self> {
        Ok(Self {
            desc,
            queue,
            events,
            stream: None,
            is_running: Arc::new(AtomicBool::new(false)),
            frames_processed: Arc::new(AtomicUsize::new(0)),
            underruns: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Open the default output device and start draining the queue.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running.load(Ordering::Relaxed) {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            IrisPulseError::AudioDevice("No default output device available".into())
        })?;

        let config = cpal::StreamConfig {
            channels: self.desc.channels,
            sample_rate: cpal::SampleRate(self.desc.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(self.desc.block_size as u32),
        };

        let default_config = device.default_output_config().map_err(|e| {
            IrisPulseError::AudioDevice(format!("Failed to get default config: {}", e))
        })?;

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => self.create_stream::<f32>(&device, &config)?,
            cpal::SampleFormat::I16 => self.create_stream::<i16>(&device, &config)?,
            cpal::SampleFormat::U16 => self.create_stream::<u16>(&device, &config)?,
            _ => {
                return Err(IrisPulseError::AudioFormat(
                    "Unsupported sample format".into(),
                ));
            }
        };

        stream.play().map_err(|e| {
            IrisPulseError::AudioDevice(format!("Failed to start stream: {}", e))
        })?;

        self.stream = Some(stream);
        self.is_running.store(true, Ordering::Relaxed);

        Ok(())
    }

    /// Stop the output stream.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            self.is_running.store(false, Ordering::Relaxed);
            drop(stream); // This stops the stream
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Number of audio frames delivered to the device since start.
    pub fn frames_processed(&self) -> usize {
        self.frames_processed.load(Ordering::Relaxed)
    }

    /// Number of callback underruns observed since start.
    pub fn underruns(&self) -> usize {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &IrisPulseWorldDesc {
        &self.desc
    }

    fn create_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let queue = self.queue.clone();
        let events = self.events.clone();
        let is_running = self.is_running.clone();
        let frames_processed = self.frames_processed.clone();
        let underruns = self.underruns.clone();
        let channels = self.desc.channels as usize;

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    if !is_running.load(Ordering::Relaxed) {
                        for sample in data.iter_mut() {
                            *sample = T::from_sample(0.0f32);
                        }
                        return;
                    }

                    match queue.try_pop() {
                        Some(buffer) => {
                            let mixed = buffer.samples();
                            for (i, sample) in data.iter_mut().enumerate() {
                                let value = mixed.get(i).copied().unwrap_or(0.0);
                                *sample = T::from_sample(value);
                            }
                            frames_processed
                                .fetch_add(data.len() / channels, Ordering::Relaxed);
                        }
                        None => {
                            // Starved: play silence, report the gap.
                            for sample in data.iter_mut() {
                                *sample = T::from_sample(0.0f32);
                            }
                            underruns.fetch_add(1, Ordering::Relaxed);
                            let _ = events.send(IrisPulseEvent::UnderrunDetected {
                                frames: data.len() / channels,
                            });
                        }
                    }
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| {
                IrisPulseError::AudioDevice(format!("Failed to build stream: {}", e))
            })?;

        Ok(stream)
    }
}

impl Drop for IrisPulseEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
