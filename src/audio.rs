// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;

pub mod cpal;
pub mod decode;
pub mod mixer;

pub use decode::{decode, DecodeError};
pub use mixer::{AudioMixer, ScheduledVoice};

/// Decoded audio held entirely in memory. Samples are stored planar (one Vec per channel)
/// as f32 in [-1.0, 1.0].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Creates a buffer from planar channel data. Channels are truncated to the shortest
    /// channel so every channel has the same number of frames.
    pub fn new(mut channels: Vec<Vec<f32>>, sample_rate: u32) -> AudioBuffer {
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in channels.iter_mut() {
            channel.truncate(frames);
        }
        AudioBuffer {
            channels,
            sample_rate,
        }
    }

    /// Creates a buffer from interleaved samples.
    pub fn from_interleaved(samples: &[f32], channel_count: u16, sample_rate: u32) -> AudioBuffer {
        let channel_count = channel_count.max(1) as usize;
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }
        AudioBuffer::new(channels, sample_rate)
    }

    /// Returns the number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    /// Returns the total duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Returns the samples of a single channel.
    pub fn channel(&self, index: usize) -> &[f32] {
        self.channels.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns all channels.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.channels.len() * self.frames() * std::mem::size_of::<f32>()
    }
}

/// An audio output: owns the audio clock and plays the voices scheduled on it.
pub trait Output: Send + Sync {
    /// The rate the audio clock advances at, in frames per second.
    fn sample_rate(&self) -> u32;

    /// The current position of the audio clock, in frames.
    fn current_frame(&self) -> u64;

    /// The current position of the audio clock, in seconds.
    fn current_time(&self) -> f64 {
        self.current_frame() as f64 / self.sample_rate().max(1) as f64
    }

    /// Hands a voice to the output. The voice's completion callback must run exactly once,
    /// after the voice has played its full duration, and never if it was cancelled.
    fn schedule(&self, voice: ScheduledVoice) -> Result<(), Box<dyn Error>>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::Device>, Box<dyn Error>> {
    cpal::Device::list()
}
