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
// Core voice mixing logic that can be used by both CPAL and headless implementations
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{AudioBuffer, Output};
use crate::playsync::CancelHandle;

/// A voice handed to the mixer: a window of a captured buffer, scheduled on the audio clock.
pub struct ScheduledVoice {
    /// Unique ID for this voice.
    pub id: u64,
    /// The buffer to read from. The voice owns its own reference.
    pub buffer: Arc<AudioBuffer>,
    /// First buffer frame to play.
    pub start_frame: usize,
    /// Number of buffer frames to play.
    pub frame_count: usize,
    /// Clock frame at which playback starts.
    pub start_at: u64,
    /// Cancel handle for this voice.
    pub cancel_handle: CancelHandle,
    /// Runs once when the voice has played to the end.
    pub on_complete: Option<Box<dyn FnOnce() + Send>>,
}

impl fmt::Debug for ScheduledVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledVoice")
            .field("id", &self.id)
            .field("start_frame", &self.start_frame)
            .field("frame_count", &self.frame_count)
            .field("start_at", &self.start_at)
            .finish()
    }
}

/// A voice currently owned by the mixer.
struct ActiveVoice {
    voice: ScheduledVoice,
    /// Buffer frames consumed so far (fractional when the buffer rate differs from the output).
    position: f64,
    /// Buffer frames consumed per output frame.
    step: f64,
}

impl ActiveVoice {
    fn is_done(&self) -> bool {
        self.position as usize >= self.voice.frame_count
    }
}

/// Core audio mixing logic that's independent of any audio backend. The mixer is also the
/// audio clock: the clock advances by exactly the number of frames rendered.
#[derive(Clone)]
pub struct AudioMixer {
    /// Voices currently playing.
    voices: Arc<Mutex<Vec<ActiveVoice>>>,
    /// Channel for adding voices without contending with the render lock.
    voice_tx: crossbeam_channel::Sender<ScheduledVoice>,
    voice_rx: crossbeam_channel::Receiver<ScheduledVoice>,
    /// Number of output channels.
    num_channels: u16,
    /// Sample rate.
    sample_rate: u32,
    /// Frames rendered so far.
    current_frame: Arc<AtomicU64>,
}

impl AudioMixer {
    /// Creates a new audio mixer.
    pub fn new(num_channels: u16, sample_rate: u32) -> Self {
        let (voice_tx, voice_rx) = crossbeam_channel::unbounded();
        Self {
            voices: Arc::new(Mutex::new(Vec::new())),
            voice_tx,
            voice_rx,
            num_channels: num_channels.max(1),
            sample_rate: sample_rate.max(1),
            current_frame: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Gets the number of output channels.
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Returns the number of voices the mixer is holding, including scheduled voices it has
    /// not picked up yet.
    pub fn active_count(&self) -> usize {
        self.voices.lock().len() + self.voice_rx.len()
    }

    /// Mixes `frames` frames of interleaved audio into `output` and advances the clock.
    pub fn process_into_output(&self, output: &mut [f32], frames: usize) {
        let num_channels = self.num_channels as usize;
        let frames = frames.min(output.len() / num_channels);
        output.fill(0.0);

        let base = self.current_frame.load(Ordering::Acquire);
        let mut completed: Vec<Box<dyn FnOnce() + Send>> = Vec::new();

        {
            let mut voices = self.voices.lock();
            while let Ok(voice) = self.voice_rx.try_recv() {
                let step = voice.buffer.sample_rate() as f64 / self.sample_rate as f64;
                voices.push(ActiveVoice {
                    voice,
                    position: 0.0,
                    step,
                });
            }

            voices.retain_mut(|active| {
                if active.voice.cancel_handle.is_cancelled() {
                    return false;
                }

                let buffer = &active.voice.buffer;
                let buffer_channels = buffer.channel_count();
                for frame in 0..frames {
                    if base + (frame as u64) < active.voice.start_at {
                        continue;
                    }
                    if active.is_done() || buffer_channels == 0 {
                        break;
                    }

                    let source_frame = active.voice.start_frame + active.position as usize;
                    for channel in 0..num_channels {
                        let source = buffer.channel(channel.min(buffer_channels - 1));
                        if let Some(sample) = source.get(source_frame) {
                            output[frame * num_channels + channel] += *sample;
                        }
                    }
                    active.position += active.step;
                }

                let started = base + frames as u64 > active.voice.start_at;
                if started && (active.is_done() || buffer_channels == 0) {
                    if let Some(on_complete) = active.voice.on_complete.take() {
                        completed.push(on_complete);
                    }
                    return false;
                }
                true
            });
        }

        self.current_frame
            .fetch_add(frames as u64, Ordering::AcqRel);

        // Completion callbacks run outside of the render lock.
        for on_complete in completed {
            on_complete();
        }
    }

    /// Processes multiple frames and returns them interleaved.
    pub fn process_frames(&self, num_frames: usize) -> Vec<f32> {
        let mut frames = vec![0.0f32; num_frames * self.num_channels as usize];
        self.process_into_output(&mut frames, num_frames);
        frames
    }
}

impl Output for AudioMixer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_frame(&self) -> u64 {
        self.current_frame.load(Ordering::Acquire)
    }

    fn schedule(&self, voice: ScheduledVoice) -> Result<(), Box<dyn Error>> {
        self.voice_tx.send(voice)?;
        Ok(())
    }
}

impl fmt::Debug for AudioMixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioMixer")
            .field("num_channels", &self.num_channels)
            .field("sample_rate", &self.sample_rate)
            .field("current_frame", &self.current_frame())
            .field("active_voices", &self.active_count())
            .finish()
    }
}
