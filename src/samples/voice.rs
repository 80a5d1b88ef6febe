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

//! Voice tracking for pad playback.
//!
//! The engine registers every voice it schedules so that they can all be stopped at once.
//! Voices unregister themselves when the output reports that they played to the end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio::AudioBuffer;
use crate::playsync::CancelHandle;

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// A scheduled, time-bounded playback of a pad's buffer.
#[derive(Clone)]
pub struct Voice {
    /// Unique ID for this voice.
    id: u64,
    /// The pad that produced this voice.
    pad: usize,
    /// The buffer captured when the voice was created. Reloading or clearing the pad
    /// doesn't affect it.
    buffer: Arc<AudioBuffer>,
    /// Offset into the buffer, in seconds.
    start_time: f64,
    /// How long the voice sounds, in seconds.
    duration: f64,
    /// Audio clock time the voice was scheduled at, in seconds.
    scheduled_at: f64,
    /// Cancel handle for stopping this voice without lock contention.
    cancel_handle: CancelHandle,
}

impl Voice {
    /// Creates a new voice.
    pub fn new(
        pad: usize,
        buffer: Arc<AudioBuffer>,
        start_time: f64,
        duration: f64,
        scheduled_at: f64,
    ) -> Self {
        Self {
            id: NEXT_VOICE_ID.fetch_add(1, Ordering::SeqCst),
            pad,
            buffer,
            start_time,
            duration,
            scheduled_at,
            cancel_handle: CancelHandle::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pad(&self) -> usize {
        self.pad
    }

    pub fn buffer(&self) -> &Arc<AudioBuffer> {
        &self.buffer
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The end of the sounding interval within the buffer, in seconds.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    pub fn scheduled_at(&self) -> f64 {
        self.scheduled_at
    }

    /// Returns a clone of this voice's cancel handle.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel_handle.clone()
    }

    /// Returns true once the voice has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.cancel_handle.is_cancelled()
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id)
            .field("pad", &self.pad)
            .field("start_time", &self.start_time)
            .field("duration", &self.duration)
            .field("scheduled_at", &self.scheduled_at)
            .finish()
    }
}

/// The set of voices that are currently sounding.
#[derive(Default)]
pub struct VoiceManager {
    voices: Vec<Voice>,
}

impl VoiceManager {
    /// Creates a new voice manager.
    pub fn new() -> Self {
        Self { voices: Vec::new() }
    }

    /// Registers a voice.
    pub fn add_voice(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    /// Unregisters a voice that finished on its own. Returns false if the voice was already
    /// gone, e.g. after a stop.
    pub fn remove_voice(&mut self, id: u64) -> bool {
        let before = self.voices.len();
        self.voices.retain(|voice| voice.id != id);
        self.voices.len() != before
    }

    /// Returns the current number of active voices.
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    /// Clears all voices.
    /// Returns the cancel handles for all voices that should be stopped.
    pub fn clear(&mut self) -> Vec<CancelHandle> {
        let handles: Vec<CancelHandle> = self.voices.iter().map(|v| v.cancel_handle()).collect();
        self.voices.clear();
        handles
    }
}

impl std::fmt::Debug for VoiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceManager")
            .field("active_voices", &self.voices.len())
            .finish()
    }
}
