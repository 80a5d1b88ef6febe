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

//! Pad-based sample playback.
//!
//! This module provides:
//! - Sample loading with download progress (in-memory for zero-latency playback)
//! - Per-pad trim windows
//! - Voice tracking so that everything can be stopped at once
//! - Pad state notifications for front ends

mod engine;
mod loader;
mod pad;
mod voice;

pub use engine::SamplerEngine;
pub use loader::{LoadError, SampleLoader, Source};
pub use pad::Trim;
pub use voice::Voice;

/// Number of pads.
pub const PAD_COUNT: usize = 16;

/// A change to a pad, for display.
#[derive(Clone, Debug, PartialEq)]
pub enum PadEvent {
    /// A sample finished loading.
    Loaded { pad: usize, duration: f64 },
    /// A sample failed to load. The pad is unchanged.
    LoadFailed { pad: usize, error: String },
    /// The pad was emptied.
    Cleared { pad: usize },
    /// A voice started, sounding `duration` seconds from `start` seconds into the buffer.
    Played {
        pad: usize,
        start: f64,
        duration: f64,
    },
    TrimChanged { pad: usize, trim: Trim },
}
