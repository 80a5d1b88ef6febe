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
use std::sync::Arc;

use crate::audio::AudioBuffer;
use crate::util;

/// A trim window as fractions of a buffer's duration. `start < end` always holds for trims
/// handed out by the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trim {
    pub start: f64,
    pub end: f64,
}

impl Default for Trim {
    fn default() -> Self {
        Trim {
            start: 0.0,
            end: 1.0,
        }
    }
}

impl Trim {
    /// Builds a valid trim from arbitrary input. Both ends are clamped to [0, 1] and put in
    /// order. Equal ends are pushed one representable step apart.
    pub fn new(start: f64, end: f64) -> Trim {
        let mut start = util::clamp(start, 0.0, 1.0);
        let mut end = util::clamp(end, 0.0, 1.0);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        if start == end {
            if end < 1.0 {
                end = next_up(end);
            } else {
                start = next_down(start);
            }
        }
        Trim { start, end }
    }

    /// The fraction of the buffer the window covers.
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// The next f64 above a non-negative value.
fn next_up(value: f64) -> f64 {
    // -0.0 has the sign bit set, so stepping its bits would go negative.
    if value == 0.0 {
        return f64::from_bits(1);
    }
    f64::from_bits(value.to_bits() + 1)
}

/// The next f64 below a positive value.
fn next_down(value: f64) -> f64 {
    f64::from_bits(value.to_bits() - 1)
}

/// One sample slot.
#[derive(Clone, Debug, Default)]
pub(super) struct Pad {
    pub(super) buffer: Option<Arc<AudioBuffer>>,
    pub(super) trim: Trim,
}

impl Pad {
    /// Replaces the buffer and resets the trim.
    pub(super) fn load(&mut self, buffer: Arc<AudioBuffer>) {
        self.buffer = Some(buffer);
        self.trim = Trim::default();
    }

    pub(super) fn clear(&mut self) {
        self.buffer = None;
        self.trim = Trim::default();
    }

    pub(super) fn duration(&self) -> f64 {
        self.buffer
            .as_ref()
            .map(|buffer| buffer.duration())
            .unwrap_or(0.0)
    }
}
