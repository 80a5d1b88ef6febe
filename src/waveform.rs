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

use tracing::debug;

use crate::audio::AudioBuffer;
use crate::draw::{Color, Point, Shape};

/// Reduces a buffer to `width` peak magnitudes, one per pixel column.
///
/// The frames are split into `width` contiguous segments of `max(1, frames / width)` frames.
/// The last segment runs to the end of the buffer, so no trailing frames are dropped. Each
/// peak is the mean, across channels, of the largest absolute sample in the segment. Segments
/// that fall past the end of a short buffer are 0.
pub fn compute_peaks(buffer: &AudioBuffer, width: usize) -> Vec<f32> {
    if width == 0 {
        return Vec::new();
    }

    let frames = buffer.frames();
    let channel_count = buffer.channel_count();
    let segment_size = (frames / width).max(1);

    (0..width)
        .map(|i| {
            let start = i * segment_size;
            let end = if i == width - 1 {
                frames
            } else {
                ((i + 1) * segment_size).min(frames)
            };
            if start >= end || channel_count == 0 {
                return 0.0;
            }

            let total: f32 = buffer
                .channels()
                .iter()
                .map(|channel| {
                    channel[start..end]
                        .iter()
                        .fold(0.0f32, |peak, sample| peak.max(sample.abs()))
                })
                .sum();
            total / channel_count as f32
        })
        .collect()
}

/// Draws a buffer as a mirrored peak waveform. Peaks are cached until the buffer or the
/// surface width changes.
pub struct WaveformDrawer {
    width: u32,
    height: u32,
    color: Color,
    buffer: Option<Arc<AudioBuffer>>,
    peaks: Option<Vec<f32>>,
}

impl WaveformDrawer {
    pub fn new(width: u32, height: u32) -> WaveformDrawer {
        WaveformDrawer {
            width,
            height,
            color: Color::LIGHT_BLUE,
            buffer: None,
            peaks: None,
        }
    }

    /// Sets the buffer to draw. Setting the same buffer again keeps the cached peaks.
    pub fn set_buffer(&mut self, buffer: Option<Arc<AudioBuffer>>) {
        let same = match (&self.buffer, &buffer) {
            (Some(current), Some(new)) => Arc::ptr_eq(current, new),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.peaks = None;
        }
        self.buffer = buffer;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width != self.width {
            self.peaks = None;
        }
        self.width = width;
        self.height = height;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The duration of the current buffer, or 0 without one.
    pub fn duration(&self) -> f64 {
        self.buffer.as_ref().map(|buffer| buffer.duration()).unwrap_or(0.0)
    }

    pub fn is_initialized(&self) -> bool {
        self.buffer.is_some()
    }

    /// Returns the peaks for the current buffer and width, computing them if needed.
    pub fn peaks(&mut self) -> &[f32] {
        let Some(buffer) = &self.buffer else {
            return &[];
        };
        let width = self.width as usize;
        self.peaks.get_or_insert_with(|| {
            debug!(width, frames = buffer.frames(), "Computing waveform peaks");
            compute_peaks(buffer, width)
        })
    }

    /// Produces the display list: a faint centre line and a polygon whose top edge follows
    /// the peaks left to right and whose bottom edge mirrors it right to left. The tallest
    /// peak touches the top and bottom of the surface.
    pub fn draw(&mut self) -> Vec<Shape> {
        if self.buffer.is_none() {
            return Vec::new();
        }

        let width = self.width as f32;
        let half_height = self.height as f32 / 2.0;
        let color = self.color;
        let peaks = self.peaks();

        let max_peak = peaks.iter().fold(0.0f32, |max, peak| max.max(*peak));
        let coef = if max_peak > 0.0 {
            half_height / max_peak
        } else {
            0.0
        };

        let mut points = Vec::with_capacity(peaks.len() * 2 + 1);
        points.push(Point::new(0.0, half_height));
        for (i, peak) in peaks.iter().enumerate() {
            points.push(Point::new(i as f32, half_height - peak * coef));
        }
        for (i, peak) in peaks.iter().enumerate().rev() {
            points.push(Point::new(i as f32, half_height + peak * coef));
        }

        vec![
            Shape::Line {
                from: Point::new(0.0, half_height),
                to: Point::new(width, half_height),
                color: Color::GUIDE,
                width: 1.0,
            },
            Shape::Polygon {
                points,
                fill: color,
            },
        ]
    }
}
