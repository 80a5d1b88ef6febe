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

/// Euclidean distance between two points.
pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

/// Clamps a value into [min, max]. NaN collapses to min.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// Linear interpolation between start and end.
pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start + (end - start) * t
}

/// Converts a pixel position on a surface of the given width to seconds.
pub fn pixel_to_seconds(pixel_x: f32, width: f32, duration: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    (pixel_x as f64 / width as f64) * duration
}

/// Converts seconds to a pixel position on a surface of the given width.
pub fn seconds_to_pixel(seconds: f64, width: f32, duration: f64) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    ((seconds / duration) * width as f64) as f32
}

/// Outputs the given number of seconds in a MM:SS.mmm format.
pub fn format_time(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).floor() as u64;
    let minutes = total_millis / 60_000;
    let secs = (total_millis / 1000) % 60;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}.{:03}", minutes, secs, millis)
}

/// Outputs the given number of seconds as e.g. "1.25s".
pub fn format_time_simple(seconds: f64) -> String {
    format!("{:.2}s", seconds)
}
