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
use serde::Deserialize;

use super::error::ConfigError;
use crate::trimbar::{DEFAULT_MIN_DISTANCE, DEFAULT_THRESHOLD};

const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_HEIGHT: u32 = 200;

/// The waveform surface: its size in pixels and the trim handle tuning.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Surface {
    width: Option<u32>,
    height: Option<u32>,
    /// Minimum pixel gap between the trim handles.
    min_distance: Option<f32>,
    /// Grab radius around a handle's grip.
    threshold: Option<f32>,
}

impl Surface {
    pub fn width(&self) -> u32 {
        self.width.unwrap_or(DEFAULT_WIDTH)
    }

    pub fn height(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_HEIGHT)
    }

    pub fn min_distance(&self) -> f32 {
        self.min_distance.unwrap_or(DEFAULT_MIN_DISTANCE)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold.unwrap_or(DEFAULT_THRESHOLD)
    }

    /// Checks that the handles fit on the surface.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width() == 0 || self.height() == 0 {
            return Err(ConfigError::Invalid(format!(
                "surface must have a non-zero size, got {}x{}",
                self.width(),
                self.height()
            )));
        }
        if self.min_distance() < 0.0 || self.min_distance() >= self.width() as f32 {
            return Err(ConfigError::Invalid(format!(
                "min_distance {} must be in [0, {})",
                self.min_distance(),
                self.width()
            )));
        }
        if self.threshold() < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "threshold {} must not be negative",
                self.threshold()
            )));
        }
        Ok(())
    }
}
