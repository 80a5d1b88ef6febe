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
use std::path::Path;

use config::{Config, File};
use serde::Deserialize;

use super::error::ConfigError;

/// A named sample source.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Sample {
    name: String,
    url: String,
}

impl Sample {
    /// Creates a new sample entry.
    pub fn new(name: &str, url: &str) -> Sample {
        Sample {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    /// The display name of the sample.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the sample is fetched from: an http(s) URL, a file:// URI or a path.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// An ordered list of samples. Sample n is loaded into pad n.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Preset {
    name: String,
    #[serde(default)]
    samples: Vec<Sample>,
}

impl Preset {
    /// Creates a new preset.
    pub fn new(name: &str, samples: Vec<Sample>) -> Preset {
        Preset {
            name: name.to_string(),
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// A standalone presets file.
#[derive(Deserialize)]
struct Presets {
    #[serde(default)]
    presets: Vec<Preset>,
}

/// Parse presets from a YAML file containing a top level `presets` list.
pub fn load_presets(path: &Path) -> Result<Vec<Preset>, ConfigError> {
    Ok(Config::builder()
        .add_source(File::from(path))
        .build()?
        .try_deserialize::<Presets>()?
        .presets)
}
