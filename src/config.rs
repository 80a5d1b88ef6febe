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

mod audio;
mod error;
mod midi;
mod preset;
mod surface;

pub use self::audio::Audio;
pub use self::error::ConfigError;
pub use self::midi::Midi;
pub use self::preset::{load_presets, Preset, Sample};
pub use self::surface::Surface;

/// The configuration for the sampler. Every section is optional.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Player {
    #[serde(default)]
    audio: Audio,

    #[serde(default)]
    midi: Midi,

    #[serde(default)]
    surface: Surface,

    #[serde(default)]
    presets: Vec<Preset>,
}

impl Player {
    /// Parse and validate a player configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Player, ConfigError> {
        let player = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Player>()?;
        player.surface.validate()?;
        Ok(player)
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn midi(&self) -> &Midi {
        &self.midi
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use config::FileFormat;

    use super::*;

    fn player_from_str(yaml: &str) -> Player {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_player_defaults() {
        let player = player_from_str("{}");
        assert_eq!(None, player.audio().device());
        assert_eq!(44100, player.audio().sample_rate());
        assert_eq!(2, player.audio().channels());
        assert_eq!(None, player.midi().device());
        assert_eq!(48, player.midi().base_note());
        assert_eq!(800, player.surface().width());
        assert_eq!(200, player.surface().height());
        assert_eq!(20.0, player.surface().min_distance());
        assert_eq!(15.0, player.surface().threshold());
        assert!(player.presets().is_empty());
    }

    #[test]
    fn test_player_full() {
        let player = player_from_str(
            r#"
            audio:
              device: mock-device
              sample_rate: 48000
              channels: 1
            midi:
              device: nanoPAD
              base_note: 36
            surface:
              width: 400
              threshold: 10
            presets:
              - name: Basic Drums
                samples:
                  - name: Kick
                    url: https://example.org/kick.wav
              - name: Hip-Hop
                samples:
                  - name: Clap
                    url: file:///tmp/clap.wav
        "#,
        );

        assert_eq!(Some("mock-device"), player.audio().device());
        assert_eq!(48000, player.audio().sample_rate());
        assert_eq!(1, player.audio().channels());
        assert_eq!(Some("nanoPAD"), player.midi().device());
        assert_eq!(36, player.midi().base_note());
        assert_eq!(400, player.surface().width());
        assert_eq!(10.0, player.surface().threshold());
        assert_eq!(20.0, player.surface().min_distance());

        assert_eq!(2, player.presets().len());
        assert_eq!("Basic Drums", player.presets()[0].name());
        let preset = &player.presets()[1];
        assert_eq!("Hip-Hop", preset.name());
        assert_eq!("Clap", preset.samples()[0].name());
        assert_eq!("file:///tmp/clap.wav", preset.samples()[0].url());
    }

    #[test]
    fn test_player_deserialize_validates_surface() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("unable to create temp file");
        writeln!(file, "surface:\n  width: 0").expect("unable to write config");

        let result = Player::deserialize(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_player_deserialize_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".yml")
            .tempfile()
            .expect("unable to create temp file");
        writeln!(file, "audio:\n  sample_rate: 22050").expect("unable to write config");

        let player = Player::deserialize(file.path()).expect("unable to parse config");
        assert_eq!(22050, player.audio().sample_rate());
        assert_eq!(800, player.surface().width());
    }
}
