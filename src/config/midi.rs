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

use crate::mapping::DEFAULT_BASE_NOTE;

/// A YAML representation of the MIDI input configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Midi {
    /// The MIDI input device. MIDI is disabled when omitted.
    device: Option<String>,

    /// The note that triggers pad 0.
    base_note: Option<u8>,
}

impl Midi {
    /// Creates a new MIDI configuration.
    pub fn new(device: &str, base_note: Option<u8>) -> Midi {
        Midi {
            device: Some(device.to_string()),
            base_note,
        }
    }

    /// Returns the MIDI input device, if any.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Returns the note that triggers pad 0 (default: 48, C3).
    pub fn base_note(&self) -> u8 {
        self.base_note.unwrap_or(DEFAULT_BASE_NOTE)
    }
}
