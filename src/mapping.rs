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

//! Lookup tables from raw input to pad indices.

use midly::live::LiveEvent;
use midly::MidiMessage;

use crate::samples::PAD_COUNT;

/// The note that triggers pad 0 by default (C3).
pub const DEFAULT_BASE_NOTE: u8 = 48;

/// Keyboard layout, four rows of four keys. Key n triggers pad n.
const KEY_LAYOUT: [char; PAD_COUNT] = [
    '1', '2', '3', '4', //
    'q', 'w', 'e', 'r', //
    'z', 'x', 'c', 'v', //
    'a', 's', 'd', 'f', //
];

/// Maps keyboard characters to pads.
#[derive(Clone, Debug)]
pub struct KeyMap {
    keys: [char; PAD_COUNT],
}

impl Default for KeyMap {
    fn default() -> Self {
        KeyMap { keys: KEY_LAYOUT }
    }
}

impl KeyMap {
    /// Returns the pad triggered by a key. Letters match regardless of case.
    pub fn pad_for_key(&self, key: char) -> Option<usize> {
        let key = key.to_ascii_lowercase();
        self.keys.iter().position(|mapped| *mapped == key)
    }

    /// Returns the key label for a pad, for display.
    pub fn pad_key(&self, pad: usize) -> Option<char> {
        self.keys.get(pad).map(char::to_ascii_uppercase)
    }
}

/// Maps MIDI notes to pads. Notes from `base_note` upwards wrap around the 16 pads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteMap {
    base_note: u8,
}

impl Default for NoteMap {
    fn default() -> Self {
        NoteMap::new(DEFAULT_BASE_NOTE)
    }
}

impl NoteMap {
    pub fn new(base_note: u8) -> NoteMap {
        NoteMap { base_note }
    }

    pub fn base_note(&self) -> u8 {
        self.base_note
    }

    /// Returns the pad for a note. Notes below the base note don't map to a pad.
    pub fn pad_for_note(&self, note: u8) -> Option<usize> {
        note.checked_sub(self.base_note)
            .map(|offset| offset as usize % PAD_COUNT)
    }

    /// Returns the pad triggered by a raw MIDI message. Only three byte Note On messages
    /// with a non-zero velocity trigger pads.
    pub fn pad_for_message(&self, message: &[u8]) -> Option<usize> {
        if message.len() != 3 {
            return None;
        }
        match LiveEvent::parse(message) {
            Ok(LiveEvent::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            }) if vel.as_int() > 0 => self.pad_for_note(key.as_int()),
            _ => None,
        }
    }
}
