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

//! MIDI inputs that trigger pads. Devices only forward raw messages; turning notes into pads
//! is left to [`crate::mapping::NoteMap`].

use std::{error::Error, fmt, sync::Arc};

use tokio::sync::mpsc::Sender;

mod midir;
#[cfg(test)]
mod mock;

/// A MIDI input, such as a pad controller, whose notes can trigger pads.
pub trait Device: fmt::Display + std::marker::Send + std::marker::Sync {
    /// The port name, as listed by `midi-devices`.
    fn name(&self) -> String;

    /// Starts forwarding every incoming message to `sender` as raw bytes. Only one watcher
    /// can be attached at a time.
    fn watch_events(&self, sender: Sender<Vec<u8>>) -> Result<(), Box<dyn Error>>;

    /// Detaches the watcher. Its receiver sees the channel close once queued messages drain.
    fn stop_watch_events(&self);
}

/// Lists the MIDI inputs that could drive the pads.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    midir::list()
}

/// Opens the input whose port name contains `name`. Fails if no port or more than one port
/// matches.
pub fn get_device(name: &str) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    Ok(Arc::new(midir::get(name)?))
}
