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
use std::{io, sync::Arc};

use tokio::{
    sync::mpsc::{self, Sender},
    task::JoinHandle,
};
use tracing::{debug, info, span, warn, Instrument, Level};

use super::Event;
use crate::{mapping::NoteMap, midi::Device};

/// A controller that triggers pads from MIDI notes.
pub struct Driver {
    /// The MIDI device.
    midi_device: Arc<dyn Device>,
    /// Note to pad mapping.
    notes: NoteMap,
}

impl Driver {
    pub fn new(midi_device: Arc<dyn Device>, notes: NoteMap) -> Arc<Self> {
        Arc::new(Driver { midi_device, notes })
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let (midi_events_tx, mut midi_events_rx) = mpsc::channel::<Vec<u8>>(10);
        let device = self.midi_device.clone();
        let notes = self.notes;

        let span = span!(Level::INFO, "MIDI driver");
        tokio::spawn(
            async move {
                info!(device = device.name(), "MIDI driver started.");

                // A missing or busy device leaves the other drivers running.
                if let Err(e) = device.watch_events(midi_events_tx) {
                    warn!(err = e.as_ref(), "MIDI unavailable.");
                    return Ok(());
                }

                loop {
                    let raw_event = match midi_events_rx.recv().await {
                        Some(raw_event) => raw_event,
                        None => {
                            info!("MIDI watcher closed.");
                            return Ok(());
                        }
                    };

                    let Some(pad) = notes.pad_for_message(&raw_event) else {
                        debug!(event = format!("{:?}", raw_event), "Ignoring MIDI event.");
                        continue;
                    };

                    if events_tx.send(Event::Trigger(pad)).await.is_err() {
                        info!("Controller closed, no longer watching MIDI.");
                        device.stop_watch_events();
                        return Ok(());
                    }
                }
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod test {
    use std::{io, sync::Arc};

    use tokio::sync::mpsc;

    use crate::{
        controller::{Driver as _, Event},
        mapping::NoteMap,
        midi::{self, Device as _},
    };

    #[tokio::test]
    async fn test_midi_driver() -> Result<(), io::Error> {
        let device = Arc::new(midi::test::Device::get("mock-midi-device"));
        let driver = super::Driver::new(device.clone(), NoteMap::new(36));

        let (events_tx, mut events_rx) = mpsc::channel(16);
        let handle = driver.monitor_events(events_tx);

        // Wait for the driver to start watching.
        while !device.mock_event(&[0x90, 36, 100]) {
            tokio::task::yield_now().await;
        }
        // Ignored: program change, note off, velocity zero, below the base note, junk.
        assert!(device.mock_event(&[0xC0, 27]));
        assert!(device.mock_event(&[0x80, 37, 100]));
        assert!(device.mock_event(&[0x90, 37, 0]));
        assert!(device.mock_event(&[0x90, 35, 100]));
        assert!(device.mock_event(&[1, 2, 3, 4, 5, 6, 7, 8]));
        assert!(device.mock_event(&[0x99, 53, 1]));

        assert_eq!(Some(Event::Trigger(0)), events_rx.recv().await);
        assert_eq!(Some(Event::Trigger(1)), events_rx.recv().await);

        // Closing the watcher ends the driver.
        device.stop_watch_events();
        assert!(handle.await.is_ok_and(|result| result.is_ok()));
        assert_eq!(None, events_rx.recv().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_midi_driver_device_busy() {
        let device = Arc::new(midi::test::Device::get("mock-midi-device"));
        let (held_tx, _held_rx) = mpsc::channel(1);
        device.watch_events(held_tx).expect("watch failed");

        let (events_tx, mut events_rx) = mpsc::channel(16);
        let handle = super::Driver::new(device, NoteMap::default()).monitor_events(events_tx);
        assert!(handle.await.is_ok_and(|result| result.is_ok()));
        assert_eq!(None, events_rx.recv().await);
    }
}
