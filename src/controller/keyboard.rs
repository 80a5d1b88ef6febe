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
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;
use crate::mapping::KeyMap;

const STOP: &str = "stop";
const QUIT: &str = "quit";

/// A controller that triggers pads from lines typed on the terminal. Every mapped key in a
/// line triggers its pad.
#[derive(Default)]
pub struct Driver {
    keys: KeyMap,
}

impl Driver {
    pub fn new(keys: KeyMap) -> Driver {
        Driver { keys }
    }

    /// Reads and handles one line of input. Returns false once the input is exhausted or
    /// the user quits.
    fn monitor_io<R, W>(
        keys: &KeyMap,
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(writer, "Pads (1234/qwer/zxcv/asdf), {}, {}: ", STOP, QUIT)?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        let input = input.trim().to_lowercase();
        let events = match input.as_str() {
            STOP => vec![Event::StopAll],
            QUIT => vec![Event::Quit],
            _ => input
                .chars()
                .filter_map(|key| keys.pad_for_key(key))
                .map(Event::Trigger)
                .collect(),
        };

        if events.is_empty() && !input.is_empty() {
            warn!(input = input, "Unrecognized input");
        }
        let quit = events.contains(&Event::Quit);
        for event in events {
            events_tx.blocking_send(event).map_err(io::Error::other)?;
        }
        Ok(!quit)
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let keys = self.keys.clone();
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&keys, &events_tx, io::stdin().lock(), io::stdout())? {}

            info!("Keyboard driver stopped.");
            Ok(())
        })
    }
}
