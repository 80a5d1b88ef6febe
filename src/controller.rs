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
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{error, info, span, Instrument, Level};

use crate::samples::SamplerEngine;

pub mod keyboard;
pub mod midi;

/// Number of events that can queue up before drivers block.
const EVENT_CAPACITY: usize = 16;

/// Controller events that will trigger behavior in the sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Plays the given pad.
    Trigger(usize),

    /// Stops every sounding voice.
    StopAll,

    /// Stops the controller.
    Quit,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Routes driver events to the sampler engine.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller that listens to all of the given drivers.
    pub fn new(engine: Arc<SamplerEngine>, drivers: Vec<Arc<dyn Driver>>) -> Controller {
        let span = span!(Level::INFO, "controller");
        Controller {
            handle: tokio::spawn(Controller::trigger_events(engine, drivers).instrument(span)),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Triggers engine behavior by watching the drivers and getting events from them. Stops
    /// on a quit event or once every driver has closed.
    async fn trigger_events(engine: Arc<SamplerEngine>, drivers: Vec<Arc<dyn Driver>>) {
        let (events_tx, mut events_rx) = mpsc::channel(EVENT_CAPACITY);
        let join_handles = drivers
            .iter()
            .map(|driver| driver.monitor_events(events_tx.clone()))
            .collect::<Vec<_>>();
        drop(events_tx);

        info!(drivers = drivers.len(), "Controller started.");

        while let Some(event) = events_rx.recv().await {
            info!(event = format!("{:?}", event), "Received event.");

            match event {
                Event::Trigger(pad) => {
                    engine.play_pad(pad);
                }
                Event::StopAll => {
                    let stopped = engine.stop_all();
                    info!(stopped, "Stopped all voices.");
                }
                Event::Quit => {
                    info!("Controller quitting.");
                    // Drivers blocked on input may never return.
                    join_handles.iter().for_each(JoinHandle::abort);
                    return;
                }
            }
        }

        info!("Controller closing.");
        for join_handle in join_handles {
            match join_handle.await {
                Ok(Err(e)) => error!(err = %e, "Driver failed."),
                Err(e) => error!(err = %e, "Error waiting for driver to stop."),
                Ok(Ok(())) => {}
            }
        }
    }
}
