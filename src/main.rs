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
use clap::{crate_version, Parser, Subcommand};
use padsampler::audio::{self, Output};
use padsampler::config::{self, Preset};
use padsampler::controller::{self, Controller, Driver};
use padsampler::mapping::{KeyMap, NoteMap};
use padsampler::midi;
use padsampler::samples::{SampleLoader, SamplerEngine, Source, PAD_COUNT};
use padsampler::waveform;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A 16-pad sample player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will start the sampler.
    Start {
        /// The path to the player config.
        player_path: String,
        /// The preset to load. Defaults to the first preset.
        #[arg[short, long]]
        preset: Option<String>,
        /// An additional presets file.
        #[arg[long]]
        presets_file: Option<String>,
    },
    /// Decodes a sample and prints its waveform peaks, one per line.
    Peaks {
        /// A file path or http(s) URL.
        source: String,
        /// The number of peaks to compute.
        #[arg[short, long, default_value_t = 800]]
        width: usize,
    },
    /// Lists the presets in a player config.
    Presets {
        /// The path to the player config.
        player_path: String,
        /// An additional presets file.
        #[arg[long]]
        presets_file: Option<String>,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available MIDI input devices.
    MidiDevices {},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            player_path,
            preset,
            presets_file,
        } => {
            let player = config::Player::deserialize(Path::new(&player_path))?;
            let presets = all_presets(&player, presets_file.as_deref())?;

            let device = audio::cpal::Device::get(player.audio())?;
            let output = Arc::new(device.open(player.audio())?);
            info!(
                device = device.name(),
                sample_rate = output.sample_rate(),
                "Audio output open."
            );

            let engine = Arc::new(SamplerEngine::new(output.clone()));
            log_pad_events(&engine);

            let selected = match preset.as_deref() {
                Some(name) => Some(
                    presets
                        .iter()
                        .find(|preset| preset.name() == name)
                        .ok_or_else(|| format!("no preset named {}", name))?,
                ),
                None => presets.first(),
            };
            match selected {
                Some(preset) => {
                    let results = engine
                        .load_preset_with_progress(preset, |pad, percent| {
                            debug!(pad, percent, "Downloading.")
                        })
                        .await;
                    for (pad, result) in results {
                        if let Err(e) = result {
                            warn!(pad, err = %e, "Pad left empty.");
                        }
                    }
                }
                None => info!("No preset configured, starting with empty pads."),
            }

            let keys = KeyMap::default();
            for pad in 0..PAD_COUNT {
                if engine.is_loaded(pad) {
                    if let Some(key) = keys.pad_key(pad) {
                        println!("[{}] pad {} ({:.2}s)", key, pad + 1, engine.duration(pad));
                    }
                }
            }

            let mut drivers: Vec<Arc<dyn Driver>> =
                vec![Arc::new(controller::keyboard::Driver::new(keys))];
            match player.midi().device() {
                Some(name) => match midi::get_device(name) {
                    Ok(device) => drivers.push(controller::midi::Driver::new(
                        device,
                        NoteMap::new(player.midi().base_note()),
                    )),
                    Err(e) => warn!(device = name, err = e.as_ref(), "MIDI unavailable."),
                },
                None => info!("No MIDI device configured."),
            }

            Controller::new(engine, drivers).join().await?;
        }
        Commands::Peaks { source, width } => {
            let source = Source::parse(&source);
            let buffer = SampleLoader::new().load(&source, &mut |_| {}).await?;
            for peak in waveform::compute_peaks(&buffer, width) {
                println!("{:.6}", peak);
            }
        }
        Commands::Presets {
            player_path,
            presets_file,
        } => {
            let player = config::Player::deserialize(Path::new(&player_path))?;
            let presets = all_presets(&player, presets_file.as_deref())?;

            if presets.is_empty() {
                println!("No presets found.");
                return Ok(());
            }

            println!("Presets:");
            for preset in presets.iter() {
                println!("- {} ({} samples)", preset.name(), preset.samples().len());
                for (pad, sample) in preset.samples().iter().enumerate() {
                    let ignored = if pad < PAD_COUNT { "" } else { " (ignored)" };
                    println!("  {}. {}: {}{}", pad + 1, sample.name(), sample.url(), ignored);
                }
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
    }

    Ok(())
}

/// The player's presets followed by those in the presets file, if given.
fn all_presets(
    player: &config::Player,
    presets_file: Option<&str>,
) -> Result<Vec<Preset>, Box<dyn Error>> {
    let mut presets = player.presets().to_vec();
    if let Some(path) = presets_file {
        presets.extend(config::load_presets(&PathBuf::from(path))?);
    }
    Ok(presets)
}

/// Logs pad changes until the engine goes away.
fn log_pad_events(engine: &SamplerEngine) {
    let mut events = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(event = format!("{:?}", event), "Pad event."),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Missed pad events."),
                Err(RecvError::Closed) => return,
            }
        }
    });
}
