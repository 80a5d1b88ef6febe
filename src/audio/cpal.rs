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
use std::{error::Error, fmt, sync::mpsc, thread, time::Duration};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use super::{AudioMixer, Output, ScheduledVoice};
use crate::{config, playsync::CancelHandle};

/// A small wrapper around a cpal::Device.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

impl Device {
    /// Lists cpal output devices across all available hosts.
    pub fn list() -> Result<Vec<Device>, Box<dyn Error>> {
        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_configs) = device.supported_output_configs() else {
                    continue;
                };
                let max_channels = output_configs
                    .map(|output_config| output_config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    devices.push(Device {
                        name: device.name()?,
                        max_channels,
                        host_id,
                        device,
                    })
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Gets the configured device, or the default output device of the default host.
    pub fn get(config: &config::Audio) -> Result<Device, Box<dyn Error>> {
        match config.device() {
            Some(name) => Device::list()?
                .into_iter()
                .find(|device| device.name.trim() == name)
                .ok_or_else(|| format!("no device found with name {}", name).into()),
            None => {
                let host = cpal::default_host();
                let device = host
                    .default_output_device()
                    .ok_or("no default output device")?;
                let max_channels = device.default_output_config()?.channels();
                Ok(Device {
                    name: device.name()?,
                    max_channels,
                    host_id: host.id(),
                    device,
                })
            }
        }
    }

    /// The name of the device.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens an output stream on the device. The stream renders the returned mixer until the
    /// stream is dropped.
    pub fn open(&self, config: &config::Audio) -> Result<OutputStream, Box<dyn Error>> {
        let num_channels = config.channels();
        if num_channels > self.max_channels {
            return Err(format!(
                "{} channels requested, audio device {} only has {}",
                num_channels, self.name, self.max_channels
            )
            .into());
        }

        let mixer = AudioMixer::new(num_channels, config.sample_rate());
        let sample_format = self.device.default_output_config()?.sample_format();
        let stream_config = cpal::StreamConfig {
            channels: num_channels,
            sample_rate: config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let stop = CancelHandle::new();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        // cpal streams are not Send on every platform, so the stream lives on its own thread.
        let device = self.device.clone();
        let thread_mixer = mixer.clone();
        let thread_stop = stop.clone();
        let thread = thread::spawn(move || {
            let stream = match build_stream(&device, &stream_config, sample_format, thread_mixer)
                .and_then(|stream| stream.play().map(|_| stream).map_err(|e| e.to_string()))
            {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            while !thread_stop.is_cancelled() {
                thread::sleep(Duration::from_millis(50));
            }
            drop(stream);
        });

        ready_rx
            .recv()
            .map_err(|_| "output thread exited before starting")??;

        info!(
            device = self.name,
            channels = num_channels,
            sample_rate = config.sample_rate(),
            format = sample_format.to_string(),
            "CPAL output stream started"
        );

        Ok(OutputStream {
            mixer,
            stop,
            thread: Some(thread),
        })
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    mixer: AudioMixer,
) -> Result<cpal::Stream, String> {
    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_output_stream(
            config,
            create_callback::<f32>(mixer),
            |err| error!("CPAL output stream error: {}", err),
            None,
        ),
        cpal::SampleFormat::I16 => device.build_output_stream(
            config,
            create_callback::<i16>(mixer),
            |err| error!("CPAL output stream error: {}", err),
            None,
        ),
        cpal::SampleFormat::I32 => device.build_output_stream(
            config,
            create_callback::<i32>(mixer),
            |err| error!("CPAL output stream error: {}", err),
            None,
        ),
        other => return Err(format!("unsupported sample format {}", other)),
    };
    stream.map_err(|e| e.to_string())
}

/// Mixes into a scratch buffer and converts into the device's sample type.
fn create_callback<T>(
    mixer: AudioMixer,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let num_channels = mixer.num_channels() as usize;
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        if scratch.len() != data.len() {
            scratch.resize(data.len(), 0.0);
        }
        mixer.process_into_output(&mut scratch, data.len() / num_channels);
        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src.clamp(-1.0, 1.0));
        }
    }
}

/// A running cpal output. Acts as the audio clock for the engine.
pub struct OutputStream {
    mixer: AudioMixer,
    stop: CancelHandle,
    thread: Option<thread::JoinHandle<()>>,
}

impl OutputStream {
    /// The mixer feeding the stream.
    pub fn mixer(&self) -> &AudioMixer {
        &self.mixer
    }
}

impl Output for OutputStream {
    fn sample_rate(&self) -> u32 {
        self.mixer.sample_rate()
    }

    fn current_frame(&self) -> u64 {
        self.mixer.current_frame()
    }

    fn schedule(&self, voice: ScheduledVoice) -> Result<(), Box<dyn Error>> {
        self.mixer.schedule(voice)
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        self.stop.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
