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

//! The pad sampler engine: pad slots, loading, trimming and playback.

use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::loader::{LoadError, SampleLoader, Source};
use super::pad::{Pad, Trim};
use super::voice::{Voice, VoiceManager};
use super::{PadEvent, PAD_COUNT};
use crate::audio::{AudioBuffer, Output, ScheduledVoice};
use crate::config::Preset;

/// Capacity of the pad event channel. Slow subscribers lose the oldest events.
const EVENT_CAPACITY: usize = 64;

/// The sampler engine owns the pad table and schedules pad playback on an output.
pub struct SamplerEngine {
    /// The pad slots.
    pads: RwLock<[Pad; PAD_COUNT]>,
    /// Voices that are currently sounding.
    voices: Arc<Mutex<VoiceManager>>,
    /// The output voices are scheduled on. Also the audio clock.
    output: Arc<dyn Output>,
    /// Fetches and decodes samples.
    loader: SampleLoader,
    /// Pad state notifications.
    events: broadcast::Sender<PadEvent>,
}

impl SamplerEngine {
    /// Creates a new engine with 16 empty pads.
    pub fn new(output: Arc<dyn Output>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            pads: RwLock::new(Default::default()),
            voices: Arc::new(Mutex::new(VoiceManager::new())),
            output,
            loader: SampleLoader::new(),
            events,
        }
    }

    /// Subscribes to pad state notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PadEvent> {
        self.events.subscribe()
    }

    /// Loads a sample into a pad.
    pub async fn load_sound(&self, pad: usize, uri: &str) -> Result<Arc<AudioBuffer>, LoadError> {
        self.load_sound_with_progress(pad, uri, |_| {}).await
    }

    /// Loads a sample into a pad, reporting download progress as a percentage.
    ///
    /// On success the pad's buffer is replaced and its trim reset. On failure the pad is
    /// left as it was.
    pub async fn load_sound_with_progress<F>(
        &self,
        pad: usize,
        uri: &str,
        mut on_progress: F,
    ) -> Result<Arc<AudioBuffer>, LoadError>
    where
        F: FnMut(f64) + Send,
    {
        if pad >= PAD_COUNT {
            return Err(LoadError::InvalidPadIndex(pad));
        }

        let source = Source::parse(uri);
        match self.loader.load(&source, &mut on_progress).await {
            Ok(buffer) => {
                let buffer = Arc::new(buffer);
                self.pads.write()[pad].load(buffer.clone());
                info!(pad, source = %source, duration = buffer.duration(), "Sound loaded");
                self.emit(PadEvent::Loaded {
                    pad,
                    duration: buffer.duration(),
                });
                Ok(buffer)
            }
            Err(e) => {
                error!(pad, err = %e, "Error loading sound");
                self.emit(PadEvent::LoadFailed {
                    pad,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Clears every pad, then loads the preset's samples into pads 0.. concurrently. Pads
    /// whose sample fails to load stay empty. Samples past the 16th are ignored.
    pub async fn load_preset(
        &self,
        preset: &Preset,
    ) -> Vec<(usize, Result<Arc<AudioBuffer>, LoadError>)> {
        self.load_preset_with_progress(preset, |_, _| {}).await
    }

    /// Like [`SamplerEngine::load_preset`], reporting each pad's download progress as
    /// `(pad, percent)`. Pads load concurrently, so reports for different pads interleave.
    pub async fn load_preset_with_progress<F>(
        &self,
        preset: &Preset,
        on_progress: F,
    ) -> Vec<(usize, Result<Arc<AudioBuffer>, LoadError>)>
    where
        F: Fn(usize, f64) + Sync,
    {
        info!(preset = preset.name(), samples = preset.samples().len(), "Loading preset");
        self.clear_all();

        let on_progress = &on_progress;
        let loads = preset
            .samples()
            .iter()
            .take(PAD_COUNT)
            .enumerate()
            .map(|(pad, sample)| async move {
                let result = self
                    .load_sound_with_progress(pad, sample.url(), move |percent| {
                        on_progress(pad, percent)
                    })
                    .await;
                (pad, result)
            });
        let results = join_all(loads).await;

        let loaded = results.iter().filter(|(_, result)| result.is_ok()).count();
        if loaded == results.len() {
            info!(preset = preset.name(), loaded, "Preset loaded");
        } else {
            warn!(
                preset = preset.name(),
                loaded,
                failed = results.len() - loaded,
                "Preset partially loaded"
            );
        }
        results
    }

    /// Sets a pad's trim window. Values are clamped to [0, 1] and put in order. Ignored for
    /// out of range pads.
    pub fn set_trim(&self, pad: usize, start: f64, end: f64) {
        let trim = {
            let mut pads = self.pads.write();
            let Some(slot) = pads.get_mut(pad) else {
                return;
            };
            slot.trim = Trim::new(start, end);
            slot.trim
        };
        debug!(pad, start = trim.start, end = trim.end, "Trim set");
        self.emit(PadEvent::TrimChanged { pad, trim });
    }

    /// Returns a pad's trim window. Out of range pads report the full window.
    pub fn trim(&self, pad: usize) -> Trim {
        self.pads
            .read()
            .get(pad)
            .map(|slot| slot.trim)
            .unwrap_or_default()
    }

    pub fn is_loaded(&self, pad: usize) -> bool {
        self.buffer(pad).is_some()
    }

    /// Returns the buffer loaded into a pad.
    pub fn buffer(&self, pad: usize) -> Option<Arc<AudioBuffer>> {
        self.pads.read().get(pad).and_then(|slot| slot.buffer.clone())
    }

    /// Returns the duration of a pad's buffer in seconds, or 0 if it's empty.
    pub fn duration(&self, pad: usize) -> f64 {
        self.pads.read().get(pad).map(Pad::duration).unwrap_or(0.0)
    }

    /// Returns how long the pad sounds with its current trim, in seconds.
    pub fn trimmed_duration(&self, pad: usize) -> f64 {
        self.pads
            .read()
            .get(pad)
            .map(|slot| slot.trim.width() * slot.duration())
            .unwrap_or(0.0)
    }

    /// Plays a pad's trim window, starting now. Returns None if the pad is empty.
    ///
    /// Every call produces an independent voice, so retriggering a pad layers a new voice
    /// over any that are still sounding.
    pub fn play_pad(&self, pad: usize) -> Option<Voice> {
        let snapshot = self
            .pads
            .read()
            .get(pad)
            .and_then(|slot| slot.buffer.clone().map(|buffer| (buffer, slot.trim)));
        let Some((buffer, trim)) = snapshot else {
            warn!(pad, "No sound loaded on pad");
            return None;
        };

        let duration = buffer.duration();
        let start_time = trim.start * duration;
        let play_duration = trim.width() * duration;

        let frames = buffer.frames();
        let start_frame = ((trim.start * frames as f64).round() as usize).min(frames);
        let end_frame = ((trim.end * frames as f64).round() as usize).clamp(start_frame, frames);

        let voice = Voice::new(
            pad,
            buffer.clone(),
            start_time,
            play_duration,
            self.output.current_time(),
        );
        let id = voice.id();
        self.voices.lock().add_voice(voice.clone());

        let voices = Arc::downgrade(&self.voices);
        let scheduled = ScheduledVoice {
            id,
            buffer,
            start_frame,
            frame_count: end_frame - start_frame,
            start_at: self.output.current_frame(),
            cancel_handle: voice.cancel_handle(),
            on_complete: Some(Box::new(move || {
                if let Some(voices) = voices.upgrade() {
                    voices.lock().remove_voice(id);
                }
            })),
        };

        if let Err(e) = self.output.schedule(scheduled) {
            error!(pad, err = e.as_ref(), "Unable to schedule voice");
            self.voices.lock().remove_voice(id);
            return None;
        }

        info!(
            pad,
            start = start_time,
            end = start_time + play_duration,
            "Playing pad"
        );
        self.emit(PadEvent::Played {
            pad,
            start: start_time,
            duration: play_duration,
        });
        Some(voice)
    }

    /// Stops every sounding voice. Returns how many were stopped.
    pub fn stop_all(&self) -> usize {
        let handles = self.voices.lock().clear();
        for handle in handles.iter() {
            handle.cancel();
        }
        info!(count = handles.len(), "All sounds stopped");
        handles.len()
    }

    /// Returns the number of voices currently sounding.
    pub fn active_voice_count(&self) -> usize {
        self.voices.lock().active_count()
    }

    /// Empties a pad and resets its trim. Voices already playing from the pad keep playing.
    pub fn clear_pad(&self, pad: usize) {
        {
            let mut pads = self.pads.write();
            let Some(slot) = pads.get_mut(pad) else {
                return;
            };
            slot.clear();
        }
        debug!(pad, "Pad cleared");
        self.emit(PadEvent::Cleared { pad });
    }

    /// Empties every pad.
    pub fn clear_all(&self) {
        for pad in 0..PAD_COUNT {
            self.clear_pad(pad);
        }
        info!("All pads cleared");
    }

    fn emit(&self, event: PadEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for SamplerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loaded = self
            .pads
            .read()
            .iter()
            .filter(|slot| slot.buffer.is_some())
            .count();
        f.debug_struct("SamplerEngine")
            .field("loaded_pads", &loaded)
            .field("active_voices", &self.active_voice_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioMixer;
    use crate::config::Sample;
    use crate::testutil;

    const RATE: u32 = 100;

    fn engine() -> (SamplerEngine, AudioMixer) {
        let mixer = AudioMixer::new(1, RATE);
        (SamplerEngine::new(Arc::new(mixer.clone())), mixer)
    }

    /// Writes a mono WAV of the given length and returns its file.
    fn wav(seconds: f64) -> tempfile::NamedTempFile {
        let frames = (seconds * RATE as f64) as usize;
        let samples: Vec<i16> = (0..frames).map(|i| (i as i16) * 10).collect();
        testutil::write_wav(&samples, 1, RATE)
    }

    fn path(file: &tempfile::NamedTempFile) -> String {
        file.path().to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_trim_scenario() {
        let (engine, _mixer) = engine();
        let file = wav(2.0);
        let buffer = engine.load_sound(0, &path(&file)).await.expect("load failed");
        assert_eq!(2.0, buffer.duration());
        assert!(engine.is_loaded(0));
        assert_eq!(Trim::default(), engine.trim(0));

        engine.set_trim(0, 0.9, 0.1);
        assert_eq!(Trim { start: 0.1, end: 0.9 }, engine.trim(0));
        assert!((engine.trimmed_duration(0) - 1.6).abs() < 1e-9);

        let voice = engine.play_pad(0).expect("no voice");
        assert_eq!(0, voice.pad());
        assert!((voice.start_time() - 0.2).abs() < 1e-9);
        assert!((voice.duration() - 1.6).abs() < 1e-9);
        assert!((voice.end_time() - 1.8).abs() < 1e-9);
        assert_eq!(1, engine.active_voice_count());
    }

    #[tokio::test]
    async fn test_play_renders_trimmed_window() {
        let (engine, mixer) = engine();
        let file = wav(1.0);
        engine.load_sound(0, &path(&file)).await.expect("load failed");
        engine.set_trim(0, 0.5, 0.6);

        engine.play_pad(0).expect("no voice");
        let output = mixer.process_frames(20);
        let expected: Vec<f32> = (50..60)
            .map(|i| crate::audio::decode::scale_s16((i as i16) * 10))
            .chain(std::iter::repeat(0.0).take(10))
            .collect();
        assert_eq!(expected, output);
    }

    #[tokio::test]
    async fn test_voice_removes_itself_on_completion() {
        let (engine, mixer) = engine();
        let file = wav(0.5);
        engine.load_sound(3, &path(&file)).await.expect("load failed");

        engine.play_pad(3).expect("no voice");
        engine.play_pad(3).expect("no voice");
        assert_eq!(2, engine.active_voice_count());

        mixer.process_frames(49);
        assert_eq!(2, engine.active_voice_count());
        mixer.process_frames(1);
        assert_eq!(0, engine.active_voice_count());
    }

    #[tokio::test]
    async fn test_stop_all() {
        let (engine, mixer) = engine();
        let file = wav(1.0);
        engine.load_sound(0, &path(&file)).await.expect("load failed");
        engine.load_sound(1, &path(&file)).await.expect("load failed");

        let voices: Vec<Voice> = [0, 1, 0, 1, 0]
            .iter()
            .filter_map(|pad| engine.play_pad(*pad))
            .collect();
        assert_eq!(5, engine.active_voice_count());

        assert_eq!(5, engine.stop_all());
        assert_eq!(0, engine.active_voice_count());
        assert!(voices.iter().all(Voice::is_stopped));

        // Stopping again is harmless.
        assert_eq!(0, engine.stop_all());
        assert_eq!(vec![0.0; 10], mixer.process_frames(10));
        assert_eq!(0, mixer.active_count());
    }

    #[tokio::test]
    async fn test_clear_does_not_stop_voices() {
        let (engine, mixer) = engine();
        let file = wav(1.0);
        engine.load_sound(0, &path(&file)).await.expect("load failed");
        engine.set_trim(0, 0.5, 1.0);

        let voice = engine.play_pad(0).expect("no voice");
        engine.clear_pad(0);
        assert!(!engine.is_loaded(0));
        assert_eq!(Trim::default(), engine.trim(0));
        assert_eq!(0.0, engine.duration(0));
        assert!(engine.play_pad(0).is_none());

        // The voice still plays from its own buffer.
        assert_eq!(1.0, voice.buffer().duration());
        let output = mixer.process_frames(10);
        assert!(output.iter().all(|sample| *sample != 0.0));
        assert_eq!(1, engine.active_voice_count());
    }

    #[test]
    fn test_unloaded_and_out_of_range_pads() {
        let (engine, _mixer) = engine();
        assert!(engine.play_pad(0).is_none());
        assert!(engine.play_pad(16).is_none());
        assert_eq!(0, engine.active_voice_count());

        engine.set_trim(16, 0.2, 0.4);
        engine.clear_pad(99);
        assert_eq!(Trim::default(), engine.trim(16));
        assert!(!engine.is_loaded(16));
        assert!(engine.buffer(16).is_none());
        assert_eq!(0.0, engine.duration(16));
        assert_eq!(0.0, engine.trimmed_duration(16));
        assert_eq!(0.0, engine.trimmed_duration(0));
    }

    #[tokio::test]
    async fn test_load_invalid_pad() {
        let (engine, _mixer) = engine();
        let file = wav(0.1);
        let result = engine.load_sound(16, &path(&file)).await;
        assert!(matches!(result, Err(LoadError::InvalidPadIndex(16))));
    }

    #[tokio::test]
    async fn test_failed_load_leaves_pad_untouched() {
        let (engine, _mixer) = engine();
        let file = wav(1.0);
        engine.load_sound(0, &path(&file)).await.expect("load failed");
        engine.set_trim(0, 0.25, 0.75);

        let url = testutil::serve_once("404 Not Found", Vec::new());
        let result = engine.load_sound(0, &url).await;
        assert!(matches!(result, Err(LoadError::Network { .. })));
        assert!(engine.is_loaded(0));
        assert_eq!(Trim { start: 0.25, end: 0.75 }, engine.trim(0));
    }

    #[tokio::test]
    async fn test_reload_resets_trim_and_reports_progress() {
        let (engine, _mixer) = engine();
        let first = wav(1.0);
        let second = wav(0.5);
        engine.load_sound(0, &path(&first)).await.expect("load failed");
        engine.set_trim(0, 0.25, 0.75);

        let mut reported = Vec::new();
        engine
            .load_sound_with_progress(0, &format!("file://{}", path(&second)), |percent| {
                reported.push(percent)
            })
            .await
            .expect("load failed");
        assert_eq!(Trim::default(), engine.trim(0));
        assert_eq!(0.5, engine.duration(0));
        assert_eq!(Some(&100.0), reported.last());
    }

    #[tokio::test]
    async fn test_events() {
        let (engine, _mixer) = engine();
        let mut events = engine.subscribe();
        let file = wav(1.0);

        engine.load_sound(2, &path(&file)).await.expect("load failed");
        engine.set_trim(2, 0.0, 0.5);
        engine.play_pad(2).expect("no voice");
        engine.clear_pad(2);
        let _ = engine.load_sound(2, "/nonexistent/kick.wav").await;

        assert_eq!(
            PadEvent::Loaded {
                pad: 2,
                duration: 1.0
            },
            events.recv().await.unwrap()
        );
        assert_eq!(
            PadEvent::TrimChanged {
                pad: 2,
                trim: Trim { start: 0.0, end: 0.5 }
            },
            events.recv().await.unwrap()
        );
        assert_eq!(
            PadEvent::Played {
                pad: 2,
                start: 0.0,
                duration: 0.5
            },
            events.recv().await.unwrap()
        );
        assert_eq!(PadEvent::Cleared { pad: 2 }, events.recv().await.unwrap());
        assert!(matches!(
            events.recv().await.unwrap(),
            PadEvent::LoadFailed { pad: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_load_preset_reports_progress_per_pad() {
        let (engine, _mixer) = engine();
        let file = wav(1.0);
        let preset = Preset::new(
            "Basic Drums",
            vec![
                Sample::new("Kick", &path(&file)),
                Sample::new("Snare", &format!("file://{}", path(&file))),
                Sample::new("Hat", &path(&file)),
            ],
        );

        let reported = parking_lot::Mutex::new(Vec::new());
        let results = engine
            .load_preset_with_progress(&preset, |pad, percent| {
                reported.lock().push((pad, percent))
            })
            .await;
        assert!(results.iter().all(|(_, result)| result.is_ok()));

        let reported = reported.into_inner();
        for pad in 0..3 {
            let percents: Vec<f64> = reported
                .iter()
                .filter(|(reported_pad, _)| *reported_pad == pad)
                .map(|(_, percent)| *percent)
                .collect();
            assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
            assert_eq!(Some(&100.0), percents.last(), "pad {} never finished", pad);
        }
        assert!(reported.iter().all(|(pad, _)| *pad < 3));
    }

    #[tokio::test]
    async fn test_concurrent_loads_to_one_pad() {
        let (engine, _mixer) = engine();
        let short = wav(0.5);
        let long = wav(1.0);
        engine.load_sound(0, &path(&long)).await.expect("load failed");
        engine.set_trim(0, 0.25, 0.75);

        let short_path = path(&short);
        let long_path = path(&long);
        let (first, second) = tokio::join!(
            engine.load_sound(0, &short_path),
            engine.load_sound(0, &long_path)
        );
        let first = first.expect("load failed");
        let second = second.expect("load failed");

        // Whichever load committed last owns the pad, with a fresh trim.
        let buffer = engine.buffer(0).expect("pad is empty");
        assert!(Arc::ptr_eq(&buffer, &first) || Arc::ptr_eq(&buffer, &second));
        assert_eq!(Trim::default(), engine.trim(0));
        assert_eq!(buffer.duration(), engine.duration(0));
    }

    #[tokio::test]
    async fn test_load_preset() {
        let (engine, _mixer) = engine();
        let file = wav(1.0);
        engine.load_sound(5, &path(&file)).await.expect("load failed");

        let preset = Preset::new(
            "Basic Drums",
            vec![
                Sample::new("Kick", &path(&file)),
                Sample::new("Missing", "/nonexistent/snare.wav"),
                Sample::new("Hat", &format!("file://{}", path(&file))),
            ],
        );
        let results = engine.load_preset(&preset).await;

        assert_eq!(3, results.len());
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_ok());
        assert!(engine.is_loaded(0));
        assert!(!engine.is_loaded(1));
        assert!(engine.is_loaded(2));
        // Pads outside the preset are cleared.
        assert!(!engine.is_loaded(5));
    }
}
