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
use std::sync::Arc;

use tracing::debug;

use crate::config;
use crate::draw::Shape;
use crate::samples::SamplerEngine;
use crate::trimbar::{Side, TrimBars};
use crate::util;
use crate::waveform::WaveformDrawer;

/// Edits the trim of one pad at a time: shows its waveform under a pair of trim bars and
/// writes handle drags back to the engine.
pub struct PadEditor {
    engine: Arc<SamplerEngine>,
    waveform: WaveformDrawer,
    trim_bars: TrimBars,
    selected: Option<usize>,
}

impl PadEditor {
    pub fn new(engine: Arc<SamplerEngine>, surface: &config::Surface) -> PadEditor {
        let width = surface.width();
        PadEditor {
            engine,
            waveform: WaveformDrawer::new(width, surface.height()),
            trim_bars: TrimBars::new(width as f32, 0.0, width as f32)
                .with_min_distance(surface.min_distance())
                .with_threshold(surface.threshold()),
            selected: None,
        }
    }

    /// Shows a pad. Returns false if the pad is empty, in which case there's no waveform to
    /// show.
    pub fn select_pad(&mut self, pad: usize) -> bool {
        let buffer = self.engine.buffer(pad);
        let loaded = buffer.is_some();
        let trim = self.engine.trim(pad);

        self.waveform.set_buffer(buffer);
        self.trim_bars.pointer_up();
        self.trim_bars.set_normalized(trim.start, trim.end);
        self.selected = Some(pad);
        debug!(pad, loaded, "Pad selected");
        loaded
    }

    /// Re-reads the selected pad from the engine, e.g. after it was reloaded.
    pub fn refresh(&mut self) {
        if let Some(pad) = self.selected {
            self.select_pad(pad);
        }
    }

    pub fn selected_pad(&self) -> Option<usize> {
        self.selected
    }

    pub fn trim_bars(&self) -> &TrimBars {
        &self.trim_bars
    }

    pub fn pointer_hover(&mut self, x: f32, y: f32) {
        self.trim_bars.pointer_hover(x, y);
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> Option<Side> {
        self.trim_bars.pointer_down(x, y)
    }

    /// Moves the dragged handle and writes the new trim to the engine.
    pub fn pointer_move(&mut self, x: f32) -> bool {
        let moved = self.trim_bars.pointer_move(x);
        if moved {
            self.commit();
        }
        moved
    }

    pub fn pointer_up(&mut self) {
        let was_dragging = self.trim_bars.is_dragging();
        self.trim_bars.pointer_up();
        if was_dragging {
            self.commit();
        }
    }

    pub fn pointer_leave(&mut self) {
        let was_dragging = self.trim_bars.is_dragging();
        self.trim_bars.pointer_leave();
        if was_dragging {
            self.commit();
        }
    }

    /// Describes the selected trim window, e.g. "00:00.200 - 00:01.800 (1.60s)".
    pub fn trim_summary(&self) -> Option<String> {
        let pad = self.selected?;
        if !self.engine.is_loaded(pad) {
            return None;
        }
        let trim = self.engine.trim(pad);
        let duration = self.engine.duration(pad);
        Some(format!(
            "{} - {} ({})",
            util::format_time(util::lerp(0.0, duration, trim.start)),
            util::format_time(util::lerp(0.0, duration, trim.end)),
            util::format_time_simple(self.engine.trimmed_duration(pad))
        ))
    }

    /// Seconds into the selected pad's sample under a surface x position.
    pub fn time_at(&self, x: f32) -> f64 {
        util::pixel_to_seconds(x, self.trim_bars.width(), self.waveform.duration())
    }

    /// Surface x position of a time in the selected pad's sample, e.g. for a playhead.
    pub fn x_at(&self, seconds: f64) -> f32 {
        util::seconds_to_pixel(seconds, self.trim_bars.width(), self.waveform.duration())
    }

    /// The waveform followed by the trim bar overlay.
    pub fn draw(&mut self) -> Vec<Shape> {
        let mut shapes = self.waveform.draw();
        shapes.extend(self.trim_bars.draw(self.waveform.height() as f32));
        shapes
    }

    fn commit(&self) {
        if let Some(pad) = self.selected {
            let trim = self.trim_bars.normalized();
            self.engine.set_trim(pad, trim.start, trim.end);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::audio::AudioMixer;
    use crate::samples::Trim;
    use crate::testutil;

    async fn editor() -> (PadEditor, Arc<SamplerEngine>, tempfile::NamedTempFile) {
        let engine = Arc::new(SamplerEngine::new(Arc::new(AudioMixer::new(1, 100))));
        let file = testutil::write_wav(&[1000; 200], 1, 100);
        engine
            .load_sound(0, &file.path().to_string_lossy())
            .await
            .expect("load failed");
        let editor = PadEditor::new(engine.clone(), &config::Surface::default());
        (editor, engine, file)
    }

    #[tokio::test]
    async fn test_drag_updates_engine_trim() {
        let (mut editor, engine, _file) = editor().await;
        assert!(editor.select_pad(0));
        assert_eq!(800.0, editor.trim_bars().right().x());

        assert!(editor.pointer_down(0.0, 7.5).is_some());
        assert!(editor.pointer_move(200.0));
        assert_eq!(Trim { start: 0.25, end: 1.0 }, engine.trim(0));

        editor.pointer_up();
        assert!(editor.pointer_down(800.0, 7.5).is_some());
        editor.pointer_move(600.0);
        editor.pointer_leave();
        assert_eq!(Trim { start: 0.25, end: 0.75 }, engine.trim(0));
        assert_eq!(
            Some("00:00.500 - 00:01.500 (1.00s)".to_string()),
            editor.trim_summary()
        );
        assert_eq!(1.5, editor.time_at(600.0));
        assert_eq!(200.0, editor.x_at(0.5));
    }

    #[tokio::test]
    async fn test_select_pad_reads_trim() {
        let (mut editor, engine, _file) = editor().await;
        engine.set_trim(0, 0.5, 0.75);
        editor.select_pad(0);
        assert_eq!(400.0, editor.trim_bars().left().x());
        assert_eq!(600.0, editor.trim_bars().right().x());

        // Hovering and clicking without dragging leaves the engine alone.
        editor.pointer_hover(400.0, 7.5);
        editor.pointer_up();
        assert_eq!(Trim { start: 0.5, end: 0.75 }, engine.trim(0));
    }

    #[tokio::test]
    async fn test_empty_pad() {
        let (mut editor, engine, _file) = editor().await;
        assert!(!editor.select_pad(1));
        assert_eq!(None, editor.trim_summary());
        // Only the trim bar overlay is drawn.
        assert_eq!(6, editor.draw().len());

        assert!(editor.select_pad(0));
        assert_eq!(8, editor.draw().len());

        engine.clear_pad(0);
        editor.refresh();
        assert_eq!(6, editor.draw().len());
    }
}
