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

//! In-memory decoding of fetched audio bytes (WAV, MP3, OGG, FLAC, ...) using symphonia.

use std::io::Cursor;

use symphonia::core::audio::{AudioBuffer as DecodedBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

use super::AudioBuffer;

/// Error types for decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Audio decode error: {0}")]
    Audio(#[from] SymphoniaError),

    #[error("No audio track found")]
    NoAudioTrack,

    #[error("Sample rate not specified")]
    UnknownSampleRate,

    #[error("No audio frames could be decoded")]
    NoFrames,
}

/// Decodes a complete encoded file held in memory. The extension, if known, helps the probe
/// pick the right format reader.
pub fn decode(bytes: Vec<u8>, extension: Option<&str>) -> Result<AudioBuffer, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params.sample_rate.ok_or(DecodeError::UnknownSampleRate)?;

    let mut decoder = get_codecs().make(&params, &DecoderOptions::default())?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_decoded(decoded, &mut channels),
            Err(SymphoniaError::DecodeError(e)) => {
                // A corrupt packet in an otherwise good stream is skipped.
                warn!(error = e, "Skipping undecodable packet");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let buffer = AudioBuffer::new(channels, sample_rate);
    if buffer.frames() == 0 {
        return Err(DecodeError::NoFrames);
    }

    debug!(
        channels = buffer.channel_count(),
        sample_rate,
        frames = buffer.frames(),
        "Decoded audio"
    );
    Ok(buffer)
}

/// Appends a decoded packet to the planar channel storage, scaling every format to f32.
fn append_decoded(decoded: AudioBufferRef, channels: &mut Vec<Vec<f32>>) {
    match decoded {
        AudioBufferRef::F32(buf) => append_planar(&buf, channels, |sample| sample),
        AudioBufferRef::F64(buf) => append_planar(&buf, channels, |sample| sample as f32),
        AudioBufferRef::S8(buf) => append_planar(&buf, channels, scale_s8),
        AudioBufferRef::S16(buf) => append_planar(&buf, channels, scale_s16),
        AudioBufferRef::S24(buf) => {
            append_planar(&buf, channels, |sample| scale_s24(sample.inner()))
        }
        AudioBufferRef::S32(buf) => append_planar(&buf, channels, scale_s32),
        AudioBufferRef::U8(buf) => append_planar(&buf, channels, scale_u8),
        AudioBufferRef::U16(buf) => append_planar(&buf, channels, scale_u16),
        AudioBufferRef::U24(buf) => {
            append_planar(&buf, channels, |sample| scale_u24(sample.inner()))
        }
        AudioBufferRef::U32(buf) => append_planar(&buf, channels, scale_u32),
    }
}

fn append_planar<T, F>(buf: &DecodedBuffer<T>, channels: &mut Vec<Vec<f32>>, convert: F)
where
    T: symphonia::core::sample::Sample,
    F: Fn(T) -> f32,
{
    let count = buf.spec().channels.count();
    if channels.len() < count {
        channels.resize_with(count, Vec::new);
    }
    for (channel, plane) in channels.iter_mut().zip(buf.planes().planes().iter()) {
        channel.extend(plane.iter().map(|sample| convert(*sample)));
    }
}

#[inline]
pub(crate) fn scale_s8(sample: i8) -> f32 {
    sample as f32 / (1i64 << 7) as f32
}

#[inline]
pub(crate) fn scale_s16(sample: i16) -> f32 {
    sample as f32 / (1i64 << 15) as f32
}

#[inline]
pub(crate) fn scale_s24(sample: i32) -> f32 {
    sample as f32 / (1i64 << 23) as f32
}

#[inline]
pub(crate) fn scale_s32(sample: i32) -> f32 {
    sample as f32 / (1i64 << 31) as f32
}

#[inline]
pub(crate) fn scale_u8(sample: u8) -> f32 {
    (sample as f32 / u8::MAX as f32) * 2.0 - 1.0
}

#[inline]
pub(crate) fn scale_u16(sample: u16) -> f32 {
    (sample as f32 / u16::MAX as f32) * 2.0 - 1.0
}

#[inline]
pub(crate) fn scale_u24(sample: u32) -> f32 {
    let max = (1u32 << 24) - 1;
    (sample as f32 / max as f32) * 2.0 - 1.0
}

#[inline]
pub(crate) fn scale_u32(sample: u32) -> f32 {
    (sample as f32 / u32::MAX as f32) * 2.0 - 1.0
}
