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
use std::{
    io::{Cursor, Read, Write},
    net::TcpListener,
    thread,
    time::{Duration, SystemTime},
};

use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::NamedTempFile;

/// Wait for the given predicate to return true or fail.
#[inline]
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = SystemTime::now();
    let mut tick = Duration::from_millis(5);
    let timeout = Duration::from_secs(10);
    let max_tick = Duration::from_millis(100);

    loop {
        let elapsed = start.elapsed().expect("system time error");
        if elapsed > timeout {
            panic!("{}", error_msg);
        }
        if predicate() {
            return;
        }

        thread::sleep(tick);
        tick = std::cmp::min(tick * 2, max_tick);
    }
}

/// Encodes interleaved 16 bit samples as a WAV file in memory.
pub fn wav_bytes(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).expect("unable to create wav writer");
        for sample in samples {
            writer.write_sample(*sample).expect("unable to write sample");
        }
        writer.finalize().expect("unable to finalize wav");
    }
    cursor.into_inner()
}

/// Writes interleaved 16 bit samples to a temporary WAV file.
pub fn write_wav(samples: &[i16], channels: u16, sample_rate: u32) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".wav")
        .tempfile()
        .expect("unable to create temp file");
    file.write_all(&wav_bytes(samples, channels, sample_rate))
        .expect("unable to write wav");
    file.flush().expect("unable to flush wav");
    file
}

/// Serves a single HTTP response on a local port and returns the URL to fetch it from.
pub fn serve_once(status: &str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("unable to bind listener");
    let addr = listener.local_addr().expect("no local address");
    let status = status.to_string();

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };

        // Read the request head before answering.
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(read) => request.extend_from_slice(&buf[..read]),
            }
        }

        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: audio/wav\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
        let _ = stream.flush();
    });

    format!("http://{}/kick.wav", addr)
}

/// Returns a URL on a local port that nothing listens on.
pub fn unused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("unable to bind listener");
    let addr = listener.local_addr().expect("no local address");
    drop(listener);
    format!("http://{}/kick.wav", addr)
}
