//! Audio container decoding
//!
//! Normalizes WAV/MP3/FLAC/OGG containers to the mono PCM the engine
//! expects: symphonia decodes to interleaved 16-bit samples and the
//! channels are down-mixed by averaging. The sample rate must already
//! match the engine's configured rate; this boundary never resamples.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use waveprint_engine::{EngineError, Signal};

use crate::error::{RecognizerError, RecognizerResult};

/// Decode an audio file into a mono signal at the required sample rate.
pub fn decode_file(path: &Path, sample_rate: u32) -> RecognizerResult<Signal> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| RecognizerError::decode(path, e.to_string()))?;
    let mut format = probed.format;

    let (track_id, codec_params) = {
        let track = format
            .default_track()
            .ok_or_else(|| RecognizerError::decode(path, "no default audio track"))?;
        (track.id, track.codec_params.clone())
    };

    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| RecognizerError::decode(path, "unknown sample rate"))?;
    if source_rate != sample_rate {
        return Err(EngineError::sample_rate_mismatch(sample_rate, source_rate).into());
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| RecognizerError::decode(path, e.to_string()))?;

    let mut sample_buf: Option<SampleBuffer<i16>> = None;
    let mut interleaved = Vec::<i16>::new();
    let mut channels = 1u16;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(RecognizerError::decode(path, err.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Recoverable per the symphonia contract: skip the packet.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(err) => return Err(RecognizerError::decode(path, err.to_string())),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count() as u16;

        if sample_buf
            .as_ref()
            .map(|b| b.capacity() < decoded.capacity())
            .unwrap_or(true)
        {
            sample_buf = Some(SampleBuffer::<i16>::new(decoded.capacity() as u64, spec));
        }
        let buf = sample_buf.as_mut().expect("sample buffer initialized");

        buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buf.samples());
    }

    tracing::debug!(
        path = %path.display(),
        channels,
        samples = interleaved.len(),
        "decoded audio container"
    );

    Ok(Signal::downmix(&interleaved, channels.max(1), sample_rate))
}
