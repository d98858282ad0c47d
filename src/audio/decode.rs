//! Format-sniffing decode into an [`AudioClip`] via `symphonia`.
//!
//! Anything symphonia's default registry can probe (WAV, MP3, FLAC, OGG,
//! AAC, ...) is accepted. The file extension, or one derived from a URL,
//! is only a hint.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{AudioClip, AudioError};

/// Decode the file at `path`.
pub fn decode_file(path: &Path) -> Result<AudioClip, AudioError> {
    let file = File::open(path)?;
    let ext = path.extension().and_then(|e| e.to_str());
    decode_source(Box::new(file), ext, &path.display().to_string())
}

/// Decode an in-memory encoded stream, e.g. a download body.
pub fn decode_bytes(bytes: Vec<u8>, ext_hint: Option<&str>) -> Result<AudioClip, AudioError> {
    decode_source(Box::new(Cursor::new(bytes)), ext_hint, "<memory>")
}

fn decode_source(
    source: Box<dyn MediaSource>,
    ext_hint: Option<&str>,
    label: &str,
) -> Result<AudioClip, AudioError> {
    let mss = MediaSourceStream::new(source, Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = ext_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::Decode(format!("probe failed for {label}: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode(format!("no audio track in {label}")))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("no decoder for {label}: {e}")))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AudioError::Decode(format!("packet read failed for {label}: {e}")))
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("skipping corrupt packet in {label}: {e}");
                continue;
            }
            Err(e) => return Err(AudioError::Decode(format!("decode failed for {label}: {e}"))),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count() as u16;
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if sample_rate == 0 || channels == 0 {
        return Err(AudioError::Decode(format!("unknown stream format in {label}")));
    }

    log::debug!(
        "decoded {label}: {} samples, {sample_rate}Hz, {channels}ch",
        samples.len()
    );
    Ok(AudioClip::new(samples, sample_rate, channels))
}
