//! 16-bit PCM WAV output via `hound`.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::{AudioClip, AudioError};

fn spec_for(clip: &AudioClip) -> WavSpec {
    WavSpec {
        channels: clip.channels(),
        sample_rate: clip.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Write `clip` to `path`, creating parent directories.
pub fn write_wav(path: &Path, clip: &AudioClip) -> Result<(), AudioError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = WavWriter::create(path, spec_for(clip))?;
    for &s in clip.samples() {
        writer.write_sample(to_i16(s))?;
    }
    writer.finalize()?;
    Ok(())
}

/// Encode `clip` as a WAV byte stream.
pub fn encode_wav(clip: &AudioClip) -> Result<Vec<u8>, AudioError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec_for(clip))?;
        for &s in clip.samples() {
            writer.write_sample(to_i16(s))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_file_has_pcm16_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.wav");
        let clip = AudioClip::new(vec![0.0, 0.5, -0.5, 1.0], 22_050, 2);

        write_wav(&path, &clip).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        let samples: Vec<i16> = reader.into_samples().map(Result::unwrap).collect();
        assert_eq!(samples, vec![0, 16_384, -16_384, i16::MAX]);
    }

    #[test]
    fn out_of_range_samples_are_clipped() {
        assert_eq!(to_i16(3.0), i16::MAX);
        assert_eq!(to_i16(-3.0), -i16::MAX);
    }
}
