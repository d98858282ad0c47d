//! [`AudioClip`]: interleaved PCM held in memory.
//!
//! Lengths are exposed in whole milliseconds, matching how snippet offsets
//! and targets are expressed. Internally everything is frame-indexed.

use super::resample::downmix_to_mono;

/// Interleaved `f32` samples in `[-1.0, 1.0]` plus their format.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClip {
    /// Wrap interleaved samples. A trailing partial frame is dropped and a
    /// zero rate or channel count is treated as one.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self {
            samples,
            sample_rate: sample_rate.max(1),
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in whole milliseconds (truncated).
    pub fn duration_ms(&self) -> u64 {
        (self.frames() as u64 * 1_000) / self.sample_rate as u64
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Frame index corresponding to `ms`, not clamped.
    pub fn ms_to_frames(&self, ms: u64) -> usize {
        ((ms as u128 * self.sample_rate as u128) / 1_000) as usize
    }

    /// `len_ms` starting at `start_ms`, clamped to the clip.
    pub fn slice_ms(&self, start_ms: u64, len_ms: u64) -> AudioClip {
        let frames = self.frames();
        let start = self.ms_to_frames(start_ms).min(frames);
        let end = start.saturating_add(self.ms_to_frames(len_ms)).min(frames);
        let ch = self.channels as usize;
        AudioClip {
            samples: self.samples[start * ch..end * ch].to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// The whole clip repeated `ceil(target / len)` times when shorter than
    /// `target_ms`; otherwise an unchanged copy.
    pub fn loop_to_length(&self, target_ms: u64) -> AudioClip {
        let frames = self.frames();
        let target_frames = self.ms_to_frames(target_ms);
        if frames == 0 || frames >= target_frames {
            return self.clone();
        }

        let times = target_frames.div_ceil(frames);
        log::debug!("looping {frames}-frame clip {times}x to reach {target_ms} ms");
        AudioClip {
            samples: self.samples.repeat(times),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Linear fade-in and fade-out of `fade_ms` each, clamped to the clip.
    pub fn apply_fades(&mut self, fade_ms: u64) {
        let frames = self.frames();
        let fade = self.ms_to_frames(fade_ms).min(frames);
        if fade == 0 {
            return;
        }

        let ch = self.channels as usize;
        for i in 0..fade {
            let gain = i as f32 / fade as f32;
            for s in &mut self.samples[i * ch..(i + 1) * ch] {
                *s *= gain;
            }
            let tail = frames - 1 - i;
            for s in &mut self.samples[tail * ch..(tail + 1) * ch] {
                *s *= gain;
            }
        }
    }

    /// Channel-averaged copy of the samples.
    pub fn to_mono(&self) -> Vec<f32> {
        downmix_to_mono(&self.samples, self.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, rate: u32, channels: u16) -> AudioClip {
        let samples = (0..frames * channels as usize)
            .map(|i| (i / channels as usize) as f32 / frames as f32)
            .collect();
        AudioClip::new(samples, rate, channels)
    }

    #[test]
    fn durations_follow_frames() {
        let clip = ramp(44_100, 44_100, 2);
        assert_eq!(clip.frames(), 44_100);
        assert_eq!(clip.duration_ms(), 1_000);
        assert!((clip.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn partial_frame_is_dropped() {
        let clip = AudioClip::new(vec![0.0; 5], 8_000, 2);
        assert_eq!(clip.frames(), 2);
        assert_eq!(clip.samples().len(), 4);
    }

    #[test]
    fn slice_is_clamped() {
        let clip = ramp(1_000, 1_000, 1);
        assert_eq!(clip.slice_ms(200, 300).frames(), 300);
        assert_eq!(clip.slice_ms(900, 300).frames(), 100);
        assert!(clip.slice_ms(5_000, 300).is_empty());
    }

    #[test]
    fn short_clip_loops_whole_times() {
        // 4 s clip, 15 s target: 4 repetitions, 16 s.
        let clip = ramp(4 * 8_000, 8_000, 1);
        let looped = clip.loop_to_length(15_000);
        assert_eq!(looped.frames(), 4 * clip.frames());
        assert_eq!(looped.duration_ms(), 16_000);
        assert_eq!(&looped.samples()[..clip.frames()], clip.samples());
    }

    #[test]
    fn long_or_empty_clip_is_not_looped() {
        let clip = ramp(20 * 100, 100, 1);
        assert_eq!(clip.loop_to_length(15_000), clip);

        let empty = AudioClip::new(Vec::new(), 100, 1);
        assert!(empty.loop_to_length(15_000).is_empty());
    }

    #[test]
    fn fades_ramp_edges_and_keep_middle() {
        let mut clip = AudioClip::new(vec![1.0; 2 * 1_000], 1_000, 2);
        clip.apply_fades(100);

        let s = clip.samples();
        assert_eq!(s[0], 0.0);
        assert_eq!(s[1], 0.0);
        assert!((s[2 * 50] - 0.5).abs() < 1e-6);
        assert_eq!(s[2 * 500], 1.0);
        assert_eq!(s[2 * 999], 0.0);
    }

    #[test]
    fn fade_longer_than_clip_is_clamped() {
        let mut clip = AudioClip::new(vec![1.0; 10], 1_000, 1);
        clip.apply_fades(500);
        assert!(clip.samples().iter().all(|s| s.is_finite() && *s <= 1.0));
        assert_eq!(clip.samples()[0], 0.0);
    }

    #[test]
    fn to_mono_averages_channels() {
        let clip = AudioClip::new(vec![1.0, 0.0, 0.5, 0.5], 10, 2);
        assert_eq!(clip.to_mono(), vec![0.5, 0.5]);
    }
}
