//! Loudest-window search.
//!
//! Window energies come from a prefix sum of squared samples, so each
//! candidate costs O(1) and the scan is a single pass over the signal.

/// Candidate windows start every 50 ms.
pub const HOP_MS: u64 = 50;

/// Start (in ms) of the `window_ms` window of `signal` with the greatest
/// RMS, scanning at [`HOP_MS`]. The first of equal maxima wins.
///
/// Returns 0 when the window does not fit strictly inside the signal.
pub fn loudest_window_ms(signal: &[f32], sample_rate: u32, window_ms: u64) -> u64 {
    let rate = sample_rate.max(1) as u64;
    let window = (window_ms * rate / 1_000) as usize;
    let hop = ((HOP_MS * rate / 1_000) as usize).max(1);
    if window == 0 || window >= signal.len() {
        return 0;
    }

    let mut prefix = Vec::with_capacity(signal.len() + 1);
    prefix.push(0.0_f64);
    let mut acc = 0.0_f64;
    for &s in signal {
        acc += s as f64 * s as f64;
        prefix.push(acc);
    }

    let mut best_start = 0usize;
    let mut best_energy = f64::NEG_INFINITY;
    for start in (0..=signal.len() - window).step_by(hop) {
        let energy = prefix[start + window] - prefix[start];
        if energy > best_energy {
            best_energy = energy;
            best_start = start;
        }
    }

    log::debug!(
        "loudest {window_ms} ms window starts at sample {best_start} (rms {:.4})",
        (best_energy / window as f64).max(0.0).sqrt()
    );
    best_start as u64 * 1_000 / rate
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22_050;

    #[test]
    fn finds_burst_in_quiet_track() {
        // Two minutes of low noise with a loud 15 s section at 60 s.
        let len = 120 * SR as usize;
        let mut signal: Vec<f32> = (0..len).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();
        let burst_start = 60 * SR as usize;
        for s in &mut signal[burst_start..burst_start + 15 * SR as usize] {
            *s *= 50.0;
        }

        let start_ms = loudest_window_ms(&signal, SR, 15_000);

        // The chosen window must overlap the burst almost entirely.
        assert!(start_ms.abs_diff(60_000) <= HOP_MS, "start {start_ms}");
    }

    #[test]
    fn ties_pick_first_window() {
        let signal = vec![0.5_f32; 30 * SR as usize];
        assert_eq!(loudest_window_ms(&signal, SR, 15_000), 0);
    }

    #[test]
    fn window_not_fitting_returns_zero() {
        let signal = vec![0.5_f32; 15 * SR as usize];
        assert_eq!(loudest_window_ms(&signal, SR, 15_000), 0);
        assert_eq!(loudest_window_ms(&[], SR, 15_000), 0);
    }

    #[test]
    fn loud_tail_is_reachable() {
        let mut signal = vec![0.0_f32; 20 * SR as usize];
        let tail = signal.len() - SR as usize;
        for s in &mut signal[tail..] {
            *s = 1.0;
        }
        let start_ms = loudest_window_ms(&signal, SR, 15_000);
        // Energy grows with the start offset; the last candidate on the
        // 50 ms grid is just under 5 s.
        assert!(start_ms > 4_900 && start_ms <= 5_000, "start {start_ms}");
    }
}
