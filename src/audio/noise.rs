use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rodio::Source;
use std::time::Duration;

/// Flat-spectrum white noise, softened with a one-pole low-pass so it sits
/// under speech rather than on top of it.
pub struct WhiteNoise {
    sample_rate: u32,
    smoothed: f32,
    rng: StdRng,
}

impl WhiteNoise {
    pub fn new() -> Self {
        Self {
            sample_rate: 44100,
            smoothed: 0.0,
            rng: StdRng::from_entropy(),
        }
    }
}

impl Iterator for WhiteNoise {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let white: f32 = self.rng.gen_range(-1.0..1.0);
        self.smoothed += 0.6 * (white - self.smoothed);
        Some(self.smoothed * 0.2)
    }
}

impl Source for WhiteNoise {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
