use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rodio::Source;
use std::time::Duration;

/// Forest stream: low rumbling brown noise with an irregular gurgle.
pub struct ForestStream {
    sample_rate: u32,
    brown: f32,
    low_passed: f32,
    gurgle_phase: f32,
    gurgle_rate: f32,
    rng: StdRng,
}

impl ForestStream {
    pub fn new() -> Self {
        Self {
            sample_rate: 44100,
            brown: 0.0,
            low_passed: 0.0,
            gurgle_phase: 0.0,
            gurgle_rate: 1.5,
            rng: StdRng::from_entropy(),
        }
    }
}

impl Iterator for ForestStream {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let white: f32 = self.rng.gen_range(-1.0..1.0);
        self.brown = ((self.brown + white * 0.03) * 0.999).clamp(-1.0, 1.0);
        self.low_passed += 0.08 * (self.brown - self.low_passed);

        self.gurgle_phase += self.gurgle_rate / self.sample_rate as f32;
        if self.gurgle_phase > std::f32::consts::TAU {
            self.gurgle_phase -= std::f32::consts::TAU;
            // drift the rate a little every cycle so it never settles into a pulse
            self.gurgle_rate = (self.gurgle_rate + self.rng.gen_range(-0.4f32..0.4)).clamp(0.8, 3.0);
        }
        let gurgle = 0.8 + 0.2 * self.gurgle_phase.sin();

        Some((self.low_passed * 0.7 + self.brown * 0.3) * gurgle * 0.45)
    }
}

impl Source for ForestStream {
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
