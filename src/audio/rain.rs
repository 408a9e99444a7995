use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rodio::Source;
use std::time::Duration;

/// Steady rainfall: band-passed brown noise for the wash plus sparse decaying
/// clicks for individual drops.
pub struct RainSound {
    sample_rate: u32,
    brown: f32,
    // biquad band-pass state
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    drop_level: f32,
    swell_phase: f32,
    rng: StdRng,
}

impl RainSound {
    pub fn new() -> Self {
        Self {
            sample_rate: 44100,
            brown: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            drop_level: 0.0,
            swell_phase: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    fn next_brown(&mut self) -> f32 {
        let white: f32 = self.rng.gen_range(-1.0..1.0);
        self.brown = ((self.brown + white * 0.02) * 0.9999).clamp(-1.0, 1.0);
        self.brown
    }

    fn band_pass(&mut self, input: f32) -> f32 {
        const B0: f32 = 0.1;
        const B2: f32 = -0.1;
        const A1: f32 = -1.8;
        const A2: f32 = 0.85;

        let output = B0 * input + B2 * self.x2 - A1 * self.y1 - A2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    fn next_drop(&mut self) -> f32 {
        // roughly forty drops a second
        if self.rng.gen_bool(40.0 / self.sample_rate as f64) {
            self.drop_level = self.rng.gen_range(0.2..0.6);
        }
        self.drop_level *= 0.995;
        let grain: f32 = self.rng.gen_range(-1.0..1.0);
        grain * self.drop_level
    }
}

impl Iterator for RainSound {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let brown = self.next_brown();
        let wash = self.band_pass(brown) * 0.8 + brown * 0.2;
        let drop = self.next_drop();

        self.swell_phase += 0.25 / self.sample_rate as f32;
        if self.swell_phase > std::f32::consts::TAU {
            self.swell_phase -= std::f32::consts::TAU;
        }
        let swell = 0.75 + 0.25 * self.swell_phase.sin();

        Some((wash * swell + drop * 0.15) * 0.4)
    }
}

impl Source for RainSound {
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
