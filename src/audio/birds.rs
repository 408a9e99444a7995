use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rodio::Source;
use std::f32::consts::TAU;
use std::time::Duration;

struct Chirp {
    remaining: u32,
    length: u32,
    start_hz: f32,
    end_hz: f32,
}

/// Birdsong: short downward-sweeping sine chirps separated by random pauses.
pub struct Birdsong {
    sample_rate: u32,
    phase: f32,
    silence: u32,
    chirp: Option<Chirp>,
    rng: StdRng,
}

impl Birdsong {
    pub fn new() -> Self {
        Self {
            sample_rate: 44100,
            phase: 0.0,
            silence: 0,
            chirp: None,
            rng: StdRng::from_entropy(),
        }
    }

    fn schedule_chirp(&mut self) {
        let length = self.rng.gen_range(0.05f32..0.15) * self.sample_rate as f32;
        let start_hz: f32 = self.rng.gen_range(2500.0..4500.0);
        self.chirp = Some(Chirp {
            remaining: length as u32,
            length: length as u32,
            start_hz,
            end_hz: start_hz * self.rng.gen_range(0.6f32..0.9),
        });
    }
}

impl Iterator for Birdsong {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(chirp) = self.chirp.as_mut() else {
            if self.silence == 0 {
                self.schedule_chirp();
            } else {
                self.silence -= 1;
            }
            return Some(0.0);
        };

        let progress = 1.0 - chirp.remaining as f32 / chirp.length.max(1) as f32;
        let hz = chirp.start_hz + (chirp.end_hz - chirp.start_hz) * progress;
        // sine envelope so each chirp fades in and out
        let envelope = (progress * std::f32::consts::PI).sin();

        self.phase = (self.phase + hz / self.sample_rate as f32 * TAU) % TAU;
        let sample = self.phase.sin() * envelope * 0.12;

        chirp.remaining = chirp.remaining.saturating_sub(1);
        if chirp.remaining == 0 {
            self.chirp = None;
            // bursts of two or three chirps, then a longer rest
            let pause_secs: f32 = if self.rng.gen_bool(0.6) {
                self.rng.gen_range(0.05..0.2)
            } else {
                self.rng.gen_range(0.8..3.0)
            };
            self.silence = (pause_secs * self.sample_rate as f32) as u32;
        }

        Some(sample)
    }
}

impl Source for Birdsong {
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
