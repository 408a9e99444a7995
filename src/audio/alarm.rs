use rodio::Source;
use std::f32::consts::TAU;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const BEEP_HZ: f32 = 880.0;
const BEEPS: u32 = 3;
const BEEP_MS: u32 = 180;
const GAP_MS: u32 = 120;

/// Digital-clock style alarm: a few short beeps, then the source ends.
pub struct AlarmChime {
    sample: u32,
    total: u32,
}

impl AlarmChime {
    pub fn new() -> Self {
        Self {
            sample: 0,
            total: samples_for(BEEPS * (BEEP_MS + GAP_MS)),
        }
    }
}

fn samples_for(ms: u32) -> u32 {
    SAMPLE_RATE / 1000 * ms
}

impl Iterator for AlarmChime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.sample >= self.total {
            return None;
        }
        let within_cycle = self.sample % samples_for(BEEP_MS + GAP_MS);
        let t = self.sample as f32 / SAMPLE_RATE as f32;
        self.sample += 1;

        if within_cycle < samples_for(BEEP_MS) {
            Some((TAU * BEEP_HZ * t).sin() * 0.35)
        } else {
            Some(0.0)
        }
    }
}

impl Source for AlarmChime {
    fn current_frame_len(&self) -> Option<usize> {
        Some((self.total - self.sample.min(self.total)) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_millis(u64::from(BEEPS * (BEEP_MS + GAP_MS))))
    }
}
