use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;

/// Short completion chime: a sine tone with an exponential decay.
/// Finite, unlike the ambient generators.
pub struct Chime {
    frequency: f32,
    total_samples: usize,
    num_sample: usize,
}

impl Chime {
    pub fn new(frequency: f32, duration: Duration) -> Self {
        let total_samples = (duration.as_millis() * u128::from(SAMPLE_RATE) / 1000) as usize;
        Self {
            frequency,
            total_samples,
            num_sample: 0,
        }
    }
}

impl Iterator for Chime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        let t = self.num_sample as f32 / SAMPLE_RATE as f32;
        self.num_sample += 1;

        // Fade to roughly -40 dB by the end of the tone.
        let progress = self.num_sample as f32 / self.total_samples as f32;
        let envelope = (-4.6 * progress).exp();

        Some((2.0 * PI * self.frequency * t).sin() * envelope * 0.3)
    }
}

impl Source for Chime {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1 // Mono
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_samples as f32 / SAMPLE_RATE as f32,
        ))
    }
}
