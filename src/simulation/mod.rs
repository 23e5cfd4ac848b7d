//! Deterministic synthetic EEG
//!
//! Sinusoidal rhythms plus seeded Gaussian noise, optional line interference and
//! rectangular blink or spike injections. Used by tests, benches and demos to
//! produce reproducible recordings.

use crate::error::EegResult;
use crate::signal::Signal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Sinusoidal rhythm present on every channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rhythm {
    pub freq_hz: f64,
    pub amplitude: f64,
}

/// Rectangular offset added to one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Injection {
    pub channel: usize,
    pub start_sample: usize,
    pub length: usize,
    pub amplitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticEegConfig {
    pub sampling_rate: f64,
    pub duration_s: f64,
    pub channels: usize,
    pub rhythms: Vec<Rhythm>,
    pub noise_std: f64,
    pub line_freq_hz: f64,
    pub line_amplitude: f64,
    pub injections: Vec<Injection>,
    pub seed: u64,
}

impl Default for SyntheticEegConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 256.0,
            duration_s: 10.0,
            channels: 1,
            rhythms: vec![Rhythm { freq_hz: 10.0, amplitude: 1.0 }],
            noise_std: 0.5,
            line_freq_hz: 50.0,
            line_amplitude: 0.0,
            injections: Vec::new(),
            seed: 42,
        }
    }
}

/// Generator for [`SyntheticEegConfig`]
pub struct SyntheticEeg {
    config: SyntheticEegConfig,
    rng: StdRng,
}

impl SyntheticEeg {
    pub fn new(config: SyntheticEegConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    /// Generate the recording. Multichannel output is built channel by channel.
    pub fn generate(&mut self) -> EegResult<Signal> {
        let n = (self.config.duration_s * self.config.sampling_rate).round() as usize;
        let channels: Vec<Vec<f64>> = (0..self.config.channels.max(1))
            .map(|ch| self.channel(ch, n))
            .collect();
        if channels.len() == 1 {
            let mut channels = channels;
            Signal::from_samples(channels.remove(0), self.config.sampling_rate)
        } else {
            Signal::from_channels(channels, self.config.sampling_rate)
        }
    }

    fn channel(&mut self, index: usize, n: usize) -> Vec<f64> {
        let fs = self.config.sampling_rate;
        // Stagger rhythms across channels so they are not perfectly coherent
        let phase = index as f64 * PI / 7.0;
        let mut samples: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / fs;
                let rhythm: f64 = self
                    .config
                    .rhythms
                    .iter()
                    .map(|r| r.amplitude * (2.0 * PI * r.freq_hz * t + phase).sin())
                    .sum();
                let line = self.config.line_amplitude * (2.0 * PI * self.config.line_freq_hz * t).sin();
                rhythm + line
            })
            .collect();

        for v in samples.iter_mut() {
            *v += self.config.noise_std * self.gaussian();
        }

        for injection in self.config.injections.iter().filter(|inj| inj.channel == index) {
            let end = (injection.start_sample + injection.length).min(n);
            for v in samples.iter_mut().take(end).skip(injection.start_sample) {
                *v += injection.amplitude;
            }
        }
        samples
    }

    fn gaussian(&mut self) -> f64 {
        // Box-Muller transform
        let u1: f64 = self.rng.gen_range(f64::MIN_POSITIVE..1.0);
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}
