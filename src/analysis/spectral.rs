//! Power spectral density and band power integration

use crate::utils::stats;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize, Serializer};
use std::f64::consts::PI;
use std::fmt;

/// One-sided power spectral density
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Psd {
    pub freqs: Vec<f64>,
    pub power: Vec<f64>,
}

impl Psd {
    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Frequency of the first maximum, 0 for an empty estimate
    pub fn dominant_frequency(&self) -> f64 {
        let mut best: Option<(usize, f64)> = None;
        for (i, &p) in self.power.iter().enumerate() {
            if best.map_or(true, |(_, b)| p > b) {
                best = Some((i, p));
            }
        }
        best.map_or(0.0, |(i, _)| self.freqs[i])
    }

    /// Trapezoidal integral over the whole spectrum
    pub fn total_power(&self) -> f64 {
        stats::trapz(&self.power, &self.freqs)
    }

    /// Trapezoidal integral over the bins inside `[low, high]`
    pub fn band_power(&self, low: f64, high: f64) -> f64 {
        let (freqs, power): (Vec<f64>, Vec<f64>) = self
            .freqs
            .iter()
            .zip(&self.power)
            .filter(|(f, _)| **f >= low && **f <= high)
            .map(|(f, p)| (*f, *p))
            .unzip();
        stats::trapz(&power, &freqs)
    }
}

/// Welch's averaged periodogram.
///
/// Periodic Hann window, 50% overlap, per-segment mean removal and density
/// scaling. A trailing partial segment is dropped. `segment_length` is capped at
/// the input length.
pub fn welch(samples: &[f64], sampling_rate: f64, segment_length: usize) -> Psd {
    let n = samples.len();
    let nperseg = segment_length.min(n);
    if nperseg == 0 || !(sampling_rate > 0.0) {
        return Psd::default();
    }

    let window = hann_periodic(nperseg);
    let scale = 1.0 / (sampling_rate * window.iter().map(|w| w * w).sum::<f64>());
    let noverlap = nperseg / 2;
    let step = nperseg - noverlap;
    let n_freqs = nperseg / 2 + 1;
    let segments = 1 + (n - nperseg) / step;

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nperseg);
    let mut buffer = vec![Complex64::new(0.0, 0.0); nperseg];
    let mut power = vec![0.0; n_freqs];

    for seg in 0..segments {
        let segment = &samples[seg * step..seg * step + nperseg];
        let mean = stats::mean(segment);
        for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&window) {
            *slot = Complex64::new((x - mean) * w, 0.0);
        }
        fft.process(&mut buffer);
        for (p, bin) in power.iter_mut().zip(&buffer) {
            *p += bin.norm_sqr() * scale;
        }
    }

    // Fold negative frequencies: every bin except DC, and Nyquist for even lengths
    let last_doubled = if nperseg % 2 == 0 { n_freqs - 1 } else { n_freqs };
    for (k, p) in power.iter_mut().enumerate() {
        *p /= segments as f64;
        if k > 0 && k < last_doubled {
            *p *= 2.0;
        }
    }

    let freqs = (0..n_freqs).map(|k| k as f64 * sampling_rate / nperseg as f64).collect();
    Psd { freqs, power }
}

fn hann_periodic(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / len as f64).cos())
        .collect()
}

/// Canonical EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }

    /// Inclusive frequency range in Hz
    pub fn range(self) -> (f64, f64) {
        match self {
            Band::Delta => (0.5, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 13.0),
            Band::Beta => (13.0, 30.0),
            Band::Gamma => (30.0, 45.0),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Power share per band, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandPowerMap {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandPowerMap {
    pub fn get(&self, band: Band) -> f64 {
        match band {
            Band::Delta => self.delta,
            Band::Theta => self.theta,
            Band::Alpha => self.alpha,
            Band::Beta => self.beta,
            Band::Gamma => self.gamma,
        }
    }

    fn slot(&mut self, band: Band) -> &mut f64 {
        match band {
            Band::Delta => &mut self.delta,
            Band::Theta => &mut self.theta,
            Band::Alpha => &mut self.alpha,
            Band::Beta => &mut self.beta,
            Band::Gamma => &mut self.gamma,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Band, f64)> + '_ {
        Band::ALL.iter().map(move |&b| (b, self.get(b)))
    }

    pub fn total(&self) -> f64 {
        self.iter().map(|(_, p)| p).sum()
    }

    /// Absolute band powers normalized to percentages; all zero when the total is zero
    pub fn from_psd(psd: &Psd) -> Self {
        let mut absolute = Self::default();
        for band in Band::ALL {
            let (low, high) = band.range();
            *absolute.slot(band) = psd.band_power(low, high);
        }
        let total = absolute.total();
        if !(total > 0.0) {
            return Self::default();
        }
        let mut percent = Self::default();
        for (band, power) in absolute.iter() {
            *percent.slot(band) = power / total * 100.0;
        }
        percent
    }

    /// Band with the largest share, first in canonical order on ties.
    /// `None` when no band carries power.
    pub fn dominant(&self) -> Option<Band> {
        if !(self.total() > 0.0) {
            return None;
        }
        let mut best = Band::Delta;
        for (band, power) in self.iter() {
            if power > self.get(best) {
                best = band;
            }
        }
        Some(best)
    }
}

pub(crate) fn serialize_band_or_unknown<S: Serializer>(band: &Option<Band>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(band.map_or("unknown", Band::name))
}
