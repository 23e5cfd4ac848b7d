//! Signal container and layout handling
//!
//! A [`Signal`] always stores its samples as a `samples × channels` matrix. The
//! layout it was built from is remembered so cleaned output can be handed back
//! in the caller's orientation.

use crate::config::validate_sampling_rate;
use crate::error::{EegErrorBuilder, EegResult};
use ndarray::{Array2, ArrayView1, Axis};

/// Orientation of the data a signal was constructed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One-dimensional sample sequence
    Single,
    /// Rows are samples, columns are channels
    SamplesByChannels,
    /// Rows are channels, columns are samples
    ChannelsBySamples,
}

/// Multichannel time series with its sampling rate
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    data: Array2<f64>,
    sampling_rate: f64,
    layout: Layout,
}

impl Signal {
    /// Single-channel signal
    pub fn from_samples(samples: Vec<f64>, sampling_rate: f64) -> EegResult<Self> {
        let n = samples.len();
        let data = Array2::from_shape_vec((n, 1), samples).map_err(|e| {
            EegErrorBuilder::new("signal", "from_samples").invalid_data("signal", e.to_string())
        })?;
        Self::build(data, sampling_rate, Layout::Single)
    }

    /// Two-dimensional signal of either orientation.
    ///
    /// The longer axis is taken as time: a matrix with at least as many rows as
    /// columns is `samples × channels`, otherwise `channels × samples`.
    pub fn from_array(array: Array2<f64>, sampling_rate: f64) -> EegResult<Self> {
        let (rows, cols) = array.dim();
        if rows >= cols {
            Self::build(array, sampling_rate, Layout::SamplesByChannels)
        } else {
            Self::build(array.reversed_axes().as_standard_layout().to_owned(), sampling_rate, Layout::ChannelsBySamples)
        }
    }

    /// Signal from per-channel sample vectors of equal length
    pub fn from_channels(channels: Vec<Vec<f64>>, sampling_rate: f64) -> EegResult<Self> {
        let n_channels = channels.len();
        let n_samples = channels.first().map_or(0, Vec::len);
        if channels.iter().any(|c| c.len() != n_samples) {
            return Err(EegErrorBuilder::new("signal", "from_channels")
                .invalid_data("signal", "channels have different lengths"));
        }
        let data = Array2::from_shape_fn((n_samples, n_channels), |(t, c)| channels[c][t]);
        Self::build(data, sampling_rate, Layout::ChannelsBySamples)
    }

    fn build(data: Array2<f64>, sampling_rate: f64, layout: Layout) -> EegResult<Self> {
        validate_sampling_rate(sampling_rate)?;
        if data.is_empty() {
            return Err(EegErrorBuilder::new("signal", "new").invalid_data("signal", "signal contains no samples"));
        }
        Ok(Self { data, sampling_rate, layout })
    }

    /// Same rate and layout, new samples. `data` must be `samples × channels`.
    pub(crate) fn with_data(&self, data: Array2<f64>) -> Self {
        Self {
            data,
            sampling_rate: self.sampling_rate,
            layout: self.layout,
        }
    }

    /// `samples × channels` view of the data
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn sample_count(&self) -> usize {
        self.data.nrows()
    }

    pub fn channel_count(&self) -> usize {
        self.data.ncols()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.sample_count() as f64 / self.sampling_rate
    }

    pub fn channel(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.column(index)
    }

    /// Per-channel sample vectors
    pub fn channels(&self) -> Vec<Vec<f64>> {
        self.data.axis_iter(Axis(1)).map(|c| c.to_vec()).collect()
    }

    /// All samples concatenated channel after channel
    pub fn flatten(&self) -> Vec<f64> {
        self.data.t().iter().copied().collect()
    }

    /// Data in the orientation the signal was built from
    pub fn to_layout(&self) -> Array2<f64> {
        match self.layout {
            Layout::Single | Layout::SamplesByChannels => self.data.clone(),
            Layout::ChannelsBySamples => self.data.t().to_owned(),
        }
    }

    /// True when any sample is NaN or infinite
    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|v| !v.is_finite())
    }
}

/// Restore raw samples over `[start_s, end_s)` in a cleaned signal.
///
/// Sample indices are `floor(t × fs)`, clamped to the signal bounds. An empty or
/// inverted window returns the cleaned signal unchanged.
pub fn revert_window(cleaned: &Signal, raw: &Signal, start_s: f64, end_s: f64) -> EegResult<Signal> {
    if cleaned.data.dim() != raw.data.dim() {
        return Err(EegErrorBuilder::new("signal", "revert_window").invalid_data(
            "signal",
            format!("shape mismatch: cleaned {:?}, raw {:?}", cleaned.data.dim(), raw.data.dim()),
        ));
    }
    let n = cleaned.sample_count();
    let to_index = |t: f64| ((t * cleaned.sampling_rate).floor().max(0.0) as usize).min(n);
    let (start, end) = (to_index(start_s), to_index(end_s));

    let mut reverted = cleaned.data.clone();
    if start < end {
        reverted
            .slice_mut(ndarray::s![start..end, ..])
            .assign(&raw.data.slice(ndarray::s![start..end, ..]));
    }
    Ok(cleaned.with_data(reverted))
}
