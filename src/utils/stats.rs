//! Descriptive statistics over sample slices
//!
//! Population (biased) moments throughout. Every function accepts an empty slice
//! and returns a neutral value rather than NaN.

/// Arithmetic mean, 0 for an empty slice
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Population variance
pub fn variance(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let m = mean(x);
    x.iter().map(|v| (v - m).powi(2)).sum::<f64>() / x.len() as f64
}

/// Population standard deviation
pub fn std_dev(x: &[f64]) -> f64 {
    variance(x).sqrt()
}

fn central_moment(x: &[f64], m: f64, order: i32) -> f64 {
    x.iter().map(|v| (v - m).powi(order)).sum::<f64>() / x.len() as f64
}

/// Biased sample skewness. A constant slice has zero skew.
pub fn skewness(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let m = mean(x);
    let m2 = central_moment(x, m, 2);
    if m2 <= 0.0 {
        return 0.0;
    }
    central_moment(x, m, 3) / m2.powf(1.5)
}

/// Fisher (excess) kurtosis, biased. A constant slice has zero kurtosis.
pub fn kurtosis(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let m = mean(x);
    let m2 = central_moment(x, m, 2);
    if m2 <= 0.0 {
        return 0.0;
    }
    central_moment(x, m, 4) / (m2 * m2) - 3.0
}

/// Pearson correlation coefficient.
///
/// When either input has zero variance the coefficient is undefined; identical
/// inputs then correlate at 1 and anything else at 0.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return if x == y { 1.0 } else { 0.0 };
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Lower median: the middle element for odd counts, the lower of the two
/// middle elements for even counts. NaN values sort last.
pub fn median_low(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted[(sorted.len() - 1) / 2]
}

/// Peak-to-peak amplitude
pub fn peak_to_peak(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let (lo, hi) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    hi - lo
}

/// Largest absolute value
pub fn max_abs(x: &[f64]) -> f64 {
    x.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

/// Mean absolute value
pub fn mean_abs(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().map(|v| v.abs()).sum::<f64>() / x.len() as f64
}

/// Trapezoidal integral of `y` over the sample points `x`
pub fn trapz(y: &[f64], x: &[f64]) -> f64 {
    y.windows(2)
        .zip(x.windows(2))
        .map(|(yw, xw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) / 2.0)
        .sum()
}

/// `n` evenly spaced points over `[start, stop]`, endpoints included
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Piecewise-linear interpolation of `(xp, fp)` at each point of `x`.
/// `xp` must be increasing; points outside its range take the edge value.
pub fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return vec![0.0; x.len()];
    }
    x.iter()
        .map(|&xi| {
            if xi <= xp[0] {
                return fp[0];
            }
            if xi >= xp[n - 1] {
                return fp[n - 1];
            }
            let upper = xp[..n].partition_point(|&v| v <= xi);
            let (x0, x1) = (xp[upper - 1], xp[upper]);
            let (y0, y1) = (fp[upper - 1], fp[upper]);
            if x1 == x0 {
                y0
            } else {
                y0 + (y1 - y0) * (xi - x0) / (x1 - x0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_moments_of_known_sequence() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((mean(&x) - 2.5).abs() < TOL);
        assert!((variance(&x) - 1.25).abs() < TOL);
        assert!(skewness(&x).abs() < TOL);
        // Uniform-like sequence is platykurtic
        assert!((kurtosis(&x) - (-1.36)).abs() < 1e-9);
    }

    #[test]
    fn test_skewness_sign() {
        let right_tail = [0.0, 0.0, 0.0, 0.0, 10.0];
        assert!(skewness(&right_tail) > 0.0);
    }

    #[test]
    fn test_constant_input_is_neutral() {
        let x = [3.0; 16];
        assert_eq!(variance(&x), 0.0);
        assert_eq!(skewness(&x), 0.0);
        assert_eq!(kurtosis(&x), 0.0);
        assert_eq!(pearson(&x, &x), 1.0);
        assert_eq!(pearson(&x, &[0.0; 16]), 0.0);
    }

    #[test]
    fn test_pearson() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let z: Vec<f64> = x.iter().map(|v| -v).collect();
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_median_low() {
        assert_eq!(median_low(&[5.0, 1.0, 3.0]), 3.0);
        assert_eq!(median_low(&[4.0, 1.0]), 1.0);
        assert_eq!(median_low(&[4.0, 2.0, 8.0, 6.0]), 4.0);
        assert_eq!(median_low(&[]), 0.0);
    }

    #[test]
    fn test_amplitude_helpers() {
        let x = [-3.0, 1.0, 2.0];
        assert_eq!(peak_to_peak(&x), 5.0);
        assert_eq!(max_abs(&x), 3.0);
        assert!((mean_abs(&x) - 2.0).abs() < TOL);
    }

    #[test]
    fn test_trapz_and_interp() {
        let x = linspace(0.0, 1.0, 11);
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
        assert!((trapz(&y, &x) - 1.0).abs() < 1e-12);

        let probe = interp(&[-1.0, 0.25, 2.0], &x, &y);
        assert_eq!(probe[0], 0.0);
        assert!((probe[1] - 0.5).abs() < 1e-12);
        assert_eq!(probe[2], 2.0);
    }
}
