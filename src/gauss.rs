//! One-dimensional normal distribution descriptor.
//!
//! [`GausDesc`] carries only a center and a width. It answers two kinds of
//! question: how far (in sigma) a coordinate lies from the center, which the
//! sink uses for its out-of-window cut, and how much of the unit-normalised
//! distribution falls into each bin of a regular grid, which the patch builder
//! uses to fill cells.

use core::f64::consts::SQRT_2;

/// A 1-D Gaussian described by its center and sigma.
///
/// `sigma == 0` is a delta distribution: all of the weight sits exactly at
/// `center`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GausDesc {
    /// Mean of the distribution.
    pub center: f64,
    /// Standard deviation. Never negative.
    pub sigma: f64,
}

impl GausDesc {
    /// Create a descriptor. A negative sigma is taken by magnitude.
    pub fn new(center: f64, sigma: f64) -> Self {
        Self { center, sigma: sigma.abs() }
    }

    /// True for the zero-width case.
    pub fn is_delta(&self) -> bool {
        self.sigma == 0.0
    }

    /// Signed distance of `x` from the center in units of sigma.
    ///
    /// For a delta the distance is `0` at the center and `±inf` elsewhere.
    pub fn distance(&self, x: f64) -> f64 {
        let d = x - self.center;
        if self.sigma > 0.0 {
            d / self.sigma
        } else if d == 0.0 {
            0.0
        } else {
            d.signum() * f64::INFINITY
        }
    }

    /// Interval `(center - n*sigma, center + n*sigma)`. A delta collapses to
    /// `(center, center)` for any `n`.
    pub fn sigma_range(&self, nsigma: f64) -> (f64, f64) {
        if self.is_delta() {
            return (self.center, self.center);
        }
        (self.center - nsigma * self.sigma, self.center + nsigma * self.sigma)
    }

    /// Gaussian density shape (unnormalised, peak 1) at `nsamples` points
    /// `start + i*step`. A delta puts `1.0` in the first sample.
    pub fn sample(&self, start: f64, step: f64, nsamples: usize) -> Vec<f64> {
        let mut out = vec![0.0; nsamples];
        if nsamples == 0 {
            return out;
        }
        if self.is_delta() {
            out[0] = 1.0;
            return out;
        }
        for (ind, val) in out.iter_mut().enumerate() {
            let rel = (start + ind as f64 * step - self.center) / self.sigma;
            *val = (-0.5 * rel * rel).exp();
        }
        out
    }

    /// Integral of the unit-normalised Gaussian over each of `nbins`
    /// consecutive bins of width `binsize` starting at `start`.
    ///
    /// A delta puts all of its weight in the first bin.
    pub fn binint(&self, start: f64, binsize: f64, nbins: usize) -> Vec<f64> {
        let mut bins = vec![0.0; nbins];
        if nbins == 0 {
            return bins;
        }
        if self.is_delta() {
            bins[0] = 1.0;
            return bins;
        }
        let mut prev = self.half_erf(start);
        for (ind, val) in bins.iter_mut().enumerate() {
            let next = self.half_erf(start + binsize * (ind + 1) as f64);
            *val = next - prev;
            prev = next;
        }
        bins
    }

    fn half_erf(&self, x: f64) -> f64 {
        0.5 * erf((x - self.center) / (SQRT_2 * self.sigma))
    }
}

/// Error function, Abramowitz & Stegun 7.1.26 (|error| < 1.5e-7).
pub fn erf(x: f64) -> f64 {
    if x < 0.0 {
        return -erf(-x);
    }
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    1.0 - poly * (-x * x).exp()
}
