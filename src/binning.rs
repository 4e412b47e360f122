//! Uniform discretisation of a continuous axis.
//!
//! A [`Binning`] splits `[min, max)` into `nbins` equal bins. Index lookups
//! never fail: a coordinate outside the range maps to a negative index or an
//! index `>= nbins`, and it is up to the caller to bound-check.

/// Uniform binning of `[min, max)` into `nbins` equal bins.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Binning {
    nbins: i32,
    min: f64,
    max: f64,
    binsize: f64,
}

impl Binning {
    /// Create a binning of `nbins` bins spanning `[min, max)`.
    ///
    /// A negative bin count is clamped to zero.
    pub fn new(nbins: i32, min: f64, max: f64) -> Self {
        let nbins = nbins.max(0);
        let binsize = if nbins > 0 { (max - min) / nbins as f64 } else { 0.0 };
        Self { nbins, min, max, binsize }
    }

    /// Number of bins.
    pub fn nbins(&self) -> i32 {
        self.nbins
    }

    /// Lower edge of the first bin.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper edge of the last bin.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Width of one bin.
    pub fn binsize(&self) -> f64 {
        self.binsize
    }

    /// Full extent `max - min`.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Lower edge of bin `ind`. Extrapolates for out-of-range indices.
    pub fn edge(&self, ind: i32) -> f64 {
        self.min + ind as f64 * self.binsize
    }

    /// Midpoint of bin `ind`. Extrapolates for out-of-range indices.
    pub fn center(&self, ind: i32) -> f64 {
        self.min + (ind as f64 + 0.5) * self.binsize
    }

    /// Index of the bin containing `x`, possibly out of range.
    pub fn bin(&self, x: f64) -> i32 {
        if self.binsize == 0.0 {
            return 0;
        }
        ((x - self.min) / self.binsize).floor() as i32
    }

    /// True if `x` lies in `[min, max)`.
    pub fn inside(&self, x: f64) -> bool {
        self.min <= x && x < self.max
    }

    /// True if `ind` is a valid bin index.
    pub fn in_range(&self, ind: i32) -> bool {
        0 <= ind && ind < self.nbins
    }

    /// Half-open bin index range `[first, last)` covering `[lo, hi]`, clamped
    /// to the valid indices. The range is empty (`first >= last`) when the
    /// interval misses the binning entirely.
    pub fn sample_bin_range(&self, lo: f64, hi: f64) -> (i32, i32) {
        let first = self.bin(lo).max(0);
        let last = self.bin(hi).saturating_add(1).min(self.nbins);
        (first, last)
    }
}
