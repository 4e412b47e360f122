/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Gaussian diffusion patches.
//!
//! A deposit's charge cloud is modelled as the product of two independent
//! Gaussians, one along drift time and one along wire pitch. Binned against a
//! time [`Binning`] and a pitch [`Binning`], it becomes a small dense [`Patch`]
//! of charge values plus the absolute bin indices of its first row and column.
//!
//! ```text
//!              time bins  →
//!          ┌───┬───┬───┬───┐
//! pitch  p0│ . │ o │ o │ . │   cell[p][t] = Q · wp[p] · wt[t] / Σ wp·wt
//! bins   p1│ o │ O │ O │ o │
//!  ↓     p2│ . │ o │ o │ . │   origin = (pitch_offset, time_offset)
//!          └───┴───┴───┴───┘
//! ```
//!
//! # Invariants
//!
//! - Every cell has the sign of the deposit charge; magnitudes are non-negative.
//! - A non-empty patch sums to the deposit charge (up to rounding). Weights are
//!   renormalised over the cells that survive clipping to the binnings.
//! - An axis whose `nsigma` support misses its binning yields an empty patch.

use crate::binning::Binning;
use crate::gauss::GausDesc;
use crate::geometry::PlaneIndex;
use crate::units;

// ─── Patch ──────────────────────────────────────────────────────────────────

/// Dense 2-D array of charge, indexed `[pitch bin][time bin]`, located in the
/// global binnings by its offsets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    data: Vec<f64>,
    npitch: usize,
    ntime: usize,
    pitch_offset: i32,
    time_offset: i32,
}

impl Patch {
    /// An empty patch anchored at the given offsets.
    pub fn empty(pitch_offset: i32, time_offset: i32) -> Self {
        Self { data: Vec::new(), npitch: 0, ntime: 0, pitch_offset, time_offset }
    }

    /// Number of pitch bins (rows).
    pub fn rows(&self) -> usize {
        self.npitch
    }

    /// Number of time bins (columns).
    pub fn cols(&self) -> usize {
        self.ntime
    }

    /// True when the patch has no cells.
    pub fn is_empty(&self) -> bool {
        self.npitch == 0 || self.ntime == 0
    }

    /// Absolute pitch bin of row 0.
    pub fn pitch_offset(&self) -> i32 {
        self.pitch_offset
    }

    /// Absolute time bin of column 0.
    pub fn time_offset(&self) -> i32 {
        self.time_offset
    }

    /// Charge in cell `[pbin][tbin]` (patch-relative indices).
    pub fn get(&self, pbin: usize, tbin: usize) -> Option<f64> {
        (pbin < self.npitch && tbin < self.ntime).then(|| self.data[pbin * self.ntime + tbin])
    }

    /// Sum over all cells.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Iterate `(absolute pitch bin, absolute time bin, charge)` row by row.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, f64)> + '_ {
        let ntime = self.ntime.max(1);
        self.data.iter().enumerate().map(move |(i, &q)| {
            let p = (i / ntime) as i32 + self.pitch_offset;
            let t = (i % ntime) as i32 + self.time_offset;
            (p, t, q)
        })
    }
}

// ─── Sampling ───────────────────────────────────────────────────────────────

/// How finely each bin is integrated, per axis.
///
/// `0` integrates the Gaussian over the bin exactly (error function). `k >= 1`
/// evaluates the Gaussian at `k` evenly spaced points inside each bin and sums
/// them, trading accuracy for speed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sampling {
    /// Sub-samples per time bin.
    pub time: u32,
    /// Sub-samples per pitch bin.
    pub pitch: u32,
}

// ─── GaussianDiffusion ──────────────────────────────────────────────────────

/// The diffused charge cloud of one deposit against one plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianDiffusion {
    charge: f64,
    time_desc: GausDesc,
    pitch_desc: GausDesc,
}

impl GaussianDiffusion {
    /// Cloud of `charge` distributed as `time_desc × pitch_desc`.
    pub fn new(charge: f64, time_desc: GausDesc, pitch_desc: GausDesc) -> Self {
        Self { charge, time_desc, pitch_desc }
    }

    /// Total charge.
    pub fn charge(&self) -> f64 {
        self.charge
    }

    /// Time-axis Gaussian.
    pub fn time_desc(&self) -> &GausDesc {
        &self.time_desc
    }

    /// Pitch-axis Gaussian.
    pub fn pitch_desc(&self) -> &GausDesc {
        &self.pitch_desc
    }

    /// Bin the cloud over `nsigma` on each axis.
    pub fn patch(&self, tbins: &Binning, pbins: &Binning, nsigma: f64, sampling: Sampling) -> Patch {
        let (toffset, tweights) = axis_weights(&self.time_desc, tbins, nsigma, sampling.time);
        let (poffset, pweights) = axis_weights(&self.pitch_desc, pbins, nsigma, sampling.pitch);
        if tweights.is_empty() || pweights.is_empty() {
            return Patch::empty(poffset, toffset);
        }

        let mut data = Vec::with_capacity(pweights.len() * tweights.len());
        let mut raw_sum = 0.0;
        for &wp in &pweights {
            for &wt in &tweights {
                let v = wp * wt;
                raw_sum += v;
                data.push(v);
            }
        }
        if raw_sum <= 0.0 || !raw_sum.is_finite() {
            return Patch::empty(poffset, toffset);
        }

        let norm = self.charge / raw_sum;
        for v in &mut data {
            *v *= norm;
        }

        Patch {
            data,
            npitch: pweights.len(),
            ntime: tweights.len(),
            pitch_offset: poffset,
            time_offset: toffset,
        }
    }
}

/// First absolute bin and per-bin weights of one axis.
fn axis_weights(desc: &GausDesc, bins: &Binning, nsigma: f64, substeps: u32) -> (i32, Vec<f64>) {
    let (lo, hi) = desc.sigma_range(nsigma);
    let (first, last) = bins.sample_bin_range(lo, hi);
    if first >= last {
        return (first, Vec::new());
    }
    let n = (last - first) as usize;
    let start = bins.edge(first);
    let weights = if substeps == 0 || desc.is_delta() {
        desc.binint(start, bins.binsize(), n)
    } else {
        let k = substeps as usize;
        let step = bins.binsize() / k as f64;
        let fine = desc.sample(start + 0.5 * step, step, n * k);
        fine.chunks(k).map(|c| c.iter().sum()).collect()
    };
    (first, weights)
}

// ─── Extra sigma ────────────────────────────────────────────────────────────

/// Longitudinal widening coefficient, per time slice.
const EXTRA_SIGMA_LONG: f64 = 1.428249;

/// Transverse widening coefficients, per plane, in units of the wire pitch.
const EXTRA_SIGMA_TRAN: [f64; 3] = [0.402993 * 0.3, 0.402993 * 0.5, 0.188060 * 0.2];

/// Empirical widening of deposit extents to make up for diffusion that starts
/// too late near the deposit.
///
/// Both extents are combined in quadrature with a correction term: the
/// longitudinal one depends on drift speed and tick, the transverse one on the
/// plane's wire pitch and a per-plane factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtraSigma {
    drift_speed: f64,
    tick: f64,
}

impl ExtraSigma {
    /// Correction for the given drift speed and sample tick.
    pub fn new(drift_speed: f64, tick: f64) -> Self {
        Self { drift_speed, tick }
    }

    /// Additive longitudinal term, as a length.
    pub fn long_term(&self) -> f64 {
        let time_slice_width = self.drift_speed * self.tick;
        EXTRA_SIGMA_LONG * time_slice_width / (self.tick / units::US)
    }

    /// Additive transverse term for `plane` with wire spacing `pitch`.
    pub fn tran_term(&self, pitch: f64, plane: PlaneIndex) -> f64 {
        pitch * EXTRA_SIGMA_TRAN[plane.index()]
    }

    /// Widened longitudinal extent.
    pub fn longitudinal(&self, extent_long: f64) -> f64 {
        extent_long.hypot(self.long_term())
    }

    /// Widened transverse extent.
    pub fn transverse(&self, extent_tran: f64, pitch: f64, plane: PlaneIndex) -> f64 {
        extent_tran.hypot(self.tran_term(pitch, plane))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tbins() -> Binning {
        Binning::new(100, 0.0, 100.0)
    }

    fn pbins() -> Binning {
        Binning::new(20, -0.5, 19.5)
    }

    #[test]
    fn test_patch_conserves_charge() {
        let gd = GaussianDiffusion::new(-5000.0, GausDesc::new(50.3, 2.0), GausDesc::new(9.7, 1.2));
        let patch = gd.patch(&tbins(), &pbins(), 3.0, Sampling::default());
        assert!(!patch.is_empty());
        assert!((patch.sum() + 5000.0).abs() < 1e-6, "sum={}", patch.sum());
        assert!(patch.cells().all(|(_, _, q)| q <= 0.0));
    }

    #[test]
    fn test_patch_offsets_cover_center() {
        let gd = GaussianDiffusion::new(100.0, GausDesc::new(50.5, 1.0), GausDesc::new(10.0, 0.5));
        let patch = gd.patch(&tbins(), &pbins(), 3.0, Sampling::default());
        // time: [47.5, 53.5] -> bins 47..=53, pitch: [8.5, 11.5] -> bins 9..=12 clamped at edges
        assert_eq!(patch.time_offset(), 47);
        assert_eq!(patch.cols(), 7);
        assert_eq!(patch.pitch_offset(), 9);
        let (p, t, q) = patch
            .cells()
            .fold((0, 0, f64::MIN), |best, c| if c.2 > best.2 { c } else { best });
        assert_eq!((p, t), (10, 50));
        assert!(q > 0.0);
    }

    #[test]
    fn test_delta_lands_in_one_cell() {
        let gd = GaussianDiffusion::new(42.0, GausDesc::new(10.5, 0.0), GausDesc::new(3.0, 0.0));
        let patch = gd.patch(&tbins(), &pbins(), 3.0, Sampling::default());
        assert_eq!((patch.rows(), patch.cols()), (1, 1));
        assert_eq!(patch.get(0, 0), Some(42.0));
        assert_eq!((patch.pitch_offset(), patch.time_offset()), (3, 10));
    }

    #[test]
    fn test_delta_unbounded_nsigma_stays_in_place() {
        let gd = GaussianDiffusion::new(7.0, GausDesc::new(50.5, 0.0), GausDesc::new(10.0, 0.0));
        let patch = gd.patch(&tbins(), &pbins(), f64::INFINITY, Sampling::default());
        assert_eq!((patch.rows(), patch.cols()), (1, 1));
        assert_eq!((patch.pitch_offset(), patch.time_offset()), (10, 50));
        assert_eq!(patch.get(0, 0), Some(7.0));
    }

    #[test]
    fn test_out_of_window_is_empty() {
        let gd = GaussianDiffusion::new(10.0, GausDesc::new(150.0, 2.0), GausDesc::new(3.0, 1.0));
        let patch = gd.patch(&tbins(), &pbins(), 3.0, Sampling::default());
        assert!(patch.is_empty());
        assert_eq!(patch.sum(), 0.0);
    }

    #[test]
    fn test_subsampling_close_to_exact() {
        let gd = GaussianDiffusion::new(1000.0, GausDesc::new(40.2, 3.0), GausDesc::new(7.1, 1.5));
        let exact = gd.patch(&tbins(), &pbins(), 3.0, Sampling::default());
        let sampled = gd.patch(&tbins(), &pbins(), 3.0, Sampling { time: 8, pitch: 8 });
        assert_eq!((exact.rows(), exact.cols()), (sampled.rows(), sampled.cols()));
        for ((_, _, a), (_, _, b)) in exact.cells().zip(sampled.cells()) {
            assert!((a - b).abs() < 1.0, "exact={a} sampled={b}");
        }
        assert!((sampled.sum() - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_clipped_patch_renormalised() {
        // Half of the cloud hangs off the low pitch edge.
        let gd = GaussianDiffusion::new(300.0, GausDesc::new(50.0, 2.0), GausDesc::new(-0.5, 1.0));
        let patch = gd.patch(&tbins(), &pbins(), 3.0, Sampling::default());
        assert_eq!(patch.pitch_offset(), 0);
        assert!((patch.sum() - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_extra_sigma_widens() {
        let es = ExtraSigma::new(1.098 * units::MM / units::US, 0.5 * units::US);
        assert!(es.longitudinal(1.0) > 1.0);
        assert!((es.longitudinal(0.0) - es.long_term()).abs() < 1e-12);
        for plane in PlaneIndex::ALL {
            assert!(es.transverse(0.5, 3.0, plane) > 0.5, "{plane:?}");
        }
        assert!(es.tran_term(3.0, PlaneIndex::V) > es.tran_term(3.0, PlaneIndex::U));
    }

    #[test]
    fn test_long_term_value() {
        let es = ExtraSigma::new(1.098 * units::MM / units::US, 0.5 * units::US);
        // 1.428249 * (1.098 mm/us * 0.5 us) / 0.5
        assert!((es.long_term() - 1.428249 * 1.098).abs() < 1e-9);
    }
}
