//! Python FFI bindings via PyO3.
//!
//! Exposes the binning and Gaussian primitives, the patch builder, and a sink
//! driven by the planar reference geometry. For custom geometries, use the
//! Rust API directly.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from depo_simchannel import Binning, GausDesc, diffuse_patch, SimChannelSink
//!
//! tbins = Binning(100, 0.0, 50_000.0)      # ns
//! pbins = Binning(20, -1.5, 58.5)          # mm, wire i at 3*i
//! poff, toff, patch = diffuse_patch(-1e4, GausDesc(20_000.0, 800.0), GausDesc(30.0, 1.2), tbins, pbins)
//!
//! sink = SimChannelSink(nwires=100, pitch=3.0)
//! sink.add_depo(100.0, 0.0, 30.0, time=0.0, charge=-5000.0)
//! for channel, tick, charge in sink.flush():
//!     print(channel, tick, charge)
//! ```

#![allow(non_snake_case)]

use std::sync::Arc;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::binning::Binning as RustBinning;
use crate::config::SinkConfig;
use crate::depo::{Depo, Point};
use crate::diffusion::{GaussianDiffusion, Sampling};
use crate::gauss::GausDesc as RustGausDesc;
use crate::geometry::{BoundingBox, ChannelId, ReferenceAnode};
use crate::services::{Registry, SplitMix64};
use crate::sink::DepoSimChannelSink;

// ── Binning ───────────────────────────────────────────────────────────────────

/// Uniform binning of [min, max) into nbins bins.
#[pyclass(name = "Binning")]
#[derive(Clone)]
pub struct PyBinning {
    inner: RustBinning,
}

#[pymethods]
impl PyBinning {
    /// Create a binning.
    #[new]
    pub fn new(nbins: i32, min: f64, max: f64) -> Self {
        Self { inner: RustBinning::new(nbins, min, max) }
    }

    /// Number of bins.
    #[getter]
    pub fn nbins(&self) -> i32 {
        self.inner.nbins()
    }

    /// Bin width.
    #[getter]
    pub fn binsize(&self) -> f64 {
        self.inner.binsize()
    }

    /// Midpoint of bin `ind`.
    pub fn center(&self, ind: i32) -> f64 {
        self.inner.center(ind)
    }

    /// Index of the bin holding `x`.
    pub fn bin(&self, x: f64) -> i32 {
        self.inner.bin(x)
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!("Binning({}, {}, {})", self.inner.nbins(), self.inner.min(), self.inner.max())
    }
}

// ── GausDesc ──────────────────────────────────────────────────────────────────

/// 1-D Gaussian (center, sigma).
#[pyclass(name = "GausDesc")]
#[derive(Clone)]
pub struct PyGausDesc {
    inner: RustGausDesc,
}

#[pymethods]
impl PyGausDesc {
    /// Create a descriptor. Sigma must not be negative.
    #[new]
    pub fn new(center: f64, sigma: f64) -> PyResult<Self> {
        if sigma < 0.0 {
            return Err(PyValueError::new_err(format!("sigma must not be negative, got {sigma}")));
        }
        Ok(Self { inner: RustGausDesc::new(center, sigma) })
    }

    /// Signed distance from the center in sigma.
    pub fn distance(&self, x: f64) -> f64 {
        self.inner.distance(x)
    }

    /// Per-bin integrals of the unit Gaussian.
    pub fn binint(&self, start: f64, binsize: f64, nbins: usize) -> Vec<f64> {
        self.inner.binint(start, binsize, nbins)
    }
}

// ── Patch builder ─────────────────────────────────────────────────────────────

/// Diffuse `charge` over the two binnings.
///
/// Returns:
///     (pitch_offset, time_offset, rows) where rows[p][t] is the charge in
///     absolute pitch bin pitch_offset + p and time bin time_offset + t.
#[pyfunction]
#[pyo3(signature = (charge, time, pitch, tbins, pbins, nsigma=3.0))]
pub fn diffuse_patch(
    charge: f64,
    time: &PyGausDesc,
    pitch: &PyGausDesc,
    tbins: &PyBinning,
    pbins: &PyBinning,
    nsigma: f64,
) -> (i32, i32, Vec<Vec<f64>>) {
    let patch = GaussianDiffusion::new(charge, time.inner, pitch.inner).patch(
        &tbins.inner,
        &pbins.inner,
        nsigma,
        Sampling::default(),
    );
    let rows = (0..patch.rows())
        .map(|p| (0..patch.cols()).filter_map(|t| patch.get(p, t)).collect())
        .collect();
    (patch.pitch_offset(), patch.time_offset(), rows)
}

// ── Sink ──────────────────────────────────────────────────────────────────────

/// Sink over a single-face, three-plane reference anode.
///
/// The sensitive volume spans x in [0, drift_length] and y, z in
/// [-half_width, half_width]. Wires of all planes pass through the origin.
#[pyclass(name = "SimChannelSink")]
pub struct PySimChannelSink {
    inner: DepoSimChannelSink<ReferenceAnode>,
}

#[pymethods]
impl PySimChannelSink {
    /// Create a sink with default timing configuration.
    #[new]
    #[pyo3(signature = (nwires=100, pitch=3.0, drift_length=2000.0, half_width=300.0, nsigma=3.0, use_energy=false))]
    pub fn new(
        nwires: u32,
        pitch: f64,
        drift_length: f64,
        half_width: f64,
        nsigma: f64,
        use_energy: bool,
    ) -> PyResult<Self> {
        let sensitive = BoundingBox::new(
            Point::new(0.0, -half_width, -half_width),
            Point::new(drift_length, half_width, half_width),
        );
        let cfg = SinkConfig { nsigma, use_energy, ..SinkConfig::default() };
        let mut registry = Registry::new();
        registry
            .add_anode(cfg.anode.clone(), ReferenceAnode::three_plane(0, sensitive, Point::default(), pitch, nwires, 0))
            .add_random(cfg.rng.clone(), Arc::new(SplitMix64::new(0)));
        let inner = DepoSimChannelSink::configure(cfg, &registry)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Diffuse and accumulate one deposit.
    #[pyo3(signature = (x, y, z, time, charge, extent_long=0.0, extent_tran=0.0, id=0, energy=0.0))]
    #[allow(clippy::too_many_arguments)]
    pub fn add_depo(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        time: f64,
        charge: f64,
        extent_long: f64,
        extent_tran: f64,
        id: i32,
        energy: f64,
    ) {
        let depo = Depo::new(Point::new(x, y, z), time, charge)
            .with_extent(extent_long, extent_tran)
            .with_id(id)
            .with_energy(energy);
        self.inner.save_as_simchannel(&depo);
    }

    /// Number of configured channels.
    #[getter]
    pub fn channel_count(&self) -> usize {
        self.inner.accumulator().len()
    }

    /// Flush the cycle as a list of (channel, tick, charge), one per non-empty
    /// tick, in channel then tick order.
    pub fn flush(&mut self) -> Vec<(ChannelId, u32, f64)> {
        let product = self.inner.flush();
        product
            .non_empty()
            .flat_map(|sc| {
                let channel = sc.channel();
                sc.tdc_ides()
                    .iter()
                    .map(move |t| (channel, t.tdc, t.ides.iter().map(|i| i.num_electrons).sum::<f64>()))
            })
            .collect()
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!("SimChannelSink(channels={})", self.inner.accumulator().len())
    }
}

// ── Module entry point ────────────────────────────────────────────────────────

/// Gaussian diffusion of charge deposits onto wire channels.
#[pymodule]
pub fn depo_simchannel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyBinning>()?;
    m.add_class::<PyGausDesc>()?;
    m.add_class::<PySimChannelSink>()?;
    m.add_function(wrap_pyfunction!(diffuse_patch, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
