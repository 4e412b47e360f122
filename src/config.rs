//! Sink configuration.
//!
//! All dimensional values are expressed in the crate's system of units (see
//! [`crate::units`]): a configuration document carries numbers already
//! multiplied by their unit, so `"tick": 500.0` is half a microsecond.
//!
//! With the `serde` feature, [`SinkConfig::from_json`] reads a JSON object in
//! which every key is optional and missing keys take their defaults.
//!
//! # Distance to the response plane
//!
//! Two naming schemes are accepted for the per-plane wire-to-response-plane
//! distances. `uboone_{u,v,y}_to_rp` always has a value; when one of
//! `{u,v,y}_to_rp` is present it takes precedence for that plane.

use crate::binning::Binning;
use crate::error::{ConfigError, ConfigResult};
use crate::geometry::PlaneIndex;
use crate::units;

/// What to do when a deposit's diffusion misses a plane's bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TruncationPolicy {
    /// Skip only that plane and carry on with the next plane of the face.
    #[default]
    SkipPlane,
    /// Stop processing the remaining planes of that face.
    SkipFace,
}

/// Configuration of a [`crate::sink::DepoSimChannelSink`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SinkConfig {
    /// Names of the anodes to read out. Takes precedence over `anode`.
    pub anodes_tn: Vec<String>,
    /// Single anode name used when `anodes_tn` is empty.
    pub anode: String,
    /// Name of the random source. Must resolve even though diffusion does not
    /// draw from it.
    pub rng: String,
    /// Label the flushed records are published under.
    pub artlabel: String,
    /// Start of the acquisition window.
    pub start_time: f64,
    /// Length of the acquisition window.
    pub readout_time: f64,
    /// Sample tick.
    pub tick: f64,
    /// Gaussian truncation, in sigma.
    pub nsigma: f64,
    /// Electron drift speed.
    pub drift_speed: f64,
    /// U wire to response plane distance.
    pub uboone_u_to_rp: f64,
    /// V wire to response plane distance.
    pub uboone_v_to_rp: f64,
    /// Y (collection) wire to response plane distance.
    pub uboone_y_to_rp: f64,
    /// Override of `uboone_u_to_rp`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub u_to_rp: Option<f64>,
    /// Override of `uboone_v_to_rp`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub v_to_rp: Option<f64>,
    /// Override of `uboone_y_to_rp`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub y_to_rp: Option<f64>,
    /// Extra time shift applied to U plane ticks.
    pub u_time_offset: f64,
    /// Extra time shift applied to V plane ticks.
    pub v_time_offset: f64,
    /// Extra time shift applied to Y plane ticks.
    pub y_time_offset: f64,
    /// Reference time subtracted before converting to ticks.
    pub g4_ref_time: f64,
    /// Attribute the deposit's energy instead of a constant.
    pub use_energy: bool,
    /// Apply the empirical extra-sigma widening.
    pub use_extra_sigma: bool,
    /// Behaviour when a plane is out of reach.
    pub truncation: TruncationPolicy,
    /// Cell charges at or below this magnitude are dropped.
    pub min_charge: f64,
    /// Distance of the response plane from the wires; deposits this far ahead
    /// of the anode still reach readout.
    pub response_plane: f64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            anodes_tn: Vec::new(),
            anode: "AnodePlane".into(),
            rng: "Random".into(),
            artlabel: "simpleSC".into(),
            start_time: -1.6 * units::MS,
            readout_time: 4.8 * units::MS,
            tick: 0.5 * units::US,
            nsigma: 3.0,
            drift_speed: 1.098 * units::MM / units::US,
            uboone_u_to_rp: 94.0 * units::MM,
            uboone_v_to_rp: 97.0 * units::MM,
            uboone_y_to_rp: 100.0 * units::MM,
            u_to_rp: None,
            v_to_rp: None,
            y_to_rp: None,
            u_time_offset: 0.0,
            v_time_offset: 0.0,
            y_time_offset: 0.0,
            g4_ref_time: -4050.0 * units::US,
            use_energy: false,
            use_extra_sigma: false,
            truncation: TruncationPolicy::SkipPlane,
            min_charge: 1.0 * units::EPLUS,
            response_plane: 10.0 * units::CM,
        }
    }
}

impl SinkConfig {
    /// Defaults with the second detector's response-plane distances and
    /// reference time.
    pub fn protodune() -> Self {
        Self {
            u_to_rp: Some(90.58 * units::MM),
            v_to_rp: Some(95.29 * units::MM),
            y_to_rp: Some(100.0 * units::MM),
            g4_ref_time: -250.0 * units::US,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration object. Missing keys take defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let cfg: SinkConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("tick", self.tick),
            ("drift_speed", self.drift_speed),
            ("readout_time", self.readout_time),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid { field, reason: format!("must be positive, got {value}") });
            }
        }
        let non_negative = [
            ("nsigma", self.nsigma),
            ("response_plane", self.response_plane),
            ("min_charge", self.min_charge),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be finite and not negative, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Anode names to resolve, in order.
    pub fn anode_names(&self) -> Vec<&str> {
        if self.anodes_tn.is_empty() {
            vec![self.anode.as_str()]
        } else {
            self.anodes_tn.iter().map(String::as_str).collect()
        }
    }

    /// Wire to response plane distance for `plane`.
    pub fn to_rp(&self, plane: PlaneIndex) -> f64 {
        match plane {
            PlaneIndex::U => self.u_to_rp.unwrap_or(self.uboone_u_to_rp),
            PlaneIndex::V => self.v_to_rp.unwrap_or(self.uboone_v_to_rp),
            PlaneIndex::W => self.y_to_rp.unwrap_or(self.uboone_y_to_rp),
        }
    }

    /// Configured time offset for `plane`.
    pub fn time_offset(&self, plane: PlaneIndex) -> f64 {
        match plane {
            PlaneIndex::U => self.u_time_offset,
            PlaneIndex::V => self.v_time_offset,
            PlaneIndex::W => self.y_time_offset,
        }
    }

    /// Fixed time added to every tick centre on `plane`.
    pub fn plane_time_shift(&self, plane: PlaneIndex) -> f64 {
        self.to_rp(plane) / self.drift_speed + self.time_offset(plane)
    }

    /// Drift time across the response-plane distance.
    pub fn response_time_offset(&self) -> f64 {
        self.response_plane / self.drift_speed
    }

    /// Readout time binning, opened early by the response time offset.
    pub fn time_binning(&self) -> Binning {
        let offset = self.response_time_offset();
        let response_nticks = (offset / self.tick).trunc();
        let nbins = (self.readout_time / self.tick + response_nticks) as i32;
        Binning::new(nbins, self.start_time - offset, self.start_time + self.readout_time)
    }

    /// Readout tick of absolute time `t`, or `None` if it falls before the
    /// reference time or beyond the tick range.
    pub fn readout_tick(&self, t: f64) -> Option<u32> {
        let ticks = (t - self.g4_ref_time) / self.tick;
        (ticks >= 0.0 && ticks < u32::MAX as f64).then(|| ticks as u32)
    }
}
