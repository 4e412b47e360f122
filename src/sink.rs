/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Deposit processor and cycle manager.
//!
//! [`DepoSimChannelSink`] diffuses each deposit of a cycle onto every wire
//! plane whose face contains it and accumulates the result per channel and
//! readout tick. At the end of a cycle [`DepoSimChannelSink::flush`] publishes
//! the complete channel list and empties it for the next cycle.
//!
//! ```text
//! DepoSet ─► for each depo ─► faces containing pos ─► planes
//!                                                      │
//!            out-of-window cut ◄── time/pitch GausDesc ┘
//!                   │
//!                   ▼
//!            GaussianDiffusion::patch ─► (wire, tick) ─► ChannelAccumulator
//! ```
//!
//! # Per-plane tick
//!
//! ```text
//! t    = tbins.center(abs_tbin) + to_rp[plane] / drift_speed + time_offset[plane]
//! tick = trunc((t - g4_ref_time) / tick)
//! ```
//!
//! # Invariants
//!
//! - Deposits are processed one at a time; no deposit sees another's partial
//!   contributions.
//! - Every skip (null deposit, out-of-window plane, sub-threshold cell, wire or
//!   tick out of range) is silent and leaves no partial state behind.
//! - The channel set is fixed at configuration and reset in place each cycle.

use std::sync::Arc;

use crate::accumulator::{record_position, ChannelAccumulator};
use crate::binning::Binning;
use crate::config::{SinkConfig, TruncationPolicy};
use crate::depo::{Depo, DepoSet};
use crate::diffusion::{ExtraSigma, GaussianDiffusion, Sampling};
use crate::error::{ConfigError, ConfigResult};
use crate::gauss::GausDesc;
use crate::geometry::{Anode, AnodeFace, WirePlane};
use crate::product::SimChannelProduct;
use crate::services::{ComponentResolver, RandomSource};

/// Energy attributed to a deposit when energy accounting is off.
pub const DEFAULT_ENERGY: f64 = 100.0;

// ─── Cycle statistics ───────────────────────────────────────────────────────

/// Counters for the current cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Non-null deposits processed.
    pub depos: u64,
    /// Null entries skipped.
    pub null_depos: u64,
    /// Deposits outside every face.
    pub uncontained: u64,
    /// Planes skipped by the out-of-window cut.
    pub planes_skipped: u64,
    /// Cells added to a channel record.
    pub cells_added: u64,
    /// Cells dropped at or below the charge threshold.
    pub cells_below_threshold: u64,
    /// Cells dropped for a wire or tick out of range.
    pub cells_out_of_range: u64,
}

/// Result of projecting one deposit onto one plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PlaneOutcome {
    /// The deposit's support misses the plane's time or pitch range.
    OutOfWindow,
    /// The plane has no valid plane index.
    Ignored,
    /// Number of cells accumulated.
    Deposited(u64),
}

// ─── Sink ───────────────────────────────────────────────────────────────────

/// Diffuses deposits onto channels and publishes per-cycle charge records.
pub struct DepoSimChannelSink<A: Anode> {
    cfg: SinkConfig,
    anodes: Vec<Arc<A>>,
    rng: Arc<dyn RandomSource>,
    tbins: Binning,
    extra_sigma: Option<ExtraSigma>,
    channels: ChannelAccumulator,
    stats: CycleStats,
    cycle: u64,
}

impl<A: Anode> DepoSimChannelSink<A> {
    /// Resolve the configured anodes and random source and build the channel
    /// map from every channel of every anode.
    ///
    /// Fails if the configuration is invalid, if an anode name is empty or
    /// unknown, or if the random source cannot be found.
    pub fn configure<R>(cfg: SinkConfig, resolver: &R) -> ConfigResult<Self>
    where
        R: ComponentResolver<Anode = A>,
    {
        cfg.validate()?;

        let mut anodes = Vec::new();
        for name in cfg.anode_names() {
            if name.is_empty() {
                return Err(ConfigError::MissingAnode(String::new()));
            }
            let anode = resolver
                .find_anode(name)
                .ok_or_else(|| ConfigError::MissingAnode(name.to_string()))?;
            anodes.push(anode);
        }

        if cfg.rng.is_empty() {
            return Err(ConfigError::MissingRandom(String::new()));
        }
        let rng = resolver
            .find_random(&cfg.rng)
            .ok_or_else(|| ConfigError::MissingRandom(cfg.rng.clone()))?;

        let channels = ChannelAccumulator::with_channels(anodes.iter().flat_map(|a| a.channels()));
        let tbins = cfg.time_binning();
        let extra_sigma = cfg
            .use_extra_sigma
            .then(|| ExtraSigma::new(cfg.drift_speed, cfg.tick));

        tracing::info!(
            label = %cfg.artlabel,
            anodes = anodes.len(),
            channels = channels.len(),
            nticks = tbins.nbins(),
            tmin = tbins.min(),
            tmax = tbins.max(),
            truncation = ?cfg.truncation,
            "configured depo simchannel sink"
        );

        Ok(Self {
            cfg,
            anodes,
            rng,
            tbins,
            extra_sigma,
            channels,
            stats: CycleStats::default(),
            cycle: 0,
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    /// Active configuration.
    pub fn config(&self) -> &SinkConfig {
        &self.cfg
    }

    /// Label records are published under.
    pub fn label(&self) -> &str {
        &self.cfg.artlabel
    }

    /// Resolved anodes.
    pub fn anodes(&self) -> &[Arc<A>] {
        &self.anodes
    }

    /// Resolved random source.
    pub fn random(&self) -> &Arc<dyn RandomSource> {
        &self.rng
    }

    /// Readout time binning including the early-response extension.
    pub fn time_binning(&self) -> &Binning {
        &self.tbins
    }

    /// Current, unflushed channel records.
    pub fn accumulator(&self) -> &ChannelAccumulator {
        &self.channels
    }

    /// Counters since the last flush.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    // ── Processing ─────────────────────────────────────────────────────────

    /// Accumulate every deposit of `depos` and hand the set back unchanged,
    /// so the sink can sit in the middle of a deposit pipeline.
    pub fn process<'a>(&mut self, depos: &'a DepoSet) -> &'a DepoSet {
        for depo in depos.depos() {
            match depo {
                Some(depo) => self.save_as_simchannel(depo),
                None => self.stats.null_depos += 1,
            }
        }
        depos
    }

    /// Diffuse one deposit onto every plane that can see it.
    pub fn save_as_simchannel(&mut self, depo: &Depo) {
        self.stats.depos += 1;

        let (track_id, energy) = self.attribution(depo);
        let position = record_position(&depo.origin_pos());

        let mut contained = false;
        for anode in &self.anodes {
            for face in anode.faces_containing(&depo.pos) {
                contained = true;
                for plane in face.planes() {
                    let outcome = diffuse_on_plane(
                        &self.cfg,
                        &self.tbins,
                        self.extra_sigma.as_ref(),
                        &mut self.channels,
                        &mut self.stats,
                        depo,
                        plane,
                        Attribution { track_id, energy, position },
                    );
                    match outcome {
                        PlaneOutcome::OutOfWindow => {
                            self.stats.planes_skipped += 1;
                            if self.cfg.truncation == TruncationPolicy::SkipFace {
                                break;
                            }
                        }
                        PlaneOutcome::Ignored => {}
                        PlaneOutcome::Deposited(cells) => {
                            tracing::trace!(track = track_id, cells, "depo diffused onto plane");
                        }
                    }
                }
            }
        }
        if !contained {
            self.stats.uncontained += 1;
            tracing::trace!(x = depo.pos.x, y = depo.pos.y, z = depo.pos.z, "depo outside every face");
        }
    }

    /// Publish every channel record and reset them for the next cycle.
    pub fn flush(&mut self) -> SimChannelProduct {
        let channels = self.channels.flush();
        let product = SimChannelProduct { label: self.cfg.artlabel.clone(), cycle: self.cycle, channels };

        tracing::debug!(
            label = %product.label,
            cycle = self.cycle,
            channels = product.len(),
            touched = product.non_empty().count(),
            charge = product.total_charge(),
            depos = self.stats.depos,
            skipped_planes = self.stats.planes_skipped,
            "flushed channel records"
        );

        self.cycle += 1;
        self.stats = CycleStats::default();
        product
    }

    /// Track id and energy a deposit's charge is attributed to: the prior's,
    /// if it has one, otherwise its own.
    fn attribution(&self, depo: &Depo) -> (i32, f64) {
        let (id, own_energy) = match depo.prior() {
            Some(prior) => (prior.id, prior.energy),
            None => (depo.id, depo.energy),
        };
        let energy = if self.cfg.use_energy { own_energy } else { DEFAULT_ENERGY };
        (id, energy)
    }
}

impl<A: Anode> core::fmt::Debug for DepoSimChannelSink<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DepoSimChannelSink")
            .field("label", &self.cfg.artlabel)
            .field("anodes", &self.anodes.len())
            .field("channels", &self.channels.len())
            .field("cycle", &self.cycle)
            .field("stats", &self.stats)
            .finish()
    }
}

// ─── Plane projection ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
struct Attribution {
    track_id: i32,
    energy: f64,
    position: [f64; 3],
}

/// True when the `nsigma` support of `desc` lies wholly outside `bins`.
///
/// A deposit with no raw extent on this axis is cut as soon as its center is
/// outside the range.
fn out_of_window(desc: &GausDesc, bins: &Binning, raw_sigma: f64, nsigma: f64) -> bool {
    let eff_nsigma = if raw_sigma > 0.0 { nsigma } else { 0.0 };
    desc.distance(bins.min()) > eff_nsigma || desc.distance(bins.max()) < -eff_nsigma
}

#[allow(clippy::too_many_arguments)]
fn diffuse_on_plane<P: WirePlane>(
    cfg: &SinkConfig,
    tbins: &Binning,
    extra_sigma: Option<&ExtraSigma>,
    channels: &mut ChannelAccumulator,
    stats: &mut CycleStats,
    depo: &Depo,
    plane: &P,
    attr: Attribution,
) -> PlaneOutcome {
    let Some(plane_index) = plane.plane_index() else {
        return PlaneOutcome::Ignored;
    };

    let sigma_l = extra_sigma.map_or(depo.extent_long, |es| es.longitudinal(depo.extent_long));
    let time_desc = GausDesc::new(depo.time, sigma_l / cfg.drift_speed);
    if out_of_window(&time_desc, tbins, depo.extent_long / cfg.drift_speed, cfg.nsigma) {
        tracing::trace!(plane = ?plane_index, time = depo.time, "depo outside time window");
        return PlaneOutcome::OutOfWindow;
    }

    let wbins = plane.pitch_binning();
    let sigma_t = extra_sigma.map_or(depo.extent_tran, |es| {
        es.transverse(depo.extent_tran, wbins.binsize(), plane_index)
    });
    let pitch_desc = GausDesc::new(plane.pitch(&depo.pos), sigma_t);
    if out_of_window(&pitch_desc, &wbins, depo.extent_tran, cfg.nsigma) {
        tracing::trace!(plane = ?plane_index, pitch = pitch_desc.center, "depo outside wire range");
        return PlaneOutcome::OutOfWindow;
    }

    let gd = GaussianDiffusion::new(depo.charge, time_desc, pitch_desc);
    let patch = gd.patch(tbins, &wbins, cfg.nsigma, Sampling::default());
    if patch.is_empty() {
        // Only the explicit sigma cut above counts as out of window.
        return PlaneOutcome::Deposited(0);
    }

    let time_shift = cfg.plane_time_shift(plane_index);
    let mut added = 0;
    for (abs_pbin, abs_tbin, charge) in patch.cells() {
        let channel = match wbins.in_range(abs_pbin).then(|| plane.wire_channel(abs_pbin as usize)) {
            Some(Some(channel)) => channel,
            _ => {
                stats.cells_out_of_range += 1;
                continue;
            }
        };
        let Some(tick) = cfg.readout_tick(tbins.center(abs_tbin) + time_shift) else {
            stats.cells_out_of_range += 1;
            continue;
        };

        let q = charge.abs();
        if q > cfg.min_charge {
            let energy = attr.energy * (charge / depo.charge).abs();
            channels.add(channel, tick, q, attr.position, attr.track_id, energy);
            added += 1;
        } else {
            stats.cells_below_threshold += 1;
        }
    }
    stats.cells_added += added;
    PlaneOutcome::Deposited(added)
}
