//! Per-channel charge records.
//!
//! A [`SimChannel`] holds, for one readout channel, every ionization
//! contribution that reached it during a cycle, grouped by readout tick and
//! kept in tick order. Contributions from the same track at the same tick are
//! merged into one [`Ide`]: charge and energy add up, and the position becomes
//! the charge-weighted mean.

use crate::geometry::ChannelId;

/// Ionization deposited on a channel at one tick by one track.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ide {
    /// Track the charge is attributed to.
    pub track_id: i32,
    /// Number of electrons (charge magnitude).
    pub num_electrons: f64,
    /// Energy attributed to this charge.
    pub energy: f64,
    /// Charge-weighted origin x, in cm.
    pub x: f64,
    /// Charge-weighted origin y, in cm.
    pub y: f64,
    /// Charge-weighted origin z, in cm.
    pub z: f64,
}

/// All contributions at one readout tick.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TdcIde {
    /// Readout tick.
    pub tdc: u32,
    /// One entry per track.
    pub ides: Vec<Ide>,
}

/// Per-track summary over a tick window.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackIde {
    /// Track identifier.
    pub track_id: i32,
    /// Fraction of the window's energy from this track.
    pub energy_frac: f64,
    /// Energy from this track.
    pub energy: f64,
    /// Electrons from this track.
    pub num_electrons: f64,
}

/// Time-ordered charge record of one channel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimChannel {
    channel: ChannelId,
    tdc_ides: Vec<TdcIde>,
}

impl SimChannel {
    /// Empty record for `channel`.
    pub fn new(channel: ChannelId) -> Self {
        Self { channel, tdc_ides: Vec::new() }
    }

    /// Channel number.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Contributions, sorted by tick.
    pub fn tdc_ides(&self) -> &[TdcIde] {
        &self.tdc_ides
    }

    /// True if nothing was added since the last clear.
    pub fn is_empty(&self) -> bool {
        self.tdc_ides.is_empty()
    }

    /// Drop all contributions, keeping the channel.
    pub fn clear(&mut self) {
        self.tdc_ides.clear();
    }

    /// Move the contents out, leaving an empty record for the same channel.
    pub fn take(&mut self) -> SimChannel {
        SimChannel { channel: self.channel, tdc_ides: core::mem::take(&mut self.tdc_ides) }
    }

    /// Add `num_electrons` from `track_id` at tick `tdc`.
    pub fn add_ionization_electrons(
        &mut self,
        track_id: i32,
        tdc: u32,
        num_electrons: f64,
        xyz: [f64; 3],
        energy: f64,
    ) {
        let slot = match self.tdc_ides.binary_search_by_key(&tdc, |t| t.tdc) {
            Ok(i) => i,
            Err(i) => {
                self.tdc_ides.insert(i, TdcIde { tdc, ides: Vec::new() });
                i
            }
        };
        let ides = &mut self.tdc_ides[slot].ides;

        if let Some(ide) = ides.iter_mut().find(|ide| ide.track_id == track_id) {
            let total = ide.num_electrons + num_electrons;
            if total > 0.0 {
                let (w_old, w_new) = (ide.num_electrons / total, num_electrons / total);
                ide.x = ide.x * w_old + xyz[0] * w_new;
                ide.y = ide.y * w_old + xyz[1] * w_new;
                ide.z = ide.z * w_old + xyz[2] * w_new;
            }
            ide.num_electrons = total;
            ide.energy += energy;
        } else {
            ides.push(Ide {
                track_id,
                num_electrons,
                energy,
                x: xyz[0],
                y: xyz[1],
                z: xyz[2],
            });
        }
    }

    /// Electrons at tick `tdc`.
    pub fn charge(&self, tdc: u32) -> f64 {
        self.find(tdc).map_or(0.0, |t| t.ides.iter().map(|i| i.num_electrons).sum())
    }

    /// Energy at tick `tdc`.
    pub fn energy(&self, tdc: u32) -> f64 {
        self.find(tdc).map_or(0.0, |t| t.ides.iter().map(|i| i.energy).sum())
    }

    /// Electrons over all ticks.
    pub fn total_charge(&self) -> f64 {
        self.all_ides().map(|i| i.num_electrons).sum()
    }

    /// Energy over all ticks.
    pub fn total_energy(&self) -> f64 {
        self.all_ides().map(|i| i.energy).sum()
    }

    /// Per-track energy and charge over ticks `[start, end]`, in order of
    /// first appearance.
    pub fn track_ides(&self, start: u32, end: u32) -> Vec<TrackIde> {
        let mut out: Vec<TrackIde> = Vec::new();
        let mut total_energy = 0.0;
        for t in self.tdc_ides.iter().filter(|t| (start..=end).contains(&t.tdc)) {
            for ide in &t.ides {
                total_energy += ide.energy;
                match out.iter_mut().find(|tr| tr.track_id == ide.track_id) {
                    Some(tr) => {
                        tr.energy += ide.energy;
                        tr.num_electrons += ide.num_electrons;
                    }
                    None => out.push(TrackIde {
                        track_id: ide.track_id,
                        energy_frac: 0.0,
                        energy: ide.energy,
                        num_electrons: ide.num_electrons,
                    }),
                }
            }
        }
        if total_energy > 0.0 {
            for tr in &mut out {
                tr.energy_frac = tr.energy / total_energy;
            }
        }
        out
    }

    fn find(&self, tdc: u32) -> Option<&TdcIde> {
        self.tdc_ides
            .binary_search_by_key(&tdc, |t| t.tdc)
            .ok()
            .map(|i| &self.tdc_ides[i])
    }

    fn all_ides(&self) -> impl Iterator<Item = &Ide> {
        self.tdc_ides.iter().flat_map(|t| t.ides.iter())
    }
}
