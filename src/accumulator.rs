/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Channel-keyed accumulator of charge records.
//!
//! [`ChannelAccumulator`] owns one [`SimChannel`] per readout channel. The key
//! set is fixed when the accumulator is reset from the geometry and then kept
//! for the lifetime of the sink: each cycle's flush empties the records in
//! place instead of rebuilding the map.
//!
//! # Invariants
//!
//! - Records are always sorted by channel number, with no duplicates.
//! - Every channel passed to [`ChannelAccumulator::reset`] has a record, even
//!   if nothing was ever added to it.
//! - [`ChannelAccumulator::flush`] returns every record and leaves every record
//!   empty; the channel set and order survive.

use hashbrown::HashMap;

use crate::depo::Point;
use crate::geometry::ChannelId;
use crate::simchannel::SimChannel;

// ─── Channel Accumulator ────────────────────────────────────────────────────

/// Sorted, complete set of per-channel charge records.
#[derive(Clone, Debug, Default)]
pub struct ChannelAccumulator {
    /// Records in channel order.
    records: Vec<SimChannel>,
    /// Channel → position in `records`.
    index: HashMap<ChannelId, usize>,
}

impl ChannelAccumulator {
    /// An accumulator with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// An accumulator holding one empty record per channel.
    pub fn with_channels<I: IntoIterator<Item = ChannelId>>(channels: I) -> Self {
        let mut acc = Self::new();
        acc.reset(channels);
        acc
    }

    /// Replace the key set with `channels` (any order, duplicates ignored),
    /// each with an empty record.
    pub fn reset<I: IntoIterator<Item = ChannelId>>(&mut self, channels: I) {
        let mut chans: Vec<ChannelId> = channels.into_iter().collect();
        chans.sort_unstable();
        chans.dedup();
        self.records = chans.into_iter().map(SimChannel::new).collect();
        self.reindex(0);
    }

    // ── Accumulation ───────────────────────────────────────────────────────

    /// Add `charge` at `tick` on `channel`, attributed to `track_id`.
    ///
    /// A channel outside the reset set gets a record created in its sorted
    /// position.
    pub fn add(&mut self, channel: ChannelId, tick: u32, charge: f64, position: [f64; 3], track_id: i32, energy: f64) {
        self.get_or_create(channel)
            .add_ionization_electrons(track_id, tick, charge, position, energy);
    }

    /// Record for `channel`, created if missing.
    pub fn get_or_create(&mut self, channel: ChannelId) -> &mut SimChannel {
        let slot = match self.index.get(&channel).copied() {
            Some(i) => i,
            None => {
                let i = self.records.partition_point(|r| r.channel() < channel);
                tracing::debug!(channel, "creating record for channel outside the configured set");
                self.records.insert(i, SimChannel::new(channel));
                self.reindex(i);
                i
            }
        };
        &mut self.records[slot]
    }

    // ── Cycle boundary ─────────────────────────────────────────────────────

    /// All records in channel order. Every record is left empty, keeping its
    /// channel.
    pub fn flush(&mut self) -> Vec<SimChannel> {
        self.records.iter_mut().map(SimChannel::take).collect()
    }

    /// Empty every record without producing output.
    pub fn clear(&mut self) {
        for record in &mut self.records {
            record.clear();
        }
    }

    // ── Read accessors ─────────────────────────────────────────────────────

    /// Record for `channel`, if the channel is known.
    pub fn get(&self, channel: ChannelId) -> Option<&SimChannel> {
        self.index.get(&channel).map(|&i| &self.records[i])
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no channel is known.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in channel order.
    pub fn iter(&self) -> impl Iterator<Item = &SimChannel> {
        self.records.iter()
    }

    /// Channel numbers in order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.records.iter().map(SimChannel::channel)
    }

    /// Number of channels with at least one contribution.
    pub fn touched(&self) -> usize {
        self.records.iter().filter(|r| !r.is_empty()).count()
    }

    /// Charge summed over every channel and tick.
    pub fn total_charge(&self) -> f64 {
        self.records.iter().map(SimChannel::total_charge).sum()
    }

    fn reindex(&mut self, from: usize) {
        if from == 0 {
            self.index.clear();
            self.index.reserve(self.records.len());
        }
        for (i, record) in self.records.iter().enumerate().skip(from) {
            self.index.insert(record.channel(), i);
        }
    }
}

/// Convert a position in the geometry's length unit into the cm triple stored
/// in records.
pub fn record_position(pos: &Point) -> [f64; 3] {
    pos.scaled(crate::units::CM)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
