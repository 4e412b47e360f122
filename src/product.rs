//! Published output of one cycle.
//!
//! A [`SimChannelProduct`] is the complete, channel-ordered list of records
//! flushed from the sink, tagged with the configured label and the cycle
//! number. Consumers may rely on it holding one record per configured
//! channel, sorted by channel, even when most records are empty.

use crate::geometry::ChannelId;
use crate::simchannel::SimChannel;

/// The records flushed at the end of one cycle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimChannelProduct {
    /// Label the records are published under.
    pub label: String,
    /// Zero-based index of the cycle that produced these records.
    pub cycle: u64,
    /// One record per channel, sorted by channel.
    pub channels: Vec<SimChannel>,
}

impl SimChannelProduct {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True when there are no records at all.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// True when every record is empty.
    pub fn is_blank(&self) -> bool {
        self.channels.iter().all(SimChannel::is_empty)
    }

    /// Record for `channel`.
    pub fn get(&self, channel: ChannelId) -> Option<&SimChannel> {
        self.channels
            .binary_search_by_key(&channel, SimChannel::channel)
            .ok()
            .map(|i| &self.channels[i])
    }

    /// Records with at least one contribution.
    pub fn non_empty(&self) -> impl Iterator<Item = &SimChannel> {
        self.channels.iter().filter(|c| !c.is_empty())
    }

    /// Charge summed over all records.
    pub fn total_charge(&self) -> f64 {
        self.channels.iter().map(SimChannel::total_charge).sum()
    }

    /// Serialise to JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
