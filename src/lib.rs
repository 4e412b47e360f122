//! # depo-simchannel
//!
//! Gaussian diffusion of ionization deposits onto sense-wire channels.
//!
//! ---
//!
//! ## What it does
//!
//! A drifted ionization deposit arrives at the anode as a cloud of electrons,
//! smeared in time (longitudinally) and across wires (transversely). For each
//! wire plane that can see the deposit, the cloud is modelled as a 2-D
//! Gaussian over `time × pitch`, integrated over readout ticks and wire pitch
//! bins, and the resulting charge is recorded per channel and tick, together
//! with the track it came from, its energy share and where it started.
//!
//! Records persist across the deposits of one cycle. At the end of the cycle
//! [`DepoSimChannelSink::flush`] publishes one record for every configured
//! channel, in channel order, and resets them for the next cycle.
//!
//! ## The pipeline
//!
//! ```text
//! DepoSet → DepoSimChannelSink::process → (Anode → Face → WirePlane)
//!                    │                                  │
//!                    │                       GaussianDiffusion::patch
//!                    ▼                                  │
//!          SimChannelProduct ◄── flush ◄── ChannelAccumulator
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`units`] | | System of units (mm, ns, electrons, MeV) |
//! | [`binning`] | [`Binning`] | Uniform 1-D binning |
//! | [`gauss`] | [`GausDesc`] | 1-D Gaussian: sampling and bin integrals |
//! | [`depo`] | [`Depo`], [`DepoSet`] | Ionization deposits and their prior chain |
//! | [`geometry`] | [`Anode`], [`AnodeFace`], [`WirePlane`] | Geometry provider traits and a planar reference geometry |
//! | [`diffusion`] | [`GaussianDiffusion`], [`Patch`] | Per-deposit 2-D charge patch, empirical extra sigma |
//! | [`simchannel`] | [`SimChannel`] | Per-channel, per-tick charge record |
//! | [`accumulator`] | [`ChannelAccumulator`] | Persistent channel-keyed record map |
//! | [`config`] | [`SinkConfig`] | Configuration, defaults and validation |
//! | [`services`] | [`ComponentResolver`], [`Registry`] | Named anode and random-source lookup |
//! | [`sink`] | [`DepoSimChannelSink`] | Deposit processor and cycle manager |
//! | [`product`] | [`SimChannelProduct`] | Published output of one cycle |
//! | [`error`] | [`ConfigError`] | Configuration errors |
//!
//! ## Features
//!
//! - `serde`: serialisation of configuration and records, and
//!   [`SinkConfig::from_json`].
//! - `python-ffi`: PyO3 bindings (see `ffi`).
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.
//! Configuration is logged at `info`, each flush at `debug`, and per-deposit
//! decisions at `trace`.
//!
//! ## License
//!
//! Business Source License 1.1.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod units;
pub mod binning;
pub mod gauss;
pub mod depo;
pub mod geometry;
pub mod diffusion;
pub mod simchannel;
pub mod accumulator;
pub mod config;
pub mod error;
pub mod services;
pub mod product;
pub mod sink;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use accumulator::ChannelAccumulator;
pub use binning::Binning;
pub use config::{SinkConfig, TruncationPolicy};
pub use depo::{Depo, DepoSet, Point};
pub use diffusion::{ExtraSigma, GaussianDiffusion, Patch, Sampling};
pub use error::{ConfigError, ConfigResult};
pub use gauss::GausDesc;
pub use geometry::{Anode, AnodeFace, ChannelId, PlaneIndex, WirePlane};
pub use product::SimChannelProduct;
pub use services::{ComponentResolver, RandomSource, Registry};
pub use simchannel::{Ide, SimChannel, TdcIde, TrackIde};
pub use sink::{CycleStats, DepoSimChannelSink};
