//! Drift a handful of simulated tracks through a reference anode and print
//! the per-cycle channel summary.
//!
//! ```bash
//! RUST_LOG=depo_simchannel=debug cargo run --example drift_sim
//! ```

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use depo_simchannel::geometry::{BoundingBox, ReferenceAnode};
use depo_simchannel::services::SplitMix64;
use depo_simchannel::units;
use depo_simchannel::{Depo, DepoSet, DepoSimChannelSink, Point, RandomSource, Registry, SinkConfig};

const NWIRES: u32 = 200;
const PITCH: f64 = 3.0 * units::MM;
const DRIFT_LENGTH: f64 = 2.0 * units::M;

/// Longitudinal and transverse diffusion constants.
const DIFF_LONG: f64 = 4.0 * units::CM * units::CM / units::S;
const DIFF_TRAN: f64 = 8.8 * units::CM * units::CM / units::S;

/// A straight track of `nsteps` deposits, drifted to the anode plane at x = 0.
fn track(
    set: &mut DepoSet,
    rng: &dyn RandomSource,
    cfg: &SinkConfig,
    track_id: i32,
    nsteps: usize,
) {
    let start = Point::new(rng.range(100.0, 1800.0), rng.range(-200.0, 200.0), rng.range(50.0, 250.0));
    let dir = Point::new(rng.normal(0.0, 1.0), rng.normal(0.0, 1.0), rng.normal(0.0, 1.0));
    let norm = dir.dot(&dir).sqrt().max(f64::MIN_POSITIVE);
    let t0 = rng.range(0.0, 500.0 * units::US);

    for step in 0..nsteps {
        let s = step as f64 * 1.0 * units::MM / norm;
        let pos = Point::new(start.x + s * dir.x, start.y + s * dir.y, start.z + s * dir.z);
        let charge = -rng.normal(6000.0, 300.0).abs();
        let origin = Arc::new(
            Depo::new(pos, t0, charge)
                .with_id(track_id)
                .with_energy(rng.range(0.15, 0.25) * units::MEV),
        );

        let drift_time = pos.x / cfg.drift_speed;
        let extent_long = (2.0 * DIFF_LONG * drift_time).sqrt();
        let extent_tran = (2.0 * DIFF_TRAN * drift_time).sqrt();
        let mut drifted = Depo::drifted_from(&origin, Point::new(1.0, pos.y, pos.z), t0 + drift_time, charge);
        drifted.extent_long = extent_long;
        drifted.extent_tran = extent_tran;

        set.keep_alive(origin);
        set.push(Some(Arc::new(drifted)));
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let sensitive = BoundingBox::new(Point::new(0.0, -300.0, -300.0), Point::new(DRIFT_LENGTH, 300.0, 300.0));
    let mut registry = Registry::new();
    registry
        .add_anode("AnodePlane", ReferenceAnode::three_plane(0, sensitive, Point::new(0.0, -150.0, 0.0), PITCH, NWIRES, 0))
        .add_random("Random", Arc::new(SplitMix64::new(2024)));

    let cfg = SinkConfig { use_energy: true, ..SinkConfig::default() };
    let mut sink = match DepoSimChannelSink::configure(cfg, &registry) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("configuration failed: {e}");
            std::process::exit(1);
        }
    };

    for event in 0..3u32 {
        let rng = Arc::clone(sink.random());
        let mut set = DepoSet::new(event);
        for track_id in 1..=4 {
            track(&mut set, rng.as_ref(), sink.config(), track_id, 60);
        }
        sink.process(&set);
        let stats = *sink.stats();
        let product = sink.flush();

        println!(
            "event {event}: {} depos, {} planes skipped, {} of {} channels hit, {:.0} electrons",
            stats.depos,
            stats.planes_skipped,
            product.non_empty().count(),
            product.len(),
            product.total_charge(),
        );
        if let Some(busiest) = product.non_empty().max_by(|a, b| a.total_charge().total_cmp(&b.total_charge())) {
            let tracks = busiest.track_ides(0, u32::MAX);
            println!(
                "  busiest channel {}: {} ticks, {:.0} electrons from {} tracks",
                busiest.channel(),
                busiest.tdc_ides().len(),
                busiest.total_charge(),
                tracks.len(),
            );
        }
    }
}
