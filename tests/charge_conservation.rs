//! Property tests: charge and energy conservation.
//!
//! With the charge threshold at zero, a deposit whose cloud sits wholly
//! inside the readout window puts exactly its charge magnitude on every
//! plane, and with energy accounting on, exactly its energy.

use std::sync::Arc;

use proptest::prelude::*;

use depo_simchannel::binning::Binning;
use depo_simchannel::geometry::{BoundingBox, ReferenceAnode};
use depo_simchannel::services::SplitMix64;
use depo_simchannel::units;
use depo_simchannel::{
    Depo, DepoSimChannelSink, GausDesc, GaussianDiffusion, Point, Registry, Sampling, SinkConfig,
};

const NWIRES: u32 = 100;

fn sink(cfg: SinkConfig) -> DepoSimChannelSink<ReferenceAnode> {
    let sensitive = BoundingBox::new(Point::new(0.0, -300.0, -300.0), Point::new(2000.0, 300.0, 300.0));
    let mut reg = Registry::new();
    reg.add_anode("AnodePlane", ReferenceAnode::three_plane(0, sensitive, Point::default(), 3.0, NWIRES, 0))
        .add_random("Random", Arc::new(SplitMix64::new(5)));
    DepoSimChannelSink::configure(cfg, &reg).unwrap()
}

fn plane_sums(s: &DepoSimChannelSink<ReferenceAnode>, f: impl Fn(&depo_simchannel::SimChannel) -> f64) -> [f64; 3] {
    let mut sums = [0.0; 3];
    for record in s.accumulator().iter() {
        sums[(record.channel() / NWIRES) as usize] += f(record);
    }
    sums
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_patch_sums_to_charge(
        charge in -1e6f64..-1.0,
        t0 in 10.0f64..90.0,
        p0 in 3.0f64..17.0,
        sigma_t in prop_oneof![Just(0.0), 0.5f64..4.0],
        sigma_p in prop_oneof![Just(0.0), 0.5f64..2.0],
        nsigma in 1.0f64..5.0,
        sub_t in 0u32..4,
        sub_p in 0u32..4,
    ) {
        let tbins = Binning::new(100, 0.0, 100.0);
        let pbins = Binning::new(20, -0.5, 19.5);
        let gd = GaussianDiffusion::new(charge, GausDesc::new(t0, sigma_t), GausDesc::new(p0, sigma_p));
        let patch = gd.patch(&tbins, &pbins, nsigma, Sampling { time: sub_t, pitch: sub_p });
        prop_assert!(!patch.is_empty());
        prop_assert!((patch.sum() - charge).abs() <= 1e-9 * charge.abs());
        for (p, t, _) in patch.cells() {
            prop_assert!(pbins.in_range(p) && tbins.in_range(t));
        }
    }

    #[test]
    fn prop_sink_conserves_charge_per_plane(
        charge in 10.0f64..1e5,
        x in 10.0f64..1900.0,
        y in -20.0f64..20.0,
        z in 100.0f64..200.0,
        tbin in 100i32..9000,
        extent_long in 0.0f64..5.0,
        extent_tran in 0.0f64..5.0,
    ) {
        let mut s = sink(SinkConfig { min_charge: 0.0, ..SinkConfig::default() });
        let t = s.time_binning().center(tbin);
        let depo = Depo::new(Point::new(x, y, z), t, -charge).with_extent(extent_long, extent_tran);
        s.save_as_simchannel(&depo);

        for (plane, sum) in plane_sums(&s, |r| r.total_charge()).iter().enumerate() {
            prop_assert!((sum - charge).abs() <= 1e-9 * charge, "plane {}: {} != {}", plane, sum, charge);
        }
        prop_assert_eq!(s.stats().planes_skipped, 0);
        prop_assert_eq!(s.stats().cells_out_of_range, 0);
    }

    #[test]
    fn prop_sink_conserves_energy_per_plane(
        energy in 0.01f64..10.0,
        y in -20.0f64..20.0,
        z in 100.0f64..200.0,
        extent_tran in 0.5f64..3.0,
    ) {
        let cfg = SinkConfig { min_charge: 0.0, use_energy: true, use_extra_sigma: true, ..SinkConfig::default() };
        let mut s = sink(cfg);
        let t = s.time_binning().center(4000);
        let depo = Depo::new(Point::new(500.0, y, z), t, -2e4)
            .with_extent(1.0 * units::MM, extent_tran)
            .with_energy(energy * units::MEV);
        s.save_as_simchannel(&depo);

        for sum in plane_sums(&s, |r| r.total_energy()) {
            prop_assert!((sum - energy).abs() <= 1e-9 * energy.max(1.0), "{} != {}", sum, energy);
        }
    }
}
