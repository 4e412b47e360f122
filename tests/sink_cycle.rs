//! End-to-end sink behaviour over whole cycles.
//!
//! Drives a `DepoSimChannelSink` over the single-face reference anode
//! (100 wires per plane, 3 mm pitch, channels U 0–99, V 100–199, W 200–299)
//! and checks what lands in the flushed records.

use std::sync::Arc;

use depo_simchannel::geometry::{BoundingBox, ReferenceAnode};
use depo_simchannel::services::SplitMix64;
use depo_simchannel::units;
use depo_simchannel::{
    Depo, DepoSet, DepoSimChannelSink, Point, Registry, SimChannel, SinkConfig, TruncationPolicy,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const PITCH: f64 = 3.0 * units::MM;
const NWIRES: u32 = 100;

fn registry() -> Registry<ReferenceAnode> {
    let sensitive = BoundingBox::new(Point::new(0.0, -300.0, -300.0), Point::new(2000.0, 300.0, 300.0));
    let mut reg = Registry::new();
    reg.add_anode("AnodePlane", ReferenceAnode::three_plane(0, sensitive, Point::default(), PITCH, NWIRES, 0))
        .add_random("Random", Arc::new(SplitMix64::new(11)));
    reg
}

fn sink(cfg: SinkConfig) -> DepoSimChannelSink<ReferenceAnode> {
    DepoSimChannelSink::configure(cfg, &registry()).unwrap()
}

fn w_records(s: &DepoSimChannelSink<ReferenceAnode>) -> Vec<&SimChannel> {
    s.accumulator().iter().filter(|r| r.channel() >= 2 * NWIRES).collect()
}

fn assert_complete_and_sorted(channels: &[SimChannel]) {
    assert_eq!(channels.len(), 3 * NWIRES as usize, "every channel must be published");
    assert!(
        channels.windows(2).all(|w| w[0].channel() < w[1].channel()),
        "records must be in channel order"
    );
    for record in channels {
        assert!(
            record.tdc_ides().windows(2).all(|w| w[0].tdc < w[1].tdc),
            "channel {} ticks out of order",
            record.channel()
        );
    }
}

// ── Cycles ───────────────────────────────────────────────────────────────────

#[test]
fn test_zero_depo_cycle_publishes_every_channel() {
    let mut s = sink(SinkConfig::default());
    let product = s.flush();
    assert_complete_and_sorted(&product.channels);
    assert!(product.is_blank());
    assert_eq!(product.label, "simpleSC");
    assert_eq!(product.cycle, 0);
    assert_eq!(s.flush().cycle, 1);
}

#[test]
fn test_double_flush_second_is_blank() {
    let mut s = sink(SinkConfig::default());
    let t = s.time_binning().center(1500);
    s.save_as_simchannel(&Depo::new(Point::new(100.0, 0.0, 60.0), t, -5000.0).with_extent(1.0, 1.0));

    let first = s.flush();
    assert!(!first.is_blank());
    assert_complete_and_sorted(&first.channels);

    let second = s.flush();
    assert_complete_and_sorted(&second.channels);
    assert!(second.is_blank(), "records must be reset by the first flush");
    let a: Vec<_> = first.channels.iter().map(SimChannel::channel).collect();
    let b: Vec<_> = second.channels.iter().map(SimChannel::channel).collect();
    assert_eq!(a, b);
}

#[test]
fn test_contributions_do_not_leak_across_cycles() {
    let mut s = sink(SinkConfig::default());
    let t = s.time_binning().center(1500);
    let depo = Depo::new(Point::new(100.0, 0.0, 60.0), t, -5000.0).with_extent(1.0, 1.0);

    s.save_as_simchannel(&depo);
    let first = s.flush();
    s.save_as_simchannel(&depo);
    let second = s.flush();

    assert!((first.total_charge() - second.total_charge()).abs() < 1e-6);
    assert_eq!(second.cycle, first.cycle + 1);
}

// ── Deposits ─────────────────────────────────────────────────────────────────

#[test]
fn test_delta_depo_lands_on_one_cell_per_plane() {
    let mut s = sink(SinkConfig::default());
    let t = s.time_binning().center(2500);
    // y = 0 puts every plane's pitch coordinate on z / 2 or z.
    let depo = Depo::new(Point::new(500.0, 0.0, 20.0 * PITCH), t, -8000.0).with_id(5);
    s.save_as_simchannel(&depo);

    let product = s.flush();
    let touched: Vec<_> = product.non_empty().map(SimChannel::channel).collect();
    assert_eq!(touched, vec![10, 110, 220]);
    for record in product.non_empty() {
        assert_eq!(record.tdc_ides().len(), 1, "channel {}", record.channel());
        assert!((record.total_charge() - 8000.0).abs() < 1e-9);
        assert_eq!(record.tdc_ides()[0].ides[0].track_id, 5);
    }
}

#[test]
fn test_tiny_extent_depo_lands_on_one_cell_per_plane() {
    let mut s = sink(SinkConfig::default());
    let t = s.time_binning().center(2500);
    let depo = Depo::new(Point::new(500.0, 0.0, 20.0 * PITCH), t, -8000.0)
        .with_extent(1e-6 * units::MM, 1e-6 * units::MM)
        .with_id(6);
    s.save_as_simchannel(&depo);

    let product = s.flush();
    let touched: Vec<_> = product.non_empty().map(SimChannel::channel).collect();
    assert_eq!(touched, vec![10, 110, 220]);
    for record in product.non_empty() {
        assert_eq!(record.tdc_ides().len(), 1, "channel {}", record.channel());
        assert!(
            (record.total_charge() - 8000.0).abs() < 1e-6,
            "channel {}: {}",
            record.channel(),
            record.total_charge()
        );
    }
}

#[test]
fn test_same_cell_contributions_add() {
    let mut once = sink(SinkConfig::default());
    let mut twice = sink(SinkConfig::default());
    let t = once.time_binning().center(800);
    let depo = Depo::new(Point::new(300.0, 10.0, 90.0), t, -3000.0).with_extent(2.0, 1.5).with_id(2);

    once.save_as_simchannel(&depo);
    twice.save_as_simchannel(&depo);
    twice.save_as_simchannel(&depo);

    for (a, b) in once.accumulator().iter().zip(twice.accumulator().iter()) {
        assert_eq!(a.channel(), b.channel());
        assert_eq!(a.tdc_ides().len(), b.tdc_ides().len());
        for (ta, tb) in a.tdc_ides().iter().zip(b.tdc_ides()) {
            assert_eq!(ta.tdc, tb.tdc);
            assert_eq!(tb.ides.len(), 1, "same track must merge into one entry");
            assert!((2.0 * ta.ides[0].num_electrons - tb.ides[0].num_electrons).abs() < 1e-9);
        }
    }
}

#[test]
fn test_depo_beyond_nsigma_in_time_contributes_nothing() {
    let mut s = sink(SinkConfig::default());
    let drift_speed = s.config().drift_speed;
    let tmax = s.time_binning().max();
    // sigma_t = 1 µs; centre 5 sigma past the end of the window.
    let depo = Depo::new(Point::new(100.0, 0.0, 60.0), tmax + 5.0 * units::US, -1e5)
        .with_extent(1.0 * units::US * drift_speed, 1.0);
    s.save_as_simchannel(&depo);

    assert_eq!(s.accumulator().touched(), 0);
    assert_eq!(s.stats().planes_skipped, 3);
    assert!(s.flush().is_blank());
}

#[test]
fn test_uncontained_depo_skipped_silently() {
    let mut s = sink(SinkConfig::default());
    let t = s.time_binning().center(100);
    s.save_as_simchannel(&Depo::new(Point::new(2500.0, 0.0, 0.0), t, -1e5).with_extent(1.0, 1.0));
    assert_eq!(s.stats().uncontained, 1);
    assert!(s.flush().is_blank());
}

#[test]
fn test_plane_time_offset_shifts_ticks() {
    let mut plain = sink(SinkConfig::default());
    let mut shifted = sink(SinkConfig { y_time_offset: 10.0 * units::US, ..SinkConfig::default() });
    let t = plain.time_binning().center(4000);
    let depo = Depo::new(Point::new(100.0, 0.0, 30.0 * PITCH), t, -2000.0);
    plain.save_as_simchannel(&depo);
    shifted.save_as_simchannel(&depo);

    let w = |s: &DepoSimChannelSink<ReferenceAnode>, ch| s.accumulator().get(ch).unwrap().tdc_ides()[0].tdc;
    // 10 µs at 0.5 µs per tick.
    assert_eq!(w(&shifted, 230), w(&plain, 230) + 20);
    // Induction planes are not shifted.
    assert_eq!(w(&shifted, 15), w(&plain, 15));
}

#[test]
fn test_extra_sigma_never_narrows() {
    let base = SinkConfig { min_charge: 0.0, ..SinkConfig::default() };
    let mut plain = sink(base.clone());
    let mut wide = sink(SinkConfig { use_extra_sigma: true, ..base });
    let t = plain.time_binning().center(3000);
    let depo = Depo::new(Point::new(100.0, 0.0, 150.0), t, -1e4).with_extent(0.8, 0.6);
    plain.save_as_simchannel(&depo);
    wide.save_as_simchannel(&depo);

    let span = |records: Vec<&SimChannel>| -> usize { records.iter().map(|r| r.tdc_ides().len()).sum() };
    let plain_cells = span(w_records(&plain));
    let wide_cells = span(w_records(&wide));
    assert!(wide_cells >= plain_cells, "plain={plain_cells} wide={wide_cells}");
    assert!(wide.accumulator().touched() >= plain.accumulator().touched());
}

// ── Truncation ───────────────────────────────────────────────────────────────

/// At y = 100, z = 30 the V pitch is about −72 mm, far outside its wires,
/// while U and W are well inside.
fn v_out_of_reach(s: &DepoSimChannelSink<ReferenceAnode>) -> Depo {
    let t = s.time_binning().center(2000);
    Depo::new(Point::new(100.0, 100.0, 30.0), t, -5000.0).with_extent(1.0, 1.0)
}

#[test]
fn test_skip_plane_continues_with_next_plane() {
    let mut s = sink(SinkConfig::default());
    let depo = v_out_of_reach(&s);
    s.save_as_simchannel(&depo);

    let touched: Vec<_> = s.accumulator().iter().filter(|r| !r.is_empty()).map(SimChannel::channel).collect();
    assert!(touched.iter().any(|&c| c < NWIRES), "U must be filled");
    assert!(!touched.iter().any(|&c| (NWIRES..2 * NWIRES).contains(&c)), "V must be empty");
    assert!(touched.iter().any(|&c| c >= 2 * NWIRES), "W must be filled");
    assert_eq!(s.stats().planes_skipped, 1);
}

#[test]
fn test_skip_face_abandons_remaining_planes() {
    let mut s = sink(SinkConfig { truncation: TruncationPolicy::SkipFace, ..SinkConfig::default() });
    let depo = v_out_of_reach(&s);
    s.save_as_simchannel(&depo);

    let touched: Vec<_> = s.accumulator().iter().filter(|r| !r.is_empty()).map(SimChannel::channel).collect();
    assert!(touched.iter().any(|&c| c < NWIRES), "U is processed before the miss");
    assert!(touched.iter().all(|&c| c < NWIRES), "nothing after the missed plane: {touched:?}");
}

// ── Deposit sets ─────────────────────────────────────────────────────────────

#[test]
fn test_process_passes_set_through_and_skips_nulls() {
    let mut s = sink(SinkConfig::default());
    let t = s.time_binning().center(1200);
    let mut set = DepoSet::new(4);
    set.push(None);
    set.push(Some(Arc::new(Depo::new(Point::new(100.0, 0.0, 60.0), t, -4000.0))));
    set.push(None);

    let out = s.process(&set);
    assert!(std::ptr::eq(out, &set));
    assert_eq!(s.stats().null_depos, 2);
    assert_eq!(s.stats().depos, 1);
    assert_eq!(s.accumulator().touched(), 3);
}

#[test]
fn test_drifted_depos_attributed_to_their_origin() {
    let mut s = sink(SinkConfig { use_energy: true, ..SinkConfig::default() });
    let t = s.time_binning().center(1200);

    let mut set = DepoSet::new(9);
    let step = Arc::new(Depo::new(Point::new(1500.0, 20.0, -40.0), 0.0, -4000.0).with_id(17).with_energy(0.25));
    let drifted = Depo::drifted_from(&step, Point::new(100.0, 0.0, 60.0), t, -4000.0);
    set.keep_alive(step);
    set.push(Some(Arc::new(drifted)));
    s.process(&set);

    let record = s.accumulator().get(220).unwrap();
    let ide = &record.tdc_ides()[0].ides[0];
    assert_eq!(ide.track_id, 17);
    assert_eq!([ide.x, ide.y, ide.z], [150.0, 2.0, -4.0]);
    assert!((record.total_energy() - 0.25).abs() < 1e-9);
}

#[test]
fn test_multiple_anodes_share_one_map() {
    let mut reg = registry();
    let second = BoundingBox::new(Point::new(-2000.0, -300.0, -300.0), Point::new(-1.0, 300.0, 300.0));
    reg.add_anode(
        "AnodePlane:1",
        ReferenceAnode::three_plane(1, second, Point::default(), PITCH, NWIRES, 3 * NWIRES),
    );
    let cfg = SinkConfig {
        anodes_tn: vec!["AnodePlane".into(), "AnodePlane:1".into()],
        ..SinkConfig::default()
    };
    let mut s = DepoSimChannelSink::configure(cfg, &reg).unwrap();
    let t = s.time_binning().center(1000);
    s.save_as_simchannel(&Depo::new(Point::new(-100.0, 0.0, 60.0), t, -3000.0));

    let product = s.flush();
    assert_eq!(product.len(), 6 * NWIRES as usize);
    let touched: Vec<_> = product.non_empty().map(SimChannel::channel).collect();
    assert_eq!(touched, vec![310, 410, 520]);
}
