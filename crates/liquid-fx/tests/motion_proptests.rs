//! Property-based tests for the motion math

#![allow(clippy::unwrap_used)]

use liquid_fx::config::{merge_overrides, BubbleOptions};
use liquid_fx::effects::{wave_path, BlobParticle, BubbleParticle, TrailChain};
use liquid_fx::rng::DeterministicRng;
use proptest::prelude::*;

// ===== Strategy definitions =====

/// Any phase a running wave can reach, including negative values
fn phase_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(-0.0), -1.0e4f64..1.0e4f64]
}

/// Valid (min, max) size pairs
fn size_range_strategy() -> impl Strategy<Value = (f64, f64)> {
    (1.0f64..500.0, 0.0f64..500.0).prop_map(|(min, extra)| (min, min + extra))
}

proptest! {
    /// Every wave path opens at the baseline and closes along the bottom
    #[test]
    fn prop_wave_path_outline(
        amplitude in 0.0f64..200.0,
        frequency in 0.0f64..0.05,
        phase in phase_strategy(),
    ) {
        let d = wave_path(amplitude, frequency, phase);
        prop_assert!(d.starts_with("M0,160"));
        prop_assert!(d.ends_with(" L1440,320 L0,320 Z"));
        prop_assert!(!d.contains("NaN"));
    }

    /// Blob parameters stay inside their documented ranges
    #[test]
    fn prop_blob_sample_ranges(seed in any::<u64>(), (min, max) in size_range_strategy()) {
        let mut rng = DeterministicRng::new(seed);
        let p = BlobParticle::sample(|| rng.next_f64(), min, max);
        prop_assert!(p.size >= min && p.size <= max);
        prop_assert!((0.0..=100.0).contains(&p.x));
        prop_assert!((0.0..=100.0).contains(&p.y));
        prop_assert!((-1.0..=1.0).contains(&p.phase_x));
        prop_assert!((-1.0..=1.0).contains(&p.phase_y));
        prop_assert!((0.5..=1.0).contains(&p.morph_speed));
        prop_assert!((0.0..=std::f64::consts::TAU).contains(&p.morph_offset));
    }

    /// Blob scale never leaves 1.0 +/- 0.2
    #[test]
    fn prop_blob_scale_bounded(seed in any::<u64>(), index in 0usize..50, t in 0.0f64..1.0e3) {
        let mut rng = DeterministicRng::new(seed);
        let p = BlobParticle::sample(|| rng.next_f64(), 100.0, 400.0);
        let (_, _, sx, sy) = p.pose(index, t);
        prop_assert!((0.8 - 1e-9..=1.2 + 1e-9).contains(&sx));
        prop_assert!((0.8 - 1e-9..=1.2 + 1e-9).contains(&sy));
    }

    /// Bubble delays never exceed their own rise duration
    #[test]
    fn prop_bubble_delay_within_duration(seed in any::<u64>()) {
        let mut rng = DeterministicRng::new(seed);
        let options = BubbleOptions::default();
        let p = BubbleParticle::sample(|| rng.next_f64(), &options);
        prop_assert!(p.delay >= 0.0 && p.delay <= p.duration);
        prop_assert!(p.size >= options.min_size && p.size <= options.max_size);
        prop_assert!((0.0..=100.0).contains(&p.left));
    }

    /// Trail nodes approach a fixed pointer monotonically
    #[test]
    fn prop_trail_monotonic(
        len in 1usize..20,
        smoothing in 0.05f64..0.95,
        x in -2000.0f64..2000.0,
        y in -2000.0f64..2000.0,
    ) {
        prop_assume!(x.abs() > 1.0 || y.abs() > 1.0);
        let mut chain = TrailChain::new(len, smoothing);
        chain.set_pointer(x, y);
        let gap = |p: &(f64, f64)| (x - p.0).hypot(y - p.1);
        let mut previous: Vec<f64> = chain.nodes().iter().map(gap).collect();
        for _ in 0..5 {
            chain.step();
            let current: Vec<f64> = chain.nodes().iter().map(gap).collect();
            for (now, before) in current.iter().zip(&previous) {
                prop_assert!(now <= before);
            }
            previous = current;
        }
    }

    /// Overrides replace exactly the keys they name
    #[test]
    fn prop_override_count(count in 0usize..200) {
        let merged = merge_overrides(&BubbleOptions::default(), &format!("{{\"count\":{count}}}")).unwrap();
        prop_assert_eq!(merged.count, count);
        prop_assert_eq!(merged.min_size, BubbleOptions::default().min_size);
    }
}
