use crate::*;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + (self.next_u64() % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }

    fn gen_height(&mut self) -> f64 {
        self.gen_range_u64(20, 600) as f64
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn expected_average(heights: &[Option<f64>], min_average: f64) -> f64 {
    let measured: Vec<f64> = heights.iter().flatten().copied().collect();
    if measured.is_empty() {
        return min_average;
    }
    let mean = measured.iter().sum::<f64>() / measured.len() as f64;
    mean.max(min_average)
}

fn expected_offsets(heights: &[Option<f64>], min_average: f64) -> Vec<f64> {
    let avg = expected_average(heights, min_average);
    let mut out = Vec::with_capacity(heights.len() + 1);
    let mut acc = 0.0;
    out.push(acc);
    for h in heights {
        acc += h.unwrap_or(avg);
        out.push(acc);
    }
    out
}

fn feed(count: usize, viewport: f64) -> FeedVirtualizer {
    let mut v = FeedVirtualizer::new(FeedOptions::new().with_initial_viewport_height(viewport));
    v.set_count(count);
    v
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(&FeedVirtualizer) + Send + Sync + 'static) {
    let calls = Arc::new(AtomicUsize::new(0));
    let cb = {
        let calls = Arc::clone(&calls);
        move |_: &FeedVirtualizer| {
            calls.fetch_add(1, Ordering::Relaxed);
        }
    };
    (calls, cb)
}

#[test]
fn repeated_measurement_does_not_invalidate_offsets() {
    let mut heights = HeightCache::new(20, 100.0, 2.0);
    let mut offsets = OffsetCache::new();

    let stale = heights.record_height(5, 120.0).unwrap();
    offsets.invalidate_from(stale);
    offsets.offset_of(&heights, 20);
    assert_eq!(offsets.memoized_len(), 21);

    // Same value, then a sub-epsilon wobble: both rejected, memo untouched.
    assert_eq!(heights.record_height(5, 120.0), None);
    assert_eq!(heights.record_height(5, 121.5), None);
    assert_eq!(offsets.memoized_len(), 21);
    assert_eq!(heights.measured_height(5), Some(120.0));

    // Beyond epsilon is accepted.
    assert!(heights.record_height(5, 130.0).is_some());
    assert_eq!(heights.measured_height(5), Some(130.0));
}

#[test]
fn average_height_is_floored() {
    let mut heights = HeightCache::new(4, 100.0, 2.0);
    assert_eq!(heights.average_height(), 100.0);

    heights.record_height(0, 40.0);
    assert_eq!(heights.average_height(), 100.0);
    assert_eq!(heights.estimate_height(1), 100.0);

    heights.record_height(1, 460.0);
    assert_eq!(heights.average_height(), 250.0);
    assert_eq!(heights.estimate_height(3), 250.0);
    assert_eq!(heights.estimate_height(0), 40.0);
}

#[test]
fn anomalous_measurements_are_ignored() {
    let mut heights = HeightCache::new(3, 100.0, 2.0);
    assert_eq!(heights.record_height(0, 0.0), None);
    assert_eq!(heights.record_height(0, -12.0), None);
    assert_eq!(heights.record_height(0, f64::NAN), None);
    assert_eq!(heights.record_height(0, f64::INFINITY), None);
    assert_eq!(heights.record_height(3, 50.0), None);
    assert_eq!(heights.measured_count(), 0);

    let mut v = feed(3, 500.0);
    assert!(!v.measure(1, 0.0));
    assert!(!v.measure(7, 150.0));
    assert!(!v.needs_frame());
}

#[test]
fn moved_average_invalidates_from_first_unmeasured_item() {
    let mut heights = HeightCache::new(10, 100.0, 2.0);
    assert_eq!(heights.record_height(0, 300.0), Some(0));
    // Item 1 is still estimated from the average, which moves from 300 to 250.
    assert_eq!(heights.record_height(6, 200.0), Some(1));

    // Average pinned at the floor: only downstream offsets are stale.
    let mut floored = HeightCache::new(10, 100.0, 2.0);
    assert_eq!(floored.record_height(0, 50.0), Some(0));
    assert_eq!(floored.record_height(6, 60.0), Some(6));
}

#[test]
fn offsets_are_prefix_sums_of_measured_and_estimated_heights() {
    let mut rng = Lcg::new(7);
    for _case in 0..50 {
        let count = rng.gen_range_usize(0, 120);
        let mut heights = HeightCache::new(count, 100.0, 2.0);
        let mut mirror = alloc::vec![None; count];
        for (i, slot) in mirror.iter_mut().enumerate() {
            if rng.gen_bool() {
                let h = rng.gen_height();
                heights.record_height(i, h);
                *slot = Some(h);
            }
        }

        let offsets = OffsetCache::new();
        let expected = expected_offsets(&mirror, 100.0);
        for k in 0..=count {
            assert!(
                close(offsets.offset_of(&heights, k), expected[k]),
                "k={k} got={} expected={}",
                offsets.offset_of(&heights, k),
                expected[k]
            );
        }
        assert!(close(offsets.total_height(&heights, count), expected[count]));
    }
}

#[test]
fn invalidation_leaves_no_stale_offsets() {
    let mut rng = Lcg::new(42);
    let count = 200usize;
    let mut heights = HeightCache::new(count, 100.0, 2.0);
    let mut offsets = OffsetCache::new();
    let mut mirror = alloc::vec![None; count];

    for _step in 0..400 {
        // Warm a random prefix so there is something to go stale.
        offsets.offset_of(&heights, rng.gen_range_usize(0, count + 1));

        let i = rng.gen_range_usize(0, count);
        let h = rng.gen_height();
        if let Some(stale) = heights.record_height(i, h) {
            offsets.invalidate_from(stale);
            mirror[i] = Some(h);
        }

        let expected = expected_offsets(&mirror, 100.0);
        for j in (i + 1)..=count {
            assert!(close(offsets.offset_of(&heights, j), expected[j]), "j={j}");
        }
    }
}

#[test]
fn zero_items_have_no_extent() {
    let heights = HeightCache::new(0, 100.0, 2.0);
    let offsets = OffsetCache::new();
    assert_eq!(offsets.total_height(&heights, 0), 0.0);
    assert_eq!(
        compute_range(&heights, &offsets, 0.0, 800.0, 0, 3),
        VisibleRange::EMPTY
    );

    let v = feed(0, 800.0);
    assert_eq!(v.total_extent(), 0.0);
    assert!(v.visible_items().is_empty());
    assert_eq!(v.item_placement(0), None);
}

#[test]
fn range_walks_to_first_item_past_scroll_top() {
    let heights = HeightCache::new(10, 100.0, 2.0);
    let offsets = OffsetCache::new();

    let r = compute_range(&heights, &offsets, 0.0, 250.0, 10, 0);
    assert_eq!((r.start_index, r.end_index), (0, 3));

    let r = compute_range(&heights, &offsets, 150.0, 250.0, 10, 0);
    assert_eq!((r.start_index, r.end_index), (1, 5));

    // An item ending exactly at scroll_top is no longer visible.
    let r = compute_range(&heights, &offsets, 100.0, 250.0, 10, 0);
    assert_eq!(r.start_index, 1);

    let r = compute_range(&heights, &offsets, 150.0, 250.0, 10, 2);
    assert_eq!((r.start_index, r.end_index), (0, 7));

    // Everything fits.
    let r = compute_range(&heights, &offsets, 0.0, 5000.0, 10, 2);
    assert_eq!((r.start_index, r.end_index), (0, 10));

    let negative = compute_range(&heights, &offsets, -40.0, 250.0, 10, 1);
    let zero = compute_range(&heights, &offsets, 0.0, 250.0, 10, 1);
    assert_eq!(negative, zero);
}

#[test]
fn range_is_monotonic_in_scroll_top() {
    let mut rng = Lcg::new(99);
    for _case in 0..30 {
        let count = rng.gen_range_usize(1, 150);
        let mut heights = HeightCache::new(count, 100.0, 2.0);
        for i in 0..count {
            if rng.gen_bool() {
                heights.record_height(i, rng.gen_height());
            }
        }
        let offsets = OffsetCache::new();
        let viewport = rng.gen_range_u64(0, 1200) as f64;
        let overscan = rng.gen_range_usize(0, 5);
        let total = offsets.total_height(&heights, count);

        let mut prev = compute_range(&heights, &offsets, 0.0, viewport, count, overscan);
        let mut top = 0.0;
        while top < total + 500.0 {
            top += rng.gen_range_u64(1, 90) as f64;
            let r = compute_range(&heights, &offsets, top, viewport, count, overscan);
            assert!(r.start_index >= prev.start_index, "top={top}");
            assert!(r.end_index >= prev.end_index, "top={top}");
            assert!(r.start_index <= r.end_index && r.end_index <= count);
            prev = r;
        }
    }
}

#[test]
fn placements_stack_in_a_single_column() {
    let mut v = feed(30, 600.0);
    v.measure_many([(0, 250.0), (1, 80.0), (4, 400.0)]);
    v.on_animation_frame(16);

    let mut expected_top = 0.0;
    for i in 0..30 {
        let p = v.item_placement(i).unwrap();
        assert!(close(p.top, expected_top), "i={i}");
        assert!(p.animate);
        expected_top = p.bottom();
    }
    assert!(close(v.total_extent(), expected_top));
    assert!(v.item_placement(1).unwrap().measured);
    assert!(!v.item_placement(2).unwrap().measured);
}

#[test]
fn measurements_refresh_once_per_frame() {
    let (calls, cb) = counter();
    let mut v = feed(100, 500.0);
    v.set_on_change(Some(cb));

    let before = v.visible_range();
    for i in 0..6 {
        assert!(v.measure(i, 40.0 + i as f64 * 10.0));
    }
    assert_eq!(calls.load(Ordering::Relaxed), 0);
    assert_eq!(v.visible_range(), before);
    assert!(v.needs_frame());

    // Offsets are already fresh even though the snapshot is not.
    assert!(close(v.item_placement(1).unwrap().top, 40.0));

    v.on_animation_frame(16);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_ne!(v.visible_range(), before);
    assert!(!v.needs_frame());

    v.on_animation_frame(32);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn unmeasured_items_keep_the_running_average() {
    let mut v = feed(5, 300.0);
    for i in [0usize, 1, 3, 4] {
        v.measure(i, 300.0);
    }
    v.on_animation_frame(16);
    assert_eq!(v.item_placement(2).unwrap().height, 300.0);
    assert!(close(v.total_extent(), 1500.0));
}

#[test]
fn forced_remeasure_is_throttled_per_index() {
    let mut v = feed(20, 500.0);
    v.measure(3, 300.0);
    v.on_animation_frame(0);

    assert!(v.force_remeasure(3, 1000));
    assert!(!v.is_measured(3));

    v.measure(3, 320.0);
    v.on_animation_frame(1010);
    assert!(!v.force_remeasure(3, 1020));
    assert!(v.is_measured(3));

    // Other indexes have their own window.
    v.measure(4, 200.0);
    assert!(v.force_remeasure(4, 1020));

    v.on_animation_frame(1040);
    assert!(v.is_measured(3));
    v.on_animation_frame(1050);
    assert!(!v.is_measured(3));
    assert!(!v.needs_frame());

    assert!(v.force_remeasure(3, 1200));
}

#[test]
fn forced_remeasure_rederives_extent_immediately() {
    let mut v = feed(4, 1000.0);
    v.measure(0, 700.0);
    v.measure(1, 100.0);
    v.on_animation_frame(0);
    // avg = 400: 700 + 100 + 400 + 400
    assert!(close(v.total_extent(), 1600.0));

    assert!(v.force_remeasure(0, 100));
    // Only item 1 (100px) is left, so every estimate drops to the 100px floor.
    assert!(close(v.total_extent(), 400.0));
}

#[test]
fn scroll_to_index_aligns_and_animates() {
    let mut v = feed(50, 300.0);
    assert_eq!(v.scroll_to_index_offset(10, Align::Start), 1000.0);
    assert_eq!(v.scroll_to_index_offset(10, Align::Center), 900.0);
    assert_eq!(v.scroll_to_index_offset(10, Align::End), 800.0);
    // Clamped to the scrollable range.
    assert_eq!(v.scroll_to_index_offset(49, Align::Start), 4700.0);
    assert_eq!(v.scroll_to_index_offset(0, Align::End), 0.0);

    let to = v.scroll_to_index(10, Align::Start, 0);
    assert_eq!(to, 1000.0);
    assert!(v.is_animating());

    let mut last = 0.0;
    let mut now_ms = 0u64;
    while v.is_animating() {
        now_ms += 16;
        let off = v.on_animation_frame(now_ms).unwrap();
        assert!(off >= last);
        last = off;
    }
    assert_eq!(v.scroll_offset(), 1000.0);
    assert_eq!(v.visible_range().start_index, 7);

    // A user scroll cancels an in-flight animation.
    v.scroll_to_index(30, Align::Start, now_ms);
    v.apply_scroll_event(1200.0, now_ms + 5);
    assert!(!v.is_animating());
    assert_eq!(v.on_animation_frame(now_ms + 16), None);
    assert_eq!(v.scroll_offset(), 1200.0);
}

#[test]
fn scroll_to_top_suspends_transitions_for_one_pass() {
    let (calls, cb) = counter();
    let mut v = feed(100, 500.0);
    v.apply_scroll_event(2000.0, 0);
    v.set_on_change(Some(cb));
    assert!(v.offsets().memoized_len() > 0);

    v.scroll_to_top(10);
    assert_eq!(v.scroll_offset(), 0.0);
    assert_eq!(v.visible_items(), alloc::vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(v.offsets().memoized_len(), 0);
    assert!(!v.transitions_enabled());
    assert!(!v.item_placement(0).unwrap().animate);
    assert_eq!(calls.load(Ordering::Relaxed), 1);

    // Measurement pass.
    v.on_animation_frame(16);
    assert!(!v.transitions_enabled());
    // Raw end is one past the item crossing the viewport bottom, padded by the overscan.
    assert_eq!(v.visible_range(), VisibleRange { start_index: 0, end_index: 9 });

    v.on_animation_frame(32);
    assert!(v.transitions_enabled());
    assert!(v.item_placement(0).unwrap().animate);
    assert!(!v.needs_frame());
}

#[test]
fn load_more_fires_once_per_approach() {
    let loads = Arc::new(AtomicUsize::new(0));
    let opts = FeedOptions::new()
        .with_initial_viewport_height(500.0)
        .with_load_more_threshold_px(200.0)
        .with_on_load_more(Some({
            let loads = Arc::clone(&loads);
            move || {
                loads.fetch_add(1, Ordering::Relaxed);
            }
        }));
    let mut v = FeedVirtualizer::new(opts);
    v.set_data_source(DataSource::new(10).with_has_more(true));
    // 1000px of content, 500px remaining below the fold.
    assert_eq!(loads.load(Ordering::Relaxed), 0);

    v.apply_scroll_event(400.0, 0);
    assert_eq!(loads.load(Ordering::Relaxed), 1);
    v.apply_scroll_event(450.0, 10);
    v.apply_scroll_event(500.0, 20);
    assert_eq!(loads.load(Ordering::Relaxed), 1);

    v.set_data_source(DataSource::new(10).with_has_more(true).with_loading(true));
    v.set_data_source(DataSource::new(20).with_has_more(true));
    assert_eq!(loads.load(Ordering::Relaxed), 1);

    v.apply_scroll_event(1400.0, 30);
    assert_eq!(loads.load(Ordering::Relaxed), 2);

    // Leaving and re-entering the threshold is a new approach.
    v.apply_scroll_event(200.0, 40);
    v.apply_scroll_event(1450.0, 50);
    assert_eq!(loads.load(Ordering::Relaxed), 3);
}

#[test]
fn load_more_respects_loading_and_has_more_guards() {
    let loads = Arc::new(AtomicUsize::new(0));
    let mut v = FeedVirtualizer::new(
        FeedOptions::new()
            .with_initial_viewport_height(800.0)
            .with_on_load_more(Some({
                let loads = Arc::clone(&loads);
                move || {
                    loads.fetch_add(1, Ordering::Relaxed);
                }
            })),
    );

    v.set_data_source(DataSource::new(3).with_has_more(true).with_loading(true));
    assert_eq!(loads.load(Ordering::Relaxed), 0);

    // Loading finished without new items: still at the end, so the approach is still pending.
    v.set_data_source(DataSource::new(3).with_has_more(true));
    assert_eq!(loads.load(Ordering::Relaxed), 1);

    v.set_data_source(DataSource::new(5));
    v.apply_scroll_event(10.0, 0);
    assert_eq!(loads.load(Ordering::Relaxed), 1);
}

#[test]
fn shrinking_the_count_resets_measurements() {
    let mut v = feed(10, 500.0);
    v.measure(2, 300.0);
    v.on_animation_frame(0);
    v.set_count(20);
    assert!(v.is_measured(2));

    v.set_count(5);
    assert!(!v.is_measured(2));
    assert_eq!(v.heights().measured_count(), 0);
    assert!(close(v.total_extent(), 500.0));
}

#[test]
fn latest_measurement_wins_within_a_frame() {
    let mut v = feed(10, 500.0);
    assert!(v.measure(0, 200.0));
    assert!(v.measure(0, 260.0));
    assert!(!v.measure(0, 261.0));
    v.on_animation_frame(16);
    assert_eq!(v.item_placement(0).unwrap().height, 260.0);
}

#[test]
fn visible_items_match_for_each() {
    let mut v = feed(1000, 640.0);
    v.apply_scroll_event(12_345.0, 0);
    let mut a = Vec::new();
    v.for_each_visible_index(|i| a.push(i));
    let mut b = Vec::new();
    v.collect_visible_items(&mut b);
    assert_eq!(a, b);
    assert_eq!(a, v.visible_items());
    assert_eq!(a.first().copied(), Some(120));
    assert_eq!(a.last().copied(), Some(132));
}

#[test]
fn example_basic_smoke_large_count() {
    let mut v = feed(100_000, 900.0);
    let mut rng = Lcg::new(3);
    for i in 0..50 {
        v.measure(i, rng.gen_height());
    }
    v.on_animation_frame(16);
    let target = v.scroll_to_index_offset(60_000, Align::Center);
    v.scroll_to_offset(target);
    let items = v.visible_items();
    assert!(items.contains(&60_000));
    assert!(v.total_extent() > 0.0);
}
