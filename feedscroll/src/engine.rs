use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::height::sanitize;
use crate::key::IndexMap;
use crate::range::compute_range;
use crate::{
    Align, DataSource, FeedOptions, FeedSnapshot, HeightCache, ItemPlacement, OffsetCache, Tween,
    VisibleRange,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transitions {
    Enabled,
    // Counts down once per animation frame; re-enabled when it reaches zero.
    Suspended { frames_remaining: u8 },
}

/// A headless virtualization engine for feeds of variable-height items.
///
/// The engine does not hold any UI objects. Your adapter drives it:
/// - `set_viewport_height` / `apply_scroll_event` / `set_data_source` on UI and data events
/// - `measure(i, h)` from each mounted item after layout
/// - `on_animation_frame(now_ms)` once per frame, to flush coalesced refreshes, advance smooth
///   scrolls and fire `on_load_more`
///
/// Render with `visible_items()` (or `for_each_visible_index`) and `item_placement(i)`, sized
/// by `total_extent()`.
#[derive(Clone, Debug)]
pub struct FeedVirtualizer {
    options: FeedOptions,
    data: DataSource,
    viewport_height: f64,
    scroll_offset: f64,

    heights: HeightCache,
    offsets: OffsetCache,

    snapshot: FeedSnapshot,
    refresh_pending: bool,
    transitions: Transitions,
    tween: Option<Tween>,
    load_more_armed: bool,

    last_forced_remeasure: IndexMap<u64>,
    deferred_remeasure: IndexMap<u64>,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl FeedVirtualizer {
    pub fn new(options: FeedOptions) -> Self {
        vdebug!(
            overscan = options.overscan,
            min_average_height = options.min_average_height,
            "FeedVirtualizer::new"
        );
        let heights = HeightCache::new(0, options.min_average_height, options.height_epsilon);
        let mut v = Self {
            data: DataSource::default(),
            viewport_height: sanitize(options.initial_viewport_height),
            scroll_offset: 0.0,
            heights,
            offsets: OffsetCache::new(),
            snapshot: FeedSnapshot::default(),
            refresh_pending: false,
            transitions: Transitions::Enabled,
            tween: None,
            load_more_armed: true,
            last_forced_remeasure: IndexMap::new(),
            deferred_remeasure: IndexMap::new(),
            options,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        };
        v.refresh_snapshot();
        v
    }

    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    pub fn set_on_change(
        &mut self,
        on_change: Option<impl Fn(&FeedVirtualizer) + Send + Sync + 'static>,
    ) {
        self.options.on_change = on_change.map(|f| Arc::new(f) as _);
    }

    pub fn set_on_load_more(&mut self, on_load_more: Option<impl Fn() + Send + Sync + 'static>) {
        self.options.on_load_more = on_load_more.map(|f| Arc::new(f) as _);
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            cb(self);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Batches multiple updates into a single `on_change` notification.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    pub fn count(&self) -> usize {
        self.data.total_item_count
    }

    pub fn data_source(&self) -> DataSource {
        self.data
    }

    /// Applies the data source's current state.
    ///
    /// Growing the count keeps every measurement (items are only appended). Shrinking it is
    /// treated as a new data set and drops all cached heights and offsets.
    pub fn set_data_source(&mut self, data: DataSource) {
        if self.data == data {
            return;
        }
        let prev_count = self.data.total_item_count;
        self.data = data;
        if data.total_item_count != prev_count {
            vdebug!(
                from = prev_count,
                to = data.total_item_count,
                "set_data_source: count changed"
            );
            if self.heights.resize(data.total_item_count) {
                self.offsets.clear();
                self.last_forced_remeasure.clear();
                self.deferred_remeasure.clear();
            }
            // New data is a new approach to the end of the list.
            self.load_more_armed = true;
        }
        self.refresh_now();
    }

    pub fn set_count(&mut self, count: usize) {
        let data = DataSource {
            total_item_count: count,
            ..self.data
        };
        self.set_data_source(data);
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        let height = sanitize(height);
        if self.viewport_height == height {
            return;
        }
        self.viewport_height = height;
        self.refresh_now();
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Applies a scroll offset reported by the UI (wheel, drag, native scrolling).
    ///
    /// This cancels any active smooth scroll.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn apply_scroll_event(&mut self, offset: f64, now_ms: u64) {
        vtrace!(offset, now_ms, "apply_scroll_event");
        self.tween = None;
        let offset = sanitize(offset);
        if self.scroll_offset == offset {
            return;
        }
        self.scroll_offset = offset;
        self.refresh_now();
    }

    /// Jumps to `offset` (clamped) without animation. Returns the applied offset.
    pub fn scroll_to_offset(&mut self, offset: f64) -> f64 {
        self.tween = None;
        let offset = self.clamp_scroll_offset(offset);
        if self.scroll_offset != offset {
            self.scroll_offset = offset;
            self.refresh_now();
        }
        offset
    }

    /// Starts a smooth scroll to `offset` (clamped), advanced by `on_animation_frame`.
    ///
    /// Returns the target offset.
    pub fn smooth_scroll_to_offset(&mut self, offset: f64, now_ms: u64) -> f64 {
        let to = self.clamp_scroll_offset(offset);
        self.tween = Some(Tween::new(
            self.scroll_offset,
            to,
            now_ms,
            self.options.smooth_scroll_duration_ms,
            self.options.smooth_scroll_easing,
        ));
        to
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn cancel_animation(&mut self) {
        self.tween = None;
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot
    }

    pub fn visible_range(&self) -> VisibleRange {
        self.snapshot.range
    }

    /// Total scrollable extent as of the last refresh.
    pub fn total_extent(&self) -> f64 {
        self.snapshot.total_extent
    }

    /// Total height computed from the current caches, including refreshes not yet flushed.
    pub fn content_height(&self) -> f64 {
        self.offsets.total_height(&self.heights, self.count())
    }

    pub fn max_scroll_offset(&self) -> f64 {
        (self.content_height() - self.viewport_height).max(0.0)
    }

    pub fn clamp_scroll_offset(&self, offset: f64) -> f64 {
        sanitize(offset).min(self.max_scroll_offset())
    }

    pub fn for_each_visible_index(&self, mut f: impl FnMut(usize)) {
        let range = self.snapshot.range;
        for i in range.start_index..range.end_index {
            f(i);
        }
    }

    /// Collects the visible (overscanned) indexes into `out`, clearing it first.
    pub fn collect_visible_items(&self, out: &mut Vec<usize>) {
        out.clear();
        self.for_each_visible_index(|i| out.push(i));
    }

    /// Ordered indexes of the current visible window, overscan included.
    pub fn visible_items(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.snapshot.range.len());
        self.collect_visible_items(&mut out);
        out
    }

    pub fn item_placement(&self, index: usize) -> Option<ItemPlacement> {
        if index >= self.count() {
            return None;
        }
        Some(ItemPlacement {
            index,
            top: self.offsets.offset_of(&self.heights, index),
            height: self.heights.estimate_height(index),
            measured: self.heights.is_measured(index),
            animate: self.transitions_enabled(),
        })
    }

    pub fn transitions_enabled(&self) -> bool {
        self.transitions == Transitions::Enabled
    }

    pub fn average_height(&self) -> f64 {
        self.heights.average_height()
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.heights.is_measured(index)
    }

    pub fn heights(&self) -> &HeightCache {
        &self.heights
    }

    pub fn offsets(&self) -> &OffsetCache {
        &self.offsets
    }

    /// Whether `on_animation_frame` has work to do.
    pub fn needs_frame(&self) -> bool {
        self.refresh_pending
            || self.tween.is_some()
            || !self.deferred_remeasure.is_empty()
            || self.transitions != Transitions::Enabled
    }

    /// Records the rendered height of a mounted item.
    ///
    /// Offsets are invalidated immediately; the visible range and total extent are refreshed on
    /// the next `on_animation_frame`, so a burst of measurements in one frame costs one refresh.
    ///
    /// Returns `true` if the measurement was accepted.
    pub fn measure(&mut self, index: usize, height: f64) -> bool {
        if index >= self.count() {
            return false;
        }
        let Some(stale_from) = self.heights.record_height(index, height) else {
            return false;
        };
        self.offsets.invalidate_from(stale_from);
        self.refresh_pending = true;
        true
    }

    pub fn measure_many(&mut self, measurements: impl IntoIterator<Item = (usize, f64)>) -> usize {
        let mut accepted = 0usize;
        for (index, height) in measurements {
            if self.measure(index, height) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Drops the cached height of `index` because its content changed independently of a remount
    /// (e.g. a reply thread expanded). The range and extent are re-derived right away.
    ///
    /// Calls for the same index closer than `remeasure_debounce_ms` are deferred to the end of
    /// the window and applied by `on_animation_frame`.
    ///
    /// Returns `true` if the remeasure was applied now.
    pub fn force_remeasure(&mut self, index: usize, now_ms: u64) -> bool {
        if index >= self.count() {
            return false;
        }
        let window = self.options.remeasure_debounce_ms;
        if let Some(&last) = self.last_forced_remeasure.get(&index) {
            if now_ms.saturating_sub(last) < window {
                let due = last.saturating_add(window);
                vtrace!(index, now_ms, due, "force_remeasure: deferred");
                self.deferred_remeasure.insert(index, due);
                return false;
            }
        }
        self.apply_remeasure(index, now_ms);
        self.refresh_now();
        true
    }

    fn apply_remeasure(&mut self, index: usize, now_ms: u64) {
        self.last_forced_remeasure.insert(index, now_ms);
        self.deferred_remeasure.remove(&index);
        if let Some(stale_from) = self.heights.forget(index) {
            self.offsets.invalidate_from(stale_from);
        }
    }

    /// Smooth-scrolls so that `index` is aligned in the viewport. Returns the target offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align, now_ms: u64) -> f64 {
        let target = self.scroll_to_index_offset(index, align);
        self.smooth_scroll_to_offset(target, now_ms)
    }

    pub fn scroll_to_index_offset(&self, index: usize, align: Align) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        let index = index.min(count - 1);
        let top = self.offsets.offset_of(&self.heights, index);
        let height = self.heights.estimate_height(index);
        let view = self.viewport_height;

        let target = match align {
            Align::Start => top,
            Align::Center => top + height / 2.0 - view / 2.0,
            Align::End => top + height - view,
        };
        self.clamp_scroll_offset(target)
    }

    /// Jumps back to the top of the list.
    ///
    /// The visible range is reset to the first `overscan * 2` items and memoized offsets are
    /// dropped. Position transitions are suspended so already-mounted items do not visibly
    /// slide into their new places; they come back on the second animation frame, after one
    /// measurement pass.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn scroll_to_top(&mut self, now_ms: u64) {
        vdebug!(now_ms, "scroll_to_top");
        self.tween = None;
        self.offsets.clear();
        self.scroll_offset = 0.0;
        self.transitions = Transitions::Suspended {
            frames_remaining: 2,
        };
        let count = self.count();
        self.snapshot = FeedSnapshot {
            range: VisibleRange {
                start_index: 0,
                end_index: count.min(self.options.overscan.saturating_mul(2)),
            },
            total_extent: self.snapshot.total_extent,
            scroll_offset: 0.0,
        };
        self.refresh_pending = true;
        self.notify();
    }

    /// Advances the engine by one frame.
    ///
    /// - applies deferred forced remeasures that are due
    /// - samples the active smooth scroll
    /// - flushes a pending refresh (one `on_change` for the whole frame)
    /// - steps the transition suspension started by `scroll_to_top`
    ///
    /// Returns the new scroll offset while a smooth scroll is active, for the adapter to apply to
    /// the real scroll container.
    pub fn on_animation_frame(&mut self, now_ms: u64) -> Option<f64> {
        let mut scrolled = None;
        self.batch_update(|v| {
            let due: Vec<usize> = v
                .deferred_remeasure
                .iter()
                .filter(|&(_, &due)| due <= now_ms)
                .map(|(&index, _)| index)
                .collect();
            for index in due {
                v.apply_remeasure(index, now_ms);
                v.refresh_pending = true;
            }

            if let Some(tween) = v.tween {
                let off = v.clamp_scroll_offset(tween.sample(now_ms));
                if tween.is_done(now_ms) {
                    v.tween = None;
                }
                if v.scroll_offset != off {
                    v.scroll_offset = off;
                    v.refresh_pending = true;
                }
                scrolled = Some(off);
            }

            if v.refresh_pending {
                v.refresh_now();
            }

            if let Transitions::Suspended { frames_remaining } = v.transitions {
                if frames_remaining <= 1 {
                    v.transitions = Transitions::Enabled;
                    v.notify();
                } else {
                    v.transitions = Transitions::Suspended {
                        frames_remaining: frames_remaining - 1,
                    };
                }
            }
        });
        scrolled
    }

    /// Forgets every measurement and memoized offset.
    pub fn reset_measurements(&mut self) {
        self.heights.clear();
        self.offsets.clear();
        self.last_forced_remeasure.clear();
        self.deferred_remeasure.clear();
        self.refresh_now();
    }

    fn refresh_snapshot(&mut self) {
        let count = self.count();
        self.snapshot = FeedSnapshot {
            range: compute_range(
                &self.heights,
                &self.offsets,
                self.scroll_offset,
                self.viewport_height,
                count,
                self.options.overscan,
            ),
            total_extent: self.offsets.total_height(&self.heights, count),
            scroll_offset: self.scroll_offset,
        };
        self.refresh_pending = false;
    }

    fn refresh_now(&mut self) {
        self.refresh_snapshot();
        self.maybe_load_more();
        self.notify();
    }

    fn maybe_load_more(&mut self) {
        let viewport_bottom = self.scroll_offset + self.viewport_height;
        let remaining = self.snapshot.total_extent - viewport_bottom;
        if remaining > self.options.load_more_threshold_px {
            self.load_more_armed = true;
            return;
        }
        if !self.load_more_armed || !self.data.has_more || self.data.loading {
            return;
        }
        self.load_more_armed = false;
        vdebug!(
            count = self.data.total_item_count,
            remaining,
            "load more threshold reached"
        );
        if let Some(cb) = &self.options.on_load_more {
            cb();
        }
    }
}
