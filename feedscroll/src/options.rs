use alloc::sync::Arc;

use crate::Easing;
use crate::engine::FeedVirtualizer;

/// A callback fired when the engine's render-facing state changes.
pub type OnChangeCallback = Arc<dyn Fn(&FeedVirtualizer) + Send + Sync>;

/// The data source's "load more" hook. Fired at most once per approach to the end of the list.
pub type OnLoadMoreCallback = Arc<dyn Fn() + Send + Sync>;

/// Configuration for [`crate::FeedVirtualizer`].
///
/// Cheap to clone: callbacks are stored in `Arc`s.
pub struct FeedOptions {
    /// Items rendered beyond each edge of the viewport.
    pub overscan: usize,

    /// Floor for the running average used to estimate unmeasured items.
    pub min_average_height: f64,

    /// Measurements within this many pixels of the cached height are ignored.
    pub height_epsilon: f64,

    /// Minimum spacing between two forced remeasures of the same index.
    pub remeasure_debounce_ms: u64,

    /// Distance (px) between the viewport bottom and the end of the list at which
    /// `on_load_more` fires.
    pub load_more_threshold_px: f64,

    pub smooth_scroll_duration_ms: u64,
    pub smooth_scroll_easing: Easing,

    pub initial_viewport_height: f64,

    pub on_change: Option<OnChangeCallback>,
    pub on_load_more: Option<OnLoadMoreCallback>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FeedOptions {
    fn clone(&self) -> Self {
        Self {
            overscan: self.overscan,
            min_average_height: self.min_average_height,
            height_epsilon: self.height_epsilon,
            remeasure_debounce_ms: self.remeasure_debounce_ms,
            load_more_threshold_px: self.load_more_threshold_px,
            smooth_scroll_duration_ms: self.smooth_scroll_duration_ms,
            smooth_scroll_easing: self.smooth_scroll_easing,
            initial_viewport_height: self.initial_viewport_height,
            on_change: self.on_change.clone(),
            on_load_more: self.on_load_more.clone(),
        }
    }
}

impl FeedOptions {
    pub fn new() -> Self {
        Self {
            overscan: 3,
            min_average_height: 100.0,
            height_epsilon: 2.0,
            remeasure_debounce_ms: 50,
            load_more_threshold_px: 800.0,
            smooth_scroll_duration_ms: 300,
            smooth_scroll_easing: Easing::SmoothStep,
            initial_viewport_height: 0.0,
            on_change: None,
            on_load_more: None,
        }
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_min_average_height(mut self, min_average_height: f64) -> Self {
        self.min_average_height = min_average_height;
        self
    }

    pub fn with_height_epsilon(mut self, height_epsilon: f64) -> Self {
        self.height_epsilon = height_epsilon;
        self
    }

    pub fn with_remeasure_debounce_ms(mut self, delay_ms: u64) -> Self {
        self.remeasure_debounce_ms = delay_ms;
        self
    }

    pub fn with_load_more_threshold_px(mut self, threshold_px: f64) -> Self {
        self.load_more_threshold_px = threshold_px;
        self
    }

    pub fn with_smooth_scroll(mut self, duration_ms: u64, easing: Easing) -> Self {
        self.smooth_scroll_duration_ms = duration_ms;
        self.smooth_scroll_easing = easing;
        self
    }

    pub fn with_initial_viewport_height(mut self, viewport_height: f64) -> Self {
        self.initial_viewport_height = viewport_height;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&FeedVirtualizer) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_load_more(
        mut self,
        on_load_more: Option<impl Fn() + Send + Sync + 'static>,
    ) -> Self {
        self.on_load_more = on_load_more.map(|f| Arc::new(f) as _);
        self
    }
}

impl core::fmt::Debug for FeedOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeedOptions")
            .field("overscan", &self.overscan)
            .field("min_average_height", &self.min_average_height)
            .field("height_epsilon", &self.height_epsilon)
            .field("remeasure_debounce_ms", &self.remeasure_debounce_ms)
            .field("load_more_threshold_px", &self.load_more_threshold_px)
            .field("smooth_scroll_duration_ms", &self.smooth_scroll_duration_ms)
            .field("smooth_scroll_easing", &self.smooth_scroll_easing)
            .field("initial_viewport_height", &self.initial_viewport_height)
            .finish_non_exhaustive()
    }
}
