use alloc::vec::Vec;

/// Observed pixel heights per item index, plus the running average used for unmeasured items.
///
/// Writes report the first index whose prefix sum went stale so the caller can invalidate its
/// [`crate::OffsetCache`] in the same update.
#[derive(Clone, Debug)]
pub struct HeightCache {
    heights: Vec<Option<f64>>,
    measured: usize,
    measured_sum: f64,
    // Smallest index without a measurement (== len when everything is measured).
    first_unmeasured: usize,
    min_average: f64,
    epsilon: f64,
}

impl HeightCache {
    pub fn new(count: usize, min_average: f64, epsilon: f64) -> Self {
        Self {
            heights: alloc::vec![None; count],
            measured: 0,
            measured_sum: 0.0,
            first_unmeasured: 0,
            min_average: sanitize(min_average),
            epsilon: sanitize(epsilon),
        }
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn measured_count(&self) -> usize {
        self.measured
    }

    pub fn is_measured(&self, index: usize) -> bool {
        matches!(self.heights.get(index), Some(Some(_)))
    }

    pub fn measured_height(&self, index: usize) -> Option<f64> {
        self.heights.get(index).copied().flatten()
    }

    /// Mean of the measured heights, floored at the configured minimum.
    ///
    /// Estimates never feed back into this value.
    pub fn average_height(&self) -> f64 {
        if self.measured == 0 {
            return self.min_average;
        }
        let mean = self.measured_sum / self.measured as f64;
        mean.max(self.min_average)
    }

    pub fn estimate_height(&self, index: usize) -> f64 {
        match self.measured_height(index) {
            Some(h) => h,
            None => self.average_height(),
        }
    }

    /// Records a measured height for `index`.
    ///
    /// Returns the first index whose offset is now stale, or `None` when the write was rejected
    /// (out of range, non-positive or non-finite height, or within epsilon of the cached value).
    pub fn record_height(&mut self, index: usize, height: f64) -> Option<usize> {
        let Some(slot) = self.heights.get(index).copied() else {
            vwarn!(index, len = self.heights.len(), "record_height: out-of-range index");
            return None;
        };
        if !height.is_finite() || height <= 0.0 {
            vtrace!(index, height, "record_height: ignoring anomalous measurement");
            return None;
        }
        if let Some(prev) = slot {
            if abs_diff(prev, height) <= self.epsilon {
                return None;
            }
        }

        let average_before = self.average_height();
        self.heights[index] = Some(height);
        match slot {
            Some(prev) => {
                self.measured_sum += height - prev;
            }
            None => {
                self.measured = self.measured.saturating_add(1);
                self.measured_sum += height;
                if index == self.first_unmeasured {
                    self.advance_first_unmeasured();
                }
            }
        }
        vtrace!(index, height, "record_height");
        Some(self.stale_from(index, average_before))
    }

    /// Drops the measurement for `index` so it falls back to the average estimate.
    ///
    /// Returns the first stale index, or `None` if the item was not measured.
    pub fn forget(&mut self, index: usize) -> Option<usize> {
        let prev = self.measured_height(index)?;
        let average_before = self.average_height();
        self.heights[index] = None;
        self.measured = self.measured.saturating_sub(1);
        if self.measured == 0 {
            self.measured_sum = 0.0;
        } else {
            self.measured_sum -= prev;
        }
        self.first_unmeasured = self.first_unmeasured.min(index);
        Some(self.stale_from(index, average_before))
    }

    /// Grows the cache with unmeasured slots. Shrinking is a new data set: every measurement is
    /// dropped, since indexes are not stable across removals.
    ///
    /// Returns `true` when a full reset happened.
    pub fn resize(&mut self, count: usize) -> bool {
        let len = self.heights.len();
        if count >= len {
            self.heights.resize(count, None);
            return false;
        }
        vdebug!(from = len, to = count, "HeightCache: shrink resets measurements");
        self.heights.clear();
        self.heights.resize(count, None);
        self.reset_stats();
        true
    }

    pub fn clear(&mut self) {
        for h in self.heights.iter_mut() {
            *h = None;
        }
        self.reset_stats();
    }

    fn reset_stats(&mut self) {
        self.measured = 0;
        self.measured_sum = 0.0;
        self.first_unmeasured = 0;
    }

    fn advance_first_unmeasured(&mut self) {
        let len = self.heights.len();
        while self.first_unmeasured < len && self.heights[self.first_unmeasured].is_some() {
            self.first_unmeasured += 1;
        }
    }

    fn stale_from(&self, index: usize, average_before: f64) -> usize {
        // A moved average shifts every estimate, so offsets go stale from the first
        // unmeasured item too.
        if self.average_height() != average_before {
            index.min(self.first_unmeasured)
        } else {
            index
        }
    }
}

pub(crate) fn abs_diff(a: f64, b: f64) -> f64 {
    if a > b { a - b } else { b - a }
}

pub(crate) fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}
