use alloc::vec::Vec;
use core::cell::RefCell;

use crate::HeightCache;

/// Memoized prefix sums over a [`HeightCache`].
///
/// `memo[i]` is the cumulative height of items `[0, i)`. Entries are computed lazily on read and
/// evicted by [`OffsetCache::invalidate_from`]; the memo is always a contiguous prefix, so a
/// read past its end resumes from the last valid offset.
#[derive(Clone, Debug, Default)]
pub struct OffsetCache {
    memo: RefCell<Vec<f64>>,
}

impl OffsetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative height of all items before `index` (clamped to `heights.len()`).
    pub fn offset_of(&self, heights: &HeightCache, index: usize) -> f64 {
        let index = index.min(heights.len());
        let mut memo = self.memo.borrow_mut();
        if let Some(&off) = memo.get(index) {
            return off;
        }

        if memo.is_empty() {
            memo.push(0.0);
        }
        let mut next = memo.len();
        let mut acc = memo.last().copied().unwrap_or(0.0);
        while next <= index {
            acc += heights.estimate_height(next - 1);
            memo.push(acc);
            next += 1;
        }
        acc
    }

    /// Sum of heights (measured or estimated) of the first `count` items.
    pub fn total_height(&self, heights: &HeightCache, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        self.offset_of(heights, count)
    }

    /// Evicts every memoized offset at or after `index`.
    pub fn invalidate_from(&mut self, index: usize) {
        let memo = self.memo.get_mut();
        if index < memo.len() {
            vtrace!(index, memoized = memo.len(), "OffsetCache::invalidate_from");
            memo.truncate(index);
        }
    }

    pub fn clear(&mut self) {
        self.memo.get_mut().clear();
    }

    /// Number of offsets currently memoized (including the implicit `0` for index 0).
    pub fn memoized_len(&self) -> usize {
        self.memo.borrow().len()
    }
}
