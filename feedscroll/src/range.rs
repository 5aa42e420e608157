use crate::height::sanitize;
use crate::{HeightCache, OffsetCache, VisibleRange};

/// Computes the overscanned range of items intersecting `[scroll_top, scroll_top + viewport)`.
///
/// - raw start: the first item whose end lies past `scroll_top`
/// - raw end: one past the first item whose end lies past the viewport bottom, or `count`
/// - both are then padded by `overscan` and clamped to `[0, count]`
///
/// Prefix sums are monotone, so both lookups are binary searches over the offset cache. The
/// first query walks (and memoizes) the whole prefix; later ones only touch `O(log n)` entries.
///
/// Negative or non-finite `scroll_top` is treated as `0`.
pub fn compute_range(
    heights: &HeightCache,
    offsets: &OffsetCache,
    scroll_top: f64,
    viewport_height: f64,
    count: usize,
    overscan: usize,
) -> VisibleRange {
    let count = count.min(heights.len());
    if count == 0 {
        return VisibleRange::EMPTY;
    }

    let top = sanitize(scroll_top);
    let bottom = top + sanitize(viewport_height);

    let raw_start = first_end_past(heights, offsets, 0, count, top);
    let raw_end = if raw_start >= count {
        count
    } else {
        first_end_past(heights, offsets, raw_start, count, bottom)
            .saturating_add(1)
            .min(count)
    };

    VisibleRange {
        start_index: raw_start.saturating_sub(overscan),
        end_index: raw_end.saturating_add(overscan).min(count),
    }
}

/// Smallest `i` in `[lo, hi)` with `offset_of(i + 1) > target`, or `hi` if there is none.
fn first_end_past(
    heights: &HeightCache,
    offsets: &OffsetCache,
    mut lo: usize,
    mut hi: usize,
    target: f64,
) -> usize {
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if offsets.offset_of(heights, mid + 1) > target {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

