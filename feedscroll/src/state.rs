use crate::VisibleRange;

/// The render-facing state of the engine as of the last refresh.
///
/// Scroll, resize and count changes refresh it synchronously; measurements only mark it dirty
/// and it is refreshed on the next animation frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedSnapshot {
    pub range: VisibleRange,
    pub total_extent: f64,
    pub scroll_offset: f64,
}
