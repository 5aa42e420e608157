#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleRange {
    pub start_index: usize,
    pub end_index: usize, // exclusive, overscan included
}

impl VisibleRange {
    pub const EMPTY: Self = Self {
        start_index: 0,
        end_index: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }
}

/// Absolute placement of one item in the single stacked column.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemPlacement {
    pub index: usize,
    /// Pixel offset from the top of the list (`translateY`).
    pub top: f64,
    /// Measured height, or the current average estimate when unmeasured.
    pub height: f64,
    pub measured: bool,
    /// `false` while position transitions are suspended (see `FeedVirtualizer::scroll_to_top`).
    pub animate: bool,
}

impl ItemPlacement {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// What the paginated data source currently exposes.
///
/// The engine never fetches on its own: it only calls `on_load_more` when the window nears the
/// end and `has_more && !loading`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataSource {
    pub total_item_count: usize,
    pub has_more: bool,
    pub loading: bool,
}

impl DataSource {
    pub fn new(total_item_count: usize) -> Self {
        Self {
            total_item_count,
            has_more: false,
            loading: false,
        }
    }

    pub fn with_has_more(mut self, has_more: bool) -> Self {
        self.has_more = has_more;
        self
    }

    pub fn with_loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}
