use feedscroll::FeedVirtualizer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollBehavior {
    #[default]
    Instant,
    Smooth,
}

/// Identifies one restore. Tokens from a superseded restore never become current again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RestoreToken(pub(crate) u64);

impl RestoreToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// A programmatic scroll issued by the coordinator.
///
/// Adapters running their own smooth scrolls can drop an in-flight one once
/// [`crate::RestoreCoordinator::is_current`] returns `false` for its token.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollCommand {
    pub x: f64,
    pub y: f64,
    pub behavior: ScrollBehavior,
    pub token: RestoreToken,
    pub issued_at_ms: u64,
}

/// The scrollable host a coordinator reads from and scrolls.
pub trait ScrollSurface {
    /// Live `(x, y)` scroll offset.
    fn scroll_position(&self) -> (f64, f64);
    fn viewport_height(&self) -> f64;
    /// Total scrollable height, which may still be growing while content loads.
    fn document_height(&self) -> f64;
    fn scroll_to(&mut self, command: ScrollCommand);
}

impl<T: ScrollSurface + ?Sized> ScrollSurface for &mut T {
    fn scroll_position(&self) -> (f64, f64) {
        (**self).scroll_position()
    }

    fn viewport_height(&self) -> f64 {
        (**self).viewport_height()
    }

    fn document_height(&self) -> f64 {
        (**self).document_height()
    }

    fn scroll_to(&mut self, command: ScrollCommand) {
        (**self).scroll_to(command)
    }
}

/// A virtualized feed scrolls vertically only; its document is the estimated total extent.
impl ScrollSurface for FeedVirtualizer {
    fn scroll_position(&self) -> (f64, f64) {
        (0.0, self.scroll_offset())
    }

    fn viewport_height(&self) -> f64 {
        FeedVirtualizer::viewport_height(self)
    }

    fn document_height(&self) -> f64 {
        self.total_extent()
    }

    fn scroll_to(&mut self, command: ScrollCommand) {
        match command.behavior {
            ScrollBehavior::Instant => {
                self.scroll_to_offset(command.y);
            }
            ScrollBehavior::Smooth => {
                self.smooth_scroll_to_offset(command.y, command.issued_at_ms);
            }
        }
    }
}
