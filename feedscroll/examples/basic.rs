// Example: rendering a feed of variable-height items with a headless engine.
use feedscroll::{DataSource, FeedOptions, FeedVirtualizer};

// Stand-in for real layout: the height an item turns out to have once rendered.
fn rendered_height(index: usize) -> f64 {
    80.0 + (index % 7) as f64 * 35.0
}

fn main() {
    let mut feed = FeedVirtualizer::new(
        FeedOptions::new()
            .with_initial_viewport_height(900.0)
            .with_on_change(Some(|v: &FeedVirtualizer| {
                println!("on_change: range={:?} extent={}", v.visible_range(), v.total_extent());
            })),
    );
    feed.set_data_source(DataSource::new(500));

    // A frame: mount what is visible, report measurements, then flush once.
    let mut now_ms = 0u64;
    for _ in 0..3 {
        for index in feed.visible_items() {
            feed.measure(index, rendered_height(index));
        }
        feed.on_animation_frame(now_ms);
        now_ms += 16;
    }

    for index in feed.visible_items() {
        if let Some(p) = feed.item_placement(index) {
            println!(
                "item {:>3}: translateY={:>7.1} height={:>5.1} measured={}",
                p.index, p.top, p.height, p.measured
            );
        }
    }

    feed.apply_scroll_event(12_000.0, now_ms);
    println!(
        "after scroll: off={} range={:?} average={:.1}",
        feed.scroll_offset(),
        feed.visible_range(),
        feed.average_height()
    );
}
