// Example: smooth scrolling to an item, then jumping back to the top.
use feedscroll::{Align, DataSource, FeedOptions, FeedVirtualizer};

fn main() {
    let mut feed = FeedVirtualizer::new(FeedOptions::new().with_initial_viewport_height(600.0));
    feed.set_data_source(DataSource::new(1_000));

    let target = feed.scroll_to_index(400, Align::Center, 0);
    println!("target_offset={target}");

    // An adapter applies each returned offset to the real scroll container.
    let mut now_ms = 0u64;
    while feed.is_animating() {
        now_ms += 16;
        if let Some(off) = feed.on_animation_frame(now_ms) {
            if now_ms % 80 == 0 {
                println!("t={now_ms} off={off:.1} range={:?}", feed.visible_range());
            }
        }
    }
    println!("arrived: off={} range={:?}", feed.scroll_offset(), feed.visible_range());

    feed.scroll_to_top(now_ms);
    for _ in 0..3 {
        println!(
            "t={now_ms} range={:?} transitions={}",
            feed.visible_range(),
            feed.transitions_enabled()
        );
        now_ms += 16;
        feed.on_animation_frame(now_ms);
    }
}
