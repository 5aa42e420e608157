// Example: loading pages as the viewport approaches the end of the feed.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use feedscroll::{DataSource, FeedOptions, FeedVirtualizer};

const PAGE: usize = 50;

fn main() {
    // The callback only flags the request; the host fetches and reports back.
    let requested = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&requested);

    let mut feed = FeedVirtualizer::new(
        FeedOptions::new()
            .with_initial_viewport_height(800.0)
            .with_on_load_more(Some(move || flag.store(true, Ordering::SeqCst))),
    );
    feed.set_data_source(DataSource::new(PAGE).with_has_more(true));

    let mut now_ms = 0u64;
    let mut pages = 1;
    while pages < 5 {
        now_ms += 16;
        let next = feed.scroll_offset() + 400.0;
        feed.apply_scroll_event(next, now_ms);
        feed.on_animation_frame(now_ms);

        if requested.swap(false, Ordering::SeqCst) {
            println!(
                "t={now_ms} load more at off={} (count={})",
                feed.scroll_offset(),
                feed.count()
            );
            feed.set_data_source(feed.data_source().with_loading(true));

            // The fetch completes.
            pages += 1;
            let data = DataSource::new(pages * PAGE).with_has_more(pages < 5);
            feed.set_data_source(data);
        }
    }

    println!(
        "done: count={} extent={} has_more={}",
        feed.count(),
        feed.total_extent(),
        feed.data_source().has_more
    );
}
