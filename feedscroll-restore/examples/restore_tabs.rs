// Example: two tabs of one page, each with its own feed and its own saved position.
use feedscroll::{DataSource, FeedOptions, FeedVirtualizer};
use feedscroll_restore::{
    MemoryStorage, RestoreCoordinator, RestoreOptions, ScrollKey, ScrollPositionStore,
};

fn feed(count: usize) -> FeedVirtualizer {
    let mut v = FeedVirtualizer::new(FeedOptions::new().with_initial_viewport_height(800.0));
    v.set_data_source(DataSource::new(count));
    v
}

fn main() {
    let store = ScrollPositionStore::new(MemoryStorage::new());
    let mut coord = RestoreCoordinator::new(store, RestoreOptions::new());

    let latest = ScrollKey::new("/home", Some("latest"));
    let following = ScrollKey::new("/home", Some("following"));
    let mut latest_feed = feed(300);
    let mut following_feed = feed(300);

    let mut now_ms = 0u64;
    coord.activate(latest.clone(), now_ms, &latest_feed);

    // The user reads down the "latest" tab.
    for _ in 0..20 {
        now_ms += 16;
        let next = latest_feed.scroll_offset() + 150.0;
        latest_feed.apply_scroll_event(next, now_ms);
        coord.on_scroll(now_ms, &latest_feed);
        coord.tick(now_ms, &mut latest_feed);
    }
    println!("latest: left at off={}", latest_feed.scroll_offset());

    // Switch tabs. The outgoing tab is still on screen, so its position is saved.
    now_ms += 16;
    coord.activate(following.clone(), now_ms, &latest_feed);
    following_feed.apply_scroll_event(500.0, now_ms);
    coord.on_scroll(now_ms, &following_feed);

    // And back. The "latest" feed was unmounted, so it starts over at the top.
    now_ms += 1_000;
    let token = coord.activate(latest, now_ms, &following_feed);
    println!("restore scheduled: {token:?}");
    let mut remounted = feed(300);
    while coord.is_restoring() {
        if let Some(outcome) = coord.tick(now_ms, &mut remounted) {
            println!("t={now_ms} {outcome:?} off={}", remounted.scroll_offset());
        }
        remounted.on_animation_frame(now_ms);
        now_ms += 16;
    }
}
