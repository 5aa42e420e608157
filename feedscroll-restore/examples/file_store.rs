// Example: positions persisted to disk and read back by a later "session".
use feedscroll_restore::{FileStorage, ScrollKey, ScrollPositionStore};

fn main() -> feedscroll_restore::Result<()> {
    let dir = std::env::temp_dir().join("feedscroll-file-store-demo");
    let key = ScrollKey::path("/search?q=rust");

    {
        let mut store = ScrollPositionStore::new(FileStorage::new(&dir));
        store.save(&key, 0.0, 2_400.0, 1_000);
        println!("saved to {}", dir.display());
    }

    let mut store = ScrollPositionStore::new(FileStorage::new(&dir));
    println!("next session: {:?}", store.get(&key, 5_000));

    store.clear_all();
    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
