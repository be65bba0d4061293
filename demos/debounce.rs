//! # Example: debounce
//!
//! Collapses a burst of keystrokes into one search query.
//!
//! Demonstrates how to:
//! - Derive a debounced event with [`debounce`] and a merge function.
//! - Subscribe on the temporary derived event and keep only the subscription.
//! - Unhook the whole chain by disposing that subscription.
//!
//! ## Flow
//! ```text
//! keys.fire('r') ─┐
//! keys.fire('u') ─┼─► merge into "rus" ─► 150ms quiet ─► listener("rus")
//! keys.fire('s') ─┘
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example debounce
//! ```

use std::time::Duration;

use eventide::{DebounceConfig, Disposable, Emitter, debounce};

fn append(query: Option<String>, key: &char) -> String {
    let mut query = query.unwrap_or_default();
    query.push(*key);
    query
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Source of raw keystrokes
    let keys = Emitter::<char>::new();

    // 2. Debounced query; the derived event itself is not kept
    let config = DebounceConfig::with_delay(Duration::from_millis(150));
    let sub = debounce(&keys.event(), append, config, None)
        .subscribe(|query: &String| println!(" ├─► search: {query}"));

    // 3. Two bursts separated by a pause
    println!("Typing:");
    for key in "rust".chars() {
        keys.fire(&key);
        tokio::time::sleep(Duration::from_millis(40)).await;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    for key in " events".chars() {
        keys.fire(&key);
        tokio::time::sleep(Duration::from_millis(40)).await;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    // 4. Dispose the subscription; the source is released too
    sub.dispose()?;
    println!(" └─► keystrokes still observed: {}", keys.has_listeners());
    Ok(())
}
