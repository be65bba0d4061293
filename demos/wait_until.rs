//! # Example: wait_until
//!
//! Saves a document through listeners that each finish async work before the
//! next one runs.
//!
//! Demonstrates how to:
//! - Register async work from a listener with [`WaitUntilEvent::wait_until`].
//! - Drive delivery with [`AsyncEmitter::fire_async`].
//! - Stop delivery early through the [`CancellationToken`].
//!
//! ## Flow
//! ```text
//! fire_async("notes.md")
//!     ├─► formatter  ── wait_until(format 50ms) ──► done
//!     ├─► backup     ── wait_until(copy 20ms)   ──► done
//!     └─► uploader   ── skipped once the token is cancelled
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example wait_until
//! ```

use std::time::Duration;

use eventide::{AsyncEmitter, WaitUntilEvent};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let on_will_save = AsyncEmitter::<String>::new();

    // 1. Formatter: slow async work, awaited before the next listener
    on_will_save.event().subscribe(|e: &WaitUntilEvent<String>| {
        let file = e.data().clone();
        let registered = e.wait_until(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            println!(" ├─► formatted {file}");
            Ok(())
        });
        if let Err(err) = registered {
            eprintln!("formatter: {err}");
        }
    });

    // 2. Backup: finishes, then cancels the rest of this save
    on_will_save.event().subscribe(|e: &WaitUntilEvent<String>| {
        let file = e.data().clone();
        let token = e.token().clone();
        let registered = e.wait_until(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            println!(" ├─► backed up {file}; cancelling upload");
            token.cancel();
            Ok(())
        });
        if let Err(err) = registered {
            eprintln!("backup: {err}");
        }
    });

    // 3. Uploader: never reached for this save
    on_will_save.event().subscribe(|e: &WaitUntilEvent<String>| {
        println!(" ├─► uploading {}", e.data());
    });

    println!("Saving:");
    let token = CancellationToken::new();
    on_will_save
        .fire_async("notes.md".to_string(), &token, None)
        .await;
    println!(" └─► cancelled: {}", token.is_cancelled());
    Ok(())
}
