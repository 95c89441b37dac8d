//! # Example: cancel_flow
//!
//! Demonstrates mid-flight cooperative cancellation of a running graph.
//!
//! Shows how to:
//! - Park a producer on a long await and settle it from a cancel hook
//! - Cancel the whole run from another task via [`ItemProvider::cancel`]
//! - Distinguish the cancelled outcome from a missing item
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► spawn provide().await        (producer parks on a 10s sleep)
//!   ├─► sleep 300ms, provider.cancel()
//!   │     └─► cancel hook fires once, finish() settles the producer
//!   └─► join: Err(Cancelled)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example cancel_flow
//! ```

use std::sync::Arc;
use std::time::Duration;

use itemflow::{ItemProvider, ProducerHandle};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== cancel_flow example ===\n");

    let provider = Arc::new(
        ItemProvider::builder(
            "placeholder".to_string(),
            |h: ProducerHandle<String>| async move {
                println!("[producer] started, simulating slow work...");
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(10)) => {
                        h.finish_with_item("finished item".to_string());
                    }
                    _ = h.cancelled() => {
                        println!("[producer] observed the cancellation request");
                    }
                }
            },
        )
        .with_cancel_hook(|h| {
            println!("[hook] cancel hook invoked, settling the task");
            h.finish();
        })
        .build(),
    );

    let runner = {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move { provider.provide().await })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("[main] requesting cancellation");
    provider.cancel();

    match runner.await? {
        Ok(item) => println!("[main] unexpected item: {item}"),
        Err(e) => println!("[main] run ended: {e} (cancelled = {})", e.is_cancelled()),
    }
    Ok(())
}
