//! # Example: share_flow
//!
//! Demonstrates the full lifecycle graph around a slow producer.
//!
//! Shows how to:
//! - Wire a dialog surface and a background-window collaborator
//! - Report stepwise progress from the `provide` closure
//! - Observe events with the built-in [`LogWriter`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► build ItemProvider (dialog + background + LogWriter)
//!   └─► provide().await
//!         ├─► present-dialog, begin-window
//!         ├─► provide-item: 12 progress steps, then finish_with_item
//!         └─► dismiss-dialog, end-window
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example share_flow --features logging
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use itemflow::{
    BackgroundLifecycle, DialogSurface, ItemProvider, LogWriter, ProducerHandle, Subscribe,
    WindowToken,
};

struct PrintingDialog;

#[async_trait]
impl DialogSurface for PrintingDialog {
    async fn present(&self) {
        println!("[dialog] preparing...");
    }

    async fn dismiss(&self) {
        println!("[dialog] done");
    }
}

struct PrintingBackground {
    next: AtomicU64,
}

impl BackgroundLifecycle for PrintingBackground {
    fn begin_window(&self) -> Option<WindowToken> {
        let token = WindowToken::new(self.next.fetch_add(1, Ordering::SeqCst));
        println!("[background] window {} opened", token.raw());
        Some(token)
    }

    fn end_window(&self, token: WindowToken) {
        println!("[background] window {} released", token.raw());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== share_flow example ===\n");

    let dialog: Arc<dyn DialogSurface> = Arc::new(PrintingDialog);
    let background = Arc::new(PrintingBackground {
        next: AtomicU64::new(1),
    });
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];

    let provider = ItemProvider::builder(
        "placeholder".to_string(),
        |h: ProducerHandle<String>| async move {
            let steps = 12u32;
            for step in 1..=steps {
                tokio::time::sleep(Duration::from_millis(100)).await;
                h.report_progress(f64::from(step) / f64::from(steps));
            }
            h.finish_with_item(format!("prepared at step {steps}"));
        },
    )
    .with_cancel_hook(|h| h.finish())
    .with_dialog(Arc::downgrade(&dialog))
    .with_background(background)
    .with_subscribers(subs)
    .build();

    let item = provider.provide().await?;
    println!("\nproduced item: {item}");
    println!("final progress: {:.2}", provider.current_progress());
    Ok(())
}
