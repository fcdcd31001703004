//! Debounced search input
//!
//! Raw keystrokes go in, settled queries come out: a value is emitted only
//! after no newer value arrived for the quiet period, and only when it differs
//! from the previously emitted one.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Sending half of a debounced query stream
pub struct QueryDebouncer {
    tx: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl QueryDebouncer {
    /// Spawns the debounce task and returns the input handle and settled output
    pub fn spawn(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(quiet, in_rx, out_tx));
        (Self { tx: in_tx, task }, out_rx)
    }

    /// Feeds the latest raw query
    pub fn push(&self, query: impl Into<String>) {
        // The task only stops once this handle is dropped
        let _ = self.tx.send(query.into());
    }

    /// Stops accepting input; a pending query is still flushed
    pub async fn close(self) {
        let Self { tx, task } = self;
        drop(tx);
        let _ = task.await;
    }
}

async fn run(
    quiet: Duration,
    mut input: mpsc::UnboundedReceiver<String>,
    output: mpsc::UnboundedSender<String>,
) {
    let mut last_emitted: Option<String> = None;

    while let Some(mut pending) = input.recv().await {
        let mut closed = false;
        loop {
            tokio::select! {
                next = input.recv() => match next {
                    Some(next) => pending = next,
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = sleep(quiet) => break,
            }
        }

        if last_emitted.as_deref() != Some(pending.as_str()) {
            tracing::debug!(query = %pending, "Search query settled");
            if output.send(pending.clone()).is_err() {
                return;
            }
            last_emitted = Some(pending);
        }

        if closed {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(400);

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_only_last_value() {
        let (debouncer, mut settled) = QueryDebouncer::spawn(QUIET);

        for q in ["b", "bi", "bit"] {
            debouncer.push(q);
            sleep(Duration::from_millis(100)).await;
        }
        sleep(QUIET).await;

        assert_eq!(settled.recv().await.as_deref(), Some("bit"));
        assert!(settled.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_value_is_suppressed() {
        let (debouncer, mut settled) = QueryDebouncer::spawn(QUIET);

        debouncer.push("eth");
        sleep(QUIET * 2).await;
        debouncer.push("eth");
        sleep(QUIET * 2).await;
        debouncer.push("sol");
        sleep(QUIET * 2).await;

        assert_eq!(settled.recv().await.as_deref(), Some("eth"));
        assert_eq!(settled.recv().await.as_deref(), Some("sol"));
        assert!(settled.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_pending_query() {
        let (debouncer, mut settled) = QueryDebouncer::spawn(QUIET);
        debouncer.push("doge");
        debouncer.close().await;

        assert_eq!(settled.recv().await.as_deref(), Some("doge"));
        assert_eq!(settled.recv().await, None);
    }
}
