//! Debounce Scheduler
//!
//! Coalesces bursts of filter-change signals into a single evaluation fired
//! once the input has been quiet for a fixed window, measured from the most
//! recent signal.
//!
//! [`Debouncer`] is the synchronous state machine: a single pending slot
//! plus a deadline. Signalling replaces whatever is pending, so superseded
//! work is discarded and never executed. [`run`] drives a debouncer from a
//! channel on one task; the fire callback runs to completion before the
//! next signal is looked at, and nothing in flight is interrupted.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Quiescence window used by the interactive filter path
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Single-slot debouncer
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
    superseded: u64,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            superseded: 0,
        }
    }

    /// Schedule `item`, replacing any pending item and restarting the window
    pub fn signal(&mut self, item: T, now: Instant) {
        if self.pending.is_some() {
            self.superseded += 1;
        }
        self.pending = Some((item, now + self.window));
    }

    /// When the pending item becomes due, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Take the pending item if its window has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(item, _)| item),
            _ => None,
        }
    }

    /// Drop the pending item without firing it
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(item, _)| item)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of signals discarded because a newer one replaced them
    pub fn superseded(&self) -> u64 {
        self.superseded
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Drive a debouncer from `rx`, calling `fire` once per quiet period.
///
/// Returns when the channel closes; an item still pending at that point is
/// discarded.
pub async fn run<T, F, Fut>(mut rx: mpsc::UnboundedReceiver<T>, window: Duration, mut fire: F)
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut debouncer = Debouncer::new(window);

    loop {
        let deadline = debouncer.deadline();
        let sleep = sleep_until(deadline.unwrap_or_else(|| Instant::now() + window));

        tokio::select! {
            received = rx.recv() => match received {
                Some(item) => debouncer.signal(item, Instant::now()),
                None => break,
            },
            _ = sleep, if deadline.is_some() => {
                if let Some(item) = debouncer.poll(Instant::now()) {
                    fire(item).await;
                }
            }
        }
    }

    if debouncer.cancel().is_some() {
        tracing::trace!("Discarded pending debounced item on shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const WINDOW: Duration = Duration::from_millis(250);

    #[test]
    fn test_not_due_before_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.signal("a", start);

        assert!(debouncer.poll(start + Duration::from_millis(249)).is_none());
        assert_eq!(debouncer.poll(start + WINDOW), Some("a"));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_burst_coalesces_to_latest() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        debouncer.signal(1, start);
        debouncer.signal(2, start + Duration::from_millis(100));
        debouncer.signal(3, start + Duration::from_millis(200));

        // Window restarts from the last signal
        assert!(debouncer.poll(start + Duration::from_millis(300)).is_none());
        assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(450)));
        assert_eq!(debouncer.poll(start + Duration::from_millis(450)), Some(3));
        assert_eq!(debouncer.superseded(), 2);
        assert!(debouncer.poll(start + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.signal("x", start);

        assert_eq!(debouncer.cancel(), Some("x"));
        assert!(debouncer.poll(start + WINDOW).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_fires_once_per_quiet_period() {
        let (tx, rx) = mpsc::unbounded_channel();
        let fired = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&fired);
        let task = tokio::spawn(run(rx, WINDOW, move |item: u32| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(item);
            }
        }));

        for i in 0..5 {
            tx.send(i).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*fired.lock().unwrap(), vec![4]);

        tx.send(10).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*fired.lock().unwrap(), vec![4, 10]);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_discards_pending_on_close() {
        let (tx, rx) = mpsc::unbounded_channel();
        let fired = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&fired);
        let task = tokio::spawn(run(rx, WINDOW, move |item: u32| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(item);
            }
        }));

        tx.send(1).unwrap();
        drop(tx);
        task.await.unwrap();

        assert!(fired.lock().unwrap().is_empty());
    }
}
