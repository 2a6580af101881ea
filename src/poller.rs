//! Repeating uploads refresh.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::worker::WorkerCmd;

/// Sends `RefreshUploads` to the worker on a fixed period.
///
/// The first tick fires immediately so the table loads on startup. The task
/// stops on [`cancel`](Self::cancel), on drop, or when the worker goes away.
pub struct RefreshTimer {
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    /// Spawn the timer task on the current runtime.
    pub fn spawn(period: Duration, worker_tx: mpsc::Sender<WorkerCmd>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            // After a stall, keep ticks spaced rather than bursting.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if worker_tx.send(WorkerCmd::RefreshUploads).await.is_err() {
                    tracing::info!("refresh timer stopped: worker closed");
                    break;
                }
            }
        });
        tracing::info!("refresh timer started: every {:?}", period);
        Self { handle }
    }

    /// Stop ticking.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_ready(rx: &mut mpsc::Receiver<WorkerCmd>) -> usize {
        let mut n = 0;
        while let Ok(cmd) = rx.try_recv() {
            assert!(matches!(cmd, WorkerCmd::RefreshUploads));
            n += 1;
        }
        n
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_immediately_then_every_period() {
        let (tx, mut rx) = mpsc::channel(16);
        let timer = RefreshTimer::spawn(Duration::from_secs(3), tx);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count_ready(&mut rx), 1);

        time::sleep(Duration::from_millis(6_000)).await;
        assert_eq!(count_ready(&mut rx), 2);

        timer.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (tx, mut rx) = mpsc::channel(16);
        let timer = RefreshTimer::spawn(Duration::from_secs(3), tx);
        time::sleep(Duration::from_millis(100)).await;
        count_ready(&mut rx);

        timer.cancel();
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count_ready(&mut rx), 0);
        assert!(timer.handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_worker_closes() {
        let (tx, rx) = mpsc::channel(16);
        let timer = RefreshTimer::spawn(Duration::from_secs(3), tx);
        drop(rx);

        time::sleep(Duration::from_secs(1)).await;
        assert!(timer.handle.is_finished());
    }
}
