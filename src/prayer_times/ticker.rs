use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Tick every period until stopped.
    Every(Duration),
    /// Tick once after the delay, then end.
    Once(Duration),
}

/// Background timer feeding [`Tick`]s into a channel. Dropping the ticker
/// (or calling [`Ticker::stop`]) cancels it; nothing fires afterwards.
pub struct Ticker {
    rx: mpsc::Receiver<Tick>,
    cancel: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn every(period: Duration) -> Self {
        Self::spawn(Cadence::Every(period))
    }

    pub fn once_after(delay: Duration) -> Self {
        Self::spawn(Cadence::Once(delay))
    }

    pub fn spawn(cadence: Cadence) -> Self {
        let (tx, rx) = mpsc::channel();
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let (period, repeat) = match cadence {
                Cadence::Every(p) => (p, true),
                Cadence::Once(d) => (d, false),
            };
            let mut deadline = Instant::now() + period;
            loop {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match cancel_rx.recv_timeout(timeout) {
                    Err(RecvTimeoutError::Timeout) => {}
                    // explicit cancel or the ticker was dropped
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                if tx.send(Tick).is_err() || !repeat {
                    break;
                }
                deadline += period;
            }
        });

        Self {
            rx,
            cancel: Some(cancel_tx),
            handle: Some(handle),
        }
    }

    pub fn next(&self) -> Result<Tick, mpsc::RecvError> {
        self.rx.recv()
    }

    pub fn try_next(&self) -> Option<Tick> {
        self.rx.try_recv().ok()
    }

    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        // discard anything queued before the cancel landed
        while self.rx.try_recv().is_ok() {}
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
