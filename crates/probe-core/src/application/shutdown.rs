//! Shutdown signal shared by the loop and its pollers.

use std::time::Duration;

use tokio::sync::watch;

use crate::domain::ProbeError;

/// Receiving side of a `watch` shutdown channel. `true` means stop.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// New channel. Send `true` on the sender to request shutdown.
    pub fn new() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// Wrap an existing receiver.
    pub fn from_receiver(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Signal that never fires.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // Dropping the sender leaves the value at `false` for good.
        drop(tx);
        Self { rx }
    }

    /// Has shutdown been requested?
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested. Pends forever if the sender is
    /// dropped without requesting it.
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `duration`, failing with [`ProbeError::Cancelled`] if
    /// shutdown is requested first.
    pub async fn sleep(&mut self, duration: Duration) -> Result<(), ProbeError> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.triggered() => Err(ProbeError::Cancelled),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::never()
    }
}
