//! Cooperative stop signal shared by the control loop and playback

use std::sync::Arc;

use tokio::sync::watch;

/// Requests that an in-flight `speak` call stop early
///
/// Cloning yields another handle to the same signal.
#[derive(Debug, Clone)]
pub struct Interrupt {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    /// Create an untriggered interrupt
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Ask the current call to stop
    pub fn trigger(&self) {
        self.tx.send_replace(true);
        tracing::debug!("interrupt triggered");
    }

    /// Clear a previous trigger so the next call runs normally
    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    /// Whether a stop has been requested
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Observer side of the signal
    #[must_use]
    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer side of an [`Interrupt`]
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Poll without blocking
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once a stop has been requested
    ///
    /// Never resolves if every [`Interrupt`] handle is dropped untriggered.
    pub async fn stopped(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
