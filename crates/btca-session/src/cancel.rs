use btca_types::CancelState;
use std::sync::Arc;
use tokio::sync::watch;

/// Owner of the cancel signal for the in-flight turn.
///
/// `none --request--> requested --acknowledge--> canceled`, reset to `none`
/// when the next turn starts. Requests come in through [`CancelHandle`]s,
/// which can live on other tasks (a Ctrl-C listener, a key binding).
pub struct CancelCoordinator {
    tx: Arc<watch::Sender<CancelState>>,
    rx: watch::Receiver<CancelState>,
}

/// Cloneable requester side of the cancel signal
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<CancelState>>,
}

impl CancelCoordinator {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(CancelState::None);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.tx),
        }
    }

    pub fn state(&self) -> CancelState {
        *self.tx.borrow()
    }

    /// True once a request was made for this turn, acknowledged or not
    pub fn is_requested(&self) -> bool {
        self.state() != CancelState::None
    }

    pub fn reset(&self) {
        self.tx.send_replace(CancelState::None);
    }

    /// Move `requested` to `canceled`. Returns false in any other state.
    pub fn acknowledge(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == CancelState::Requested {
                *state = CancelState::Canceled;
                true
            } else {
                false
            }
        })
    }

    /// Resolves as soon as a request exists, immediately if one already does
    pub async fn requested(&mut self) {
        // the sender lives in self, so the channel cannot close here
        let _ = self.rx.wait_for(|state| *state != CancelState::None).await;
    }
}

impl Default for CancelCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    /// Ask the in-flight turn to stop. Returns false if a request was
    /// already made.
    pub fn request(&self) -> bool {
        let requested = self.tx.send_if_modified(|state| {
            if *state == CancelState::None {
                *state = CancelState::Requested;
                true
            } else {
                false
            }
        });
        if requested {
            tracing::info!("Cancellation requested");
        }
        requested
    }

    pub fn state(&self) -> CancelState {
        *self.tx.borrow()
    }
}
