use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{mpsc, Notify};

/// Holds only the newest `state` frame for a session. A slow reader skips
/// frames instead of queueing them.
#[derive(Debug)]
pub struct LatestFrame {
    frame: StdMutex<Option<String>>,
    notify: Notify,
}

impl LatestFrame {
    pub(crate) fn new() -> Self {
        Self {
            frame: StdMutex::new(None),
            notify: Notify::new(),
        }
    }

    pub(crate) fn store(&self, payload: String) {
        *self.frame.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload);
        self.notify.notify_one();
    }

    pub fn take_latest(&self) -> Option<String> {
        self.frame.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    pub async fn wait_for_update(&self) {
        self.notify.notified().await;
    }
}

pub struct SessionIo {
    pub session_id: String,
    pub outbound_state: Arc<LatestFrame>,
    pub outbound_rx: mpsc::Receiver<String>,
}
