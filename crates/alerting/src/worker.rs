//! Background notification sender
//!
//! The worker task is the only owner of the dispatcher, so the cooldown
//! state needs no lock. The decision loop hands requests over a bounded
//! queue and never waits on the network.

use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::NotificationDispatcher;

/// One onset notification waiting to be sent
#[derive(Debug, Clone)]
pub struct AlertRequest {
    pub message: String,
    /// When the onset happened; the cooldown is measured from here
    pub raised_at: Instant,
}

/// Cheap, cloneable handle used by the decision loop
#[derive(Debug, Clone)]
pub struct NotificationHandle {
    tx: mpsc::Sender<AlertRequest>,
}

impl NotificationHandle {
    /// Queue a request without blocking.
    ///
    /// Returns `false` if the request was dropped (queue full or worker gone).
    pub fn notify(&self, request: AlertRequest) -> bool {
        match self.tx.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Notification queue full, dropping alert");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Notification worker stopped, dropping alert");
                false
            }
        }
    }
}

/// Spawn the sender task.
///
/// Requests are sent strictly in arrival order. The task ends once every
/// handle is dropped and the queue is drained, handing the dispatcher back.
pub fn spawn_worker(
    mut dispatcher: NotificationDispatcher,
    capacity: usize,
) -> (NotificationHandle, JoinHandle<NotificationDispatcher>) {
    let (tx, mut rx) = mpsc::channel::<AlertRequest>(capacity.max(1));

    let task = tokio::spawn(async move {
        info!(
            "Notification worker started with {} channel(s)",
            dispatcher.channel_count()
        );

        while let Some(request) = rx.recv().await {
            let sent = dispatcher
                .send_alert(&request.message, request.raised_at)
                .await;
            debug!("Notification request processed (sent: {})", sent);
        }

        info!("Notification worker stopped");
        dispatcher
    });

    (NotificationHandle { tx }, task)
}
