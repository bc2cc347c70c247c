//! EventNotifier implementations.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::ports::{EventNotifier, Notification, NotifierError};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Pushes notifications onto a bounded queue drained by a consumer task.
#[derive(Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventNotifier for ChannelNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifierError> {
        self.sender
            .send(notification)
            .await
            .map_err(|_| NotifierError::Closed)
    }
}

/// Keeps every notification in memory.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Notification> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifierError> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(notification);
        }
        Ok(())
    }
}
