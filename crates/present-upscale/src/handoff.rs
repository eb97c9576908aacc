//! Bounded, order-preserving handoff between the presenting thread and the
//! upscale worker.
//!
//! Push never blocks; pop blocks until an item arrives or the queue has been
//! closed and drained. Closing drops the only sender, so a blocked consumer
//! wakes once the backlog is gone.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use present_core::CaptureError;

/// Push failure; the rejected item is handed back.
#[derive(Debug, PartialEq, Eq)]
pub enum HandoffError<T> {
    Full(T),
    Closed(T),
}

impl<T> HandoffError<T> {
    pub fn into_inner(self) -> T {
        match self {
            HandoffError::Full(item) | HandoffError::Closed(item) => item,
        }
    }
}

impl<T> From<HandoffError<T>> for CaptureError {
    fn from(err: HandoffError<T>) -> Self {
        match err {
            HandoffError::Full(_) => CaptureError::HandoffFull,
            HandoffError::Closed(_) => CaptureError::HandoffClosed,
        }
    }
}

pub struct FrameHandoff<T> {
    sender: Mutex<Option<Sender<T>>>,
    receiver: Receiver<T>,
    capacity: usize,
}

impl<T: Send> FrameHandoff<T> {
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            capacity,
        }
    }

    fn sender(&self) -> MutexGuard<'_, Option<Sender<T>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, item: T) -> Result<(), HandoffError<T>> {
        let sender = self.sender();
        let Some(tx) = sender.as_ref() else {
            return Err(HandoffError::Closed(item));
        };
        tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(item) => HandoffError::Full(item),
            TrySendError::Disconnected(item) => HandoffError::Closed(item),
        })
    }

    /// Block until an item is available. `None` once closed and drained.
    pub fn pop(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    pub fn try_pop(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Stop accepting new items. Idempotent.
    pub fn close(&self) {
        self.sender().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender().is_none()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
