use crossbeam_channel::{Receiver, TryRecvError};

use crate::runtime::{PromoteResult, Promotion};

/// One-shot future for a submitted promotion. Either already resolved
/// (no-op and failure paths never reach a worker) or waiting on the
/// worker's reply channel.
pub struct PromotionHandle {
    inner: Inner,
}

enum Inner {
    Ready(Option<PromoteResult>),
    Pending(Receiver<PromoteResult>),
}

impl PromotionHandle {
    pub(crate) fn ready(result: PromoteResult) -> Self {
        Self {
            inner: Inner::Ready(Some(result)),
        }
    }

    pub(crate) fn pending(rx: Receiver<PromoteResult>) -> Self {
        Self {
            inner: Inner::Pending(rx),
        }
    }

    /// Non-blocking poll; `None` while the task is still running. Once a
    /// result has been taken, further polls return `None`.
    pub fn poll(&mut self) -> Option<PromoteResult> {
        match &mut self.inner {
            Inner::Ready(slot) => slot.take(),
            Inner::Pending(rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                // Worker side gone before replying.
                Err(TryRecvError::Disconnected) => Some(Ok(Promotion::Unloaded)),
            },
        }
    }

    /// Blocks until the task finishes. A runtime that shut down before
    /// running the task resolves as `Unloaded`.
    pub fn wait(self) -> PromoteResult {
        match self.inner {
            Inner::Ready(slot) => slot.unwrap_or(Ok(Promotion::Unloaded)),
            Inner::Pending(rx) => rx.recv().unwrap_or(Ok(Promotion::Unloaded)),
        }
    }
}
