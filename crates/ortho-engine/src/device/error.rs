use std::sync::{Arc, Mutex, MutexGuard};

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Collects device errors that wgpu reports through its uncaptured-error
/// callback (validation failures, out-of-memory).
///
/// Cloning yields another handle to the same queue. Every message is logged at
/// `error` when it arrives; callers drain the queue at points where they can
/// attribute the failure (after pipeline creation, after encoding a frame).
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    pending: Arc<Mutex<Vec<String>>>,
}

impl ErrorSink {
    /// Creates a sink and installs it as `device`'s uncaptured-error handler.
    pub fn install(device: &wgpu::Device) -> Self {
        let sink = Self::default();
        let handle = sink.clone();
        device.on_uncaptured_error(Arc::new(move |err: wgpu::Error| {
            handle.push(err.to_string());
        }));
        sink
    }

    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        log::error!("gpu: {message}");
        self.lock().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes and returns every pending message.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    /// Drains the queue into a single message, or `None` when nothing was
    /// reported.
    pub fn take_joined(&self) -> Option<String> {
        let messages = self.drain();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join("\n"))
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_queue() {
        let sink = ErrorSink::default();
        let other = sink.clone();
        other.push("validation error");
        assert!(!sink.is_empty());
        assert_eq!(sink.drain(), vec!["validation error".to_string()]);
        assert!(other.is_empty());
    }

    #[test]
    fn take_joined_concatenates_and_clears() {
        let sink = ErrorSink::default();
        assert_eq!(sink.take_joined(), None);
        sink.push("a");
        sink.push("b");
        assert_eq!(sink.take_joined().as_deref(), Some("a\nb"));
        assert_eq!(sink.take_joined(), None);
    }
}
