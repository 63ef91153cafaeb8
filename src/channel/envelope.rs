//! Envelope wrapper pairing a message with its admission time

use std::time::{Duration, Instant};

/// A message as it sits inside a [`Channel`](crate::channel::Channel)
///
/// The enqueue timestamp is captured by the channel at publish time and is
/// only used to compute queue-wait latency. Envelopes are immutable; the
/// payload can be borrowed or taken back with [`Envelope::into_message`].
#[derive(Debug)]
pub struct Envelope<T> {
    message: T,
    enqueued_at: Instant,
}

impl<T> Envelope<T> {
    pub(crate) fn new(message: T) -> Self {
        Self {
            message,
            enqueued_at: Instant::now(),
        }
    }

    pub fn message(&self) -> &T {
        &self.message
    }

    /// Monotonic instant at which the channel admitted this message
    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    /// Time spent since admission
    pub fn queue_wait(&self) -> Duration {
        self.enqueued_at.elapsed()
    }

    pub fn into_message(self) -> T {
        self.message
    }

    /// Take the payload out, keeping a payload-free envelope as a receipt
    ///
    /// The receipt retains the enqueue timestamp, so it can still be passed
    /// to [`Channel::record_processed`](crate::channel::Channel::record_processed)
    /// after the message itself has been handed to a handler.
    pub fn split(self) -> (T, Envelope<()>) {
        (
            self.message,
            Envelope {
                message: (),
                enqueued_at: self.enqueued_at,
            },
        )
    }
}
