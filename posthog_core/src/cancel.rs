/**
 * Cooperative cancellation for the delivery pipeline.
 *
 * A `CancellationSource` is created by the client at construction and
 * hands out `CancellationToken` clones. Tokens carry two views of the
 * same state:
 *
 * - a shared flag for cheap point-in-time checks (`is_cancelled`)
 * - a channel that disconnects on cancel, so a worker blocked in a
 *   `select!` wakes up the moment the signal fires
 *
 * Cancellation is one-way and sticky: once fired it never resets.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};

// ---------------------------------------------------------------------------
// CancellationSource
// ---------------------------------------------------------------------------

/**
 * The owning side of a cancellation pair.
 *
 * Dropping the source cancels it, so teardown is unconditional even when
 * `cancel()` is never called explicitly.
 */
pub struct CancellationSource {
    /// Sticky flag observed by every token.
    cancelled: Arc<AtomicBool>,

    /// Held only to keep the signal channel connected; taken on cancel.
    guard: Mutex<Option<Sender<()>>>,

    /// Template receiver cloned into each token.
    signal: Receiver<()>,
}

impl CancellationSource {
    pub fn new() -> Self {
        /*
         * Zero-capacity channel used purely for its disconnect edge:
         * nothing is ever sent through it. Dropping the sender wakes every
         * receiver blocked in a select.
         */
        let (sender, signal) = crossbeam_channel::bounded(0);

        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            guard: Mutex::new(Some(sender)),
            signal,
        }
    }

    /**
     * Creates a token observing this source.
     */
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            cancelled: self.cancelled.clone(),
            signal: self.signal.clone(),
        }
    }

    /**
     * Fires the signal. Idempotent.
     *
     * The flag is raised before the channel disconnects, so a woken waiter
     * always observes `is_cancelled() == true`.
     */
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);

        if let Ok(mut guard) = self.guard.lock() {
            guard.take();
        }
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancellationSource {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// CancellationToken
// ---------------------------------------------------------------------------

/**
 * A cheap, clonable handle observing a `CancellationSource`.
 */
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    signal: Receiver<()>,
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /**
     * The channel view of the signal, for use in `select!` arms.
     * Receiving an error on it means the source has been cancelled.
     */
    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}
