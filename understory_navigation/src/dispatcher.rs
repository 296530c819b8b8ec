// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Affinity boundary for result completion.
//!
//! Typed results are signaled through a [`Dispatcher`] so that a toolkit can run the
//! continuation on its UI thread. [`InlineDispatcher`] runs tasks immediately;
//! [`QueuedDispatcher`] holds them until [`QueuedDispatcher::run_pending`] is called from
//! the owning thread.

use core::fmt;

use parking_lot::Mutex;

/// A unit of work marshaled onto the dispatcher.
pub type Task = Box<dyn FnOnce() + Send>;

/// Runs tasks on the region tree's affinity context.
pub trait Dispatcher: Send + Sync + fmt::Debug {
    /// Schedule `task`.
    fn dispatch(&self, task: Task);
}

/// Runs every task on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, task: Task) {
        task();
    }
}

/// Queues tasks until they are drained.
#[derive(Default)]
pub struct QueuedDispatcher {
    queue: Mutex<Vec<Task>>,
}

impl fmt::Debug for QueuedDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedDispatcher")
            .field("pending", &self.queue.lock().len())
            .finish()
    }
}

impl QueuedDispatcher {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run queued tasks in submission order, including tasks queued while running.
    ///
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch = core::mem::take(&mut *self.queue.lock());
            if batch.is_empty() {
                return ran;
            }
            for task in batch {
                task();
                ran += 1;
            }
        }
    }
}

impl Dispatcher for QueuedDispatcher {
    fn dispatch(&self, task: Task) {
        self.queue.lock().push(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn queued_tasks_wait_for_the_drain() {
        let dispatcher = Arc::new(QueuedDispatcher::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let d = dispatcher.clone();
        dispatcher.dispatch(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
            let h = h.clone();
            d.dispatch(Box::new(move || {
                h.fetch_add(10, Ordering::SeqCst);
            }));
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.pending(), 1);
        assert_eq!(dispatcher.run_pending(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 11);
    }
}
