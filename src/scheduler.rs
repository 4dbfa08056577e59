//! Periodic task trigger
//!
//! A deliberately small timer abstraction: a task is a no-argument closure,
//! and [`Periodic`] owns a worker thread that invokes it on a fixed
//! interval until dropped. The expiration sweeper registers itself here;
//! nothing in the core knows it is being scheduled.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The once-daily interval used for the expiration sweep
pub const DAILY: Duration = Duration::from_secs(24 * 60 * 60);

struct Shared {
    stop: Mutex<bool>,
    signal: Condvar,
}

/// A periodic trigger owning its worker thread
///
/// The task runs once per interval, starting one interval after
/// [`Periodic::spawn`]. Dropping the handle stops the worker promptly,
/// without waiting out the current interval.
pub struct Periodic {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Periodic {
    /// Spawn a worker invoking `task` every `interval`
    pub fn spawn<F>(interval: Duration, task: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            stop: Mutex::new(false),
            signal: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || loop {
            let mut stop = worker_shared.stop.lock();
            if *stop {
                break;
            }
            // Wake early only when asked to stop.
            worker_shared.signal.wait_for(&mut stop, interval);
            if *stop {
                break;
            }
            drop(stop);
            task();
        });

        Periodic {
            shared,
            worker: Some(worker),
        }
    }

    /// Ask the worker to stop and wait for it to finish
    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        *self.shared.stop.lock() = true;
        self.shared.signal.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Periodic {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_periodic_fires_repeatedly() {
        let count = Arc::new(AtomicUsize::new(0));
        let task_count = Arc::clone(&count);

        let timer = Periodic::spawn(Duration::from_millis(10), move || {
            task_count.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(120));
        timer.shutdown();

        let fired = count.load(Ordering::SeqCst);
        assert!(fired >= 2, "expected at least 2 firings, got {}", fired);
    }

    #[test]
    fn test_shutdown_is_prompt_for_long_intervals() {
        let timer = Periodic::spawn(DAILY, || {});
        // Must return without waiting out the 24h interval.
        timer.shutdown();
    }

    #[test]
    fn test_drop_stops_the_worker() {
        let count = Arc::new(AtomicUsize::new(0));
        let task_count = Arc::clone(&count);
        {
            let _timer = Periodic::spawn(Duration::from_millis(5), move || {
                task_count.fetch_add(1, Ordering::SeqCst);
            });
            thread::sleep(Duration::from_millis(30));
        }
        let after_drop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_drop);
    }
}
