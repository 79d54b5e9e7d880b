use crossbeam::channel::{self, select, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

/// Handle to a delayed task. Cancelling or dropping it keeps a not-yet-fired task from running.
#[derive(Debug)]
pub struct ScheduledTask {
    cancel_tx: Sender<()>,
}

impl ScheduledTask {
    /// Creates a handle together with the receiver a scheduler watches for cancellation
    pub fn pair() -> (Self, CancelToken) {
        let (cancel_tx, cancel_rx) = channel::bounded(1);
        (Self { cancel_tx }, CancelToken { cancel_rx })
    }

    pub fn cancel(self) {
        let _ = self.cancel_tx.try_send(());
    }
}

/// Scheduler-side view of a [`ScheduledTask`]
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancel_rx: Receiver<()>,
}

impl CancelToken {
    /// True once the handle was cancelled or dropped
    pub fn is_cancelled(&self) -> bool {
        !matches!(self.cancel_rx.try_recv(), Err(TryRecvError::Empty))
    }
}

pub trait Scheduler: Send + Sync + 'static {
    fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static;

    /// Runs `f` after `delay` unless the returned handle is cancelled or dropped first
    fn schedule<F>(&self, delay: Duration, f: F) -> ScheduledTask
    where
        F: FnOnce() + Send + 'static;
}

pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        ThreadScheduler
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let _ = thread::spawn(f);
    }

    fn schedule<F>(&self, delay: Duration, f: F) -> ScheduledTask
    where
        F: FnOnce() + Send + 'static,
    {
        let (task, token) = ScheduledTask::pair();
        self.spawn(move || {
            select! {
                // A cancel message or a dropped handle both end up here
                recv(token.cancel_rx) -> _ => {}
                recv(channel::after(delay)) -> _ => f(),
            }
        });
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_thread_scheduler_spawn() {
        let scheduler = ThreadScheduler::new();
        let flag = Arc::new(Mutex::new(false));
        let flag_clone = flag.clone();

        scheduler.spawn(move || {
            let mut flag = flag_clone.lock().unwrap();
            *flag = true;
        });

        // Give the thread a moment to execute
        thread::sleep(Duration::from_millis(10));
        assert!(*flag.lock().unwrap());
    }

    #[test]
    fn test_scheduled_task_runs_after_delay() {
        let scheduler = ThreadScheduler::new();
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();

        let task = scheduler.schedule(Duration::from_millis(20), move || {
            fired_clone.store(true, Ordering::SeqCst);
        });

        assert!(!fired.load(Ordering::SeqCst));
        thread::sleep(Duration::from_millis(100));
        assert!(fired.load(Ordering::SeqCst));
        drop(task);
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let scheduler = ThreadScheduler::new();
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();

        let task = scheduler.schedule(Duration::from_millis(30), move || {
            fired_clone.store(true, Ordering::SeqCst);
        });
        task.cancel();

        thread::sleep(Duration::from_millis(100));
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancel_token_state() {
        let (task, token) = ScheduledTask::pair();
        assert!(!token.is_cancelled());
        task.cancel();
        assert!(token.is_cancelled());

        let (task, token) = ScheduledTask::pair();
        drop(task);
        assert!(token.is_cancelled());
    }
}
