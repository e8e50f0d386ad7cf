use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::{AbortHandle, Abortable};
use pubsub_memory_core::PollSessionId;

pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

/// Single-threaded task spawning and timers of the host event loop.
pub trait Scheduler: Clone + 'static {
    fn spawn_local(&self, task: LocalTask);
    fn sleep(&self, duration: Duration) -> LocalTask;
}

/// Spawn `task` so that it can be cancelled through the returned handle.
pub fn spawn_abortable<H: Scheduler>(
    scheduler: &H,
    task: impl Future<Output = ()> + 'static,
) -> AbortHandle {
    let (handle, registration) = AbortHandle::new_pair();
    let task = Abortable::new(task, registration);
    scheduler.spawn_local(Box::pin(async move {
        let _ = task.await;
    }));
    handle
}

/// Counts timer tasks that are still alive (neither finished nor dropped after abort).
#[derive(Debug, Clone, Default)]
pub struct LiveTimers {
    count: Rc<Cell<usize>>,
}

impl LiveTimers {
    pub fn get(&self) -> usize {
        self.count.get()
    }

    /// Token to move into a timer task; the count drops when the task does.
    pub fn track(&self) -> LiveTimerGuard {
        self.count.set(self.count.get() + 1);
        LiveTimerGuard {
            count: self.count.clone(),
        }
    }
}

pub struct LiveTimerGuard {
    count: Rc<Cell<usize>>,
}

impl Drop for LiveTimerGuard {
    fn drop(&mut self) {
        self.count.set(self.count.get().saturating_sub(1));
    }
}

/// The interval and safety-timeout timers of one poll session.
#[derive(Debug)]
pub struct PollTimers {
    pub session: PollSessionId,
    interval: AbortHandle,
    timeout: AbortHandle,
}

impl PollTimers {
    pub fn new(session: PollSessionId, interval: AbortHandle, timeout: AbortHandle) -> Self {
        Self {
            session,
            interval,
            timeout,
        }
    }

    pub fn cancel(self) {
        self.interval.abort();
        self.timeout.abort();
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;

    /// Runs tasks on the current tokio `LocalSet`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TokioScheduler;

    impl Scheduler for TokioScheduler {
        fn spawn_local(&self, task: LocalTask) {
            tokio::task::spawn_local(task);
        }

        fn sleep(&self, duration: Duration) -> LocalTask {
            Box::pin(tokio::time::sleep(duration))
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::TokioScheduler;
