//! Bounded worker pool with first-error propagation and cancellation.
//!
//! The pool runs submitted closures on at most `num_workers` threads, with a
//! bounded task queue providing back-pressure on submission. The first task
//! error is kept and returned from [`BoundedGroup::wait`]; later errors are
//! suppressed. An optional [`CancelToken`] is cancelled as soon as the first
//! error lands, so in-flight tasks can cut their work short by polling it.
//! Nothing is preempted.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Task<E> = Box<dyn FnOnce() -> Result<(), E> + Send + 'static>;

/// Cooperative cancellation flag, optionally chained to a parent token.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Default)]
struct TokenInner {
    cancelled: AtomicBool,
    parent: Option<CancelToken>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a child token: cancelling the parent cancels the child, not
    /// the other way around.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_cancelled())
    }
}

/// A bounded pool of workers running fallible tasks.
pub struct BoundedGroup<E> {
    tasks: Sender<Task<E>>,
    task_source: Receiver<Task<E>>,
    workers: Vec<JoinHandle<()>>,
    max_workers: usize,
    first_err: Arc<Mutex<Option<E>>>,
    cancel: Option<CancelToken>,
}

impl<E: Send + 'static> BoundedGroup<E> {
    /// Creates a group with `num_workers` worker threads at most and a task
    /// queue holding `max_pending_tasks` before submission blocks. Workers
    /// start lazily on the first submissions.
    pub fn new(num_workers: usize, max_pending_tasks: usize) -> Self {
        assert!(num_workers > 0, "bounded group needs at least one worker");
        let (tasks, task_source) = bounded(max_pending_tasks);
        Self {
            tasks,
            task_source,
            workers: Vec::with_capacity(num_workers),
            max_workers: num_workers,
            first_err: Arc::new(Mutex::new(None)),
            cancel: None,
        }
    }

    /// Same as [`BoundedGroup::new`], but ties a child of `parent` to the
    /// group: the child is cancelled on the first task error and again when
    /// the group is waited on.
    pub fn with_cancellation(
        parent: &CancelToken,
        num_workers: usize,
        max_pending_tasks: usize,
    ) -> (Self, CancelToken) {
        let child = parent.child();
        let mut group = Self::new(num_workers, max_pending_tasks);
        group.cancel = Some(child.clone());
        (group, child)
    }

    /// Submits a task. Blocks while the queue is full. Starts another worker
    /// first if the pool has not reached its cap.
    pub fn go(&mut self, f: impl FnOnce() -> Result<(), E> + Send + 'static) {
        if self.workers.len() < self.max_workers {
            self.spawn_worker();
        }
        self.tasks
            .send(Box::new(f))
            .expect("task queue closed before wait");
    }

    fn spawn_worker(&mut self) {
        let source = self.task_source.clone();
        let first_err = self.first_err.clone();
        let cancel = self.cancel.clone();
        self.workers.push(thread::spawn(move || {
            // Drains until the sender side is dropped in `wait`, which also
            // guarantees every submitted task runs before shutdown.
            while let Ok(task) = source.recv() {
                if let Err(err) = task() {
                    let mut slot = first_err.lock();
                    if slot.is_none() {
                        *slot = Some(err);
                        if let Some(token) = &cancel {
                            token.cancel();
                        }
                    }
                }
            }
        }));
    }

    /// Runs the queue dry, shuts the workers down, cancels the child token
    /// if one was attached, and returns the first task error.
    ///
    /// Consuming `self` makes a second wait unrepresentable.
    pub fn wait(self) -> Option<E> {
        drop(self.tasks);
        drop(self.task_source);
        for worker in self.workers {
            worker.join().expect("worker thread panicked");
        }
        if let Some(token) = &self.cancel {
            token.cancel();
        }
        self.first_err.lock().take()
    }
}
