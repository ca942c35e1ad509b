//! Background command queue.
//!
//! A single worker thread drains submitted commands in FIFO order, runs each
//! through a [`ProcessRunner`] and posts the callback onto the UI thread via a
//! [`Dispatcher`]. Producers never block.
//!
//! Cancellation is cooperative: cancelling flips the command's runnable flag.
//! Cancelled tasks stay queued; the worker skips them when it reaches them.
//! A task cancelled while its process is already running still runs to
//! completion, but its callback is suppressed on the UI thread.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::dispatch::Dispatcher;
use crate::error::{TmsuError, TmsuResult};
use crate::executor::{CancelToken, Command, ProcessRunner};

/// Caller-chosen key used to cancel a tracked submission
pub type Handle = u64;

/// Completion callback, invoked at most once on the UI thread
pub type Callback = Box<dyn FnOnce(&Command, TmsuResult<String>) + Send + 'static>;

type Registry = HashMap<Handle, CancelToken>;

struct Task {
    command: Command,
    callback: Option<Callback>,
    handle: Option<Handle>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counts tasks that have been submitted but not yet finished by the worker
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn add(&self) {
        *lock(&self.count) += 1;
    }

    fn done(&self) {
        let mut count = lock(&self.count);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn get(&self) -> usize {
        *lock(&self.count)
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = lock(&self.count);
        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            count = self
                .idle
                .wait_timeout(count, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

/// State shared between producers, the worker and UI-thread deliveries
struct Shared {
    active: Mutex<Registry>,
    pending: Pending,
    runner: Arc<dyn ProcessRunner>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Shared {
    /// Drop the registration for `handle` if it still belongs to `token`
    fn release(active: &mut Registry, handle: Option<Handle>, token: &CancelToken) {
        if let Some(handle) = handle {
            if active.get(&handle).is_some_and(|t| t.same_as(token)) {
                active.remove(&handle);
            }
        }
    }

    fn process(self: &Arc<Self>, task: Task) {
        let Task {
            command,
            callback,
            handle,
        } = task;

        // Checked under the registry lock so it serializes with cancel()
        let runnable = {
            let mut active = lock(&self.active);
            let runnable = command.can_run();
            if !runnable {
                Self::release(&mut active, handle, command.token());
            }
            runnable
        };

        if !runnable {
            tracing::debug!("skipping cancelled command: {}", command);
            self.pending.done();
            return;
        }

        let result = command.execute_with(self.runner.as_ref());

        match callback {
            Some(callback) => {
                let shared = Arc::clone(self);
                self.dispatcher.dispatch(Box::new(move || {
                    let deliver = {
                        let mut active = lock(&shared.active);
                        Self::release(&mut active, handle, command.token());
                        command.can_run()
                    };
                    if deliver {
                        callback(&command, result);
                    } else {
                        tracing::debug!("command cancelled while running, dropping result");
                    }
                }));
            }
            None => {
                let mut active = lock(&self.active);
                Self::release(&mut active, handle, command.token());
            }
        }

        self.pending.done();
    }
}

/// Single-worker FIFO queue of external commands
pub struct TaskQueue {
    sender: Mutex<Sender<Task>>,
    receiver: Mutex<Option<Receiver<Task>>>,
    shared: Arc<Shared>,
}

impl TaskQueue {
    /// Create a queue. No work runs until [`TaskQueue::start`].
    pub fn new(runner: Arc<dyn ProcessRunner>, dispatcher: Arc<dyn Dispatcher>) -> Arc<Self> {
        let (tx, rx) = mpsc::channel();
        Arc::new(Self {
            sender: Mutex::new(tx),
            receiver: Mutex::new(Some(rx)),
            shared: Arc::new(Shared {
                active: Mutex::new(HashMap::new()),
                pending: Pending::default(),
                runner,
                dispatcher,
            }),
        })
    }

    /// Create a queue and start its worker
    pub fn spawn(
        runner: Arc<dyn ProcessRunner>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> TmsuResult<Arc<Self>> {
        let queue = Self::new(runner, dispatcher);
        queue.start()?;
        Ok(queue)
    }

    /// Start the worker thread. Returns `false` if it was already started.
    pub fn start(&self) -> TmsuResult<bool> {
        let Some(receiver) = lock(&self.receiver).take() else {
            tracing::debug!("worker thread already running");
            return Ok(false);
        };

        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("tmsu-worker".to_string())
            .spawn(move || {
                for task in receiver.iter() {
                    shared.process(task);
                }
                tracing::debug!("worker thread stopped");
            })
            .map_err(TmsuError::Io)?;

        tracing::info!("worker thread started");
        Ok(true)
    }

    /// Queue `command` without a callback
    pub fn submit_detached(&self, command: Command) {
        self.push(Task {
            command,
            callback: None,
            handle: None,
        });
    }

    /// Queue `command`; `callback` receives the result on the UI thread
    pub fn submit<F>(&self, command: Command, callback: F)
    where
        F: FnOnce(&Command, TmsuResult<String>) + Send + 'static,
    {
        self.push(Task {
            command,
            callback: Some(Box::new(callback)),
            handle: None,
        });
    }

    /// Like [`TaskQueue::submit`], registering the command under `handle` so
    /// it can be cancelled with [`TaskQueue::cancel`].
    pub fn submit_tracked<F>(&self, handle: Handle, command: Command, callback: F)
    where
        F: FnOnce(&Command, TmsuResult<String>) + Send + 'static,
    {
        {
            let mut active = lock(&self.shared.active);
            if let Some(previous) = active.insert(handle, command.token().clone()) {
                // The host reused a handle; the older request is obsolete
                previous.cancel();
            }
        }
        self.push(Task {
            command,
            callback: Some(Box::new(callback)),
            handle: Some(handle),
        });
    }

    /// Cancel the command registered under `handle`.
    ///
    /// Returns `true` if a registration was found. Cancelling an unknown or
    /// already cancelled handle does nothing.
    pub fn cancel(&self, handle: Handle) -> bool {
        let mut active = lock(&self.shared.active);
        match active.remove(&handle) {
            Some(token) => {
                token.cancel();
                tracing::trace!(handle, "cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether `handle` still has a live registration
    pub fn is_active(&self, handle: Handle) -> bool {
        lock(&self.shared.active).contains_key(&handle)
    }

    /// Number of tasks submitted but not yet finished by the worker
    pub fn pending(&self) -> usize {
        self.shared.pending.get()
    }

    /// Block until the worker has finished every submitted task, or `timeout`
    /// elapses. Callbacks may still be waiting on the UI thread.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.shared.pending.wait_idle(timeout)
    }

    fn push(&self, task: Task) {
        self.shared.pending.add();
        if let Err(mpsc::SendError(task)) = lock(&self.sender).send(task) {
            tracing::error!("worker thread is gone, dropping command: {}", task.command);
            if let Some(handle) = task.handle {
                Shared::release(&mut lock(&self.shared.active), Some(handle), task.command.token());
            }
            self.shared.pending.done();
        }
    }
}
