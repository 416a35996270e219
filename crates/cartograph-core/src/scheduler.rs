// ABOUTME: Single worker thread executing queued tasks strictly one at a time
// ABOUTME: FIFO queue, drain-on-stop, and fault isolation between tasks

use cartograph_logging::{OperationStats, PerfStats, PerfTimer, debug, error, info, trace, warn};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crate::error::{SchedulerError, TaskError};

/// Name of the scheduler's worker thread
pub const WORKER_THREAD_NAME: &str = "task-scheduler";

/// Tasks running longer than this log a slow operation warning
pub const DEFAULT_SLOW_TASK_THRESHOLD: Duration = Duration::from_millis(250);

type TaskBody = Box<dyn FnOnce() -> Result<(), TaskError> + Send + 'static>;

/// A named unit of work for the worker thread
pub struct Task {
    name: String,
    body: TaskBody,
}

impl Task {
    pub fn new<F>(name: impl Into<String>, work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::fallible(name, move || {
            work();
            Ok(())
        })
    }

    pub fn fallible<F>(name: impl Into<String>, work: F) -> Self
    where
        F: FnOnce() -> Result<(), TaskError> + Send + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(work),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    running: bool,
    stop_requested: bool,
    busy: bool,
    worker_thread: Option<ThreadId>,
}

struct Shared {
    state: Mutex<QueueState>,
    task_available: Condvar,
    idle: Condvar,
    stats: Mutex<PerfStats>,
    slow_task_threshold: Duration,
}

impl Shared {
    fn is_worker_thread(&self) -> bool {
        self.state.lock().worker_thread == Some(thread::current().id())
    }

    fn run_worker(&self) {
        self.state.lock().worker_thread = Some(thread::current().id());
        debug!("Task scheduler worker started");

        loop {
            let next = {
                let mut state = self.state.lock();
                loop {
                    if let Some(task) = state.tasks.pop_front() {
                        state.busy = true;
                        break Some(task);
                    }
                    if state.stop_requested {
                        break None;
                    }
                    self.idle.notify_all();
                    self.task_available.wait(&mut state);
                }
            };

            let Some(task) = next else {
                break;
            };
            self.execute(task);

            let mut state = self.state.lock();
            state.busy = false;
            if state.tasks.is_empty() {
                self.idle.notify_all();
            }
        }

        self.state.lock().worker_thread = None;
        debug!("Task scheduler worker exiting");
    }

    fn execute(&self, task: Task) {
        let Task { name, body } = task;
        let timer = PerfTimer::new(name.as_str()).with_warn_threshold(self.slow_task_threshold);

        let outcome = panic::catch_unwind(AssertUnwindSafe(body));

        let elapsed = timer.finish();
        self.stats.lock().record_operation(&name, elapsed);

        match outcome {
            Ok(Ok(())) => trace!(task = %name, "Task completed"),
            Ok(Err(err)) => error!(task = %name, error = %err, "Task failed"),
            Err(payload) => error!(
                task = %name,
                panic_message = %panic_message(payload.as_ref()),
                "Task panicked, continuing with the next task"
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Runs tasks on one dedicated thread in the order they were pushed.
///
/// Tasks pushed from inside a running task go to the back of the queue. A task
/// that fails or panics is logged and the loop moves on. [`TaskScheduler::stop`]
/// lets every queued task finish before the worker exits.
pub struct TaskScheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::with_slow_task_threshold(DEFAULT_SLOW_TASK_THRESHOLD)
    }

    pub fn with_slow_task_threshold(slow_task_threshold: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                task_available: Condvar::new(),
                idle: Condvar::new(),
                stats: Mutex::new(PerfStats::new()),
                slow_task_threshold,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the worker thread. Calling this while running does nothing.
    pub fn start(&self) -> Result<(), SchedulerError> {
        if self.shared.is_worker_thread() {
            return Ok(());
        }

        let mut worker = self.worker.lock();
        if worker.is_some() {
            debug!("Task scheduler already running");
            return Ok(());
        }

        let queued = {
            let mut state = self.shared.state.lock();
            state.running = true;
            state.stop_requested = false;
            state.tasks.len()
        };

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || shared.run_worker())
            .map_err(|source| {
                self.shared.state.lock().running = false;
                SchedulerError::Spawn { source }
            })?;

        *worker = Some(handle);
        info!(queued_tasks = queued, "Task scheduler started");
        Ok(())
    }

    /// Append a task to the queue; callable from any thread
    pub fn push_task(&self, task: Task) {
        let (queued, running) = {
            let mut state = self.shared.state.lock();
            state.tasks.push_back(task);
            (state.tasks.len(), state.running)
        };

        if !running {
            debug!(queued_tasks = queued, "Task queued while scheduler is not running");
        }
        self.shared.task_available.notify_one();
    }

    /// Drain the queue, then join the worker. Does nothing when not running.
    pub fn stop(&self) {
        if self.shared.is_worker_thread() {
            // Joining ourselves would deadlock; let the loop exit after the current task
            warn!("Task scheduler stop requested from its own worker thread");
            self.shared.state.lock().stop_requested = true;
            self.shared.task_available.notify_all();
            return;
        }

        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            debug!("Task scheduler not running, nothing to stop");
            return;
        };

        let remaining = {
            let mut state = self.shared.state.lock();
            state.stop_requested = true;
            state.tasks.len()
        };
        self.shared.task_available.notify_all();
        debug!(remaining_tasks = remaining, "Draining task scheduler");

        if handle.join().is_err() {
            error!("Task scheduler worker terminated abnormally");
        }

        {
            let mut state = self.shared.state.lock();
            state.running = false;
            state.stop_requested = false;
            state.busy = false;
        }
        self.shared.idle.notify_all();
        info!("Task scheduler stopped");
    }

    /// Block until the queue is empty and no task is executing.
    ///
    /// Returns immediately when the scheduler is not running or when called
    /// from the worker thread itself.
    pub fn wait_until_idle(&self) {
        if self.shared.is_worker_thread() {
            return;
        }

        let mut state = self.shared.state.lock();
        while state.running && (state.busy || !state.tasks.is_empty()) {
            self.shared.idle.wait(&mut state);
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    pub fn queued_len(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }

    /// Timing statistics for tasks with the given name
    pub fn task_stats(&self, name: &str) -> Option<OperationStats> {
        self.shared.stats.lock().get_stats(name)
    }

    pub fn completed_tasks(&self) -> u64 {
        self.shared.stats.lock().total_count()
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
