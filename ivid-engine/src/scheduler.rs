//! Named, cancellable timer tasks driven by the host clock

/// A queue of tasks due at given clock times, in milliseconds.
///
/// Scheduling a task under a name that is already queued replaces it, so a
/// recurring task never runs twice for one period.
#[derive(Debug, Clone)]
pub struct TaskQueue<T> {
    now_ms: u64,
    tasks: Vec<ScheduledTask<T>>,
}

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    name: &'static str,
    due_ms: u64,
    task: T,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            tasks: Vec::new(),
        }
    }

    /// Current clock time
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Queues `task` to run `delay_ms` from now
    pub fn schedule(&mut self, name: &'static str, delay_ms: u64, task: T) {
        self.cancel(name);
        self.tasks.push(ScheduledTask {
            name,
            due_ms: self.now_ms.saturating_add(delay_ms),
            task,
        });
    }

    /// Removes a queued task. Returns false if nothing was queued under `name`.
    pub fn cancel(&mut self, name: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.name != name);
        self.tasks.len() != before
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.tasks.iter().any(|t| t.name == name)
    }

    /// Advances the clock and returns every task now due, earliest first
    pub fn advance(&mut self, now_ms: u64) -> Vec<T> {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.due_ms <= now);
        self.tasks = pending;

        due.sort_by_key(|t| t.due_ms);
        due.into_iter().map(|t| t.task).collect()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
