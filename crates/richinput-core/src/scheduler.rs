//! Timer abstraction for deferred work.
//!
//! Everything the controls defer (attachment retries, dialog follow-ups,
//! debounced change notification, size updates, panel polling) goes through a
//! [`Scheduler`]. The browser crate backs it with `setTimeout`; tests use
//! [`ManualScheduler`], which runs tasks against a virtual clock.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{trace, warn};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Handle for a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Single-threaded task scheduler.
///
/// A delay of `0` defers the task to a later macrotask; it never runs the
/// task synchronously from within `schedule`.
pub trait Scheduler {
    fn schedule(&self, delay_ms: u32, task: Task) -> TimerId;

    /// Cancel a task. Cancelling a task that already ran is a no-op.
    fn cancel(&self, id: TimerId);
}

struct Entry {
    id: u64,
    due: u64,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now: u64,
    next_id: u64,
    entries: Vec<Entry>,
}

impl ManualState {
    /// Index of the earliest task due at or before `limit`, ties broken by
    /// scheduling order.
    fn earliest(&self, limit: Option<u64>) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| limit.is_none_or(|l| e.due <= l))
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(i, _)| i)
    }
}

/// Upper bound on tasks executed by a single [`ManualScheduler::run_until_idle`].
const IDLE_TASK_LIMIT: usize = 10_000;

/// Deterministic scheduler driven by virtual time.
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Run every task due at the current time, including zero-delay tasks
    /// scheduled while running. Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let now = self.now();
        self.run_due(Some(now))
    }

    /// Move the clock forward, running tasks in due order as their time
    /// comes. Returns the number of tasks run.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.now() + ms;
        let ran = self.run_due(Some(target));
        self.state.borrow_mut().now = target;
        ran
    }

    /// Run tasks until none are left, jumping the clock as needed.
    ///
    /// Self-rescheduling tasks (polling) keep the queue non-empty forever, so
    /// execution stops after a fixed number of tasks.
    pub fn run_until_idle(&self) -> usize {
        let ran = self.run_due(None);
        if ran >= IDLE_TASK_LIMIT {
            warn!(pending = self.pending(), "manual scheduler did not become idle");
        }
        ran
    }

    fn run_due(&self, limit: Option<u64>) -> usize {
        let mut ran = 0;
        while ran < IDLE_TASK_LIMIT {
            let entry = {
                let mut state = self.state.borrow_mut();
                let Some(index) = state.earliest(limit) else {
                    break;
                };
                let entry = state.entries.swap_remove(index);
                state.now = state.now.max(entry.due);
                entry
            };
            trace!(timer = entry.id, at = entry.due, "running scheduled task");
            (entry.task)();
            ran += 1;
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, task: Task) -> TimerId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        let due = state.now + u64::from(delay_ms);
        state.entries.push(Entry { id, due, task });
        TimerId(id)
    }

    fn cancel(&self, id: TimerId) {
        self.state.borrow_mut().entries.retain(|e| e.id != id.0);
    }
}

/// A cancelable, re-armable single pending timer.
#[derive(Debug, Default)]
pub struct Debounce {
    pending: Option<TimerId>,
}

impl Debounce {
    /// Schedule `task`, replacing any task still pending.
    pub fn arm(&mut self, scheduler: &dyn Scheduler, delay_ms: u32, task: Task) {
        self.cancel(scheduler);
        self.pending = Some(scheduler.schedule(delay_ms, task));
    }

    /// Cancel the pending task. Returns whether one was pending.
    pub fn cancel(&mut self, scheduler: &dyn Scheduler) -> bool {
        match self.pending.take() {
            Some(id) => {
                scheduler.cancel(id);
                true
            }
            None => false,
        }
    }

    /// Forget the pending task without cancelling it; called by the task itself.
    pub fn fired(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        (log, move |name| {
            let l = l.clone();
            Box::new(move || l.borrow_mut().push(name)) as Task
        })
    }

    #[test]
    fn test_runs_in_due_order() {
        let sched = ManualScheduler::new();
        let (log, task) = recorder();
        sched.schedule(100, task("late"));
        sched.schedule(0, task("first"));
        sched.schedule(0, task("second"));

        assert_eq!(sched.run_pending(), 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);

        sched.advance(99);
        assert_eq!(log.borrow().len(), 2);
        sched.advance(1);
        assert_eq!(*log.borrow(), vec!["first", "second", "late"]);
        assert_eq!(sched.now(), 100);
    }

    #[test]
    fn test_cancel() {
        let sched = ManualScheduler::new();
        let (log, task) = recorder();
        let id = sched.schedule(10, task("canceled"));
        sched.cancel(id);
        sched.run_until_idle();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_nested_zero_delay_runs_in_same_pass() {
        let sched = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (s, l) = (sched.clone(), log.clone());
        sched.schedule(
            0,
            Box::new(move || {
                l.borrow_mut().push(1);
                let l = l.clone();
                s.schedule(0, Box::new(move || l.borrow_mut().push(2)));
            }),
        );
        sched.run_pending();
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_debounce_rearm() {
        let sched = ManualScheduler::new();
        let (log, task) = recorder();
        let mut debounce = Debounce::default();
        debounce.arm(&*sched, 50, task("a"));
        sched.advance(30);
        debounce.arm(&*sched, 50, task("b"));
        sched.advance(30);
        assert!(log.borrow().is_empty());
        sched.advance(20);
        assert_eq!(*log.borrow(), vec!["b"]);
    }
}
