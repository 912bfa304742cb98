//! `Scheduler` backed by `setTimeout`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use richinput_core::scheduler::{Scheduler, Task, TimerId};

/// Runs scheduled tasks on the browser event loop.
///
/// Dropping a pending [`Timeout`] clears it, so cancellation is removal from
/// the pending map.
#[derive(Default)]
pub struct TimeoutScheduler {
    pending: Rc<RefCell<HashMap<u64, Timeout>>>,
    next_id: Cell<u64>,
}

impl TimeoutScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Number of tasks not yet run or cancelled.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay_ms: u32, task: Task) -> TimerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let pending = Rc::downgrade(&self.pending);
        let timeout = Timeout::new(delay_ms, move || {
            // Released before running: the task may schedule more work.
            let fired = pending.upgrade().and_then(|p| p.borrow_mut().remove(&id));
            task();
            drop(fired);
        });
        self.pending.borrow_mut().insert(id, timeout);
        TimerId(id)
    }

    fn cancel(&self, id: TimerId) {
        let timeout = self.pending.borrow_mut().remove(&id.0);
        drop(timeout);
    }
}
