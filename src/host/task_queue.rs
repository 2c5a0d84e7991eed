use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

/// Handle to a task scheduled on a [`TaskQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

type Task = Box<dyn FnOnce()>;

/// Single-threaded "next turn" scheduler.
///
/// Tasks scheduled now run on the next [`run_pending`](Self::run_pending)
/// call, after the current synchronous work. Tasks scheduled while a turn is
/// running wait for the following turn.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<VecDeque<(TaskId, Task)>>,
    next_id: Cell<u64>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, task: impl FnOnce() + 'static) -> TaskId {
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.tasks.borrow_mut().push_back((id, Box::new(task)));
        id
    }

    /// Removes a task that has not run yet. Returns false if it already ran
    /// or was cancelled before.
    pub fn cancel(&self, id: TaskId) -> bool {
        let mut tasks = self.tasks.borrow_mut();
        match tasks.iter().position(|(task_id, _)| *task_id == id) {
            Some(index) => {
                tasks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Runs one turn: every task scheduled before this call. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let boundary = TaskId(self.next_id.get());
        let mut ran = 0;

        loop {
            // The borrow is released before the task runs so tasks may schedule or cancel
            let next = {
                let mut tasks = self.tasks.borrow_mut();
                match tasks.front() {
                    Some((id, _)) if *id < boundary => tasks.pop_front(),
                    _ => None,
                }
            };

            let Some((_, task)) = next else {
                break;
            };
            task();
            ran += 1;
        }

        ran
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_tasks_run_in_order_on_next_turn() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            queue.schedule(move || log.borrow_mut().push(i));
        }
        assert!(log.borrow().is_empty());
        assert_eq!(queue.pending_count(), 3);

        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_cancel() {
        let queue = TaskQueue::new();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let id = queue.schedule(move || flag.set(true));

        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert_eq!(queue.run_pending(), 0);
        assert!(!ran.get());
    }

    #[test]
    fn test_tasks_scheduled_during_turn_wait_for_next_turn() {
        let queue = Rc::new(TaskQueue::new());
        let count = Rc::new(Cell::new(0));

        let inner_queue = queue.clone();
        let inner_count = count.clone();
        queue.schedule(move || {
            inner_count.set(inner_count.get() + 1);
            let count = inner_count.clone();
            inner_queue.schedule(move || count.set(count.get() + 10));
        });

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(count.get(), 11);
    }

    #[test]
    fn test_task_can_cancel_later_task_in_same_turn() {
        let queue = Rc::new(TaskQueue::new());
        let ran = Rc::new(Cell::new(false));

        let later_id = Rc::new(Cell::new(None));
        let canceller_queue = queue.clone();
        let canceller_id = later_id.clone();
        queue.schedule(move || {
            if let Some(id) = canceller_id.get() {
                canceller_queue.cancel(id);
            }
        });
        let flag = ran.clone();
        later_id.set(Some(queue.schedule(move || flag.set(true))));

        assert_eq!(queue.run_pending(), 1);
        assert!(!ran.get());
    }
}
