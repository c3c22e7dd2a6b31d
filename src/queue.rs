use super::{
    errors::{PoolError, PoolResult},
    task::Task,
};
use std::collections::VecDeque;
use parking_lot::{Condvar, Mutex};


struct QueueState {
    tasks: VecDeque<Task>,
    closed: bool,
    // задачи, которые уже сняты воркером, но еще выполняются
    in_flight: usize,
}


/// Неограниченная FIFO очередь задач.
///
/// Все состояние (задачи, флаг закрытия, счетчик выполняемых) под одним локом,
/// лок никогда не удерживается во время выполнения задачи.
pub(crate) struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    idle: Condvar,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                closed: false,
                in_flight: 0,
            }),
            available: Condvar::new(),
            idle: Condvar::new(),
        }
    }

    /// Кладет задачу в хвост. После `close` задача отклоняется с `PoolClosed`.
    pub(crate) fn push(&self, task: Task) -> PoolResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PoolError::PoolClosed);
        }
        state.tasks.push_back(task);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Снимает задачу с головы, блокируясь пока очередь пуста и открыта.
    /// `None` означает, что очередь закрыта и опустошена.
    pub(crate) fn pop_blocking(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                state.in_flight += 1;
                return Some(task);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Отмечает завершение задачи, ранее полученной через `pop_blocking`
    pub(crate) fn task_done(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 && state.tasks.is_empty() {
            self.idle.notify_all();
        }
    }

    /// Закрывает очередь навсегда и будит всех ожидающих.
    /// Возвращает `true`, если закрытие выполнил именно этот вызов.
    pub(crate) fn close(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        drop(state);
        self.available.notify_all();
        true
    }

    /// Блокирует, пока в очереди нет задач и ни одна не выполняется
    pub(crate) fn wait_idle(&self) {
        let mut state = self.state.lock();
        while !(state.tasks.is_empty() && state.in_flight == 0) {
            self.idle.wait(&mut state);
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
