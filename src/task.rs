use super::{
    errors::TaskError,
    handle::{self, TaskHandle},
};
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
};


/// Последовательный идентификатор задачи внутри пула
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    #[inline]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}


/// Исход выполнения задачи, по нему воркер обновляет счетчики
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Panicked,
}


/// Задача с type-erased телом. Очередь хранит только этот тип,
/// стирание типа происходит один раз при отправке.
pub(crate) struct Task {
    id: TaskId,
    run: Box<dyn FnOnce() -> Outcome + Send + 'static>,
}

impl Task {
    /// Упаковывает замыкание вместе с completer и возвращает handle на результат.
    /// Паника внутри `f` перехватывается и уходит в handle как `TaskError::Panicked`.
    pub(crate) fn new<T, F>(id: TaskId, f: F) -> (Task, TaskHandle<T>)
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (completer, handle) = handle::pair::<T>(id);
        let run = move || match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                completer.complete(Ok(value));
                Outcome::Completed
            }
            Err(payload) => {
                let err = TaskError::from_panic(payload);
                tracing::warn!(task = %id, error = %err, "task panicked");
                completer.complete(Err(err));
                Outcome::Panicked
            }
        };
        (Task { id, run: Box::new(run) }, handle)
    }

    #[inline]
    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// Выполняет задачу; задача одноразовая и поглощается
    #[inline]
    pub(crate) fn run(self) -> Outcome {
        (self.run)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish()
    }
}
