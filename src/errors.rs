use std::any::Any;


/// Ошибки конструирования пула и отправки задач
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum PoolError {
    #[error("invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    #[error("pool is shut down, task rejected")]
    PoolClosed,

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
}

impl PoolError {
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, PoolError::PoolClosed)
    }

    #[inline]
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, PoolError::InvalidConfiguration(_))
    }
}


/// Ошибки выполнения конкретной задачи, доставляются только через её handle
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum TaskError {
    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task was dropped before it could run")]
    Abandoned,

    #[error("timed out waiting for task result")]
    Timeout,
}

impl TaskError {
    /// Собирает сообщение из payload паники (`&str` или `String`)
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskError::Panicked(msg)
    }

    #[inline]
    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panicked(_))
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout)
    }
}


pub type PoolResult<T> = Result<T, PoolError>;

pub type TaskResult<T> = Result<T, TaskError>;
