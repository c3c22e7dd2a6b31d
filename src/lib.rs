//! Пул потоков фиксированного размера с handle на результат каждой задачи
//!
//! # Features
//! - Фиксированное число OS-потоков, общая FIFO очередь
//! - `submit` сразу возвращает `TaskHandle`: блокирующий `get`/`wait` или `.await`
//! - Паника в задаче изолирована и доставляется только в её handle
//! - Graceful shutdown: очередь закрывается, принятые задачи дорабатываются, воркеры join-ятся
//! - Метрики пула
//!
//! ```no_run
//! use workpool::ThreadPool;
//!
//! let pool = ThreadPool::new(4)?;
//! let handles = (1..=8u64)
//!     .map(|i| pool.submit(move || i * i))
//!     .collect::<Result<Vec<_>, _>>()?;
//! let squares: Vec<u64> = handles.into_iter().map(|h| h.get().unwrap()).collect();
//! assert_eq!(squares.len(), 8);
//! pool.shutdown();
//! # Ok::<(), workpool::PoolError>(())
//! ```

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod task;
mod queue;

pub use errors::{PoolError, PoolResult, TaskError, TaskResult};
pub use handle::TaskHandle;
pub use model::{PoolMetrics, PoolState};
pub use pool::{Config, ThreadPool};
pub use task::TaskId;
