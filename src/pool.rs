use super::{
    errors::{PoolError, PoolResult},
    handle::TaskHandle,
    model::{PoolMetrics, PoolState},
    queue::TaskQueue,
    task::{Outcome, Task, TaskId},
};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle, ThreadId},
};
use crossbeam::{sync::WaitGroup, utils::CachePadded};
use parking_lot::Mutex;


const DEFAULT_THREAD_NAME_PREFIX: &str = "workpool";


/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self::default()
    }

    /// Для задач, которые большую часть времени спят или ждут I/O
    pub fn io_bound() -> Self {
        Self {
            num_threads: num_cpus::get() * 2,
            ..Self::default()
        }
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.num_threads < 1 {
            return Err(PoolError::InvalidConfiguration(
                "num_threads must be at least 1".into(),
            ));
        }
        if self.stack_size == Some(0) {
            return Err(PoolError::InvalidConfiguration(
                "stack_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}


/// Состояние, разделяемое между пулом и воркерами
struct Shared {
    queue: TaskQueue,
    next_id: AtomicU64,
    active_tasks: CachePadded<AtomicUsize>,
    idle_workers: CachePadded<AtomicUsize>,
    total_submitted: CachePadded<AtomicUsize>,
    completed_tasks: CachePadded<AtomicUsize>,
    failed_tasks: CachePadded<AtomicUsize>,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: TaskQueue::new(),
            next_id: AtomicU64::new(0),
            active_tasks: CachePadded::new(AtomicUsize::new(0)),
            idle_workers: CachePadded::new(AtomicUsize::new(0)),
            total_submitted: CachePadded::new(AtomicUsize::new(0)),
            completed_tasks: CachePadded::new(AtomicUsize::new(0)),
            failed_tasks: CachePadded::new(AtomicUsize::new(0)),
        }
    }
}


/// Пул потоков фиксированного размера.
///
/// Воркеры стартуют в конструкторе и живут до `shutdown` (или drop).
/// При shutdown очередь закрывается, воркеры дорабатывают все уже принятые
/// задачи и только потом завершаются; `shutdown` ждет их join.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_ids: Vec<ThreadId>,
    stopped: AtomicBool,
    config: Config,
}

impl ThreadPool {
    pub fn new(num_threads: usize) -> PoolResult<Self> {
        let config = Config {
            num_threads,
            ..Default::default()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> PoolResult<Self> {
        config.validate()?;

        let shared = Arc::new(Shared::new());
        let mut workers = Vec::with_capacity(config.num_threads);
        // каждый воркер отпускает свою копию, когда вошел в цикл
        let started = WaitGroup::new();

        for index in 0..config.num_threads {
            let mut builder = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, index));
            if let Some(size) = config.stack_size {
                builder = builder.stack_size(size);
            }

            let worker_shared = shared.clone();
            let worker_started = started.clone();
            match builder.spawn(move || worker_loop(index, worker_shared, worker_started)) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    tracing::error!(
                        pool = %config.thread_name_prefix,
                        worker = index,
                        error = %e,
                        "failed to spawn worker"
                    );
                    // уже запущенные воркеры нужно остановить, иначе они повиснут на пустой очереди
                    shared.queue.close();
                    for handle in workers {
                        let name = handle.thread().name().map(str::to_owned);
                        if handle.join().is_err() {
                            tracing::error!(pool = %config.thread_name_prefix, worker = ?name, "worker thread panicked");
                        }
                    }
                    return Err(PoolError::WorkerSpawn(e.to_string()));
                }
            }
        }

        started.wait();

        let worker_ids = workers.iter().map(|h| h.thread().id()).collect();

        tracing::info!(
            pool = %config.thread_name_prefix,
            workers = config.num_threads,
            "thread pool created"
        );

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            worker_ids,
            stopped: AtomicBool::new(false),
            config,
        })
    }

    /// Отправляет задачу в пул и сразу возвращает handle на результат.
    ///
    /// Аргументы передаются захватом в замыкание (`move`).
    /// После начала shutdown возвращает `PoolError::PoolClosed`, задача не ставится в очередь.
    pub fn submit<T, F>(&self, f: F) -> PoolResult<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let id = TaskId::new(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let (task, handle) = Task::new(id, f);

        // считаем до push, иначе воркер может завершить задачу раньше, чем она учтена
        self.shared.total_submitted.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.shared.queue.push(task) {
            self.shared.total_submitted.fetch_sub(1, Ordering::Relaxed);
            tracing::debug!(pool = %self.config.thread_name_prefix, task = %id, "task rejected, pool is closed");
            return Err(e);
        }
        tracing::trace!(pool = %self.config.thread_name_prefix, task = %id, "task submitted");

        Ok(handle)
    }

    /// Fire-and-forget: результат и возможная паника задачи не наблюдаются
    pub fn execute<F>(&self, f: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(f).map(drop)
    }

    /// Закрывает очередь, дожидается выполнения всех принятых задач и join всех воркеров.
    /// Повторный вызов - no-op. Вызов из задачи этого же пула только закрывает очередь,
    /// join выполняет следующий вызов снаружи (или drop).
    pub fn shutdown(&self) {
        if self.shared.queue.close() {
            tracing::info!(
                pool = %self.config.thread_name_prefix,
                queued = self.shared.queue.len(),
                "shutting down thread pool"
            );
        }

        if self.is_worker_thread() {
            tracing::debug!(
                pool = %self.config.thread_name_prefix,
                "shutdown called from a worker thread, skipping join"
            );
            return;
        }

        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let name = handle.thread().name().map(str::to_owned);
            if handle.join().is_err() {
                tracing::error!(pool = %self.config.thread_name_prefix, worker = ?name, "worker thread panicked");
            }
        }

        if !self.stopped.swap(true, Ordering::AcqRel) {
            tracing::info!(pool = %self.config.thread_name_prefix, "thread pool stopped");
        }
    }

    /// Блокирует, пока очередь не опустеет и все выполняемые задачи не завершатся.
    /// Пул при этом продолжает принимать задачи. Из задачи этого пула сразу возвращает управление.
    pub fn wait_idle(&self) {
        if self.is_worker_thread() {
            return;
        }
        self.shared.queue.wait_idle();
    }

    pub fn state(&self) -> PoolState {
        if !self.shared.queue.is_closed() {
            PoolState::Running
        } else if self.stopped.load(Ordering::Acquire) {
            PoolState::Stopped
        } else {
            PoolState::Draining
        }
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.config.num_threads
    }

    #[inline]
    pub fn queued_tasks(&self) -> usize {
        self.shared.queue.len()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            workers: self.config.num_threads,
            active_tasks: self.shared.active_tasks.load(Ordering::Relaxed),
            idle_workers: self.shared.idle_workers.load(Ordering::Relaxed),
            queued_tasks: self.shared.queue.len(),
            total_submitted: self.shared.total_submitted.load(Ordering::Relaxed),
            completed_tasks: self.shared.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.shared.failed_tasks.load(Ordering::Relaxed),
        }
    }

    fn is_worker_thread(&self) -> bool {
        let current = thread::current().id();
        self.worker_ids.contains(&current)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}


fn worker_loop(index: usize, shared: Arc<Shared>, started: WaitGroup) {
    tracing::debug!(worker = index, "worker started");
    shared.idle_workers.fetch_add(1, Ordering::Relaxed);
    drop(started);

    while let Some(task) = shared.queue.pop_blocking() {
        shared.idle_workers.fetch_sub(1, Ordering::Relaxed);
        shared.active_tasks.fetch_add(1, Ordering::Relaxed);

        let id = task.id();
        tracing::trace!(worker = index, task = %id, "running task");
        match task.run() {
            Outcome::Completed => shared.completed_tasks.fetch_add(1, Ordering::Relaxed),
            Outcome::Panicked => shared.failed_tasks.fetch_add(1, Ordering::Relaxed),
        };

        shared.active_tasks.fetch_sub(1, Ordering::Relaxed);
        shared.idle_workers.fetch_add(1, Ordering::Relaxed);
        shared.queue.task_done();
    }

    shared.idle_workers.fetch_sub(1, Ordering::Relaxed);
    tracing::debug!(worker = index, "worker stopped");
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(Config::default().with_threads(0).validate().unwrap_err().is_invalid_configuration());
        assert!(Config::default().with_threads(1).with_stack_size(0).validate().is_err());
        assert!(Config::default().with_threads(2).validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let cpus = num_cpus::get();
        assert_eq!(Config::cpu_bound().num_threads, cpus);
        assert_eq!(Config::io_bound().num_threads, cpus * 2);
        assert_eq!(Config::default().thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);
    }

    #[test]
    fn test_worker_threads_are_named() {
        let pool = ThreadPool::with_config(
            Config::default().with_threads(2).with_thread_name_prefix("named"),
        )
        .unwrap();
        let name = pool
            .submit(|| thread::current().name().map(str::to_owned))
            .unwrap()
            .get()
            .unwrap()
            .unwrap();
        assert!(name == "named-0" || name == "named-1", "неожиданное имя {}", name);
    }

    #[test]
    fn test_state_transitions() {
        let pool = ThreadPool::new(2).unwrap();
        assert_eq!(pool.state(), PoolState::Running);
        pool.shutdown();
        assert_eq!(pool.state(), PoolState::Stopped);
        assert!(pool.workers.lock().is_empty());
    }

    #[test]
    fn test_idle_workers_counted() {
        for _ in 0..50 {
            let pool = ThreadPool::new(8).unwrap();
            // конструктор возвращается только когда все воркеры в цикле
            let metrics = pool.metrics();
            assert_eq!(metrics.idle_workers, 8);
            assert_eq!(metrics.utilization(), 0.0);
        }
    }

    #[test]
    fn test_worker_spawn_failure() {
        let config = Config::default()
            .with_threads(2)
            .with_thread_name_prefix("huge-stack")
            .with_stack_size(usize::MAX);
        match ThreadPool::with_config(config) {
            Err(PoolError::WorkerSpawn(_)) => {}
            Err(e) => panic!("ожидали WorkerSpawn, получили {:?}", e),
            Ok(_) => panic!("поток со стеком usize::MAX не должен создаваться"),
        }
    }

    #[test]
    fn test_submitted_counted_before_completion() {
        let pool = ThreadPool::new(4).unwrap();
        for i in 0..2_000u32 {
            pool.execute(move || {
                std::hint::black_box(i);
            }).unwrap();
            let m = pool.metrics();
            assert!(
                m.completed_tasks + m.failed_tasks <= m.total_submitted,
                "завершено больше, чем принято: {:?}", m
            );
        }
    }
}
