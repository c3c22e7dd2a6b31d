use super::{
    errors::{TaskError, TaskResult},
    task::TaskId,
};
use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::{Duration, Instant},
};
use futures::task::AtomicWaker;
use parking_lot::{Condvar, Mutex};


/// Общее состояние между воркером (запись) и вызывающим (чтение).
/// Результат пишется ровно один раз, флаг `ready` выставляется под тем же локом.
struct Completion<T> {
    slot: Mutex<Option<TaskResult<T>>>,
    ready: AtomicBool,
    cond: Condvar,
    waker: AtomicWaker,
}

impl<T> Completion<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: AtomicBool::new(false),
            cond: Condvar::new(),
            waker: AtomicWaker::new(),
        }
    }

    fn set(&self, result: TaskResult<T>) {
        {
            let mut slot = self.slot.lock();
            *slot = Some(result);
            self.ready.store(true, Ordering::Release);
            self.cond.notify_all();
        }
        self.waker.wake();
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn wait(&self) {
        if self.is_ready() {
            return;
        }
        let mut slot = self.slot.lock();
        while !self.ready.load(Ordering::Acquire) {
            self.cond.wait(&mut slot);
        }
    }

    fn wait_deadline(&self, deadline: Instant) -> bool {
        if self.is_ready() {
            return true;
        }
        let mut slot = self.slot.lock();
        while !self.ready.load(Ordering::Acquire) {
            if self.cond.wait_until(&mut slot, deadline).timed_out() {
                return self.ready.load(Ordering::Acquire);
            }
        }
        true
    }

    fn take(&self) -> TaskResult<T> {
        // None возможен только при повторном poll после Ready
        self.slot.lock().take().unwrap_or(Err(TaskError::Abandoned))
    }
}


/// Сторона записи: принадлежит задаче и переезжает вместе с ней на воркер.
/// Если задача так и не выполнилась, при drop handle получает `Abandoned`.
pub(crate) struct Completer<T> {
    inner: Option<Arc<Completion<T>>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, result: TaskResult<T>) {
        if let Some(inner) = self.inner.take() {
            inner.set(result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.set(Err(TaskError::Abandoned));
        }
    }
}


/// Handle на результат задачи.
///
/// Move-only: `get` забирает handle и может быть вызван ровно один раз,
/// поэтому `T` не обязан быть `Clone`. `wait`, `wait_timeout` и `is_ready`
/// работают по ссылке и доступны из любого потока.
/// Handle также является `Future` и может ожидаться из async кода.
pub struct TaskHandle<T> {
    id: TaskId,
    inner: Arc<Completion<T>>,
}

pub(crate) fn pair<T>(id: TaskId) -> (Completer<T>, TaskHandle<T>) {
    let inner = Arc::new(Completion::new());
    let completer = Completer { inner: Some(inner.clone()) };
    (completer, TaskHandle { id, inner })
}

impl<T> TaskHandle<T> {

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    /// Блокирует текущий поток до готовности результата
    pub fn wait(&self) {
        self.inner.wait();
    }

    /// Возвращает `true`, если результат готов до истечения `timeout`
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.inner.wait_deadline(Instant::now() + timeout)
    }

    /// Ждет и возвращает значение или ошибку задачи
    pub fn get(self) -> TaskResult<T> {
        self.inner.wait();
        self.inner.take()
    }

    /// Неблокирующая попытка забрать результат; если не готов, handle возвращается обратно
    pub fn try_get(self) -> Result<TaskResult<T>, Self> {
        if self.is_ready() {
            Ok(self.inner.take())
        } else {
            Err(self)
        }
    }

    /// Async ожидание с таймаутом, требует tokio runtime с таймером
    pub async fn await_timeout(self, timeout: Duration) -> TaskResult<T> {
        match tokio::time::timeout(timeout, self).await {
            Ok(result) => result,
            Err(_) => Err(TaskError::Timeout),
        }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if !this.inner.is_ready() {
            this.inner.waker.register(cx.waker());
            // повторная проверка после регистрации, иначе можно потерять wake
            if !this.inner.is_ready() {
                return Poll::Pending;
            }
        }
        Poll::Ready(this.inner.take())
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("ready", &self.is_ready())
            .finish()
    }
}
