use workpool::{PoolError, ThreadPool};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};


fn example_task(id: u32, duration: Duration) {
    info!(task = id, thread = ?thread::current().name(), "task started");
    thread::sleep(duration);
    info!(task = id, thread = ?thread::current().name(), "task completed");
}

fn compute_square(num: u64) -> u64 {
    thread::sleep(Duration::from_millis(100));
    num * num
}

fn sum_chunk(data: &[i64]) -> i64 {
    data.iter().sum()
}


fn main() -> Result<(), PoolError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workpool=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let num_threads = std::env::var("WORKPOOL_THREADS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(4);

    let pool = ThreadPool::new(num_threads)?;

    info!("=== Example 1: basic tasks ===");
    let basic = [(1, 2), (2, 1), (3, 3)]
        .into_iter()
        .map(|(id, secs)| pool.submit(move || example_task(id, Duration::from_secs(secs))))
        .collect::<Result<Vec<_>, _>>()?;
    for handle in &basic {
        handle.wait();
    }

    info!("=== Example 2: tasks with return values ===");
    let squares = (1..=8u64)
        .map(|i| pool.submit(move || compute_square(i)))
        .collect::<Result<Vec<_>, _>>()?;
    for (i, handle) in squares.into_iter().enumerate() {
        match handle.get() {
            Ok(square) => info!("square of {} is {}", i + 1, square),
            Err(e) => info!("square of {} failed: {}", i + 1, e),
        }
    }

    info!("=== Example 3: parallel computation ===");
    const N: usize = 1_000_000;
    const NUM_TASKS: usize = 4;
    let data: Arc<Vec<i64>> = Arc::new((0..N).map(|i| (i % 100) as i64).collect());
    let chunk_size = N / NUM_TASKS;

    let start = Instant::now();
    let partials = (0..NUM_TASKS)
        .map(|i| {
            let data = data.clone();
            let begin = i * chunk_size;
            let end = if i == NUM_TASKS - 1 { N } else { (i + 1) * chunk_size };
            pool.submit(move || sum_chunk(&data[begin..end]))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut parallel_sum = 0i64;
    for handle in partials {
        match handle.get() {
            Ok(partial) => parallel_sum += partial,
            Err(e) => info!("chunk failed: {}", e),
        }
    }
    info!(sum = parallel_sum, elapsed = ?start.elapsed(), "parallel sum");

    let start = Instant::now();
    let sequential_sum = sum_chunk(&data);
    info!(sum = sequential_sum, elapsed = ?start.elapsed(), "sequential sum");

    pool.shutdown();
    Ok(())
}
