#[cfg(test)]
mod tests {
    use workpool::{
        Config,
        PoolState,
        ThreadPool,
    };
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    fn measure<F, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        println!("✓ {}: {:?}", name, elapsed);
        result
    }

    #[test]
    fn load_test_1_small_fast_tasks() {
        println!("\n=== LOAD TEST 1: 100k мгновенных задач ===");
        let pool = ThreadPool::with_config(Config::cpu_bound()).unwrap();

        let results: Vec<u64> = measure("100k tasks", || {
            let handles: Vec<_> = (0..100_000u64)
                .map(|x| pool.submit(move || x * 2).unwrap())
                .collect();
            handles.into_iter().map(|h| h.get().unwrap()).collect()
        });

        assert_eq!(results.len(), 100_000);
        assert_eq!(results.iter().sum::<u64>(), (0..100_000u64).map(|x| x * 2).sum());

        pool.wait_idle();
        let metrics = pool.metrics();
        println!("  Успешно: {}/{}", metrics.completed_tasks, results.len());
        assert_eq!(metrics.completed_tasks, 100_000);
        assert_eq!(metrics.success_rate(), 1.0);
    }

    #[test]
    fn load_test_2_sleeping_tasks() {
        println!("\n=== LOAD TEST 2: 400 задач по 5ms ===");
        let pool = ThreadPool::with_config(Config::default().with_threads(16)).unwrap();

        let results = measure("400 tasks @ 5ms", || {
            let handles: Vec<_> = (0..400)
                .map(|x| pool.submit(move || {
                    thread::sleep(Duration::from_millis(5));
                    format!("result_{}", x)
                }).unwrap())
                .collect();
            handles.into_iter().map(|h| h.get()).collect::<Vec<_>>()
        });

        let successful = results.iter().filter(|r| r.is_ok()).count();
        println!("  Успешно: {}/{}", successful, results.len());
        assert_eq!(successful, 400);
    }

    #[test]
    fn load_test_3_mixed_panics() {
        println!("\n=== LOAD TEST 3: 1k задач, каждая десятая паникует ===");
        let pool = ThreadPool::new(8).unwrap();

        let handles: Vec<_> = (0..1_000u32)
            .map(|x| pool.submit(move || {
                if x % 10 == 0 {
                    panic!("Test panic");
                }
                x
            }).unwrap())
            .collect();

        let (ok, failed): (Vec<_>, Vec<_>) = handles
            .into_iter()
            .map(|h| h.get())
            .partition(|r| r.is_ok());

        assert_eq!(ok.len(), 900);
        assert_eq!(failed.len(), 100);
        assert!(failed.iter().all(|r| r.as_ref().err().map(|e| e.is_panic()).unwrap_or(false)));

        pool.shutdown();
        let metrics = pool.metrics();
        println!("  Success rate: {:.1}%", metrics.success_rate() * 100.0);
        assert_eq!(metrics.failed_tasks, 100);
        assert_eq!(metrics.completed_tasks, 900);
    }

    #[test]
    fn load_test_4_pool_churn() {
        println!("\n=== LOAD TEST 4: создание и уничтожение 50 пулов ===");
        let executed = Arc::new(AtomicUsize::new(0));

        measure("50 pools x 20 tasks", || {
            for _ in 0..50 {
                let pool = ThreadPool::new(4).unwrap();
                for _ in 0..20 {
                    let executed = executed.clone();
                    pool.execute(move || {
                        executed.fetch_add(1, Ordering::Relaxed);
                    }).unwrap();
                }
                // drop пула дорабатывает очередь
            }
        });

        assert_eq!(executed.load(Ordering::Relaxed), 1_000);
    }

    #[test]
    fn load_test_5_large_backlog_shutdown() {
        println!("\n=== LOAD TEST 5: shutdown с большой очередью ===");
        let pool = ThreadPool::new(4).unwrap();
        let executed = Arc::new(AtomicUsize::new(0));

        for _ in 0..20_000 {
            let executed = executed.clone();
            pool.execute(move || {
                executed.fetch_add(1, Ordering::Relaxed);
            }).unwrap();
        }

        measure("drain 20k", || pool.shutdown());
        assert_eq!(executed.load(Ordering::Relaxed), 20_000);
        assert_eq!(pool.state(), PoolState::Stopped);
        assert_eq!(pool.queued_tasks(), 0);
    }
}
