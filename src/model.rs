use std::fmt;


/// Состояние пула: `Running` -> `Draining` -> `Stopped`, обратных переходов нет
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PoolState {
    Running,
    Draining,
    Stopped,
}

impl PoolState {
    #[inline]
    pub fn is_accepting(&self) -> bool {
        matches!(self, PoolState::Running)
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PoolState::Running => "running",
            PoolState::Draining => "draining",
            PoolState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}


#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub workers: usize,
    pub active_tasks: usize,
    pub idle_workers: usize,
    pub queued_tasks: usize,
    pub total_submitted: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.active_tasks + self.idle_workers == 0 {
            return 0.0;
        }
        self.active_tasks as f64 / (self.active_tasks + self.idle_workers) as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }

    /// Задачи, принятые пулом, но еще не завершенные
    pub fn pending(&self) -> usize {
        self.total_submitted
            .saturating_sub(self.completed_tasks + self.failed_tasks)
    }
}
