use std::sync::atomic::{AtomicU64, Ordering};

/// Счётчики движка. Обновляются из фонового цикла, обработчиков и
/// вызовов `poll()`.
#[derive(Debug, Default)]
pub struct AcquisitionMetrics {
    /// Задачи, взятые в аренду
    pub acquired: AtomicU64,
    /// Подтверждённые complete
    pub completed: AtomicU64,
    /// Подтверждённые fail
    pub failed: AtomicU64,
    /// complete/fail, которые не прошли
    pub report_failures: AtomicU64,
    /// Ошибки брокера при захвате
    pub transient_failures: AtomicU64,
    pub stale_completions: AtomicU64,
    /// Задачи из отброшенных пачек и дубликаты
    pub discarded: AtomicU64,
    /// Аренды, снятые по истечению блокировки
    pub reclaimed: AtomicU64,
    pub cycles: AtomicU64,
}

/// Снимок счётчиков.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub acquired: u64,
    pub completed: u64,
    pub failed: u64,
    pub report_failures: u64,
    pub transient_failures: u64,
    pub stale_completions: u64,
    pub discarded: u64,
    pub reclaimed: u64,
    pub cycles: u64,
}

impl AcquisitionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(
        counter: &AtomicU64,
        n: u64,
    ) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        Self::add(counter, 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            acquired: self.acquired.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            report_failures: self.report_failures.load(Ordering::Relaxed),
            transient_failures: self.transient_failures.load(Ordering::Relaxed),
            stale_completions: self.stale_completions.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Задачи, по которым брокер подтвердил отчёт.
    pub fn resolved(&self) -> u64 {
        self.completed + self.failed
    }
}
