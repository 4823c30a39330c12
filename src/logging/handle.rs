use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tracing_appender::non_blocking::WorkerGuard;

/// Метрики для LoggingHandle.
#[derive(Debug, Default)]
pub struct LoggingMetrics {
    /// Флаг активного shutdown
    pub shutdown_in_progress: AtomicBool,
    /// Кол-во flush операций
    pub flush_count: AtomicU64,
}

/// Статистика логирования.
#[derive(Debug, Clone, Copy)]
pub struct LoggingStats {
    pub flush_count: u64,
    pub shutdown_in_progress: bool,
}

/// Handle для управления lifecycle логирования.
///
/// Держит `WorkerGuard` файлового sink-а: пока handle жив, фоновый поток
/// пишет логи в файл.
#[derive(Debug)]
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
    pub metrics: Arc<LoggingMetrics>,
    /// Timeout для flush при shutdown (по умолчанию 5 секунд)
    flush_timeout: Duration,
}

impl LoggingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_flush(&self) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Relaxed)
    }

    pub fn is_shutdown_in_progress(&self) -> bool {
        self.shutdown_in_progress.load(Ordering::Acquire)
    }

    fn start_shutdown(&self) {
        self.shutdown_in_progress.store(true, Ordering::Release);
    }
}

impl LoggingHandle {
    pub fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            file_guard,
            metrics: Arc::new(LoggingMetrics::new()),
            flush_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_flush_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.flush_timeout = timeout;
        self
    }

    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Отмечает запрос flush. Буфер файлового sink-а сбрасывается при
    /// drop guard-а.
    pub fn flush(&self) {
        self.metrics.record_flush();
        tracing::debug!(
            flush_count = self.metrics.get_flush_count(),
            "Logging flush requested"
        );
    }

    /// Graceful shutdown: сбрасывает файловый буфер.
    pub fn shutdown(mut self) {
        self.metrics.start_shutdown();
        tracing::info!(
            total_flushes = self.metrics.get_flush_count(),
            "Initiating logging shutdown"
        );

        let start = std::time::Instant::now();
        drop(self.file_guard.take());
        let elapsed = start.elapsed();

        if elapsed > self.flush_timeout {
            eprintln!(
                "WARNING: Logging shutdown took {}ms (timeout: {}ms)",
                elapsed.as_millis(),
                self.flush_timeout.as_millis()
            );
        }
    }

    /// Shutdown для async-контекстов: guard сбрасывается в блокирующем
    /// потоке с таймаутом.
    pub async fn shutdown_async(
        mut self,
        timeout: Duration,
    ) {
        self.metrics.start_shutdown();
        let file_guard = self.file_guard.take();

        match tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || drop(file_guard)),
        )
        .await
        {
            Ok(Ok(())) => tracing::info!("Async logging shutdown completed"),
            Ok(Err(e)) => eprintln!("Logging shutdown task panicked: {e}"),
            Err(_) => eprintln!(
                "WARNING: Logging shutdown exceeded timeout of {}ms",
                timeout.as_millis()
            ),
        }
    }

    pub fn get_metrics(&self) -> LoggingStats {
        LoggingStats {
            flush_count: self.metrics.get_flush_count(),
            shutdown_in_progress: self.metrics.is_shutdown_in_progress(),
        }
    }
}

impl Drop for LoggingHandle {
    fn drop(&mut self) {
        if self.file_guard.is_some() && !self.metrics.is_shutdown_in_progress() {
            eprintln!(
                "WARNING: LoggingHandle dropped without explicit shutdown(). \
                 Call .shutdown() for graceful cleanup."
            )
        }
    }
}
