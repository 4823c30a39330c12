use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки отчётов по задачам и учёта аренд.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// RPC complete/fail не прошёл; кредит слота удержан
    ReportFailed {
        task_id: u64,
        action: &'static str,
        reason: String,
    },
    /// Блокировка задачи уже истекла, отчёт не отправлялся
    StaleCompletion {
        task_id: u64,
        lock_expiration: String,
    },
    /// По задаче уже был отчёт (или она не арендована этой подпиской)
    AlreadyResolved { task_id: u64 },
    /// Возврат кредитов сверх ёмкости: двойное завершение
    CreditOverflow {
        subscription_id: u64,
        capacity: u32,
        available: u32,
        released: u32,
    },
}

impl std::fmt::Display for TaskError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::ReportFailed {
                task_id,
                action,
                reason,
            } => write!(f, "Failed to {action} task {task_id}: {reason}"),
            Self::StaleCompletion {
                task_id,
                lock_expiration,
            } => write!(
                f,
                "Lock of task {task_id} expired at {lock_expiration}; report not sent"
            ),
            Self::AlreadyResolved { task_id } => {
                write!(f, "Task {task_id} is not leased or already resolved")
            }
            Self::CreditOverflow {
                subscription_id,
                capacity,
                available,
                released,
            } => write!(
                f,
                "Credit overflow on subscription {subscription_id}: {available} + {released} exceeds capacity {capacity}"
            ),
        }
    }
}

impl std::error::Error for TaskError {}

impl ErrorExt for TaskError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ReportFailed { .. } => StatusCode::TaskReportFailed,
            Self::StaleCompletion { .. } => StatusCode::StaleCompletion,
            Self::AlreadyResolved { .. } => StatusCode::TaskAlreadyResolved,
            Self::CreditOverflow { .. } => StatusCode::CreditOverflow,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "task".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::ReportFailed {
                task_id, action, ..
            } => {
                tags.push(("task_id", task_id.to_string()));
                tags.push(("action", action.to_string()));
            }
            Self::StaleCompletion { task_id, .. } | Self::AlreadyResolved { task_id } => {
                tags.push(("task_id", task_id.to_string()));
            }
            Self::CreditOverflow {
                subscription_id, ..
            } => tags.push(("subscription_id", subscription_id.to_string())),
        }

        tags
    }
}
