use chrono::{DateTime, Utc};
use leasehold_error::StackError;

use crate::{
    subscription::SubscriptionMode,
    task::{SubscriptionId, TaskId},
};

/// Сигнал наблюдаемости движка.
///
/// Ошибки фонового цикла не пробрасываются в пользовательский код и видны
/// только через эти события (и через логи со счётчиками).
#[derive(Debug, Clone)]
pub enum EngineEvent {
    SubscriptionOpened {
        subscription_id: SubscriptionId,
        task_type: String,
        mode: SubscriptionMode,
    },
    SubscriptionClosed {
        subscription_id: SubscriptionId,
    },
    /// RPC закрытия не прошёл; подписка всё равно снята локально
    CloseFailed {
        subscription_id: SubscriptionId,
        error: StackError,
    },
    TasksAcquired {
        subscription_id: SubscriptionId,
        count: usize,
    },
    TaskCompleted {
        subscription_id: SubscriptionId,
        task_id: TaskId,
    },
    TaskFailed {
        subscription_id: SubscriptionId,
        task_id: TaskId,
        reason: String,
    },
    /// Брокер недоступен во время захвата; повтор в следующем цикле
    TransientAcquisitionFailure {
        subscription_id: SubscriptionId,
        error: StackError,
    },
    /// complete/fail не прошёл; кредит удержан
    ReportFailed {
        subscription_id: SubscriptionId,
        task_id: TaskId,
        error: StackError,
    },
    StaleCompletion {
        subscription_id: SubscriptionId,
        task_id: TaskId,
        lock_expiration: DateTime<Utc>,
    },
    /// Пачка пришла после закрытия подписки или содержала дубликаты
    BatchDiscarded {
        subscription_id: SubscriptionId,
        count: usize,
    },
    LeasesReclaimed {
        subscription_id: SubscriptionId,
        task_ids: Vec<TaskId>,
    },
    /// Нарушен учёт кредитов
    CreditOverflow {
        subscription_id: SubscriptionId,
        error: StackError,
    },
}

impl EngineEvent {
    pub fn subscription_id(&self) -> SubscriptionId {
        match self {
            Self::SubscriptionOpened {
                subscription_id, ..
            }
            | Self::SubscriptionClosed { subscription_id }
            | Self::CloseFailed {
                subscription_id, ..
            }
            | Self::TasksAcquired {
                subscription_id, ..
            }
            | Self::TaskCompleted {
                subscription_id, ..
            }
            | Self::TaskFailed {
                subscription_id, ..
            }
            | Self::TransientAcquisitionFailure {
                subscription_id, ..
            }
            | Self::ReportFailed {
                subscription_id, ..
            }
            | Self::StaleCompletion {
                subscription_id, ..
            }
            | Self::BatchDiscarded {
                subscription_id, ..
            }
            | Self::LeasesReclaimed {
                subscription_id, ..
            }
            | Self::CreditOverflow {
                subscription_id, ..
            } => *subscription_id,
        }
    }

    /// Является ли событие ошибкой.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::CloseFailed { .. }
                | Self::TransientAcquisitionFailure { .. }
                | Self::ReportFailed { .. }
                | Self::StaleCompletion { .. }
                | Self::CreditOverflow { .. }
        )
    }
}
