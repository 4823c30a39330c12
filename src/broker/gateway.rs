use async_trait::async_trait;
use bytes::Bytes;
use leasehold_error::LeaseResult;

use crate::{
    subscription::SubscriptionSpec,
    task::{SubscriptionId, Task, TaskId},
};

/// Параметры RPC открытия подписки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscriptionRequest {
    pub task_type: String,
    pub lock_duration_ms: u64,
    pub lock_owner: String,
    pub capacity: u32,
}

/// Ответ брокера на открытие подписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionCreated {
    pub subscription_id: SubscriptionId,
    /// Кредиты, которые брокер сообщил в ответ. Локальный учёт всегда
    /// ведётся по запрошенной ёмкости.
    pub credits_granted: u32,
}

/// RPC-поверхность брокера, которую потребляет движок.
///
/// Реализации отвечают за кодирование и транспорт. Любая ошибка
/// возвращается как `StackError` (обычно с корнем
/// [`leasehold_error::BrokerError`]).
#[async_trait]
pub trait BrokerGateway: Send + Sync + 'static {
    async fn create_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> LeaseResult<SubscriptionCreated>;

    async fn close_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> LeaseResult<()>;

    /// Блокирует и возвращает не более `max_count` задач.
    async fn acquire_tasks(
        &self,
        subscription_id: SubscriptionId,
        max_count: u32,
    ) -> LeaseResult<Vec<Task>>;

    async fn complete_task(
        &self,
        task_id: TaskId,
        payload: Option<Bytes>,
    ) -> LeaseResult<()>;

    async fn fail_task(
        &self,
        task_id: TaskId,
        reason: &str,
    ) -> LeaseResult<()>;
}

impl From<&SubscriptionSpec> for CreateSubscriptionRequest {
    fn from(spec: &SubscriptionSpec) -> Self {
        Self {
            task_type: spec.task_type().to_string(),
            lock_duration_ms: spec.lock_time(),
            lock_owner: spec.lock_owner().to_string(),
            capacity: spec.capacity(),
        }
    }
}
