use std::sync::Arc;

use leasehold_error::LeaseResult;

use super::{Subscription, SubscriptionState, TaskHandler};
use crate::{
    codec::Value,
    engine::AcquisitionEngine,
    task::{LockedTask, SubscriptionId},
};

/// Открытая push-подписка.
///
/// Задачи доставляются обработчику фоновым циклом движка. Handle можно
/// клонировать; все клоны указывают на одну подписку.
#[derive(Debug, Clone)]
pub struct TaskSubscription {
    engine: AcquisitionEngine,
    inner: Arc<Subscription>,
}

/// Открытая pull-подписка: задачи забираются вызовом [`poll`](Self::poll).
#[derive(Debug, Clone)]
pub struct PollableTaskSubscription {
    engine: AcquisitionEngine,
    inner: Arc<Subscription>,
}

macro_rules! subscription_accessors {
    ($handle:ty) => {
        impl $handle {
            pub(crate) fn new(
                engine: AcquisitionEngine,
                inner: Arc<Subscription>,
            ) -> Self {
                Self { engine, inner }
            }

            /// Id, выданный брокером при открытии.
            pub fn id(&self) -> SubscriptionId {
                self.inner.id().unwrap_or_default()
            }

            pub fn task_type(&self) -> &str {
                self.inner.task_type()
            }

            /// Время блокировки в миллисекундах.
            pub fn lock_time(&self) -> u64 {
                self.inner.lock_time()
            }

            pub fn lock_owner(&self) -> &str {
                self.inner.lock_owner()
            }

            pub fn capacity(&self) -> u32 {
                self.inner.capacity()
            }

            pub fn credits_available(&self) -> u32 {
                self.inner.credits_available()
            }

            pub fn state(&self) -> SubscriptionState {
                self.inner.state()
            }

            pub fn is_open(&self) -> bool {
                self.inner.is_open()
            }

            pub fn is_closed(&self) -> bool {
                self.inner.state() == SubscriptionState::Closed
            }

            /// Подписка, которой управляет движок.
            pub fn inner(&self) -> &Arc<Subscription> {
                &self.inner
            }

            /// Закрывает подписку у брокера и снимает её с учёта.
            /// Повторный вызов ничего не делает.
            pub async fn close(&self) {
                self.engine.close_subscription(&self.inner).await
            }
        }
    };
}

subscription_accessors!(TaskSubscription);
subscription_accessors!(PollableTaskSubscription);

impl PollableTaskSubscription {
    /// Забирает столько задач, сколько позволяют свободные кредиты.
    pub async fn poll(&self) -> LeaseResult<Vec<LockedTask>> {
        self.engine.poll(&self.inner, None).await
    }

    /// Забирает не больше `max_tasks` задач.
    pub async fn poll_max(
        &self,
        max_tasks: u32,
    ) -> LeaseResult<Vec<LockedTask>> {
        self.engine.poll(&self.inner, Some(max_tasks)).await
    }

    /// Забирает задачи, обрабатывает их `handler` и сразу отчитывается.
    /// Возвращает количество обработанных задач.
    pub async fn poll_with(
        &self,
        handler: impl TaskHandler,
    ) -> LeaseResult<usize> {
        self.engine.poll_with(&self.inner, Arc::new(handler)).await
    }

    pub async fn complete(
        &self,
        task: &LockedTask,
        payload: Option<Value>,
    ) -> LeaseResult<()> {
        self.engine.complete(&self.inner, task, payload).await
    }

    pub async fn fail(
        &self,
        task: &LockedTask,
        reason: impl Into<String>,
    ) -> LeaseResult<()> {
        self.engine.fail(&self.inner, task, reason).await
    }
}
