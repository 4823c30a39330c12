use std::{fmt, sync::Arc};

use leasehold_error::{LeaseResult, ValidationError};

use super::{
    IntoLockTime, PollableTaskSubscription, SubscriptionMode, SubscriptionSpec, TaskHandler,
    TaskSubscription,
};
use crate::engine::AcquisitionEngine;

/// Общие поля обоих builder-ов.
#[derive(Clone)]
struct Draft {
    engine: AcquisitionEngine,
    task_type: Option<String>,
    /// `Some(0)`: значение передано, но не приводится к положительным
    /// миллисекундам
    lock_time: Option<u64>,
    lock_owner: String,
    task_fetch_size: u32,
}

impl Draft {
    fn new(engine: AcquisitionEngine) -> Self {
        let config = engine.config();
        let lock_owner = config.default_lock_owner.clone();
        let task_fetch_size = config.default_task_fetch_size;
        Self {
            engine,
            task_type: None,
            lock_time: None,
            lock_owner,
            task_fetch_size,
        }
    }

    fn task_type(&self) -> LeaseResult<String> {
        match &self.task_type {
            Some(task_type) if !task_type.is_empty() => Ok(task_type.clone()),
            _ => Err(ValidationError::MissingTaskType.into()),
        }
    }

    fn finish(
        &self,
        task_type: String,
        mode: SubscriptionMode,
    ) -> LeaseResult<SubscriptionSpec> {
        SubscriptionSpec::new(
            task_type,
            self.lock_time.unwrap_or(0),
            self.lock_owner.clone(),
            self.task_fetch_size,
            mode,
        )
    }
}

impl fmt::Debug for Draft {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Draft")
            .field("task_type", &self.task_type)
            .field("lock_time", &self.lock_time)
            .field("lock_owner", &self.lock_owner)
            .field("task_fetch_size", &self.task_fetch_size)
            .finish()
    }
}

/// Builder push-подписки.
///
/// Поля собираются цепочкой вызовов и проверяются один раз в
/// [`build`](Self::build) / [`open`](Self::open), в порядке: taskType,
/// taskHandler, lockTime, lockOwner, taskFetchSize.
#[derive(Clone)]
pub struct TaskSubscriptionBuilder {
    draft: Draft,
    handler: Option<Arc<dyn TaskHandler>>,
}

/// Builder pull-подписки. Проверки те же, кроме обработчика.
#[derive(Debug, Clone)]
pub struct PollableTaskSubscriptionBuilder {
    draft: Draft,
}

impl TaskSubscriptionBuilder {
    pub fn new(engine: AcquisitionEngine) -> Self {
        Self {
            draft: Draft::new(engine),
            handler: None,
        }
    }

    pub fn task_type(
        mut self,
        task_type: impl Into<String>,
    ) -> Self {
        self.draft.task_type = Some(task_type.into());
        self
    }

    pub fn handler(
        self,
        handler: impl TaskHandler,
    ) -> Self {
        self.shared_handler(Arc::new(handler))
    }

    pub fn shared_handler(
        mut self,
        handler: Arc<dyn TaskHandler>,
    ) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Миллисекунды (`u64`, `i64`, ...), `std::time::Duration` или
    /// `chrono::TimeDelta`.
    pub fn lock_time(
        mut self,
        lock_time: impl IntoLockTime,
    ) -> Self {
        self.draft.lock_time = Some(lock_time.into_lock_millis().unwrap_or(0));
        self
    }

    pub fn lock_owner(
        mut self,
        lock_owner: impl Into<String>,
    ) -> Self {
        self.draft.lock_owner = lock_owner.into();
        self
    }

    pub fn task_fetch_size(
        mut self,
        task_fetch_size: u32,
    ) -> Self {
        self.draft.task_fetch_size = task_fetch_size;
        self
    }

    /// Проверяет параметры без обращения к брокеру.
    pub fn build(&self) -> LeaseResult<(SubscriptionSpec, Arc<dyn TaskHandler>)> {
        let task_type = self.draft.task_type()?;
        let handler = self
            .handler
            .clone()
            .ok_or(ValidationError::MissingTaskHandler)?;
        let spec = self.draft.finish(task_type, SubscriptionMode::Push)?;
        Ok((spec, handler))
    }

    /// Проверяет параметры и открывает подписку у брокера.
    pub async fn open(self) -> LeaseResult<TaskSubscription> {
        let (spec, handler) = self.build()?;
        let engine = self.draft.engine;
        let inner = engine.open_subscription(spec, Some(handler)).await?;
        Ok(TaskSubscription::new(engine, inner))
    }
}

impl fmt::Debug for TaskSubscriptionBuilder {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TaskSubscriptionBuilder")
            .field("draft", &self.draft)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl PollableTaskSubscriptionBuilder {
    pub fn new(engine: AcquisitionEngine) -> Self {
        Self {
            draft: Draft::new(engine),
        }
    }

    pub fn task_type(
        mut self,
        task_type: impl Into<String>,
    ) -> Self {
        self.draft.task_type = Some(task_type.into());
        self
    }

    pub fn lock_time(
        mut self,
        lock_time: impl IntoLockTime,
    ) -> Self {
        self.draft.lock_time = Some(lock_time.into_lock_millis().unwrap_or(0));
        self
    }

    pub fn lock_owner(
        mut self,
        lock_owner: impl Into<String>,
    ) -> Self {
        self.draft.lock_owner = lock_owner.into();
        self
    }

    pub fn task_fetch_size(
        mut self,
        task_fetch_size: u32,
    ) -> Self {
        self.draft.task_fetch_size = task_fetch_size;
        self
    }

    pub fn build(&self) -> LeaseResult<SubscriptionSpec> {
        let task_type = self.draft.task_type()?;
        self.draft.finish(task_type, SubscriptionMode::Pull)
    }

    pub async fn open(self) -> LeaseResult<PollableTaskSubscription> {
        let spec = self.build()?;
        let engine = self.draft.engine;
        let inner = engine.open_subscription(spec, None).await?;
        Ok(PollableTaskSubscription::new(engine, inner))
    }
}
