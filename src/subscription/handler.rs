use std::{fmt, future::Future};

use async_trait::async_trait;

use crate::{codec::Value, task::LockedTask};

/// Результат обработчика: payload завершения (или `None`) либо отказ.
pub type HandlerResult = Result<Option<Value>, HandlerError>;

/// Отказ обработчика. Задача будет отправлена брокеру как `fail` с
/// текстом ошибки в качестве причины.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Обработчик задач push-подписки.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        task: LockedTask,
    ) -> HandlerResult;
}

/// Обработчик из замыкания, см. [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

/// Оборачивает async-замыкание в [`TaskHandler`].
///
/// ```ignore
/// let handler = handler_fn(|task: LockedTask| async move {
///     Ok(Some(task.payload().clone()))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(LockedTask) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> TaskHandler for FnHandler<F>
where
    F: Fn(LockedTask) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(
        &self,
        task: LockedTask,
    ) -> HandlerResult {
        (self.f)(task).await
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::task::Task;

    fn locked(payload: Value) -> LockedTask {
        LockedTask::new(
            Task {
                task_id: 1,
                task_type: "foo".to_string(),
                subscription_id: 1,
                lock_owner: "owner".to_string(),
                lock_expiration_time: Utc::now(),
                payload: Bytes::new(),
                retries: 3,
            },
            payload,
        )
    }

    /// Тест проверяет, что замыкание получает задачу и его результат
    /// возвращается как есть.
    #[tokio::test]
    async fn test_handler_fn_passes_task_through() {
        let handler = handler_fn(|task: LockedTask| async move {
            match task.payload().get("ok") {
                Some(_) => Ok(Some(json!({"seen": task.id()}))),
                None => Err(HandlerError::new("no ok flag")),
            }
        });

        let done = handler.handle(locked(json!({"ok": true}))).await;
        assert_eq!(done, Ok(Some(json!({"seen": 1}))));

        let failed = handler.handle(locked(json!({}))).await;
        assert_eq!(failed, Err(HandlerError::Failed("no ok flag".to_string())));
    }
}
