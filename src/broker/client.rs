use std::{future::Future, sync::Arc, time::Duration};

use bytes::Bytes;
use leasehold_error::{BrokerError, LeaseResult, ResultExt};
use tokio::time::timeout;
use tracing::{debug, trace};

use super::{BrokerGateway, CreateSubscriptionRequest, SubscriptionCreated};
use crate::task::{SubscriptionId, Task, TaskId};

/// Клиентская обёртка над [`BrokerGateway`].
///
/// Добавляет к каждому RPC таймаут (если задан), контекст операции в
/// ошибку и trace-логирование. Движок общается с брокером только через
/// неё.
#[derive(Clone)]
pub struct BrokerClient {
    gateway: Arc<dyn BrokerGateway>,
    rpc_timeout: Option<Duration>,
}

impl BrokerClient {
    pub fn new(
        gateway: Arc<dyn BrokerGateway>,
        rpc_timeout: Option<Duration>,
    ) -> Self {
        Self {
            gateway,
            rpc_timeout,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn BrokerGateway> {
        &self.gateway
    }

    pub async fn create_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> LeaseResult<SubscriptionCreated> {
        debug!(
            task_type = %request.task_type,
            lock_duration_ms = request.lock_duration_ms,
            lock_owner = %request.lock_owner,
            capacity = request.capacity,
            "Creating subscription"
        );
        self.call("create subscription", self.gateway.create_subscription(request))
            .await
    }

    pub async fn close_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> LeaseResult<()> {
        debug!(subscription_id, "Closing subscription");
        self.call(
            "close subscription",
            self.gateway.close_subscription(subscription_id),
        )
        .await
    }

    pub async fn acquire_tasks(
        &self,
        subscription_id: SubscriptionId,
        max_count: u32,
    ) -> LeaseResult<Vec<Task>> {
        trace!(subscription_id, max_count, "Acquiring tasks");
        let tasks = self
            .call(
                "acquire tasks",
                self.gateway.acquire_tasks(subscription_id, max_count),
            )
            .await?;
        trace!(subscription_id, acquired = tasks.len(), "Tasks acquired");
        Ok(tasks)
    }

    pub async fn complete_task(
        &self,
        task_id: TaskId,
        payload: Option<Bytes>,
    ) -> LeaseResult<()> {
        trace!(task_id, "Completing task");
        self.call("complete task", self.gateway.complete_task(task_id, payload))
            .await
    }

    pub async fn fail_task(
        &self,
        task_id: TaskId,
        reason: &str,
    ) -> LeaseResult<()> {
        trace!(task_id, reason, "Failing task");
        self.call("fail task", self.gateway.fail_task(task_id, reason))
            .await
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        rpc: impl Future<Output = LeaseResult<T>>,
    ) -> LeaseResult<T> {
        let result = match self.rpc_timeout {
            Some(limit) => match timeout(limit, rpc).await {
                Ok(result) => result,
                Err(_) => Err(BrokerError::Unreachable {
                    reason: format!("{operation} timed out after {}ms", limit.as_millis()),
                }
                .into()),
            },
            None => rpc.await,
        };
        result.context(operation)
    }
}
