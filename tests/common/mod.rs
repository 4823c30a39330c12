#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use leasehold::{
    BrokerGateway, ClientConfig, CreateSubscriptionRequest, EngineConfig, HandlerResult,
    InMemoryBroker, LeaseResult, LockedTask, ManualClock, MsgPackCodec, PayloadCodec,
    Subscription, SubscriptionCreated, SubscriptionId, Task, TaskClient, TaskHandler, TaskId,
    Value,
};
use tokio::sync::Semaphore;

/// Id, с которого брокер нумерует подписки в тестах.
pub const FIRST_SUBSCRIPTION_ID: SubscriptionId = 123;

pub struct TestEnv {
    pub clock: Arc<ManualClock>,
    pub broker: Arc<InMemoryBroker>,
    pub client: TaskClient,
}

/// Клиент без фонового цикла: циклы гоняются вручную через `run_cycle`.
pub fn env() -> TestEnv {
    env_with(ClientConfig {
        engine: EngineConfig::default(),
        start_acquisition: false,
    })
}

pub fn env_with(config: ClientConfig) -> TestEnv {
    let clock = Arc::new(ManualClock::default());
    let broker =
        Arc::new(InMemoryBroker::new(clock.clone()).with_first_subscription_id(FIRST_SUBSCRIPTION_ID));
    let client = TaskClient::with_components(
        broker.clone(),
        Arc::new(MsgPackCodec),
        clock.clone(),
        config,
    )
    .expect("client must be created");
    TestEnv {
        clock,
        broker,
        client,
    }
}

/// Фоновый цикл с коротким интервалом.
pub fn running_env() -> TestEnv {
    env_with(ClientConfig {
        engine: EngineConfig {
            acquisition_interval: Duration::from_millis(20),
            ..EngineConfig::default()
        },
        start_acquisition: true,
    })
}

pub fn encode(value: &Value) -> Bytes {
    MsgPackCodec.encode(value).expect("value must encode")
}

pub fn decode(bytes: &Bytes) -> Value {
    MsgPackCodec.decode(bytes).expect("bytes must decode")
}

/// Кладёт `count` задач типа `task_type` с payload `{"n": i}`.
pub fn submit_many(
    broker: &InMemoryBroker,
    task_type: &str,
    count: usize,
) -> Vec<TaskId> {
    (0..count)
        .map(|i| broker.submit(task_type, encode(&serde_json::json!({ "n": i })), 3))
        .collect()
}

/// Обработчик, который ничего не делает и завершает задачу без payload.
pub struct NoopHandler;

#[async_trait]
impl TaskHandler for NoopHandler {
    async fn handle(
        &self,
        _task: LockedTask,
    ) -> HandlerResult {
        Ok(None)
    }
}

/// Обработчик, который ждёт разрешения на каждую задачу.
#[derive(Clone)]
pub struct GatedHandler {
    pub gate: Arc<Semaphore>,
}

impl GatedHandler {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn release(
        &self,
        n: usize,
    ) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl TaskHandler for GatedHandler {
    async fn handle(
        &self,
        _task: LockedTask,
    ) -> HandlerResult {
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        Ok(None)
    }
}

/// Брокер, у которого ответ `acquire_tasks` задерживается до разрешения.
/// Сам захват (блокировки) происходит сразу.
pub struct GatedBroker {
    pub inner: Arc<InMemoryBroker>,
    pub acquire_gate: Arc<Semaphore>,
}

impl GatedBroker {
    pub fn new(inner: Arc<InMemoryBroker>) -> Self {
        Self {
            inner,
            acquire_gate: Arc::new(Semaphore::new(0)),
        }
    }
}

#[async_trait]
impl BrokerGateway for GatedBroker {
    async fn create_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> LeaseResult<SubscriptionCreated> {
        self.inner.create_subscription(request).await
    }

    async fn close_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> LeaseResult<()> {
        self.inner.close_subscription(subscription_id).await
    }

    async fn acquire_tasks(
        &self,
        subscription_id: SubscriptionId,
        max_count: u32,
    ) -> LeaseResult<Vec<Task>> {
        let tasks = self.inner.acquire_tasks(subscription_id, max_count).await?;
        let permit = self.acquire_gate.acquire().await.expect("gate closed");
        permit.forget();
        Ok(tasks)
    }

    async fn complete_task(
        &self,
        task_id: TaskId,
        payload: Option<Bytes>,
    ) -> LeaseResult<()> {
        self.inner.complete_task(task_id, payload).await
    }

    async fn fail_task(
        &self,
        task_id: TaskId,
        reason: &str,
    ) -> LeaseResult<()> {
        self.inner.fail_task(task_id, reason).await
    }
}

/// `credits_available + leases_outstanding == capacity`.
pub fn assert_credit_invariant(subscription: &Subscription) {
    assert_eq!(
        subscription.credits_available() as usize + subscription.leases_outstanding(),
        subscription.capacity() as usize,
        "credit accounting drifted"
    );
}

/// Ждёт условия, отдавая управление runtime между проверками.
pub async fn wait_until(
    timeout: Duration,
    mut condition: impl FnMut() -> bool,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
