use std::{
    collections::{BTreeMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use leasehold_error::{BrokerError, LeaseResult};
use parking_lot::Mutex;

use super::{BrokerGateway, CreateSubscriptionRequest, SubscriptionCreated};
use crate::{
    clock::Clock,
    task::{SubscriptionId, Task, TaskId},
};

/// RPC брокера (для инъекции отказов и журнала вызовов).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerOperation {
    CreateSubscription,
    CloseSubscription,
    AcquireTasks,
    CompleteTask,
    FailTask,
}

/// Запись журнала вызовов брокера.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    CreateSubscription(CreateSubscriptionRequest),
    CloseSubscription(SubscriptionId),
    AcquireTasks {
        subscription_id: SubscriptionId,
        max_count: u32,
    },
    CompleteTask {
        task_id: TaskId,
        payload: Option<Bytes>,
    },
    FailTask {
        task_id: TaskId,
        reason: String,
    },
}

/// Брокер задач в памяти.
///
/// Поддерживает:
/// - Очередь задач по типам (FIFO по `task_id`)
/// - Блокировки с истечением по [`Clock`] и повторную выдачу после истечения
/// - Уменьшение бюджета повторов при `fail`
/// - Журнал всех RPC и одноразовую инъекцию отказов по операциям
pub struct InMemoryBroker {
    clock: Arc<dyn Clock>,
    /// Открытые подписки → параметры блокировки
    subscriptions: DashMap<SubscriptionId, CreateSubscriptionRequest>,
    /// Все задачи брокера, упорядоченные по id
    tasks: Mutex<BTreeMap<TaskId, StoredTask>>,
    /// Завершённые задачи → payload результата
    completed: DashMap<TaskId, Option<Bytes>>,
    next_subscription_id: AtomicU64,
    next_task_id: AtomicU64,
    /// Одноразовые отказы по операциям
    injected: DashMap<BrokerOperation, VecDeque<BrokerError>>,
    unreachable: AtomicBool,
    calls: Mutex<Vec<BrokerCall>>,
}

struct StoredTask {
    task_type: String,
    payload: Bytes,
    retries: u32,
    lock: Option<TaskLock>,
    last_failure: Option<String>,
}

struct TaskLock {
    subscription_id: SubscriptionId,
    owner: String,
    expires_at: DateTime<Utc>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl InMemoryBroker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            subscriptions: DashMap::new(),
            tasks: Mutex::new(BTreeMap::new()),
            completed: DashMap::new(),
            next_subscription_id: AtomicU64::new(1),
            next_task_id: AtomicU64::new(1),
            injected: DashMap::new(),
            unreachable: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Первый id, который получит следующая подписка.
    pub fn with_first_subscription_id(
        self,
        id: SubscriptionId,
    ) -> Self {
        self.next_subscription_id.store(id, Ordering::Relaxed);
        self
    }

    /// Кладёт задачу в очередь и возвращает её id.
    pub fn submit(
        &self,
        task_type: &str,
        payload: Bytes,
        retries: u32,
    ) -> TaskId {
        let task_id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        self.tasks.lock().insert(
            task_id,
            StoredTask {
                task_type: task_type.to_string(),
                payload,
                retries,
                lock: None,
                last_failure: None,
            },
        );
        task_id
    }

    /// Следующий вызов `operation` завершится ошибкой `error`.
    pub fn fail_next(
        &self,
        operation: BrokerOperation,
        error: BrokerError,
    ) {
        self.injected.entry(operation).or_default().push_back(error);
    }

    /// Пока флаг установлен, каждый RPC возвращает `BrokerError::Unreachable`.
    pub fn set_unreachable(
        &self,
        unreachable: bool,
    ) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Журнал вызовов в порядке поступления.
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.calls.lock().clone()
    }

    /// Количество вызовов заданной операции.
    pub fn call_count(
        &self,
        operation: BrokerOperation,
    ) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    pub fn is_completed(
        &self,
        task_id: TaskId,
    ) -> bool {
        self.completed.contains_key(&task_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Payload, с которым задача была завершена.
    pub fn completion_payload(
        &self,
        task_id: TaskId,
    ) -> Option<Bytes> {
        self.completed.get(&task_id).and_then(|e| e.value().clone())
    }

    /// Оставшийся бюджет повторов незавершённой задачи.
    pub fn retries_of(
        &self,
        task_id: TaskId,
    ) -> Option<u32> {
        self.tasks.lock().get(&task_id).map(|t| t.retries)
    }

    /// Причина последнего `fail` по задаче.
    pub fn last_failure(
        &self,
        task_id: TaskId,
    ) -> Option<String> {
        self.tasks
            .lock()
            .get(&task_id)
            .and_then(|t| t.last_failure.clone())
    }

    /// Количество задач под действующей блокировкой.
    pub fn locked_count(&self) -> usize {
        let now = self.clock.now();
        self.tasks
            .lock()
            .values()
            .filter(|t| t.lock.as_ref().is_some_and(|l| l.expires_at > now))
            .count()
    }

    pub fn is_subscription_open(
        &self,
        subscription_id: SubscriptionId,
    ) -> bool {
        self.subscriptions.contains_key(&subscription_id)
    }

    pub fn open_subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn record(
        &self,
        call: BrokerCall,
    ) -> LeaseResult<()> {
        let operation = call.operation();
        self.calls.lock().push(call);

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(BrokerError::Unreachable {
                reason: "in-memory broker marked unreachable".to_string(),
            }
            .into());
        }
        if let Some(mut queue) = self.injected.get_mut(&operation) {
            if let Some(error) = queue.pop_front() {
                return Err(error.into());
            }
        }
        Ok(())
    }
}

impl BrokerCall {
    pub fn operation(&self) -> BrokerOperation {
        match self {
            Self::CreateSubscription(_) => BrokerOperation::CreateSubscription,
            Self::CloseSubscription(_) => BrokerOperation::CloseSubscription,
            Self::AcquireTasks { .. } => BrokerOperation::AcquireTasks,
            Self::CompleteTask { .. } => BrokerOperation::CompleteTask,
            Self::FailTask { .. } => BrokerOperation::FailTask,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Реализация BrokerGateway
////////////////////////////////////////////////////////////////////////////////

#[async_trait]
impl BrokerGateway for InMemoryBroker {
    async fn create_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> LeaseResult<SubscriptionCreated> {
        self.record(BrokerCall::CreateSubscription(request.clone()))?;

        let subscription_id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions.insert(subscription_id, request.clone());

        Ok(SubscriptionCreated {
            subscription_id,
            credits_granted: request.capacity,
        })
    }

    async fn close_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> LeaseResult<()> {
        self.record(BrokerCall::CloseSubscription(subscription_id))?;

        // Блокировки задач живут до истечения.
        match self.subscriptions.remove(&subscription_id) {
            Some(_) => Ok(()),
            None => Err(BrokerError::UnknownSubscription { subscription_id }.into()),
        }
    }

    async fn acquire_tasks(
        &self,
        subscription_id: SubscriptionId,
        max_count: u32,
    ) -> LeaseResult<Vec<Task>> {
        self.record(BrokerCall::AcquireTasks {
            subscription_id,
            max_count,
        })?;

        let request = self
            .subscriptions
            .get(&subscription_id)
            .map(|e| e.value().clone())
            .ok_or(BrokerError::UnknownSubscription { subscription_id })?;

        let now = self.clock.now();
        let lock_duration =
            TimeDelta::milliseconds(i64::try_from(request.lock_duration_ms).unwrap_or(i64::MAX));
        let expires_at = now
            .checked_add_signed(lock_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut tasks = self.tasks.lock();
        let mut acquired = Vec::new();

        for (task_id, stored) in tasks.iter_mut() {
            if acquired.len() >= max_count as usize {
                break;
            }
            let lockable = stored.task_type == request.task_type
                && stored.retries > 0
                && stored.lock.as_ref().map_or(true, |l| l.expires_at <= now);
            if !lockable {
                continue;
            }

            stored.lock = Some(TaskLock {
                subscription_id,
                owner: request.lock_owner.clone(),
                expires_at,
            });
            acquired.push(Task {
                task_id: *task_id,
                task_type: stored.task_type.clone(),
                subscription_id,
                lock_owner: request.lock_owner.clone(),
                lock_expiration_time: expires_at,
                payload: stored.payload.clone(),
                retries: stored.retries,
            });
        }

        Ok(acquired)
    }

    async fn complete_task(
        &self,
        task_id: TaskId,
        payload: Option<Bytes>,
    ) -> LeaseResult<()> {
        self.record(BrokerCall::CompleteTask {
            task_id,
            payload: payload.clone(),
        })?;

        let now = self.clock.now();
        let mut tasks = self.tasks.lock();
        let held = tasks
            .get(&task_id)
            .and_then(|t| t.lock.as_ref())
            .is_some_and(|l| l.expires_at > now);
        if !held {
            return Err(BrokerError::UnknownTask { task_id }.into());
        }

        tasks.remove(&task_id);
        self.completed.insert(task_id, payload);
        Ok(())
    }

    async fn fail_task(
        &self,
        task_id: TaskId,
        reason: &str,
    ) -> LeaseResult<()> {
        self.record(BrokerCall::FailTask {
            task_id,
            reason: reason.to_string(),
        })?;

        let now = self.clock.now();
        let mut tasks = self.tasks.lock();
        let stored = tasks
            .get_mut(&task_id)
            .filter(|t| t.lock.as_ref().is_some_and(|l| l.expires_at > now))
            .ok_or(BrokerError::UnknownTask { task_id })?;

        stored.retries = stored.retries.saturating_sub(1);
        stored.lock = None;
        stored.last_failure = Some(reason.to_string());
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBroker {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let tasks = self.tasks.lock();
        let locks: Vec<(TaskId, SubscriptionId, &str)> = tasks
            .iter()
            .filter_map(|(id, t)| {
                t.lock
                    .as_ref()
                    .map(|l| (*id, l.subscription_id, l.owner.as_str()))
            })
            .collect();
        f.debug_struct("InMemoryBroker")
            .field("subscriptions", &self.subscriptions.len())
            .field("tasks", &tasks.len())
            .field("locks", &locks)
            .field("completed", &self.completed.len())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
