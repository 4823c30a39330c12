use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::codec::Value;

/// Идентификатор задачи, назначенный брокером.
pub type TaskId = u64;
/// Идентификатор подписки, назначенный брокером.
pub type SubscriptionId = u64;

/// Задача, арендованная у брокера.
///
/// Payload остаётся непрозрачными байтами до декодирования кодеком.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub task_id: TaskId,
    pub task_type: String,
    /// Подписка, через которую задача была получена
    pub subscription_id: SubscriptionId,
    pub lock_owner: String,
    /// После этого момента брокер может снова выдать задачу
    pub lock_expiration_time: DateTime<Utc>,
    pub payload: Bytes,
    /// Оставшийся бюджет повторов
    pub retries: u32,
}

impl Task {
    /// Истекла ли блокировка к моменту `now`.
    pub fn is_lock_expired(
        &self,
        now: DateTime<Utc>,
    ) -> bool {
        now >= self.lock_expiration_time
    }
}

/// Задача с декодированным payload, выданная обработчику или вызывающему
/// `poll()`.
#[derive(Debug, Clone)]
pub struct LockedTask {
    task: Task,
    payload: Value,
}

impl LockedTask {
    pub(crate) fn new(
        task: Task,
        payload: Value,
    ) -> Self {
        Self { task, payload }
    }

    pub fn id(&self) -> TaskId {
        self.task.task_id
    }

    pub fn task_type(&self) -> &str {
        &self.task.task_type
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn lock_owner(&self) -> &str {
        &self.task.lock_owner
    }

    pub fn lock_expiration_time(&self) -> DateTime<Utc> {
        self.task.lock_expiration_time
    }

    pub fn retries(&self) -> u32 {
        self.task.retries
    }

    /// Исходная задача в том виде, в каком её вернул брокер.
    pub fn task(&self) -> &Task {
        &self.task
    }
}
