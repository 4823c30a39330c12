use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use leasehold_error::TaskError;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::{Credits, SubscriptionMode, SubscriptionSpec, TaskHandler};
use crate::task::{SubscriptionId, Task, TaskId};

/// Состояние жизненного цикла подписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    Opening,
    Open,
    Closing,
    Closed,
}

/// Состояние аренды одной задачи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseStatus {
    /// Задача выдана обработчику или вызывающему `poll()`
    InFlight,
    /// Идёт RPC complete/fail
    Reporting,
    /// RPC отчёта не прошёл; слот удерживается до истечения блокировки
    Unconfirmed,
}

/// Аренда задачи подпиской.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease {
    pub expires_at: DateTime<Utc>,
    pub status: LeaseStatus,
}

/// Итог попытки взять задачу в аренду.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeaseOutcome {
    Leased,
    /// Задача уже арендована этой подпиской
    Duplicate,
    /// Брокер вернул больше задач, чем было кредитов
    NoCredit,
}

/// Итог снятия истёкших аренд.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Reclaimed {
    pub task_ids: Vec<TaskId>,
    /// Кредит не вернулся: учёт уже был сломан
    pub overflow: Option<TaskError>,
}

/// Одна подписка (push или pull) на задачи заданного типа.
///
/// Инвариант: для открытой подписки `credits_available() +
/// leases_outstanding() == capacity()`. Кредит списывается вместе с
/// созданием аренды и возвращается вместе с её удалением.
pub struct Subscription {
    spec: SubscriptionSpec,
    handler: Option<Arc<dyn TaskHandler>>,
    subscription_id: OnceCell<SubscriptionId>,
    state: Mutex<SubscriptionState>,
    credits: Credits,
    leases: DashMap<TaskId, Lease>,
    /// Сериализует acquire-RPC одной подписки
    acquisition: tokio::sync::Mutex<()>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Subscription {
    pub(crate) fn new(
        spec: SubscriptionSpec,
        handler: Option<Arc<dyn TaskHandler>>,
    ) -> Self {
        let credits = Credits::new(spec.capacity());
        Self {
            spec,
            handler,
            subscription_id: OnceCell::new(),
            state: Mutex::new(SubscriptionState::Opening),
            credits,
            leases: DashMap::new(),
            acquisition: tokio::sync::Mutex::new(()),
        }
    }

    /// Id, выданный брокером. `None`, пока открытие не завершилось.
    pub fn id(&self) -> Option<SubscriptionId> {
        self.subscription_id.get().copied()
    }

    pub fn spec(&self) -> &SubscriptionSpec {
        &self.spec
    }

    pub fn task_type(&self) -> &str {
        self.spec.task_type()
    }

    /// Время блокировки в миллисекундах.
    pub fn lock_time(&self) -> u64 {
        self.spec.lock_time()
    }

    pub fn lock_owner(&self) -> &str {
        self.spec.lock_owner()
    }

    pub fn capacity(&self) -> u32 {
        self.spec.capacity()
    }

    pub fn mode(&self) -> SubscriptionMode {
        self.spec.mode()
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.lock()
    }

    pub fn is_open(&self) -> bool {
        self.state() == SubscriptionState::Open
    }

    pub fn credits_available(&self) -> u32 {
        self.credits.available()
    }

    /// Количество неразрешённых аренд.
    pub fn leases_outstanding(&self) -> usize {
        self.leases.len()
    }

    pub fn lease(
        &self,
        task_id: TaskId,
    ) -> Option<Lease> {
        self.leases.get(&task_id).map(|l| *l.value())
    }

    pub(crate) fn handler(&self) -> Option<&Arc<dyn TaskHandler>> {
        self.handler.as_ref()
    }

    /// OPENING → OPEN.
    pub(crate) fn mark_open(
        &self,
        subscription_id: SubscriptionId,
    ) {
        let _ = self.subscription_id.set(subscription_id);
        *self.state.lock() = SubscriptionState::Open;
    }

    /// OPEN → CLOSING. Возвращает `false`, если закрытие уже начато.
    pub(crate) fn begin_close(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            SubscriptionState::Open | SubscriptionState::Opening => {
                *state = SubscriptionState::Closing;
                true
            }
            SubscriptionState::Closing | SubscriptionState::Closed => false,
        }
    }

    /// CLOSING → CLOSED.
    pub(crate) fn mark_closed(&self) {
        *self.state.lock() = SubscriptionState::Closed;
    }

    pub(crate) async fn lock_acquisition(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.acquisition.lock().await
    }

    /// Берёт задачу в аренду, списывая один кредит.
    pub(crate) fn take_lease(
        &self,
        task: &Task,
    ) -> LeaseOutcome {
        match self.leases.entry(task.task_id) {
            Entry::Occupied(_) => LeaseOutcome::Duplicate,
            Entry::Vacant(slot) => {
                if !self.credits.try_acquire(1) {
                    return LeaseOutcome::NoCredit;
                }
                slot.insert(Lease {
                    expires_at: task.lock_expiration_time,
                    status: LeaseStatus::InFlight,
                });
                LeaseOutcome::Leased
            }
        }
    }

    /// Переводит аренду в `Reporting`. Второй отчёт по той же задаче
    /// получает `AlreadyResolved`, как и отчёт по чужой аренде той же
    /// задачи (с другим сроком блокировки).
    pub(crate) fn begin_report(
        &self,
        task_id: TaskId,
        lock_expiration: DateTime<Utc>,
    ) -> Result<Lease, TaskError> {
        match self.leases.get_mut(&task_id) {
            Some(mut lease)
                if lease.status == LeaseStatus::InFlight && lease.expires_at == lock_expiration =>
            {
                lease.status = LeaseStatus::Reporting;
                Ok(*lease)
            }
            _ => Err(TaskError::AlreadyResolved { task_id }),
        }
    }

    /// Удаляет аренду с блокировкой до `lock_expiration` и возвращает её
    /// кредит. Аренду той же задачи, выданной повторно, не трогает.
    pub(crate) fn settle(
        &self,
        task_id: TaskId,
        lock_expiration: DateTime<Utc>,
    ) -> Result<(), TaskError> {
        match self.leases.entry(task_id) {
            Entry::Occupied(lease) if lease.get().expires_at == lock_expiration => {
                lease.remove();
            }
            _ => return Err(TaskError::AlreadyResolved { task_id }),
        }
        self.release_credit()
    }

    /// Аренда остаётся, кредит не возвращается.
    pub(crate) fn mark_unconfirmed(
        &self,
        task_id: TaskId,
    ) {
        if let Some(mut lease) = self.leases.get_mut(&task_id) {
            lease.status = LeaseStatus::Unconfirmed;
        }
    }

    /// Снимает аренды с истёкшей блокировкой и возвращает их кредиты.
    ///
    /// Всегда снимаются `Unconfirmed`. Для pull-подписок также `InFlight`:
    /// вызывающий `poll()` не отчитался вовремя, и брокер уже может выдать
    /// задачу снова. `InFlight` push-подписки принадлежит работающему
    /// обработчику и снимается им самим.
    pub(crate) fn reclaim_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Reclaimed {
        let reclaim_in_flight = self.mode() == SubscriptionMode::Pull;
        let mut task_ids = Vec::new();

        self.leases.retain(|task_id, lease| {
            let expired = lease.expires_at <= now;
            let reclaimable = match lease.status {
                LeaseStatus::Unconfirmed => true,
                LeaseStatus::InFlight => reclaim_in_flight,
                LeaseStatus::Reporting => false,
            };
            if expired && reclaimable {
                task_ids.push(*task_id);
                false
            } else {
                true
            }
        });

        let mut overflow = None;
        for _ in &task_ids {
            if let Err(err) = self.release_credit() {
                overflow = Some(err);
            }
        }
        Reclaimed { task_ids, overflow }
    }

    #[cfg(test)]
    pub(crate) fn credits(&self) -> &Credits {
        &self.credits
    }

    fn release_credit(&self) -> Result<(), TaskError> {
        self.credits
            .release(1)
            .map(|_| ())
            .map_err(|overflow| TaskError::CreditOverflow {
                subscription_id: self.id().unwrap_or_default(),
                capacity: overflow.capacity,
                available: overflow.available,
                released: overflow.released,
            })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для Subscription
////////////////////////////////////////////////////////////////////////////////

impl fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("subscription_id", &self.id())
            .field("spec", &self.spec)
            .field("state", &self.state())
            .field("credits_available", &self.credits_available())
            .field("leases", &self.leases_outstanding())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::TimeDelta;

    use super::*;

    fn subscription(mode: SubscriptionMode) -> Subscription {
        let spec = SubscriptionSpec::new("foo", 1_000, "owner", 2, mode).unwrap();
        let sub = Subscription::new(spec, None);
        sub.mark_open(7);
        sub
    }

    fn task(
        task_id: TaskId,
        expires_at: DateTime<Utc>,
    ) -> Task {
        Task {
            task_id,
            task_type: "foo".to_string(),
            subscription_id: 7,
            lock_owner: "owner".to_string(),
            lock_expiration_time: expires_at,
            payload: Bytes::new(),
            retries: 3,
        }
    }

    fn assert_balanced(sub: &Subscription) {
        assert_eq!(
            sub.credits_available() as usize + sub.leases_outstanding(),
            sub.capacity() as usize
        );
    }

    /// Тест проверяет переходы состояний и идемпотентность закрытия.
    #[test]
    fn test_state_transitions() {
        let spec = SubscriptionSpec::new("foo", 10, "owner", 1, SubscriptionMode::Push).unwrap();
        let sub = Subscription::new(spec, None);
        assert_eq!(sub.state(), SubscriptionState::Opening);
        assert_eq!(sub.id(), None);

        sub.mark_open(123);
        assert!(sub.is_open());
        assert_eq!(sub.id(), Some(123));

        assert!(sub.begin_close());
        assert!(!sub.begin_close());
        sub.mark_closed();
        assert_eq!(sub.state(), SubscriptionState::Closed);
        assert!(!sub.begin_close());
    }

    /// Тест проверяет защиту от повторной выдачи и ограничение кредитами.
    #[test]
    fn test_lease_guards_duplicates_and_credit() {
        let sub = subscription(SubscriptionMode::Push);
        let expires = Utc::now() + TimeDelta::seconds(1);

        assert_eq!(sub.take_lease(&task(1, expires)), LeaseOutcome::Leased);
        assert_eq!(sub.take_lease(&task(1, expires)), LeaseOutcome::Duplicate);
        assert_eq!(sub.take_lease(&task(2, expires)), LeaseOutcome::Leased);
        assert_eq!(sub.take_lease(&task(3, expires)), LeaseOutcome::NoCredit);
        assert_eq!(sub.credits_available(), 0);
        assert_balanced(&sub);
    }

    /// Тест проверяет, что второй отчёт по задаче отклоняется.
    #[test]
    fn test_double_report_rejected() {
        let sub = subscription(SubscriptionMode::Pull);
        let expires = Utc::now() + TimeDelta::seconds(1);
        sub.take_lease(&task(1, expires));

        assert!(sub.begin_report(1, expires).is_ok());
        assert_eq!(
            sub.begin_report(1, expires),
            Err(TaskError::AlreadyResolved { task_id: 1 })
        );

        sub.settle(1, expires).unwrap();
        assert_eq!(
            sub.settle(1, expires),
            Err(TaskError::AlreadyResolved { task_id: 1 })
        );
        assert_eq!(sub.credits_available(), 2);
    }

    /// Тест проверяет, что unconfirmed-аренда держит кредит до истечения
    /// блокировки, а потом возвращает его.
    #[test]
    fn test_unconfirmed_reclaimed_after_expiry() {
        let sub = subscription(SubscriptionMode::Push);
        let now = Utc::now();
        let expires = now + TimeDelta::milliseconds(500);

        sub.take_lease(&task(1, expires));
        sub.begin_report(1, expires).unwrap();
        sub.mark_unconfirmed(1);

        assert!(sub.reclaim_expired(now).task_ids.is_empty());
        assert_eq!(sub.credits_available(), 1);

        assert_eq!(sub.reclaim_expired(expires).task_ids, vec![1]);
        assert_eq!(sub.credits_available(), 2);
        assert_balanced(&sub);
    }

    /// Тест проверяет, что in-flight аренда push-подписки не снимается, а
    /// pull-подписки снимается.
    #[test]
    fn test_in_flight_reclaim_depends_on_mode() {
        let now = Utc::now();
        let expires = now + TimeDelta::milliseconds(10);

        let push = subscription(SubscriptionMode::Push);
        push.take_lease(&task(1, expires));
        assert!(push.reclaim_expired(expires).task_ids.is_empty());
        assert_eq!(push.lease(1).map(|l| l.status), Some(LeaseStatus::InFlight));

        let pull = subscription(SubscriptionMode::Pull);
        pull.take_lease(&task(1, expires));
        assert_eq!(pull.reclaim_expired(expires).task_ids, vec![1]);
        assert_balanced(&pull);
    }

    /// Тест проверяет, что отчёт по прежней аренде не снимает аренду той
    /// же задачи, выданной повторно с новым сроком блокировки.
    #[test]
    fn test_settle_ignores_lease_of_redelivered_task() {
        let sub = subscription(SubscriptionMode::Pull);
        let first = Utc::now();
        let second = first + TimeDelta::milliseconds(1_001);

        sub.take_lease(&task(1, first));
        assert_eq!(sub.reclaim_expired(first).task_ids, vec![1]);
        sub.take_lease(&task(1, second));

        assert_eq!(
            sub.settle(1, first),
            Err(TaskError::AlreadyResolved { task_id: 1 })
        );
        assert_eq!(
            sub.begin_report(1, first),
            Err(TaskError::AlreadyResolved { task_id: 1 })
        );
        assert_eq!(sub.lease(1).map(|l| l.expires_at), Some(second));
        assert_balanced(&sub);

        sub.begin_report(1, second).unwrap();
        sub.settle(1, second).unwrap();
        assert_eq!(sub.credits_available(), 2);
    }

    /// Тест проверяет, что переполнение кредитов при снятии аренд
    /// возвращается вызывающему.
    #[test]
    fn test_reclaim_reports_credit_overflow() {
        let sub = subscription(SubscriptionMode::Pull);
        let expires = Utc::now();
        sub.take_lease(&task(1, expires));
        sub.credits().release(1).unwrap();

        let reclaimed = sub.reclaim_expired(expires);
        assert_eq!(reclaimed.task_ids, vec![1]);
        assert!(matches!(
            reclaimed.overflow,
            Some(TaskError::CreditOverflow { subscription_id: 7, .. })
        ));
    }
}
