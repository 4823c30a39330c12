//! Источник времени для проверки истечения блокировок.
//!
//! Движок никогда не обращается к системным часам напрямую: проверки
//! "блокировка истекла" и возврат кредитов идут через [`Clock`], поэтому
//! тесты могут двигать время вручную через [`ManualClock`].

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

/// Источник текущего времени.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Системные часы (UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

/// Часы, которые двигаются только явно.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl ManualClock {
    /// Создаёт часы, остановленные в момент `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Переставляет часы на `instant`.
    pub fn set(
        &self,
        instant: DateTime<Utc>,
    ) {
        *self.now.lock() = instant;
    }

    /// Сдвигает часы вперёд на `delta`.
    pub fn advance(
        &self,
        delta: TimeDelta,
    ) {
        let mut now = self.now.lock();
        *now += delta;
    }

    /// Сдвигает часы вперёд на `millis` миллисекунд.
    pub fn advance_millis(
        &self,
        millis: i64,
    ) {
        self.advance(TimeDelta::milliseconds(millis));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
