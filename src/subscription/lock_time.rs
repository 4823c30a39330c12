use std::time::Duration;

use chrono::TimeDelta;

/// Значение, которое можно передать builder-у как время блокировки.
///
/// Возвращает число миллисекунд, если оно строго положительно. Всё
/// остальное (ноль, отрицательные значения, переполнение) даёт `None`, и
/// builder сообщит `lockTime must be greater than 0`.
pub trait IntoLockTime {
    fn into_lock_millis(self) -> Option<u64>;
}

impl IntoLockTime for u64 {
    fn into_lock_millis(self) -> Option<u64> {
        (self > 0).then_some(self)
    }
}

impl IntoLockTime for u32 {
    fn into_lock_millis(self) -> Option<u64> {
        u64::from(self).into_lock_millis()
    }
}

impl IntoLockTime for i64 {
    fn into_lock_millis(self) -> Option<u64> {
        u64::try_from(self).ok().and_then(IntoLockTime::into_lock_millis)
    }
}

impl IntoLockTime for i32 {
    fn into_lock_millis(self) -> Option<u64> {
        i64::from(self).into_lock_millis()
    }
}

impl IntoLockTime for Duration {
    fn into_lock_millis(self) -> Option<u64> {
        u64::try_from(self.as_millis())
            .ok()
            .and_then(IntoLockTime::into_lock_millis)
    }
}

impl IntoLockTime for TimeDelta {
    fn into_lock_millis(self) -> Option<u64> {
        self.num_milliseconds().into_lock_millis()
    }
}
