use leasehold_error::{ensure, LeaseResult, ValidationError};

/// Режим доставки задач подписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionMode {
    /// Задачи доставляются зарегистрированному обработчику движком
    Push,
    /// Задачи выдаются только по явному `poll()`
    Pull,
}

/// Проверенные параметры подписки.
///
/// Создаётся только через [`SubscriptionSpec::new`], поэтому любой
/// экземпляр уже удовлетворяет правилам валидации.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSpec {
    task_type: String,
    lock_time: u64,
    lock_owner: String,
    capacity: u32,
    mode: SubscriptionMode,
}

impl SubscriptionSpec {
    /// Проверяет параметры в порядке taskType, lockTime, lockOwner,
    /// taskFetchSize и возвращает первое нарушение.
    pub fn new(
        task_type: impl Into<String>,
        lock_time: u64,
        lock_owner: impl Into<String>,
        capacity: u32,
        mode: SubscriptionMode,
    ) -> LeaseResult<Self> {
        let task_type = task_type.into();
        let lock_owner = lock_owner.into();

        ensure!(!task_type.is_empty(), ValidationError::MissingTaskType);
        ensure!(lock_time > 0, ValidationError::NonPositiveLockTime);
        ensure!(!lock_owner.is_empty(), ValidationError::EmptyLockOwner);
        ensure!(capacity > 0, ValidationError::ZeroFetchSize);

        Ok(Self {
            task_type,
            lock_time,
            lock_owner,
            capacity,
            mode,
        })
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// Время блокировки в миллисекундах.
    pub fn lock_time(&self) -> u64 {
        self.lock_time
    }

    pub fn lock_owner(&self) -> &str {
        &self.lock_owner
    }

    /// Максимум одновременно арендованных задач.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn mode(&self) -> SubscriptionMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use leasehold_error::StatusCode;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", 10, "owner", 5, StatusCode::MissingTaskType)]
    #[case("", 0, "", 0, StatusCode::MissingTaskType)]
    #[case("foo", 0, "owner", 5, StatusCode::InvalidLockTime)]
    #[case("foo", 0, "", 5, StatusCode::InvalidLockTime)]
    #[case("foo", 10, "", 5, StatusCode::InvalidLockOwner)]
    #[case("foo", 10, "owner", 0, StatusCode::InvalidFetchSize)]
    fn test_first_violation_wins(
        #[case] task_type: &str,
        #[case] lock_time: u64,
        #[case] lock_owner: &str,
        #[case] capacity: u32,
        #[case] expected: StatusCode,
    ) {
        let err = SubscriptionSpec::new(
            task_type,
            lock_time,
            lock_owner,
            capacity,
            SubscriptionMode::Pull,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), expected);
    }

    #[test]
    fn test_valid_spec() {
        let spec = SubscriptionSpec::new("foo", 654, "owner", 5, SubscriptionMode::Push).unwrap();
        assert_eq!(spec.task_type(), "foo");
        assert_eq!(spec.lock_time(), 654);
        assert_eq!(spec.lock_owner(), "owner");
        assert_eq!(spec.capacity(), 5);
        assert_eq!(spec.mode(), SubscriptionMode::Push);
    }
}
