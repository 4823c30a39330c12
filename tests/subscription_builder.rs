mod common;

use std::time::Duration;

use common::{env, NoopHandler, FIRST_SUBSCRIPTION_ID};
use leasehold::{
    BrokerCall, BrokerError, BrokerOperation, CreateSubscriptionRequest, StatusCode,
    SubscriptionError, SubscriptionState, ValidationError, DEFAULT_TASK_FETCH_SIZE,
};

/// Тест проверяет, что push-подписка открывается с заданными
/// параметрами, регистрируется и отправляет брокеру ровно их.
#[tokio::test]
async fn test_build_subscription() {
    let env = env();

    let subscription = env
        .client
        .new_subscription()
        .handler(NoopHandler)
        .lock_time(654u64)
        .lock_owner("owner")
        .task_type("fooo")
        .open()
        .await
        .unwrap();

    assert_eq!(subscription.lock_time(), 654);
    assert_eq!(subscription.lock_owner(), "owner");
    assert_eq!(subscription.task_type(), "fooo");
    assert_eq!(subscription.id(), FIRST_SUBSCRIPTION_ID);
    assert_eq!(subscription.capacity(), DEFAULT_TASK_FETCH_SIZE);
    assert_eq!(subscription.credits_available(), DEFAULT_TASK_FETCH_SIZE);
    assert_eq!(subscription.state(), SubscriptionState::Open);

    let registry = env.client.engine().registry();
    let push = registry.push_managed();
    assert_eq!(push.len(), 1);
    assert_eq!(push[0].id(), Some(FIRST_SUBSCRIPTION_ID));
    assert!(registry.pollable().is_empty());

    assert_eq!(
        env.broker.calls(),
        vec![BrokerCall::CreateSubscription(CreateSubscriptionRequest {
            task_type: "fooo".to_string(),
            lock_duration_ms: 654,
            lock_owner: "owner".to_string(),
            capacity: DEFAULT_TASK_FETCH_SIZE,
        })]
    );
}

/// Тест проверяет, что pull-подписка попадает в список pollable и не
/// видна фоновому циклу.
#[tokio::test]
async fn test_build_pollable_subscription() {
    let env = env();

    let subscription = env
        .client
        .new_pollable_subscription()
        .lock_time(654u64)
        .lock_owner("owner")
        .task_type("fooo")
        .open()
        .await
        .unwrap();

    assert_eq!(subscription.lock_time(), 654);
    assert_eq!(subscription.lock_owner(), "owner");
    assert_eq!(subscription.task_type(), "fooo");
    assert_eq!(subscription.id(), FIRST_SUBSCRIPTION_ID);
    assert_eq!(subscription.capacity(), DEFAULT_TASK_FETCH_SIZE);

    let registry = env.client.engine().registry();
    assert!(registry.push_managed().is_empty());
    let pollable = registry.pollable();
    assert_eq!(pollable.len(), 1);
    assert_eq!(pollable[0].id(), Some(FIRST_SUBSCRIPTION_ID));
}

/// Тест проверяет, что без типа задачи подписка не открывается и брокер
/// не вызывается.
#[tokio::test]
async fn test_validate_task_type() {
    let env = env();

    let err = env
        .client
        .new_subscription()
        .handler(NoopHandler)
        .lock_time(654u64)
        .lock_owner("owner")
        .open()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "taskType must not be null");
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::MissingTaskType)
    );
    assert!(env.broker.calls().is_empty());
}

#[tokio::test]
async fn test_validate_task_handler() {
    let env = env();

    let err = env
        .client
        .new_subscription()
        .task_type("foo")
        .lock_time(654u64)
        .lock_owner("owner")
        .open()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "taskHandler must not be null");
    assert_eq!(err.status_code(), StatusCode::MissingTaskHandler);
    assert!(env.client.engine().registry().is_empty());
}

#[tokio::test]
async fn test_validate_lock_time() {
    let env = env();

    let err = env
        .client
        .new_subscription()
        .task_type("foo")
        .handler(NoopHandler)
        .lock_time(0u64)
        .lock_owner("owner")
        .open()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "lockTime must be greater than 0");
    assert_eq!(err.status_code(), StatusCode::InvalidLockTime);
}

/// Тест проверяет, что отрицательное время блокировки отклоняется так
/// же, как нулевое.
#[tokio::test]
async fn test_validate_negative_lock_time() {
    let env = env();

    let err = env
        .client
        .new_pollable_subscription()
        .task_type("foo")
        .lock_time(-5i64)
        .open()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "lockTime must be greater than 0");
}

#[tokio::test]
async fn test_validate_lock_owner() {
    let env = env();

    let err = env
        .client
        .new_subscription()
        .task_type("foo")
        .handler(NoopHandler)
        .lock_time(1000u64)
        .lock_owner("")
        .open()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "lockOwner must not be empty");
    assert!(env.broker.calls().is_empty());
}

/// Тест проверяет, что время блокировки в 10 дней задаётся через
/// `Duration` без потери точности.
#[tokio::test]
async fn test_lock_time_as_duration() {
    let env = env();
    let ten_days = Duration::from_secs(10 * 24 * 60 * 60);

    let subscription = env
        .client
        .new_subscription()
        .handler(NoopHandler)
        .lock_time(ten_days)
        .task_type("foo")
        .open()
        .await
        .unwrap();

    assert_eq!(subscription.lock_time(), 864_000_000);
    assert_eq!(subscription.lock_owner(), "default");
}

#[tokio::test]
async fn test_pollable_lock_time_as_duration() {
    let env = env();
    let ten_days = chrono::TimeDelta::days(10);

    let subscription = env
        .client
        .new_pollable_subscription()
        .lock_time(ten_days)
        .task_type("foo")
        .open()
        .await
        .unwrap();

    assert_eq!(subscription.lock_time(), 864_000_000);
}

/// Тест проверяет, что при отказе брокера открытие возвращает ошибку с
/// причиной, а подписка не регистрируется.
#[tokio::test]
async fn test_open_failure_is_not_registered() {
    let env = env();
    env.broker.fail_next(
        BrokerOperation::CreateSubscription,
        BrokerError::Rejected {
            operation: "create subscription".to_string(),
            reason: "foo".to_string(),
        },
    );

    let err = env
        .client
        .new_subscription()
        .handler(NoopHandler)
        .lock_time(654u64)
        .task_type("foo")
        .open()
        .await
        .unwrap_err();

    assert!(
        err.to_string().contains("opening subscription"),
        "got: {err}"
    );
    assert!(err.to_string().contains("foo"));
    assert!(err.is::<SubscriptionError>());
    assert_eq!(err.status_code(), StatusCode::SubscriptionOpenFailed);
    assert!(env.client.engine().registry().is_empty());
    assert_eq!(env.broker.open_subscription_count(), 0);
}

/// Тест проверяет, что размер выборки задаёт ёмкость подписки.
#[tokio::test]
async fn test_task_fetch_size_sets_capacity() {
    let env = env();

    let subscription = env
        .client
        .new_pollable_subscription()
        .task_type("foo")
        .lock_time(1000u64)
        .task_fetch_size(2)
        .open()
        .await
        .unwrap();

    assert_eq!(subscription.capacity(), 2);
    assert_eq!(subscription.credits_available(), 2);

    let err = env
        .client
        .new_pollable_subscription()
        .task_type("foo")
        .lock_time(1000u64)
        .task_fetch_size(0)
        .open()
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::InvalidFetchSize);
}

/// Тест проверяет, что builder собирает спецификацию без обращения к
/// брокеру.
#[tokio::test]
async fn test_build_does_not_call_broker() {
    let env = env();

    let spec = env
        .client
        .new_pollable_subscription()
        .task_type("foo")
        .lock_time(1000u64)
        .build()
        .unwrap();

    assert_eq!(spec.task_type(), "foo");
    assert_eq!(spec.lock_owner(), "default");
    assert_eq!(spec.capacity(), DEFAULT_TASK_FETCH_SIZE);
    assert!(env.broker.calls().is_empty());
}
