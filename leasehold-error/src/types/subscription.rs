use std::any::Any;

use crate::{ErrorExt, StackError, StatusCode};

/// Ошибки жизненного цикла подписки.
#[derive(Debug, Clone)]
pub enum SubscriptionError {
    /// RPC открытия подписки завершился ошибкой; подписка не
    /// зарегистрирована
    OpenFailed { task_type: String, cause: StackError },
    /// Операция требует открытой подписки
    NotOpen { subscription_id: u64 },
    /// Подписка отсутствует в реестре
    UnknownSubscription { subscription_id: u64 },
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::OpenFailed { task_type, cause } => write!(
                f,
                "Exception while opening subscription for task type '{task_type}': {cause}"
            ),
            Self::NotOpen { subscription_id } => {
                write!(f, "Subscription {subscription_id} is not open")
            }
            Self::UnknownSubscription { subscription_id } => {
                write!(f, "Subscription {subscription_id} is not registered")
            }
        }
    }
}

impl std::error::Error for SubscriptionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::OpenFailed { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

impl ErrorExt for SubscriptionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::OpenFailed { .. } => StatusCode::SubscriptionOpenFailed,
            Self::NotOpen { .. } => StatusCode::SubscriptionNotOpen,
            Self::UnknownSubscription { .. } => StatusCode::SubscriptionNotFound,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "subscription".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::OpenFailed { task_type, .. } => tags.push(("task_type", task_type.clone())),
            Self::NotOpen { subscription_id } | Self::UnknownSubscription { subscription_id } => {
                tags.push(("subscription_id", subscription_id.to_string()))
            }
        }

        tags
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;
    use crate::BrokerError;

    /// Тест проверяет, что OpenFailed сохраняет исходную причину.
    #[test]
    fn test_open_failed_keeps_cause() {
        let cause = StackError::new(BrokerError::Rejected {
            operation: "create subscription".to_string(),
            reason: "foo".to_string(),
        });
        let err = SubscriptionError::OpenFailed {
            task_type: "bar".to_string(),
            cause,
        };

        assert!(err.to_string().contains("opening subscription"));
        assert!(err.to_string().contains("foo"));
        assert_eq!(err.status_code(), StatusCode::SubscriptionOpenFailed);

        let source = err.source().expect("cause must be preserved");
        assert!(source.to_string().contains("foo"));
    }
}
