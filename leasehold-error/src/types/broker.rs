use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки, возвращаемые шлюзом брокера.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// Брокер недоступен (транспорт)
    Unreachable { reason: String },
    /// Брокер отклонил запрос
    Rejected { operation: String, reason: String },
    /// Брокер не знает подписку
    UnknownSubscription { subscription_id: u64 },
    /// Брокер не знает задачу или она заблокирована другим владельцем
    UnknownTask { task_id: u64 },
}

impl std::fmt::Display for BrokerError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Unreachable { reason } => write!(f, "Broker unreachable: {reason}"),
            Self::Rejected { operation, reason } => {
                write!(f, "Broker rejected {operation}: {reason}")
            }
            Self::UnknownSubscription { subscription_id } => {
                write!(f, "Broker does not know subscription {subscription_id}")
            }
            Self::UnknownTask { task_id } => {
                write!(f, "Task {task_id} is not locked by this client")
            }
        }
    }
}

impl std::error::Error for BrokerError {}

impl ErrorExt for BrokerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unreachable { .. } => StatusCode::BrokerUnreachable,
            Self::Rejected { .. } => StatusCode::BrokerRejected,
            Self::UnknownSubscription { .. } => StatusCode::SubscriptionNotFound,
            Self::UnknownTask { .. } => StatusCode::TaskNotFound,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::Unreachable { .. } => "Broker unreachable".to_string(),
            _ => self.to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "broker".to_string()),
            ("status_code", self.status_code().to_string()),
        ];
        if let Self::Rejected { operation, .. } = self {
            tags.push(("operation", operation.clone()));
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_is_retryable() {
        let err = BrokerError::Unreachable {
            reason: "reset".to_string(),
        };
        assert!(err.status_code().is_retryable());
        assert_eq!(err.client_message(), "Broker unreachable");
    }

    #[test]
    fn test_rejected_tags_operation() {
        let err = BrokerError::Rejected {
            operation: "acquire tasks".to_string(),
            reason: "bad".to_string(),
        };
        assert!(!err.status_code().is_retryable());
        assert!(err
            .metrics_tags()
            .iter()
            .any(|(k, v)| *k == "operation" && v == "acquire tasks"));
    }
}
