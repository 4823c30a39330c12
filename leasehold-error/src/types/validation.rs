use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Нарушения конфигурации подписки, обнаруженные при сборке builder-а.
///
/// Всегда возвращаются синхронно, до любого обращения к брокеру.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Не указан тип задач
    MissingTaskType,
    /// Push-подписка без обработчика
    MissingTaskHandler,
    /// Время блокировки не приводится к положительному числу миллисекунд
    NonPositiveLockTime,
    /// Пустой владелец блокировки
    EmptyLockOwner,
    /// Нулевой размер выборки (ёмкость подписки)
    ZeroFetchSize,
}

impl ValidationError {
    /// Имя поля builder-а, к которому относится ошибка.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingTaskType => "taskType",
            Self::MissingTaskHandler => "taskHandler",
            Self::NonPositiveLockTime => "lockTime",
            Self::EmptyLockOwner => "lockOwner",
            Self::ZeroFetchSize => "taskFetchSize",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::MissingTaskType => write!(f, "taskType must not be null"),
            Self::MissingTaskHandler => write!(f, "taskHandler must not be null"),
            Self::NonPositiveLockTime => write!(f, "lockTime must be greater than 0"),
            Self::EmptyLockOwner => write!(f, "lockOwner must not be empty"),
            Self::ZeroFetchSize => write!(f, "taskFetchSize must be greater than 0"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ErrorExt for ValidationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingTaskType => StatusCode::MissingTaskType,
            Self::MissingTaskHandler => StatusCode::MissingTaskHandler,
            Self::NonPositiveLockTime => StatusCode::InvalidLockTime,
            Self::EmptyLockOwner => StatusCode::InvalidLockOwner,
            Self::ZeroFetchSize => StatusCode::InvalidFetchSize,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", "validation".to_string()),
            ("status_code", self.status_code().to_string()),
            ("field", self.field().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что каждое сообщение называет своё поле.
    #[test]
    fn test_messages_name_fields() {
        for err in [
            ValidationError::MissingTaskType,
            ValidationError::MissingTaskHandler,
            ValidationError::NonPositiveLockTime,
            ValidationError::EmptyLockOwner,
            ValidationError::ZeroFetchSize,
        ] {
            assert!(
                err.to_string().starts_with(err.field()),
                "message '{err}' must start with '{}'",
                err.field()
            );
            assert!(err.status_code().is_validation_error());
        }
    }
}
