use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок клиента задач (object-safe).
///
/// Даёт единый доступ к статус-коду, безопасному сообщению для
/// пользовательского кода и тегам для сигналов наблюдаемости движка.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки. По умолчанию [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`], чтобы выполнить downcast.
    fn as_any(&self) -> &dyn Any;

    /// Сообщение без деталей реализации.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Internal | StatusCode::Unexpected => {
                "Internal client error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Теги для событий движка и счётчиков.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Короткое имя типа ошибки.
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown")
            .to_string()
    }
}
