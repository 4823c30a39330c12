use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок клиента задач.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки валидации конфигурации подписки
/// - 3xxx: Жизненный цикл подписки
/// - 4xxx: Отчёты по задачам и аренды (lease)
/// - 5xxx: Брокер / транспорт
/// - 6xxx: Кодек payload
///
/// # Реализация:
/// - `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`.
/// - опционально: `strum` для `AsRefStr`/`EnumIter` (feature = "strum").
/// - опционально: `serde_repr` для сериализации в виде числового значения
///   (feature = "serde_repr").
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Unexpected = 1001,
    Internal = 1002,
    InvalidArgs = 1003,

    // === 2xxx: Валидация ===
    MissingTaskType = 2000,
    MissingTaskHandler = 2001,
    InvalidLockTime = 2002,
    InvalidLockOwner = 2003,
    InvalidFetchSize = 2004,

    // === 3xxx: Подписки ===
    SubscriptionOpenFailed = 3000,
    SubscriptionNotOpen = 3001,
    SubscriptionNotFound = 3002,

    // === 4xxx: Задачи и аренды ===
    TaskReportFailed = 4000,
    StaleCompletion = 4001,
    TaskAlreadyResolved = 4002,
    TaskNotFound = 4003,
    CreditOverflow = 4004,

    // === 5xxx: Брокер/транспорт ===
    BrokerUnreachable = 5000,
    BrokerRejected = 5001,
    Timeout = 5002,

    // === 6xxx: Кодек ===
    EncodingError = 6000,
    DecodingError = 6001,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Возвращает `true`, если операцию имеет смысл повторить на следующем
    /// цикле.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BrokerUnreachable | Self::Timeout)
    }

    /// Вернёт `true`, если переданный `code` означает успешный результат.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Ошибка конфигурации, обнаруженная до любого RPC (диапазон 2xxx).
    pub fn is_validation_error(&self) -> bool {
        (2000..=2999).contains(&self.code())
    }

    /// Логическая ошибка клиента, указывающая на нарушение инварианта.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Internal | Self::CreditOverflow)
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::TaskNotFound | Self::SubscriptionNotFound => LogLevel::Debug,
            Self::MissingTaskType
            | Self::MissingTaskHandler
            | Self::InvalidLockTime
            | Self::InvalidLockOwner
            | Self::InvalidFetchSize
            | Self::InvalidArgs => LogLevel::Info,
            Self::BrokerUnreachable | Self::Timeout | Self::StaleCompletion => LogLevel::Warn,
            Self::Internal | Self::CreditOverflow => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
