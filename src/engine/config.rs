use std::time::Duration;

/// Размер выборки по умолчанию (ёмкость подписки без явного
/// `task_fetch_size`).
pub const DEFAULT_TASK_FETCH_SIZE: u32 = 5;
/// Владелец блокировки по умолчанию.
pub const DEFAULT_LOCK_OWNER: &str = "default";

/// Параметры движка захвата задач.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub default_task_fetch_size: u32,
    pub default_lock_owner: String,
    /// Пауза фонового цикла после цикла без новых задач
    pub acquisition_interval: Duration,
    /// Ёмкость broadcast-канала событий
    pub event_buffer: usize,
    /// Таймаут одного RPC к брокеру (`None`: без таймаута)
    pub rpc_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_task_fetch_size: DEFAULT_TASK_FETCH_SIZE,
            default_lock_owner: DEFAULT_LOCK_OWNER.to_string(),
            acquisition_interval: Duration::from_millis(100),
            event_buffer: 256,
            rpc_timeout: None,
        }
    }
}
