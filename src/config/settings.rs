use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::engine::{EngineConfig, DEFAULT_LOCK_OWNER, DEFAULT_TASK_FETCH_SIZE};

/// Префикс переменных окружения.
pub const ENV_PREFIX: &str = "LEASEHOLD";

/// Настройки клиента, собранные из значений по умолчанию и окружения.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub default_task_fetch_size: u32,
    pub acquisition_interval_ms: u64,
    pub event_buffer: usize,
    pub default_lock_owner: String,
    /// Таймаут RPC к брокеру, без значения таймаута нет
    #[serde(default)]
    pub rpc_timeout_ms: Option<u64>,
}

impl Settings {
    /// Загружает настройки: сначала значения по умолчанию, затем
    /// переменные `LEASEHOLD_*` (например `LEASEHOLD_DEFAULT_TASK_FETCH_SIZE`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_prefix(ENV_PREFIX)
    }

    pub fn load_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            // Значения по умолчанию
            .set_default("default_task_fetch_size", DEFAULT_TASK_FETCH_SIZE)?
            .set_default("acquisition_interval_ms", 100)?
            .set_default("event_buffer", 256)?
            .set_default("default_lock_owner", DEFAULT_LOCK_OWNER)?
            // Переменные окружения с префиксом
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?;

        cfg.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_task_fetch_size: DEFAULT_TASK_FETCH_SIZE,
            acquisition_interval_ms: 100,
            event_buffer: 256,
            default_lock_owner: DEFAULT_LOCK_OWNER.to_string(),
            rpc_timeout_ms: None,
        }
    }
}

impl From<&Settings> for EngineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            default_task_fetch_size: settings.default_task_fetch_size,
            default_lock_owner: settings.default_lock_owner.clone(),
            acquisition_interval: Duration::from_millis(settings.acquisition_interval_ms),
            event_buffer: settings.event_buffer,
            rpc_timeout: settings.rpc_timeout_ms.map(Duration::from_millis),
        }
    }
}
