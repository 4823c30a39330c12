use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use super::LoggingError;

/// Формат вывода событий.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

/// Настройки вывода в консоль.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
    /// Формат консоли; если не задан, берётся общий `format`
    pub format: Option<LogFormat>,
}

/// Настройки файлового sink-а (ежедневная ротация).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FileConfig {
    pub enabled: bool,
    pub filename: String,
    /// Файлы всегда пишутся JSON-ом, если не задано иное
    pub format: Option<LogFormat>,
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Базовый уровень (`trace`..`error`)
    pub level: String,
    pub format: LogFormat,
    pub log_dir: PathBuf,
    /// Дополнительные директивы вида `target=level`
    pub directives: Vec<String>,
    pub console: ConsoleConfig,
    pub file: FileConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
            format: None,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filename: "leasehold.log".to_string(),
            format: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            log_dir: PathBuf::from("logs"),
            directives: Vec::new(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

impl LoggingConfig {
    /// Применяет `LEASEHOLD_LOG_LEVEL`, `LEASEHOLD_LOG_FORMAT` и
    /// `LEASEHOLD_LOG_DIR`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("LEASEHOLD_LOG_LEVEL") {
            self.level = level.to_ascii_lowercase();
        }
        if let Ok(format) = env::var("LEASEHOLD_LOG_FORMAT") {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => eprintln!("Ignoring LEASEHOLD_LOG_FORMAT: {e}"),
            }
        }
        if let Ok(dir) = env::var("LEASEHOLD_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
            self.file.enabled = true;
        }
    }

    pub fn validate(&self) -> Result<(), LoggingError> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        if self.file.enabled && self.file.filename.trim().is_empty() {
            return Err(LoggingError::EmptyFilename);
        }
        Ok(())
    }

    /// Создаёт каталог логов, если включён файловый sink.
    pub fn ensure_log_dir(&self) -> Result<(), LoggingError> {
        if !self.file.enabled {
            return Ok(());
        }
        fs::create_dir_all(&self.log_dir).map_err(|source| LoggingError::LogDir {
            path: self.log_dir.clone(),
            source,
        })
    }

    /// Директива для `EnvFilter`: уровень, затем дополнительные директивы.
    pub fn build_filter_directive(&self) -> String {
        std::iter::once(self.level.clone())
            .chain(self.directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn console_format(&self) -> LogFormat {
        self.console.format.unwrap_or(self.format)
    }

    pub fn file_format(&self) -> LogFormat {
        self.file.format.unwrap_or(LogFormat::Json)
    }

    pub fn file_path(&self) -> PathBuf {
        Path::new(&self.log_dir).join(&self.file.filename)
    }
}
