use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling::daily};
use tracing_subscriber::{layer::Layer as LayerTrait, registry::LookupSpan};

use crate::logging::{config::LoggingConfig, formatter};

/// File layer с ежедневной ротацией. `WorkerGuard` нужно держать, пока
/// пишутся логи: при drop буфер сбрасывается на диск.
pub fn layer<S>(config: &LoggingConfig) -> (Box<dyn LayerTrait<S> + Send + Sync>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let file_appender = daily(&config.log_dir, &config.file.filename);
    let (writer, guard) = non_blocking(file_appender);

    let layer = formatter::build_formatter(config.file_format(), writer, false, &config.console);
    (layer, guard)
}
