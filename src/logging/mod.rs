pub mod config;

pub use config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Инициализация логирования с конфигурацией.
///
/// Собирает `tracing_subscriber::registry()` с `EnvFilter` и одним
/// консольным fmt-слоем (обычным или JSON). Вызывается хостом один раз
/// на процесс; повторная инициализация вернёт ошибку установки
/// глобального подписчика.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let env_filter = EnvFilter::try_new(&config.level)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(config.ansi))
            .try_init()?;
    }
    Ok(())
}
