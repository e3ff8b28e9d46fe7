use serde::{Deserialize, Serialize};

use config::{Config, ConfigError, Environment};

/// Настройки встраивающего приложения, относящиеся к этому ядру.
///
/// Само ядро конфигурации не требует; здесь живут параметры ambient
/// стека (логирование), которые хост передаёт в `init_logging`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Значение для фильтра логирования, например `"info"` или
    /// `"pulse=debug"`.
    pub log_level: String,
    /// Вывод логов в JSON вместо человекочитаемого формата.
    pub log_json: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            // Значения по умолчанию
            .set_default("log_level", "info")?
            .set_default("log_json", false)?
            // Переменные окружения с префиксом PULSE_
            .add_source(Environment::with_prefix("PULSE"))
            .build()?;

        // Десериализуем конфигурацию в нашу структуру
        cfg.try_deserialize()
    }
}
