use serde::{Deserialize, Serialize};

use crate::Settings;

/// Конфигурация логирования ядра.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Директива фильтра в синтаксисе `EnvFilter`, например `"info"`
    /// или `"pulse=debug,warn"`.
    pub level: String,
    /// JSON-формат вместо человекочитаемого.
    pub json: bool,
    /// ANSI-цвета в человекочитаемом формате.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Конфигурация из загруженных [`Settings`] хоста.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            level: settings.log_level.clone(),
            json: settings.log_json,
            ..Self::default()
        }
    }

    /// Проверяет, что директива фильтра парсится.
    pub fn validate(&self) -> Result<(), String> {
        tracing_subscriber::EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| format!("invalid log filter directive {:?}: {e}", self.level))
    }
}
