use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::services::inventory::MalformedPolicy;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub inventory: InventoryConfig,
    pub border: BorderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

/// Параметры вызова `qvm-ls` и политики обновления кэша
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub program: String,
    /// Аргументы, которые ставятся перед `--raw-data --fields ...`
    pub extra_args: Vec<String>,
    /// Запрашиваемое свойство VM (второй столбец)
    pub property: String,
    pub fetch_timeout_secs: u64,
    pub refresh_timeout_secs: u64,
    pub miss_grace_secs: u64,
    pub malformed_lines: MalformedPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BorderConfig {
    /// Метка -> [цвет без фокуса, цвет в фокусе]
    pub colors: HashMap<String, Vec<String>>,
    pub fallback: String,
    /// Метка для окон dom0
    pub dom0: String,
    /// Метка для VM, которых нет в инвентаре
    pub unknown_vm_label: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            program: "qvm-ls".to_string(),
            extra_args: Vec::new(),
            property: "label".to_string(),
            fetch_timeout_secs: 10,
            refresh_timeout_secs: 600,
            miss_grace_secs: 2,
            malformed_lines: MalformedPolicy::Skip,
        }
    }
}

impl Default for BorderConfig {
    fn default() -> Self {
        // Чёрная рамка не может быть полностью чёрной - её не видно
        let colors = [
            ("red", "#780000", "#CC0000"),
            ("orange", "#AD6D00", "#F57900"),
            ("yellow", "#B19900", "#FFE200"),
            ("green", "#006700", "#00E300"),
            ("gray", "#909090", "#CCCCCC"),
            ("blue", "#00007E", "#0000EA"),
            ("purple", "#9949A3", "#D700E9"),
            ("black", "#303030", "#606060"),
        ]
        .iter()
        .map(|(label, unfocused, focused)| {
            (label.to_string(), vec![unfocused.to_string(), focused.to_string()])
        })
        .collect();

        Self {
            colors,
            fallback: "#FFFFFF".to_string(),
            dom0: "black".to_string(),
            unknown_vm_label: "black".to_string(),
        }
    }
}

impl InventoryConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    pub fn miss_grace(&self) -> Duration {
        Duration::from_secs(self.miss_grace_secs)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("QUBES_DECOR_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        let inventory = &self.inventory;
        if inventory.program.trim().is_empty() {
            anyhow::bail!("inventory.program не может быть пустым");
        }
        if inventory.property.trim().is_empty() {
            anyhow::bail!("inventory.property не может быть пустым");
        }
        if inventory.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs должно быть больше 0");
        }
        if inventory.refresh_timeout_secs == 0 {
            anyhow::bail!("refresh_timeout_secs должно быть больше 0");
        }
        // Иначе окно ожидания глушит плановое обновление устаревшего кэша
        if inventory.miss_grace_secs >= inventory.refresh_timeout_secs {
            anyhow::bail!(
                "miss_grace_secs ({}) должно быть меньше refresh_timeout_secs ({})",
                inventory.miss_grace_secs,
                inventory.refresh_timeout_secs
            );
        }

        // Форма карты цветов проверяется при построении Resolver
        if self.border.dom0.is_empty() {
            anyhow::bail!("border.dom0 не может быть пустым");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.inventory.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.inventory.refresh_timeout(), Duration::from_secs(600));
        assert_eq!(config.inventory.property, "label");
        assert_eq!(config.border.fallback, "#FFFFFF");
        assert_eq!(config.border.colors.len(), 8);
        assert_eq!(
            config.border.colors["green"],
            vec!["#006700".to_string(), "#00E300".to_string()]
        );
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_grace_must_be_shorter_than_refresh_timeout() {
        let mut config = Config::default();
        config.inventory.refresh_timeout_secs = 5;
        config.inventory.miss_grace_secs = 5;
        assert!(config.validate().is_err());

        config.inventory.miss_grace_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = Config::default();
        config.inventory.fetch_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r##"
            [inventory]
            property = "netvm"
            malformed_lines = "abort"

            [border]
            fallback = "#123456"

            [border.colors]
            green = ["#000001", "#000002"]
        "##;

        let config: Config = Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .unwrap();

        assert_eq!(config.inventory.property, "netvm");
        assert_eq!(config.inventory.program, "qvm-ls");
        assert_eq!(config.inventory.malformed_lines, MalformedPolicy::Abort);
        assert_eq!(config.border.fallback, "#123456");
        assert_eq!(config.border.dom0, "black");
        // Таблица из файла заменяет встроенную целиком
        assert_eq!(config.border.colors.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/qubes-decor.toml").unwrap();
        assert_eq!(config.inventory.refresh_timeout_secs, 600);
    }
}
