use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecorError {
    /// Неверная конфигурация (карта цветов и т.п.) - фатальная ошибка
    #[error("Ошибка конфигурации: {0}")]
    Config(String),

    #[error("Ошибка разбора: {0}")]
    Parse(String),

    #[error("Команда инвентаря не ответила за {0:?}")]
    InventoryTimeout(Duration),

    #[error("Команда инвентаря завершилась с ошибкой ({status}): {stderr}")]
    InventoryCommandFailed { status: String, stderr: String },

    /// Последнее обновление инвентаря упало, повтор ещё не положен
    #[error("Инвентарь недоступен: {0}")]
    InventoryUnavailable(String),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecorError {
    pub fn config<T>(msg: impl Into<String>) -> Result<T> {
        Err(DecorError::Config(msg.into()))
    }

    /// Ошибки, после которых кэш продолжает жить на старой таблице
    pub fn is_inventory(&self) -> bool {
        matches!(
            self,
            DecorError::InventoryTimeout(_)
                | DecorError::InventoryCommandFailed { .. }
                | DecorError::InventoryUnavailable(_)
                | DecorError::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DecorError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! decor_error {
    (config, $($arg:tt)*) => {
        $crate::error::DecorError::Config(format!($($arg)*))
    };
    (parse, $($arg:tt)*) => {
        $crate::error::DecorError::Parse(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_classification() {
        assert!(DecorError::InventoryTimeout(Duration::from_secs(1)).is_inventory());
        assert!(DecorError::InventoryCommandFailed {
            status: "exit status: 1".into(),
            stderr: String::new(),
        }
        .is_inventory());
        assert!(DecorError::InventoryUnavailable("таймаут".into()).is_inventory());
        assert!(decor_error!(parse, "строка {}", 3).is_inventory());
        assert!(!decor_error!(config, "пустая карта").is_inventory());
    }

    #[test]
    fn test_config_helper_returns_err() {
        let res: Result<()> = DecorError::config("плохо");
        assert!(matches!(res, Err(DecorError::Config(msg)) if msg == "плохо"));
    }
}
