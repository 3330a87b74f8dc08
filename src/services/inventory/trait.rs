use crate::config::InventoryConfig;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Имя VM -> значение свойства
pub type PropertyTable = HashMap<String, String>;

/// Источник полной таблицы свойств VM
#[async_trait::async_trait]
pub trait InventoryClient: Send + Sync {
    /// Получить таблицу целиком. Должен уложиться в `timeout`,
    /// иначе вернуть `DecorError::InventoryTimeout`.
    async fn fetch_all(&self, property: &str, timeout: Duration) -> Result<PropertyTable>;
}

/// Factory function to create an appropriate inventory client based on the dry_run flag
pub fn create_inventory_client(
    config: &InventoryConfig,
    dry_run: bool,
) -> Arc<dyn InventoryClient> {
    if dry_run {
        Arc::new(super::dry_run::DryRunInventory::new())
    } else {
        Arc::new(super::qvm_ls::QvmLsClient::from_config(config))
    }
}
