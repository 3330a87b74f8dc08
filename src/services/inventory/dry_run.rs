use super::{InventoryClient, PropertyTable};
use crate::error::Result;
use std::time::Duration;
use tracing::info;

/// Инвентарь для режима сухого запуска: фиксированный набор VM без вызова `qvm-ls`
pub struct DryRunInventory {
    table: PropertyTable,
}

impl Default for DryRunInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunInventory {
    pub fn new() -> Self {
        let table = [
            ("dom0", "black"),
            ("sys-net", "red"),
            ("sys-firewall", "green"),
            ("untrusted", "red"),
            ("personal", "yellow"),
            ("work", "blue"),
            ("vault", "black"),
            ("chat", "purple"),
        ]
        .iter()
        .map(|(name, label)| (name.to_string(), label.to_string()))
        .collect();

        Self { table }
    }
}

#[async_trait::async_trait]
impl InventoryClient for DryRunInventory {
    async fn fetch_all(&self, property: &str, _timeout: Duration) -> Result<PropertyTable> {
        info!("[DRY RUN] Эмулируем инвентарь VM (свойство '{}', записей: {})", property, self.table.len());
        Ok(self.table.clone())
    }
}
