//! Клиент инвентаря VM.
//!
//! Модуль только получает полную таблицу `VM -> свойство` (через `qvm-ls` или
//! эмуляцию в сухом режиме) и разбирает её. Когда обновлять и что делать с
//! устаревшими данными, решает `PropertyCache`.

mod dry_run;
mod parser;
mod qvm_ls;
mod r#trait;

#[cfg(test)]
pub(crate) mod fake;

pub use self::dry_run::DryRunInventory;
pub use self::parser::{parse_inventory, MalformedPolicy};
pub use self::qvm_ls::QvmLsClient;
pub use self::r#trait::{create_inventory_client, InventoryClient, PropertyTable};
