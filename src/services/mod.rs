pub mod color_map;
pub mod identity;
pub mod inventory;
pub mod property_cache;
pub mod query_server;
pub mod resolver;

pub use color_map::{ColorEntry, ColorMap};
pub use identity::{extract_identity, label_from_index, window_identity, DOM0};
pub use inventory::{create_inventory_client, InventoryClient, PropertyTable};
pub use property_cache::{CacheSettings, ForceRefreshOnStartup, PropertyCache};
pub use query_server::QueryServer;
pub use resolver::{format_task_title, DisplayAttributes, Resolver};
