//! Рамки и подписи окон по метке VM для тайлового оконного менеджера в Qubes OS.
//!
//! Цепочка: имя VM из класса окна -> метка из кэша `qvm-ls` -> цвет рамки и
//! префикс заголовка. Оконный менеджер вызывает [`Resolver`] из своих хуков.

pub mod config;
pub mod error;
pub mod events;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{DecorError, Result};
pub use services::{extract_identity, format_task_title, DisplayAttributes, PropertyCache, Resolver};
