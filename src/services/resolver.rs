use super::color_map::ColorMap;
use super::identity::{label_from_index, window_identity, DOM0};
use super::property_cache::PropertyCache;
use crate::config::BorderConfig;
use crate::debug_if_enabled;
use crate::decor_error;
use crate::error::Result;
use crate::events::WindowInfo;
use crate::utils::is_hex_color;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Что рисовать для окна
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAttributes {
    pub vm: String,
    pub border_color: String,
    /// `[vm]`
    pub title_prefix: String,
    /// `[vm] <заголовок окна>` для списка задач
    pub task_title: String,
}

/// Подпись для списка задач: `[vm] title`, для dom0 - `[dom0] title`
pub fn format_task_title(identity: Option<&str>, base_title: &str) -> String {
    format!("[{}] {}", identity.unwrap_or(DOM0), base_title)
}

pub struct Resolver {
    cache: Arc<PropertyCache>,
    colors: ColorMap,
    fallback: String,
    dom0_label: String,
    unknown_vm_label: String,
}

impl Resolver {
    /// Проверяет карту цветов и резервный цвет; ошибка здесь фатальна
    pub fn new(cache: Arc<PropertyCache>, config: &BorderConfig) -> Result<Self> {
        let colors = ColorMap::new(&config.colors)?;

        if !is_hex_color(&config.fallback) {
            return Err(decor_error!(config, "резервный цвет '{}' не является hex-цветом", config.fallback));
        }

        info!(
            "Resolver готов: меток {}, резервный цвет {}, метка dom0 '{}'",
            config.colors.len(),
            config.fallback,
            config.dom0
        );

        Ok(Self {
            cache,
            colors,
            fallback: config.fallback.clone(),
            dom0_label: config.dom0.clone(),
            unknown_vm_label: config.unknown_vm_label.clone(),
        })
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Метка окна: dom0 без обращения к кэшу, иначе из кэша
    pub async fn resolve_label(&self, identity: Option<&str>) -> Result<String> {
        match identity {
            None => Ok(self.dom0_label.clone()),
            Some(vm) => self.cache.get(vm, &self.unknown_vm_label).await,
        }
    }

    pub fn color_for_label(&self, label: &str, focused: bool) -> String {
        match self.colors.get(label) {
            Some(entry) => entry.pick(focused).to_string(),
            None => {
                debug_if_enabled!("Метки '{}' нет в карте цветов - резервный цвет", label);
                self.fallback.clone()
            }
        }
    }

    /// Цвет рамки. Никогда не падает: любая ошибка кэша даёт резервный цвет.
    pub async fn resolve_border(&self, identity: Option<&str>, focused: bool) -> String {
        match self.resolve_label(identity).await {
            Ok(label) => self.color_for_label(&label, focused),
            Err(e) => {
                debug!("Метку для {:?} получить не удалось: {} - резервный цвет", identity, e);
                self.fallback.clone()
            }
        }
    }

    /// Полный набор атрибутов окна.
    /// Индекс `_QUBES_LABEL` определяет метку напрямую, без кэша.
    pub async fn resolve(&self, window: Option<&WindowInfo>, focused: bool) -> DisplayAttributes {
        let Some(window) = window else {
            return DisplayAttributes {
                vm: DOM0.to_string(),
                border_color: self.fallback.clone(),
                title_prefix: format!("[{}]", DOM0),
                task_title: format_task_title(None, ""),
            };
        };

        let identity = window_identity(window);
        let direct_label = window.label_index.and_then(label_from_index);

        let border_color = match direct_label {
            Some(label) => self.color_for_label(label, focused),
            None => self.resolve_border(identity, focused).await,
        };

        let vm = identity.unwrap_or(DOM0);
        DisplayAttributes {
            vm: vm.to_string(),
            border_color,
            title_prefix: format!("[{}]", vm),
            task_title: format_task_title(identity, &window.title),
        }
    }
}
