use serde::{Deserialize, Serialize};
use std::fmt;

/// Информация об окне, которую передаёт оконный менеджер
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowInfo {
    pub title: String,
    /// Первая часть WM_CLASS; у окон из VM начинается с `<vm>:`
    pub class: String,
    /// Свойство `_QUBES_VMNAME`, если оконный менеджер его прочитал
    pub vm_name: Option<String>,
    /// Свойство `_QUBES_LABEL` (1..=8)
    pub label_index: Option<u32>,
}

impl WindowInfo {
    pub fn new(title: String) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: String) -> Self {
        self.class = class;
        self
    }

    pub fn with_vm_name(mut self, vm_name: String) -> Self {
        self.vm_name = Some(vm_name);
        self
    }

    pub fn with_label_index(mut self, index: u32) -> Self {
        self.label_index = Some(index);
        self
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class.is_empty() {
            write!(f, "\"{}\"", self.title)
        } else {
            write!(f, "\"{}\" ({})", self.title, self.class)
        }
    }
}

/// Событие окна, пришедшее от оконного менеджера
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEvent {
    pub window: WindowInfo,
    pub focused: bool,
    pub timestamp: std::time::Instant,
    pub event_type: WindowEventType,
}

impl WindowEvent {
    pub fn new(window: WindowInfo, event_type: WindowEventType, focused: bool) -> Self {
        Self {
            window,
            focused,
            timestamp: std::time::Instant::now(),
            event_type,
        }
    }

    pub fn focus_changed(window: WindowInfo) -> Self {
        Self::new(window, WindowEventType::FocusChanged, true)
    }
}

impl fmt::Display for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {} (focused: {}, {}ms ago)",
            self.event_type,
            self.window,
            self.focused,
            self.timestamp.elapsed().as_millis()
        )
    }
}

/// Тип события окна
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowEventType {
    ClientManaged,
    FocusChanged,
    #[default]
    Draw,
}
