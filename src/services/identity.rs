//! Определение VM, которой принадлежит окно.
//!
//! Две стратегии: имя VM берётся из префикса WM_CLASS (`work:xterm` -> `work`)
//! либо из свойств окна `_QUBES_VMNAME` / `_QUBES_LABEL`, если оконный
//! менеджер их прочитал. `None` означает dom0.

use crate::events::WindowInfo;
use once_cell::sync::Lazy;
use regex::Regex;

/// Псевдоимя для окон без VM
pub const DOM0: &str = "dom0";

static VM_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9_.-]*):.*$").expect("VM class regex is valid")
});

/// Извлечь имя VM из первой части WM_CLASS
pub fn extract_identity(class_name: &str) -> Option<&str> {
    VM_CLASS_RE
        .captures(class_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Имя VM окна: `_QUBES_VMNAME` важнее префикса класса
pub fn window_identity(window: &WindowInfo) -> Option<&str> {
    match window.vm_name.as_deref() {
        Some(name) if !name.is_empty() => Some(name),
        _ => extract_identity(&window.class),
    }
}

/// Метка по индексу `_QUBES_LABEL`
pub fn label_from_index(index: u32) -> Option<&'static str> {
    match index {
        1 => Some("red"),
        2 => Some("orange"),
        3 => Some("yellow"),
        4 => Some("green"),
        5 => Some("gray"),
        6 => Some("blue"),
        7 => Some("purple"),
        8 => Some("black"),
        _ => None,
    }
}
