use crate::decor_error;
use crate::error::{DecorError, Result};
use crate::utils::is_hex_color;
use std::collections::HashMap;

/// Пара цветов рамки для одной метки
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorEntry {
    pub unfocused: String,
    pub focused: String,
}

impl ColorEntry {
    pub fn pick(&self, focused: bool) -> &str {
        if focused {
            &self.focused
        } else {
            &self.unfocused
        }
    }
}

/// Проверенная карта `метка -> [без фокуса, в фокусе]`
#[derive(Debug, Clone)]
pub struct ColorMap {
    entries: HashMap<String, ColorEntry>,
}

impl ColorMap {
    /// Построить карту, проверив каждую запись сразу
    pub fn new(raw: &HashMap<String, Vec<String>>) -> Result<Self> {
        if raw.is_empty() {
            return DecorError::config("карта цветов не задана или пуста");
        }

        let mut entries = HashMap::with_capacity(raw.len());
        for (label, colors) in raw {
            let [unfocused, focused] = colors.as_slice() else {
                return Err(decor_error!(
                    config,
                    "метка '{}': ожидается ровно 2 цвета (без фокуса/в фокусе), получено {}",
                    label,
                    colors.len()
                ));
            };

            for color in [unfocused, focused] {
                if !is_hex_color(color) {
                    return Err(decor_error!(config, "метка '{}': '{}' не является hex-цветом", label, color));
                }
            }

            entries.insert(
                label.clone(),
                ColorEntry {
                    unfocused: unfocused.clone(),
                    focused: focused.clone(),
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn get(&self, label: &str) -> Option<&ColorEntry> {
        self.entries.get(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BorderConfig;

    fn raw(label: &str, colors: &[&str]) -> HashMap<String, Vec<String>> {
        let mut map = HashMap::new();
        map.insert(label.to_string(), colors.iter().map(|c| c.to_string()).collect());
        map
    }

    #[test]
    fn test_default_colors_are_valid() {
        let map = ColorMap::new(&BorderConfig::default().colors).unwrap();
        for label in ["red", "orange", "yellow", "green", "gray", "blue", "purple", "black"] {
            assert!(map.get(label).is_some(), "{label}");
        }
        assert_eq!(map.get("black").unwrap().pick(true), "#606060");
    }

    #[test]
    fn test_pick_by_focus() {
        let map = ColorMap::new(&raw("green", &["#006700", "#00E300"])).unwrap();
        let entry = map.get("green").unwrap();
        assert_eq!(entry.pick(false), "#006700");
        assert_eq!(entry.pick(true), "#00E300");
        assert!(map.get("red").is_none());
    }

    #[test]
    fn test_single_color_entry_rejected() {
        let err = ColorMap::new(&raw("green", &["#006700"])).unwrap_err();
        assert!(matches!(err, DecorError::Config(msg) if msg.contains("green")));
    }

    #[test]
    fn test_three_color_entry_rejected() {
        let err = ColorMap::new(&raw("red", &["#100", "#200", "#300"])).unwrap_err();
        assert!(matches!(err, DecorError::Config(_)));
    }

    #[test]
    fn test_empty_map_rejected() {
        assert!(matches!(ColorMap::new(&HashMap::new()), Err(DecorError::Config(_))));
    }

    #[test]
    fn test_non_hex_color_rejected() {
        let err = ColorMap::new(&raw("green", &["green", "#00E300"])).unwrap_err();
        assert!(matches!(err, DecorError::Config(_)));
    }
}
