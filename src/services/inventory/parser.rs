use super::PropertyTable;
use crate::decor_error;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Разделитель полей в `qvm-ls --raw-data`
pub const FIELD_DELIMITER: char = '|';

/// Что делать со строкой, которая не делится ровно на 2 поля
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Пропустить строку с предупреждением
    #[default]
    Skip,
    /// Отклонить всё обновление
    Abort,
}

/// Разобрать вывод `name|value` построчно
pub fn parse_inventory(output: &str, policy: MalformedPolicy) -> Result<PropertyTable> {
    let mut table = PropertyTable::new();
    let mut skipped = 0usize;

    for (lineno, raw) in output.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        match fields.as_slice() {
            [name, value] if !name.is_empty() => {
                table.insert(name.to_string(), value.to_string());
            }
            _ => match policy {
                MalformedPolicy::Skip => {
                    skipped += 1;
                    warn!("Пропущена некорректная строка инвентаря #{}: {:?}", lineno + 1, line);
                }
                MalformedPolicy::Abort => {
                    return Err(decor_error!(
                        parse,
                        "некорректная строка инвентаря #{}: {:?}",
                        lineno + 1,
                        line
                    ));
                }
            },
        }
    }

    if skipped > 0 {
        warn!("Строк инвентаря пропущено: {}, принято: {}", skipped, table.len());
    }

    Ok(table)
}
