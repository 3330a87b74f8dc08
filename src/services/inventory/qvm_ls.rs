use super::{parse_inventory, InventoryClient, MalformedPolicy, PropertyTable};
use crate::config::InventoryConfig;
use crate::decor_error;
use crate::error::{DecorError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Клиент поверх `qvm-ls --raw-data --fields name,<property>`
pub struct QvmLsClient {
    program: String,
    extra_args: Vec<String>,
    policy: MalformedPolicy,
}

impl QvmLsClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            policy: MalformedPolicy::default(),
        }
    }

    pub fn from_config(config: &InventoryConfig) -> Self {
        Self::new(config.program.clone())
            .with_extra_args(config.extra_args.clone())
            .with_policy(config.malformed_lines)
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn with_policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn create_command(&self, property: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.extra_args)
            .args(["--raw-data", "--fields"])
            .arg(format!("name,{}", property))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Процесс убивается, если таймаут отменил ожидание
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl InventoryClient for QvmLsClient {
    async fn fetch_all(&self, property: &str, timeout: Duration) -> Result<PropertyTable> {
        debug!("Запрос инвентаря: {} (свойство '{}', таймаут {:?})", self.program, property, timeout);

        let mut cmd = self.create_command(property);
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                debug!("{} не запустился: {}", self.program, e);
                DecorError::InventoryCommandFailed {
                    status: "не запущена".to_string(),
                    stderr: e.to_string(),
                }
            })?,
            Err(_) => return Err(DecorError::InventoryTimeout(timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!("{} вернул ошибку: {}", self.program, stderr);
            return Err(DecorError::InventoryCommandFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| decor_error!(parse, "вывод {} не в UTF-8: {}", self.program, e))?;

        let table = parse_inventory(&stdout, self.policy)?;
        debug!("{} вернул записей: {}", self.program, table.len());
        Ok(table)
    }
}
