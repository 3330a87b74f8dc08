//! Построчный протокол для оконного менеджера.
//!
//! Процесс живёт всё время сессии, поэтому кэш VM переживает отдельные запросы.
//! Каждая строка stdin - JSON-запрос, каждая строка stdout - ответ:
//!
//! ```json
//! {"event": "focus_changed", "class": "work:xterm", "title": "Terminal", "focused": true}
//! {"vm": "work", "border_color": "#0000EA", "title_prefix": "[work]", "task_title": "[work] Terminal"}
//! ```
//!
//! Некорректный запрос даёт `{"error": "..."}`, цикл продолжается.

use super::resolver::{DisplayAttributes, Resolver};
use crate::error::Result;
use crate::events::{HookContext, HookRegistry, WindowEvent, WindowEventType, WindowInfo};
use crate::trace_if_enabled;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct WindowQuery {
    #[serde(default)]
    pub event: WindowEventType,
    #[serde(flatten)]
    pub window: WindowInfo,
    #[serde(default)]
    pub focused: bool,
}

#[derive(Debug, Serialize)]
struct ErrorReply {
    error: String,
}

pub struct QueryServer {
    resolver: Arc<Resolver>,
    hooks: Arc<HookRegistry>,
}

impl QueryServer {
    pub fn new(resolver: Arc<Resolver>, hooks: Arc<HookRegistry>) -> Self {
        Self { resolver, hooks }
    }

    async fn answer(&self, line: &str) -> Result<DisplayAttributes> {
        let query: WindowQuery = serde_json::from_str(line)?;

        let event = WindowEvent::new(query.window.clone(), query.event, query.focused);
        self.hooks.fire(&HookContext::window(event)).await;

        Ok(self.resolver.resolve(Some(&query.window), query.focused).await)
    }

    /// Ответ на одну строку запроса (без перевода строки)
    pub async fn handle_line(&self, line: &str) -> String {
        let reply = match self.answer(line).await {
            Ok(attrs) => serde_json::to_string(&attrs),
            Err(e) => {
                warn!("Некорректный запрос {:?}: {}", line, e);
                serde_json::to_string(&ErrorReply { error: e.to_string() })
            }
        };

        // Сериализация плоских строковых структур не падает
        reply.unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }

    /// Обслуживать запросы до конца входного потока. Возвращает число ответов.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Ожидаем запросы оконного менеджера");
        let mut lines = reader.lines();
        let mut answered = 0usize;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let reply = self.handle_line(&line).await;
            trace_if_enabled!("{} -> {}", line, reply);

            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            answered += 1;
        }

        info!("Входной поток закрыт, обработано запросов: {}", answered);
        Ok(answered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BorderConfig;
    use crate::events::{LifecycleEvent, LogWindowEvents};
    use crate::services::inventory::fake::FakeInventory;
    use crate::services::property_cache::{CacheSettings, PropertyCache};
    use std::time::Duration;

    async fn server(entries: &[(&str, &str)]) -> QueryServer {
        let fake = FakeInventory::new(entries);
        let settings = CacheSettings {
            property: "label".to_string(),
            fetch_timeout: Duration::from_secs(10),
            refresh_timeout: Duration::from_secs(600),
            miss_grace: Duration::ZERO,
        };
        let cache = Arc::new(PropertyCache::connect(fake, settings).await);
        let resolver = Arc::new(Resolver::new(cache, &BorderConfig::default()).unwrap());

        let mut hooks = HookRegistry::new();
        hooks.subscribe(LifecycleEvent::FocusChanged, Arc::new(LogWindowEvents));
        QueryServer::new(resolver, Arc::new(hooks))
    }

    #[tokio::test]
    async fn test_handle_line_resolves_window() {
        let server = server(&[("work", "blue")]).await;
        let reply = server
            .handle_line(r#"{"event":"focus_changed","class":"work:xterm","title":"Terminal","focused":true}"#)
            .await;

        let attrs: DisplayAttributes = serde_json::from_str(&reply).unwrap();
        assert_eq!(attrs.vm, "work");
        assert_eq!(attrs.border_color, "#0000EA");
        assert_eq!(attrs.task_title, "[work] Terminal");
    }

    #[tokio::test]
    async fn test_minimal_query_defaults_to_unfocused_draw() {
        let server = server(&[]).await;
        let reply = server.handle_line(r#"{"title":"Terminal"}"#).await;

        let attrs: DisplayAttributes = serde_json::from_str(&reply).unwrap();
        assert_eq!(attrs.vm, "dom0");
        assert_eq!(attrs.border_color, "#303030");
    }

    #[tokio::test]
    async fn test_run_answers_each_line_and_survives_garbage() {
        let server = server(&[("vault", "black")]).await;
        let input = concat!(
            "{\"class\":\"vault:keepassxc\",\"title\":\"KeePassXC\"}\n",
            "\n",
            "not json\n",
            "{\"class\":\"xterm\",\"title\":\"Terminal\",\"focused\":true}\n",
        );
        let mut output = Vec::new();

        let answered = server.run(input.as_bytes(), &mut output).await.unwrap();
        assert_eq!(answered, 3);

        let text = String::from_utf8(output).unwrap();
        let replies: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(replies[0]["task_title"], "[vault] KeePassXC");
        assert!(replies[1]["error"].is_string());
        assert_eq!(replies[2]["border_color"], "#606060");
    }
}
