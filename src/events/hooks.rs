//! Реестр хуков жизненного цикла.
//!
//! Оконный менеджер сообщает о событиях (старт, новое окно, смена фокуса,
//! отрисовка), а реестр вызывает все подписанные обработчики. Сами сервисы
//! о хуках ничего не знают - обработчики лишь вызывают их.

use crate::error::Result;
use crate::events::window::{WindowEvent, WindowEventType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Первый запуск процесса (не повторяется при перезагрузке конфигурации)
    StartupOnce,
    Startup,
    ClientManaged,
    FocusChanged,
    Draw,
}

impl From<WindowEventType> for LifecycleEvent {
    fn from(event_type: WindowEventType) -> Self {
        match event_type {
            WindowEventType::ClientManaged => LifecycleEvent::ClientManaged,
            WindowEventType::FocusChanged => LifecycleEvent::FocusChanged,
            WindowEventType::Draw => LifecycleEvent::Draw,
        }
    }
}

/// Контекст, передаваемый обработчику
#[derive(Debug, Clone)]
pub struct HookContext {
    pub event: LifecycleEvent,
    pub window: Option<WindowEvent>,
}

impl HookContext {
    pub fn lifecycle(event: LifecycleEvent) -> Self {
        Self { event, window: None }
    }

    pub fn window(event: WindowEvent) -> Self {
        Self {
            event: event.event_type.into(),
            window: Some(event),
        }
    }
}

#[async_trait::async_trait]
pub trait HookHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, ctx: &HookContext) -> Result<()>;
}

/// Итог вызова `fire`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookReport {
    pub ran: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct HookRegistry {
    handlers: HashMap<LifecycleEvent, Vec<Arc<dyn HookHandler>>>,
    startup_once_fired: AtomicBool,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, event: LifecycleEvent, handler: Arc<dyn HookHandler>) {
        debug!("Подписка обработчика '{}' на {:?}", handler.name(), event);
        self.handlers.entry(event).or_default().push(handler);
    }

    pub fn handler_count(&self, event: LifecycleEvent) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    /// Вызвать все обработчики события. Ошибка одного обработчика не мешает остальным.
    pub async fn fire(&self, ctx: &HookContext) -> HookReport {
        if ctx.event == LifecycleEvent::StartupOnce
            && self.startup_once_fired.swap(true, Ordering::SeqCst)
        {
            debug!("StartupOnce уже был вызван - пропускаем");
            return HookReport::default();
        }

        let mut report = HookReport::default();
        let Some(handlers) = self.handlers.get(&ctx.event) else {
            return report;
        };

        for handler in handlers {
            report.ran += 1;
            if let Err(e) = handler.handle(ctx).await {
                report.failed += 1;
                warn!("Обработчик '{}' для {:?} завершился ошибкой: {}", handler.name(), ctx.event, e);
            }
        }

        if report.failed == 0 {
            crate::trace_if_enabled!("{:?}: отработало обработчиков: {}", ctx.event, report.ran);
        }
        report
    }
}

/// Журналирует появление окон и смену фокуса
pub struct LogWindowEvents;

#[async_trait::async_trait]
impl HookHandler for LogWindowEvents {
    fn name(&self) -> &str {
        "log-window-events"
    }

    async fn handle(&self, ctx: &HookContext) -> Result<()> {
        if let Some(event) = &ctx.window {
            info!("{}", event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecorError;
    use crate::events::WindowInfo;
    use std::sync::atomic::AtomicUsize;

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Counting {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait::async_trait]
    impl HookHandler for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn handle(&self, _ctx: &HookContext) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DecorError::Parse("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_fire_runs_all_handlers_despite_failures() {
        let failing = Counting::new(true);
        let ok = Counting::new(false);
        let mut registry = HookRegistry::new();
        registry.subscribe(LifecycleEvent::Startup, failing.clone());
        registry.subscribe(LifecycleEvent::Startup, ok.clone());

        let report = registry.fire(&HookContext::lifecycle(LifecycleEvent::Startup)).await;

        assert_eq!(report, HookReport { ran: 2, failed: 1 });
        assert_eq!(ok.calls.load(Ordering::SeqCst), 1);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_startup_once_fires_once() {
        let handler = Counting::new(false);
        let mut registry = HookRegistry::new();
        registry.subscribe(LifecycleEvent::StartupOnce, handler.clone());

        let ctx = HookContext::lifecycle(LifecycleEvent::StartupOnce);
        registry.fire(&ctx).await;
        let second = registry.fire(&ctx).await;

        assert_eq!(second.ran, 0);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_window_event_routes_to_matching_hook() {
        let focus = Counting::new(false);
        let draw = Counting::new(false);
        let mut registry = HookRegistry::new();
        registry.subscribe(LifecycleEvent::FocusChanged, focus.clone());
        registry.subscribe(LifecycleEvent::Draw, draw.clone());
        registry.subscribe(LifecycleEvent::FocusChanged, Arc::new(LogWindowEvents));

        let event = WindowEvent::focus_changed(WindowInfo::new("Terminal".into()));
        let report = registry.fire(&HookContext::window(event)).await;

        assert_eq!(report.ran, 2);
        assert_eq!(focus.calls.load(Ordering::SeqCst), 1);
        assert_eq!(draw.calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.handler_count(LifecycleEvent::ClientManaged), 0);
    }
}
