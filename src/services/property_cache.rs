//! Кэш свойств VM с ограниченным временем жизни.
//!
//! Таблица `имя VM -> метка` хранится как неизменяемый снимок за `Arc`;
//! обновление подменяет снимок целиком, поэтому читатель видит либо старую,
//! либо новую таблицу. Ошибка обновления оставляет прежний снимок.
//!
//! Обновление выполняется, если:
//! - оно принудительное;
//! - с последнего успешного обновления прошло `refresh_timeout`;
//! - запрошенной VM нет в таблице (возможно, её только что создали).
//!
//! Необязательные обновления не чаще одного раза за `miss_grace` (считая и
//! неудачные попытки) и не параллельно уже идущему обновлению: в этом случае
//! отдаётся текущая таблица. Если последняя попытка упала, отсутствующая VM
//! получает ошибку, а не метку по умолчанию, пока не пройдёт успешное обновление.

use super::inventory::{InventoryClient, PropertyTable};
use crate::config::InventoryConfig;
use crate::debug_if_enabled;
use crate::error::{DecorError, Result};
use crate::events::{HookContext, HookHandler};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Пауза между фоновыми попытками, пока кэш устарел
const MIN_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub property: String,
    pub fetch_timeout: Duration,
    pub refresh_timeout: Duration,
    pub miss_grace: Duration,
}

impl From<&InventoryConfig> for CacheSettings {
    fn from(config: &InventoryConfig) -> Self {
        Self {
            property: config.property.clone(),
            fetch_timeout: config.fetch_timeout(),
            refresh_timeout: config.refresh_timeout(),
            miss_grace: config.miss_grace(),
        }
    }
}

/// Неизменяемый снимок таблицы
#[derive(Debug, Default)]
pub struct CacheSnapshot {
    table: PropertyTable,
    last_refresh: Option<Instant>,
}

pub struct PropertyCache {
    client: Arc<dyn InventoryClient>,
    settings: CacheSettings,
    snapshot: RwLock<Arc<CacheSnapshot>>,
    last_attempt: Mutex<Option<Instant>>,
    /// Ошибка последней попытки обновления; `None` после успешной
    last_failure: Mutex<Option<String>>,
    refresh_gate: AsyncMutex<()>,
}

impl PropertyCache {
    /// Пустой устаревший кэш без обращения к инвентарю
    pub fn new(client: Arc<dyn InventoryClient>, settings: CacheSettings) -> Self {
        Self {
            client,
            settings,
            snapshot: RwLock::new(Arc::new(CacheSnapshot::default())),
            last_attempt: Mutex::new(None),
            last_failure: Mutex::new(None),
            refresh_gate: AsyncMutex::new(()),
        }
    }

    /// Кэш с принудительным начальным обновлением.
    /// При ошибке кэш остаётся пустым и будет обновлён при первом запросе.
    pub async fn connect(client: Arc<dyn InventoryClient>, settings: CacheSettings) -> Self {
        let cache = Self::new(client, settings);
        if let Err(e) = cache.update(true, None).await {
            warn!("Начальное обновление кэша VM не удалось: {}", e);
        }
        cache
    }

    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.snapshot.read().clone()
    }

    /// Значение из текущей таблицы без обновления
    pub fn lookup(&self, vm: &str) -> Option<String> {
        self.snapshot.read().table.get(vm).cloned()
    }

    pub fn last_refresh(&self) -> Option<Instant> {
        self.snapshot.read().last_refresh
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// FRESH, пока с успешного обновления не прошло `refresh_timeout`
    pub fn is_fresh(&self) -> bool {
        match self.last_refresh() {
            Some(at) => at.elapsed() < self.settings.refresh_timeout,
            None => false,
        }
    }

    fn within_grace(&self) -> bool {
        match *self.last_attempt.lock() {
            Some(at) => at.elapsed() < self.settings.miss_grace,
            None => false,
        }
    }

    fn needs_refresh(&self, try_vm: Option<&str>) -> bool {
        if self.within_grace() {
            return false;
        }
        if !self.is_fresh() {
            return true;
        }
        match try_vm {
            Some(vm) => !self.snapshot.read().table.contains_key(vm),
            None => false,
        }
    }

    /// Обновить таблицу при необходимости. Возвращает `true`, если таблица была заменена.
    pub async fn update(&self, force: bool, try_vm: Option<&str>) -> Result<bool> {
        if !force && !self.needs_refresh(try_vm) {
            return Ok(false);
        }

        let _gate = if force {
            self.refresh_gate.lock().await
        } else {
            match self.refresh_gate.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    debug_if_enabled!("Обновление кэша уже идёт - отдаём текущую таблицу");
                    return Ok(false);
                }
            }
        };

        // Пока ждали, таблицу мог обновить кто-то другой
        if !force && !self.needs_refresh(try_vm) {
            return Ok(false);
        }

        self.refresh().await?;
        Ok(true)
    }

    async fn refresh(&self) -> Result<()> {
        *self.last_attempt.lock() = Some(Instant::now());

        match self
            .client
            .fetch_all(&self.settings.property, self.settings.fetch_timeout)
            .await
        {
            Ok(table) => {
                let count = table.len();
                let snapshot = Arc::new(CacheSnapshot {
                    table,
                    last_refresh: Some(Instant::now()),
                });
                *self.snapshot.write() = snapshot;
                *self.last_failure.lock() = None;
                info!("Кэш VM обновлён: записей {}", count);
                Ok(())
            }
            Err(e) => {
                *self.last_failure.lock() = Some(e.to_string());
                if e.is_inventory() {
                    warn!("Не удалось обновить кэш VM, остаёмся на прежней таблице: {}", e);
                } else {
                    error!("Не удалось обновить кэш VM: {}", e);
                }
                Err(e)
            }
        }
    }

    /// Метка VM.
    ///
    /// - VM есть в таблице -> её метка (при неудачном обновлении - из прежней таблицы);
    /// - VM нет, последнее обновление прошло -> `default`;
    /// - VM нет и последнее обновление упало (в том числе пропущенное из-за
    ///   `miss_grace` или идущего обновления) -> ошибка.
    pub async fn get(&self, vm: &str, default: &str) -> Result<String> {
        let refreshed = self.update(false, Some(vm)).await;

        if let Some(label) = self.lookup(vm) {
            if let Err(e) = &refreshed {
                debug_if_enabled!("Для '{}' отдаём устаревшую метку '{}' ({})", vm, label, e);
            }
            return Ok(label);
        }

        refreshed?;
        match self.last_failure.lock().clone() {
            Some(reason) => Err(DecorError::InventoryUnavailable(reason)),
            None => Ok(default.to_string()),
        }
    }

    /// Когда фоновому обновлению просыпаться в следующий раз
    fn next_background_refresh(&self) -> Instant {
        let retry = Instant::now() + self.settings.miss_grace.max(MIN_RETRY_DELAY);
        match self.last_refresh() {
            Some(at) if self.is_fresh() => at + self.settings.refresh_timeout,
            _ => retry,
        }
    }

    /// Фоновое обновление, чтобы запросы не ждали `qvm-ls`.
    /// Срок считается от последнего успешного обновления, кто бы его ни сделал.
    pub fn spawn_refresher(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep_until(cache.next_background_refresh()).await;
                if let Err(e) = cache.update(false, None).await {
                    debug!("Фоновое обновление кэша VM не удалось: {}", e);
                }
            }
        })
    }
}

/// Принудительное обновление кэша при старте оконного менеджера
pub struct ForceRefreshOnStartup {
    cache: Arc<PropertyCache>,
}

impl ForceRefreshOnStartup {
    pub fn new(cache: Arc<PropertyCache>) -> Self {
        Self { cache }
    }
}

#[async_trait::async_trait]
impl HookHandler for ForceRefreshOnStartup {
    fn name(&self) -> &str {
        "force-refresh-on-startup"
    }

    async fn handle(&self, _ctx: &HookContext) -> Result<()> {
        self.cache.update(true, None).await.map(|_| ())
    }
}
