//! Подменный инвентарь для тестов: управляемая таблица, сбои, задержка и счётчик вызовов.

use super::{InventoryClient, PropertyTable};
use crate::error::{DecorError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct FakeInventory {
    table: Mutex<PropertyTable>,
    fail: AtomicBool,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

impl FakeInventory {
    pub fn new(entries: &[(&str, &str)]) -> Arc<Self> {
        let fake = Arc::new(Self {
            table: Mutex::new(PropertyTable::new()),
            fail: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
        });
        fake.set_table(entries);
        fake
    }

    pub fn set_table(&self, entries: &[(&str, &str)]) {
        *self.table.lock() = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InventoryClient for FakeInventory {
    async fn fetch_all(&self, _property: &str, timeout: Duration) -> Result<PropertyTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(DecorError::InventoryTimeout(timeout));
        }
        Ok(self.table.lock().clone())
    }
}
