pub mod commands;
pub mod helpers;
pub mod query;
pub mod reminders;
pub mod stats;
pub mod storage;
pub mod store;
pub mod types;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use store::TaskStore;

/// Task store shared between the command layer and the reminder scheduler.
pub struct SharedStore(RwLock<TaskStore>);

impl SharedStore {
    pub fn new(store: TaskStore) -> Self {
        Self(RwLock::new(store))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, TaskStore> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TaskStore> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}
