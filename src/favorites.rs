//! Persisted set of favorite coin ids
//!
//! Storage is the source of truth: every query re-reads and re-parses the
//! stored JSON array, so changes made through another store instance (or by
//! hand) are always visible. Unreadable or malformed content reads as an empty
//! set.

use crate::constants::FAVORITES_STORAGE_KEY;
use crate::error::StorageError;
use crate::storage::KeyValueStorage;
use std::sync::{Arc, Mutex, Weak};
use uuid::Uuid;

type Observer = Arc<dyn Fn(&[String]) + Send + Sync>;

struct Registry {
    observers: Mutex<Vec<(Uuid, Observer)>>,
}

impl Registry {
    fn snapshot(&self) -> Vec<Observer> {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect()
    }

    fn remove(&self, id: Uuid) {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(observer_id, _)| *observer_id != id);
    }
}

/// Handle for a registered observer
///
/// The observer stays registered until the handle is dropped or
/// [`Subscription::unsubscribe`] is called.
#[must_use = "dropping a Subscription unregisters the observer"]
pub struct Subscription {
    id: Uuid,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

/// User-curated set of coin ids with change notification
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStorage>,
    registry: Arc<Registry>,
}

impl FavoritesStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            registry: Arc::new(Registry {
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    fn load(&self) -> Vec<String> {
        let raw = match self.storage.get_item(FAVORITES_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read favorites, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => {
                let mut unique: Vec<String> = Vec::with_capacity(ids.len());
                for id in ids {
                    if !unique.contains(&id) {
                        unique.push(id);
                    }
                }
                unique
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed favorites in storage, treating as empty");
                Vec::new()
            }
        }
    }

    fn save(&self, ids: &[String]) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(ids)?;
        self.storage.set_item(FAVORITES_STORAGE_KEY, &encoded)
    }

    /// Current favorites in stored order
    pub fn get_all(&self) -> Vec<String> {
        self.load()
    }

    /// Whether `id` is currently a favorite
    pub fn is_fav(&self, id: &str) -> bool {
        self.load().iter().any(|fav| fav == id)
    }

    /// Adds `id` if absent, removes it if present
    ///
    /// The resulting set is persisted and then delivered to every observer
    /// before this returns. If the write fails nothing is published.
    pub fn toggle(&self, id: &str) -> Result<Vec<String>, StorageError> {
        let mut ids = self.load();
        let removed = match ids.iter().position(|fav| fav == id) {
            Some(index) => {
                ids.remove(index);
                true
            }
            None => {
                ids.push(id.to_string());
                false
            }
        };

        self.save(&ids)?;
        tracing::info!(
            coin = id,
            favorite = !removed,
            total = ids.len(),
            "Favorites updated"
        );

        self.publish(&ids);
        Ok(ids)
    }

    /// Registers `observer`, which immediately receives the current set and
    /// then every update
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&[String]) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        let observer: Observer = Arc::new(observer);
        self.registry
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, observer.clone()));

        observer(&self.load());

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.registry
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn publish(&self, ids: &[String]) {
        // Observers may call back into the store, so no lock is held here
        for observer in self.registry.snapshot() {
            observer(ids);
        }
    }
}
