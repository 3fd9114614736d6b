use crate::models::{LeaveEntry, NewLeaveEntry, Theme};
use crate::storage::Storage;
use crate::store::EntryStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Session state: the entry store and the theme preference.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub store: EntryStore,
    pub theme: Theme,
}

#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub ledger: Arc<Mutex<Ledger>>,
}

impl AppState {
    pub fn new(storage: Storage, ledger: Ledger) -> Self {
        Self {
            storage,
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Loads persisted entries and theme, defaulting whatever is absent.
    pub async fn init(storage: Storage) -> Self {
        let entries = storage.load_entries().await.unwrap_or_default();
        let theme = storage.load_theme().await.unwrap_or_default();
        info!(entries = entries.len(), theme = theme.as_str(), "loaded ledger");

        let ledger = Ledger {
            store: EntryStore::from_entries(entries),
            theme,
        };
        Self::new(storage, ledger)
    }

    pub async fn add_entry(&self, entry: NewLeaveEntry) -> LeaveEntry {
        let mut ledger = self.ledger.lock().await;
        let created = ledger.store.add(entry);
        debug!(id = %created.id, date = %created.date, "entry added");
        self.flush_entries(&ledger).await;
        created
    }

    pub async fn update_entry(&self, entry: LeaveEntry) {
        let mut ledger = self.ledger.lock().await;
        let id = entry.id.clone();
        if ledger.store.update(entry) {
            debug!(%id, "entry updated");
            self.flush_entries(&ledger).await;
        } else {
            debug!(%id, "update ignored, no such entry");
        }
    }

    pub async fn remove_entry(&self, id: &str) {
        let mut ledger = self.ledger.lock().await;
        if ledger.store.remove(id) {
            debug!(%id, "entry removed");
            self.flush_entries(&ledger).await;
        } else {
            debug!(%id, "remove ignored, no such entry");
        }
    }

    pub async fn set_theme(&self, theme: Theme) -> Theme {
        let mut ledger = self.ledger.lock().await;
        self.store_theme(&mut ledger, theme).await
    }

    /// Flips the theme under a single lock so concurrent toggles never collapse.
    pub async fn toggle_theme(&self) -> Theme {
        let mut ledger = self.ledger.lock().await;
        let theme = ledger.theme.toggled();
        self.store_theme(&mut ledger, theme).await
    }

    async fn store_theme(&self, ledger: &mut Ledger, theme: Theme) -> Theme {
        ledger.theme = theme;
        if let Err(err) = self.storage.save_theme(theme).await {
            error!("failed to persist theme: {}", err.message);
        }
        theme
    }

    // The in-memory ledger stays authoritative when a write fails.
    async fn flush_entries(&self, ledger: &Ledger) {
        if let Err(err) = self.storage.save_entries(ledger.store.all()).await {
            error!("failed to persist entries: {}", err.message);
        }
    }
}
