use crate::errors::AppError;
use crate::models::{LeaveEntry, Theme};
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::error;

const ENTRIES_FILE: &str = "entries.json";
const THEME_FILE: &str = "theme.json";

/// JSON files in a data directory: the entry list and the theme preference.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries_path(&self) -> PathBuf {
        self.dir.join(ENTRIES_FILE)
    }

    pub fn theme_path(&self) -> PathBuf {
        self.dir.join(THEME_FILE)
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub async fn load_entries(&self) -> Option<Vec<LeaveEntry>> {
        load_json(&self.entries_path()).await
    }

    pub async fn save_entries(&self, entries: &[LeaveEntry]) -> Result<(), AppError> {
        persist_json(&self.entries_path(), entries).await
    }

    pub async fn load_theme(&self) -> Option<Theme> {
        load_json(&self.theme_path()).await
    }

    pub async fn save_theme(&self, theme: Theme) -> Result<(), AppError> {
        persist_json(&self.theme_path(), &theme).await
    }
}

async fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => Some(data),
            Err(err) => {
                error!("failed to parse {}: {err}", path.display());
                None
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            error!("failed to read {}: {err}", path.display());
            None
        }
    }
}

async fn persist_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
