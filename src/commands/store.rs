use crate::error::StoreError;
use crate::models::shot::ShotEvent;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Read-only access to per-season shot files.
#[async_trait]
pub trait ShotRecordStore: Send + Sync {
    async fn read_season_shots(&self, year: i32) -> Result<Vec<ShotEvent>, StoreError>;

    /// Years with backing data, ascending.
    async fn list_available_years(&self) -> Result<Vec<i32>, StoreError>;
}

/// Store backed by `<data_dir>/shots_<year>.json` files.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    min_year: i32,
    max_year: i32,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>, min_year: i32, max_year: i32) -> Self {
        Self {
            data_dir: data_dir.into(),
            min_year,
            max_year,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn season_path(&self, year: i32) -> PathBuf {
        self.data_dir.join(format!("shots_{year}.json"))
    }
}

/// Parse `shots_<year>.json` into its year.
pub fn parse_season_file_name(name: &str) -> Option<i32> {
    name.strip_prefix("shots_")?
        .strip_suffix(".json")?
        .parse::<i32>()
        .ok()
}

#[async_trait]
impl ShotRecordStore for JsonFileStore {
    async fn read_season_shots(&self, year: i32) -> Result<Vec<ShotEvent>, StoreError> {
        let path = self.season_path(year);
        let path_str = path.to_string_lossy().to_string();

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { year });
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path_str,
                    source,
                })
            }
        };

        serde_json::from_str::<Vec<ShotEvent>>(&raw).map_err(|e| StoreError::Malformed {
            path: path_str,
            reason: e.to_string(),
        })
    }

    async fn list_available_years(&self) -> Result<Vec<i32>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.data_dir.to_string_lossy().to_string(),
                    source,
                })
            }
        };

        let mut years = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| StoreError::Io {
            path: self.data_dir.to_string_lossy().to_string(),
            source,
        })? {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(year) = parse_season_file_name(&name) {
                if (self.min_year..=self.max_year).contains(&year) {
                    years.push(year);
                }
            }
        }

        years.sort_unstable();
        years.dedup();
        Ok(years)
    }
}
