use crate::models::Kline;
use crate::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Build the canonical day-file name: `{SYMBOL}_{INTERVAL}_{DATE}.json`
///
/// Dates are ISO (`YYYY-MM-DD`), so sorting by filename sorts
/// chronologically for a given symbol and interval.
pub fn day_filename(symbol: &str, interval: &str, date: NaiveDate) -> String {
    format!("{}_{}_{}.json", symbol, interval, date)
}

/// Flat-file store for daily kline batches
///
/// One pretty-printed JSON file per trading day, all in a single
/// directory. No database, no index; the filename is the key.
pub struct KlineStore {
    data_dir: PathBuf,
}

impl KlineStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write one day of candles, creating the data directory if needed
    ///
    /// # Returns
    /// Path of the file written
    pub async fn save_day(
        &self,
        symbol: &str,
        interval: &str,
        date: NaiveDate,
        klines: &[Kline],
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.data_dir).await?;

        let path = self.data_dir.join(day_filename(symbol, interval, date));
        let json = serde_json::to_string_pretty(klines)?;
        fs::write(&path, json).await?;

        tracing::info!("Saved {} candles to {}", klines.len(), path.display());

        Ok(path)
    }

    /// List day files for one symbol and interval, sorted by filename
    pub async fn list_days(&self, symbol: &str, interval: &str) -> Result<Vec<PathBuf>> {
        self.list_filtered(Some(&format!("{}_{}_", symbol, interval)))
            .await
    }

    /// List every day file in the store, sorted by filename
    pub async fn list_all(&self) -> Result<Vec<PathBuf>> {
        self.list_filtered(None).await
    }

    async fn list_filtered(&self, prefix: Option<&str>) -> Result<Vec<PathBuf>> {
        // A store that was never written to is just empty
        let mut entries = match fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(format!("Failed to read {}: {}", self.data_dir.display(), e).into())
            }
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };

            if !name.ends_with(".json") {
                continue;
            }
            if let Some(prefix) = prefix {
                if !name.starts_with(prefix) {
                    continue;
                }
            }

            files.push(path);
        }

        files.sort();
        Ok(files)
    }

    /// Load one day file
    pub async fn load_day(&self, path: &Path) -> Result<Vec<Kline>> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

        let klines: Vec<Kline> = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

        Ok(klines)
    }

    /// Load every day file for one symbol and interval, in chronological
    /// (filename) order
    pub async fn load_days(&self, symbol: &str, interval: &str) -> Result<Vec<Vec<Kline>>> {
        let mut days = Vec::new();
        for path in self.list_days(symbol, interval).await? {
            days.push(self.load_day(&path).await?);
        }

        tracing::info!(
            "Loaded {} {} day files from {}",
            days.len(),
            symbol,
            self.data_dir.display()
        );

        Ok(days)
    }
}
