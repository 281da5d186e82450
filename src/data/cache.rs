//! On-disk snapshots of fetched chains
//!
//! Snapshots are written in the chain file format, one file per symbol and
//! valuation date (`SPY_2025-01-02.json`), so a cached chain can be replayed
//! later with `load_chain_file`.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::file::{load_chain_file, to_chain_json};
use crate::core::{AnalyticsResult, QuoteSurface};

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    /// Snapshots older than this are refetched
    pub max_age_hours: i64,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/chains"),
            max_age_hours: 12,
            enabled: true,
        }
    }
}

/// Snapshot store keyed by symbol and valuation date
pub struct DataCache {
    config: CacheConfig,
}

impl DataCache {
    pub fn new(config: CacheConfig) -> AnalyticsResult<Self> {
        if config.enabled {
            fs::create_dir_all(&config.cache_dir)?;
        }
        Ok(Self { config })
    }

    fn snapshot_path(&self, symbol: &str, date: NaiveDate) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("{}_{}.json", symbol.to_ascii_uppercase(), date))
    }

    /// Cached valuation dates for a symbol, oldest first
    pub fn snapshots(&self, symbol: &str) -> AnalyticsResult<Vec<NaiveDate>> {
        let prefix = format!("{}_", symbol.to_ascii_uppercase());
        let mut dates: Vec<NaiveDate> = self
            .entries()?
            .into_iter()
            .filter_map(|name| {
                let rest = name.strip_prefix(&prefix)?;
                NaiveDate::parse_from_str(rest, "%Y-%m-%d").ok()
            })
            .collect();
        dates.sort();
        Ok(dates)
    }

    /// Write a snapshot under the surface's own valuation date
    pub fn save_surface(&self, surface: &QuoteSurface) -> AnalyticsResult<PathBuf> {
        let path = self.snapshot_path(&surface.underlying, surface.valuation_date);
        if !self.config.enabled {
            return Ok(path);
        }

        fs::write(&path, to_chain_json(surface)?)?;
        info!("Cached {} chain at {}", surface.underlying, path.display());
        Ok(path)
    }

    /// Latest snapshot for a symbol, `None` when missing or older than `max_age_hours`
    pub fn load_surface(&self, symbol: &str) -> AnalyticsResult<Option<QuoteSurface>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let Some(date) = self.snapshots(symbol)?.pop() else {
            return Ok(None);
        };

        let path = self.snapshot_path(symbol, date);
        let written: DateTime<Utc> = fs::metadata(&path)?.modified()?.into();
        if Utc::now() - written >= Duration::hours(self.config.max_age_hours) {
            debug!("Snapshot {} is stale", path.display());
            return Ok(None);
        }

        let surface = load_chain_file(&path)?;
        info!("Loaded {} chain from cache ({})", symbol, date);
        Ok(Some(surface))
    }

    /// Load a specific day's snapshot regardless of age
    pub fn load_snapshot(&self, symbol: &str, date: NaiveDate) -> AnalyticsResult<Option<QuoteSurface>> {
        let path = self.snapshot_path(symbol, date);
        if !path.exists() {
            return Ok(None);
        }
        load_chain_file(&path).map(Some)
    }

    /// Remove every snapshot for a symbol
    pub fn clear(&self, symbol: &str) -> AnalyticsResult<usize> {
        let dates = self.snapshots(symbol)?;
        for &date in &dates {
            fs::remove_file(self.snapshot_path(symbol, date))?;
        }
        Ok(dates.len())
    }

    /// Keep only the newest `keep` snapshots for a symbol
    pub fn prune(&self, symbol: &str, keep: usize) -> AnalyticsResult<usize> {
        let dates = self.snapshots(symbol)?;
        let excess = dates.len().saturating_sub(keep);
        for &date in &dates[..excess] {
            fs::remove_file(self.snapshot_path(symbol, date))?;
        }
        Ok(excess)
    }

    /// Symbols with at least one snapshot
    pub fn list_cached(&self) -> AnalyticsResult<Vec<String>> {
        let mut symbols: Vec<String> = self
            .entries()?
            .into_iter()
            .filter_map(|name| name.rsplit_once('_').map(|(symbol, _)| symbol.to_string()))
            .collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    /// File stems of `.json` files in the cache directory
    fn entries(&self) -> AnalyticsResult<Vec<String>> {
        if !self.config.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.cache_dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(".json") {
                names.push(stem.to_string());
            }
        }
        Ok(names)
    }
}

/// Yahoo fetcher backed by the snapshot store
pub struct CachedFetcher {
    cache: DataCache,
}

impl CachedFetcher {
    pub fn new(config: CacheConfig) -> AnalyticsResult<Self> {
        Ok(Self {
            cache: DataCache::new(config)?,
        })
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    /// Fresh snapshot if one exists, otherwise fetch and store
    pub fn get_surface(&self, symbol: &str) -> AnalyticsResult<QuoteSurface> {
        if let Some(surface) = self.cache.load_surface(symbol)? {
            return Ok(surface);
        }
        self.fetch_and_store(symbol)
    }

    /// Fetch regardless of cached state; today's snapshot is overwritten
    pub fn refresh_surface(&self, symbol: &str) -> AnalyticsResult<QuoteSurface> {
        self.fetch_and_store(symbol)
    }

    fn fetch_and_store(&self, symbol: &str) -> AnalyticsResult<QuoteSurface> {
        info!("Fetching option chain for {}", symbol);
        let surface = super::yahoo::fetch_option_surface(symbol)?;
        self.cache.save_surface(&surface)?;
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OptionContract, OptionQuote, OptionType, QuoteChain};
    use tempfile::tempdir;

    fn snapshot(date: NaiveDate) -> QuoteSurface {
        let expiry = date + Duration::days(30);
        let mut chain = QuoteChain::new("SPY", expiry);
        chain.add(OptionQuote::new(
            OptionContract::new("SPY", 500.0, expiry, OptionType::Call),
            Some(9.8),
            Some(10.2),
            None,
        ));
        let mut surface = QuoteSurface::new("SPY", 500.0, date);
        surface.add_chain(chain);
        surface
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn config(dir: PathBuf) -> CacheConfig {
        CacheConfig {
            cache_dir: dir,
            max_age_hours: 24,
            enabled: true,
        }
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let cache = DataCache::new(config(temp_dir.path().to_path_buf())).unwrap();

        let path = cache.save_surface(&snapshot(day(2))).unwrap();
        assert!(path.ends_with("SPY_2025-01-02.json"));

        // Snapshot files are plain chain files
        let replayed = load_chain_file(&path).unwrap();
        assert_eq!(replayed.total_quotes(), 1);

        let loaded = cache.load_surface("spy").unwrap().unwrap();
        assert_eq!(loaded.valuation_date, day(2));
        assert_eq!(cache.list_cached().unwrap(), vec!["SPY".to_string()]);
    }

    #[test]
    fn test_latest_snapshot_wins_and_prune() {
        let temp_dir = tempdir().unwrap();
        let cache = DataCache::new(config(temp_dir.path().to_path_buf())).unwrap();

        for d in [3, 2, 6] {
            cache.save_surface(&snapshot(day(d))).unwrap();
        }
        assert_eq!(cache.snapshots("SPY").unwrap(), vec![day(2), day(3), day(6)]);
        assert_eq!(cache.load_surface("SPY").unwrap().unwrap().valuation_date, day(6));
        assert!(cache.load_snapshot("SPY", day(3)).unwrap().is_some());

        assert_eq!(cache.prune("SPY", 1).unwrap(), 2);
        assert_eq!(cache.snapshots("SPY").unwrap(), vec![day(6)]);

        assert_eq!(cache.clear("SPY").unwrap(), 1);
        assert!(cache.load_surface("SPY").unwrap().is_none());
    }

    #[test]
    fn test_stale_snapshot_ignored() {
        let temp_dir = tempdir().unwrap();
        let mut cfg = config(temp_dir.path().to_path_buf());
        cfg.max_age_hours = 0;
        let cache = DataCache::new(cfg).unwrap();

        cache.save_surface(&snapshot(day(2))).unwrap();
        assert!(cache.load_surface("SPY").unwrap().is_none());
        assert!(cache.load_snapshot("SPY", day(2)).unwrap().is_some());
    }

    #[test]
    fn test_disabled_cache_is_noop() {
        let temp_dir = tempdir().unwrap();
        let mut cfg = config(temp_dir.path().join("never"));
        cfg.enabled = false;

        let cache = DataCache::new(cfg).unwrap();
        cache.save_surface(&snapshot(day(2))).unwrap();

        assert!(cache.load_surface("SPY").unwrap().is_none());
        assert!(!temp_dir.path().join("never").exists());
    }
}
