use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "nba_sgp";
const CACHE_FILE: &str = "http_cache.json";

/// Entries untouched for this long are dropped when the file is saved.
const MAX_ENTRY_AGE: Duration = Duration::from_secs(7 * 24 * 3600);

static CACHE: Mutex<Option<HttpCacheFile>> = Mutex::new(None);
static SAVE_LOCK: Mutex<()> = Mutex::new(());
static CACHE_DIR_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HttpCacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

impl CacheEntry {
    fn is_fresh(&self, max_age: Duration, now: u64) -> bool {
        now.saturating_sub(self.fetched_at) < max_age.as_secs()
    }
}

/// GETs `url`, serving the cached body while it is younger than `max_age` and
/// revalidating with ETag / Last-Modified once it goes stale. `validate` runs on every
/// body before it is stored or served, so upstream error payloads never get cached.
pub fn fetch_json_cached(
    client: &Client,
    url: &str,
    extra_headers: &[(&str, &str)],
    max_age: Duration,
    validate: &dyn Fn(&str) -> Result<(), ApiError>,
) -> Result<String, ApiError> {
    let now = system_time_to_secs(SystemTime::now()).unwrap_or_default();
    let mut cached_entry = {
        let mut guard = CACHE.lock().expect("http cache lock poisoned");
        let cache = guard.get_or_insert_with(load_cache_file);
        cache.entries.get(url).cloned()
    };

    if let Some(entry) = cached_entry.as_ref()
        && validate(&entry.body).is_err()
    {
        warn!(url, "evicting cached error body");
        evict_cache_entry(url);
        cached_entry = None;
    }

    if let Some(entry) = cached_entry.as_ref()
        && entry.is_fresh(max_age, now)
    {
        debug!(url, "http cache hit");
        return Ok(entry.body.clone());
    }

    let mut req = client.get(url);
    for (name, value) in extra_headers {
        req = req.header(*name, *value);
    }
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send()?;
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED
        && let Some(mut entry) = cached_entry
    {
        debug!(url, "http cache revalidated");
        entry.fetched_at = now;
        refresh_cache_entry(url, entry.clone(), now);
        return Ok(entry.body);
    }

    let body = resp.text()?;
    if !status.is_success() {
        return Err(ApiError::Status { status, body });
    }
    validate(&body)?;

    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let last_modified = headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let entry = CacheEntry {
        body: body.clone(),
        etag,
        last_modified,
        fetched_at: now,
    };
    refresh_cache_entry(url, entry, now);
    Ok(body)
}

/// Points the response cache at `dir` instead of the user cache directory. Only the
/// first call has any effect and it must happen before the first fetch.
pub fn use_cache_dir(dir: PathBuf) -> bool {
    CACHE_DIR_OVERRIDE.set(dir).is_ok()
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn refresh_cache_entry(key: &str, entry: CacheEntry, now: u64) {
    let snapshot = {
        let mut guard = CACHE.lock().expect("http cache lock poisoned");
        let cache = guard.get_or_insert_with(load_cache_file);
        cache.version = CACHE_VERSION;
        cache.entries.insert(key.to_string(), entry);
        prune_stale(cache, now);
        serde_json::to_string(cache)
    };
    let result = snapshot
        .context("serialize http cache")
        .and_then(|json| save_cache_json(&json));
    if let Err(err) = result {
        warn!("http cache not saved: {err:#}");
    }
}

fn evict_cache_entry(key: &str) {
    let mut guard = CACHE.lock().expect("http cache lock poisoned");
    if let Some(cache) = guard.as_mut() {
        cache.entries.remove(key);
    }
}

fn prune_stale(cache: &mut HttpCacheFile, now: u64) {
    cache
        .entries
        .retain(|_, entry| entry.is_fresh(MAX_ENTRY_AGE, now));
}

fn load_cache_file() -> HttpCacheFile {
    let Some(path) = cache_path() else {
        return HttpCacheFile::default();
    };
    let Ok(raw) = fs::read_to_string(path) else {
        return HttpCacheFile::default();
    };
    let cache = serde_json::from_str::<HttpCacheFile>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return HttpCacheFile::default();
    }
    cache
}

fn save_cache_json(json: &str) -> Result<()> {
    let Some(path) = cache_path() else {
        return Ok(());
    };
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    let _save = SAVE_LOCK.lock().expect("http cache save lock poisoned");
    fs::create_dir_all(dir).ok();
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, &path).context("swap http cache")?;
    Ok(())
}

fn cache_path() -> Option<PathBuf> {
    if let Some(dir) = CACHE_DIR_OVERRIDE.get() {
        return Some(dir.join(CACHE_FILE));
    }
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(fetched_at: u64) -> CacheEntry {
        CacheEntry {
            body: "{}".to_string(),
            etag: None,
            last_modified: None,
            fetched_at,
        }
    }

    #[test]
    fn freshness_follows_max_age() {
        let ten_minutes = Duration::from_secs(600);
        assert!(entry(1_000).is_fresh(ten_minutes, 1_599));
        assert!(!entry(1_000).is_fresh(ten_minutes, 1_600));
        // Clock going backwards keeps the entry usable.
        assert!(entry(2_000).is_fresh(ten_minutes, 1_000));
        assert!(!entry(1_000).is_fresh(Duration::ZERO, 1_000));
    }

    #[test]
    fn save_drops_entries_past_the_longest_ttl() {
        let week = MAX_ENTRY_AGE.as_secs();
        let now = 10 * week;
        let mut cache = HttpCacheFile {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        };
        cache.entries.insert("old-season".to_string(), entry(now - week - 1));
        cache.entries.insert("edge".to_string(), entry(now - week));
        cache.entries.insert("recent".to_string(), entry(now - 60));

        prune_stale(&mut cache, now);

        let mut kept: Vec<_> = cache.entries.keys().cloned().collect();
        kept.sort();
        assert_eq!(kept, vec!["recent".to_string()]);
    }
}
