use crate::core::loader::{load_catalog, LoadOptions};
use crate::domain::model::Catalog;
use crate::utils::error::{FinderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

/// How a cached catalog is kept in step with its source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Re-stat the source on every access and reload when the fingerprint changed.
    ///
    /// The fingerprint is modification time plus byte length. A rewrite that keeps
    /// the same length within the filesystem's mtime granularity is not detected;
    /// call `refresh()` after such an edit.
    #[default]
    Revalidate,
    /// Serve the cached catalog until `refresh()` is called.
    Manual,
}

impl std::str::FromStr for CachePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "revalidate" => Ok(CachePolicy::Revalidate),
            "manual" => Ok(CachePolicy::Manual),
            other => Err(format!(
                "unknown cache policy '{}', expected 'revalidate' or 'manual'",
                other
            )),
        }
    }
}

/// 檔案識別：修改時間 + 大小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

impl Fingerprint {
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FinderError::SourceNotFound {
                path: path.display().to_string(),
            },
            _ => FinderError::MalformedSource {
                path: path.display().to_string(),
                message: e.to_string(),
            },
        })?;
        Ok(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

#[derive(Debug)]
struct CachedCatalog {
    fingerprint: Fingerprint,
    catalog: Arc<Catalog>,
}

/// Memoized catalog handle keyed by source path and fingerprint.
///
/// The slot is replaced as a whole `Arc`, so readers see either the old or the
/// new catalog. Concurrent reloads are last-writer-wins; each produces the same
/// value for the same file contents.
#[derive(Debug)]
pub struct CatalogCache {
    source: PathBuf,
    options: LoadOptions,
    policy: CachePolicy,
    slot: RwLock<Option<CachedCatalog>>,
}

impl CatalogCache {
    pub fn new(source: impl Into<PathBuf>, options: LoadOptions, policy: CachePolicy) -> Self {
        Self {
            source: source.into(),
            options,
            policy,
            slot: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn get(&self) -> Result<Arc<Catalog>> {
        match self.policy {
            CachePolicy::Manual => {
                if let Some(catalog) = self.cached(None) {
                    return Ok(catalog);
                }
            }
            CachePolicy::Revalidate => {
                let fingerprint = match Fingerprint::of(&self.source) {
                    Ok(fingerprint) => fingerprint,
                    Err(e) => {
                        self.invalidate();
                        return Err(e);
                    }
                };
                if let Some(catalog) = self.cached(Some(fingerprint)) {
                    return Ok(catalog);
                }
                tracing::debug!("Catalog source changed or not cached, reloading");
            }
        }
        self.refresh()
    }

    /// 強制重新讀取；失敗時清空快取，不保留舊資料
    pub fn refresh(&self) -> Result<Arc<Catalog>> {
        let loaded = Fingerprint::of(&self.source).and_then(|fingerprint| {
            load_catalog(&self.source, &self.options).map(|catalog| (fingerprint, catalog))
        });

        match loaded {
            Ok((fingerprint, catalog)) => {
                let catalog = Arc::new(catalog);
                let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
                *slot = Some(CachedCatalog {
                    fingerprint,
                    catalog: Arc::clone(&catalog),
                });
                tracing::info!("🔄 Catalog cache populated from {}", self.source.display());
                Ok(catalog)
            }
            Err(e) => {
                tracing::warn!("Catalog reload failed, cache cleared: {}", e);
                self.invalidate();
                Err(e)
            }
        }
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    pub fn is_cached(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn cached(&self, expected: Option<Fingerprint>) -> Option<Arc<Catalog>> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        let entry = slot.as_ref()?;
        match expected {
            Some(fingerprint) if fingerprint != entry.fingerprint => None,
            _ => Some(Arc::clone(&entry.catalog)),
        }
    }
}
