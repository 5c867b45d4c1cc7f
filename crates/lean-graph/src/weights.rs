//! External weight providers and the usage cache.
//!
//! Measuring a module's footprint and counting how often one module refers
//! to another are done by collaborators outside this crate. They plug in
//! through [`SizeProvider`] and [`UsageProvider`].
//!
//! Usage counting can take seconds per edge, so lookups go through a
//! [`UsageCache`] that memoizes by `(from, to)` for as long as the cache
//! lives. Every graph built by one [`Ingestor`](crate::Ingestor), and every
//! copy of those graphs, shares the same cache.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{Size, Usages};

/// Reports the on-disk footprint of a module.
pub trait SizeProvider: Send + Sync {
    /// Size of the module labelled `label`.
    ///
    /// A module that cannot be located is [`Size::Unknown`], not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if measuring failed outright.
    fn module_size(&self, label: &str) -> Result<Size>;
}

/// Counts how often one module refers to another.
pub trait UsageProvider: Send + Sync {
    /// How many times `from` refers to symbols of `to`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if the analysis failed.
    fn usages(&self, from: &str, to: &str) -> Result<Usages>;
}

/// Size provider that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownSizes;

impl SizeProvider for UnknownSizes {
    fn module_size(&self, _label: &str) -> Result<Size> {
        Ok(Size::Unknown)
    }
}

/// Usage provider that reports zero usages for every edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUsages;

impl UsageProvider for NoUsages {
    fn usages(&self, _from: &str, _to: &str) -> Result<Usages> {
        Ok(Usages::Count(0))
    }
}

/// Memoizing front for a [`UsageProvider`].
///
/// Lookups for distinct pairs run concurrently; the provider is called
/// without any lock held.
pub struct UsageCache {
    provider: Arc<dyn UsageProvider>,
    memo: DashMap<(String, String), Usages>,
}

impl UsageCache {
    /// Wrap a provider with an empty cache.
    #[must_use]
    pub fn new(provider: Arc<dyn UsageProvider>) -> Self {
        Self {
            provider,
            memo: DashMap::new(),
        }
    }

    /// Usages of `to` by `from`, computing them on first request.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error. Failures are not cached.
    pub fn lookup(&self, from: &str, to: &str) -> Result<Usages> {
        let key = (from.to_string(), to.to_string());
        if let Some(hit) = self.memo.get(&key) {
            return Ok(*hit);
        }

        tracing::debug!(from, to, "Computing module usages");
        let usages = self.provider.usages(from, to)?;
        self.memo.insert(key, usages);
        Ok(usages)
    }

    /// Number of memoized pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// Whether nothing has been memoized yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

impl std::fmt::Debug for UsageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageCache")
            .field("memoized", &self.memo.len())
            .finish_non_exhaustive()
    }
}

/// One usage record in a weight table file.
#[derive(Debug, Deserialize)]
struct UsageRecord {
    from: String,
    to: String,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    unattributed: bool,
}

#[derive(Debug, Default, Deserialize)]
struct WeightFile {
    #[serde(default)]
    sizes: HashMap<String, u64>,
    #[serde(default)]
    usages: Vec<UsageRecord>,
}

/// Precomputed weights, typically loaded from JSON.
///
/// ```json
/// {
///   "sizes": { "example.com/a@v1.0.0": 10240 },
///   "usages": [
///     { "from": "example.com/root", "to": "example.com/a@v1.0.0", "count": 12 },
///     { "from": "example.com/a@v1.0.0", "to": "example.com/b@v0.2.0", "unattributed": true }
///   ]
/// }
/// ```
///
/// Modules without a size are [`Size::Unknown`]; pairs without a record
/// have zero usages.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    sizes: HashMap<String, u64>,
    usages: HashMap<(String, String), Usages>,
}

impl WeightTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module size.
    #[must_use]
    pub fn with_size(mut self, label: impl Into<String>, bytes: u64) -> Self {
        self.sizes.insert(label.into(), bytes);
        self
    }

    /// Record the usages of `to` by `from`.
    #[must_use]
    pub fn with_usages(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        usages: Usages,
    ) -> Self {
        self.usages.insert((from.into(), to.into()), usages);
        self
    }

    /// Parse a table from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is not a valid weight table.
    pub fn from_json<R: Read>(reader: R) -> Result<Self> {
        let file: WeightFile = serde_json::from_reader(reader)
            .map_err(|e| Error::Config(format!("invalid weight table: {e}")))?;

        let usages = file
            .usages
            .into_iter()
            .map(|record| {
                let usages = if record.unattributed {
                    Usages::Unattributed
                } else {
                    Usages::Count(record.count)
                };
                ((record.from, record.to), usages)
            })
            .collect();

        Ok(Self {
            sizes: file.sizes,
            usages,
        })
    }
}

impl SizeProvider for WeightTable {
    fn module_size(&self, label: &str) -> Result<Size> {
        Ok(self.sizes.get(label).map_or(Size::Unknown, |&b| Size::Known(b)))
    }
}

impl UsageProvider for WeightTable {
    fn usages(&self, from: &str, to: &str) -> Result<Usages> {
        Ok(self
            .usages
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    impl UsageProvider for Counting {
        fn usages(&self, from: &str, to: &str) -> Result<Usages> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Usages::Count((from.len() + to.len()) as u64))
        }
    }

    struct Failing;

    impl UsageProvider for Failing {
        fn usages(&self, from: &str, to: &str) -> Result<Usages> {
            Err(Error::Provider {
                subject: format!("{from} -> {to}"),
                message: "module not in cache".into(),
            })
        }
    }

    #[test]
    fn cache_calls_provider_once_per_pair() {
        let provider = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let cache = UsageCache::new(provider.clone());

        assert_eq!(cache.lookup("ab", "c").unwrap(), Usages::Count(3));
        assert_eq!(cache.lookup("ab", "c").unwrap(), Usages::Count(3));
        assert_eq!(cache.lookup("c", "ab").unwrap(), Usages::Count(3));

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn provider_failures_are_not_memoized() {
        let cache = UsageCache::new(Arc::new(Failing));

        assert!(matches!(cache.lookup("a", "b"), Err(Error::Provider { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn weight_table_parses_sizes_and_usages() {
        let json = r#"{
            "sizes": { "a": 100 },
            "usages": [
                { "from": "a", "to": "b", "count": 5 },
                { "from": "b", "to": "c", "unattributed": true }
            ]
        }"#;
        let table = WeightTable::from_json(json.as_bytes()).unwrap();

        assert_eq!(table.module_size("a").unwrap(), Size::Known(100));
        assert_eq!(table.module_size("b").unwrap(), Size::Unknown);
        assert_eq!(table.usages("a", "b").unwrap(), Usages::Count(5));
        assert_eq!(table.usages("b", "c").unwrap(), Usages::Unattributed);
        assert_eq!(table.usages("c", "a").unwrap(), Usages::Count(0));
    }

    #[test]
    fn weight_table_rejects_malformed_json() {
        let err = WeightTable::from_json("{ \"sizes\": [1, 2] }".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
