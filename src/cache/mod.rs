//! Kernel column cache
//!
//! The solver asks for whole columns of the kernel matrix at a time. Columns
//! are kept in an LRU cache whose capacity is derived from the `-m` cache
//! size in megabytes.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::rc::Rc;

/// Shared, immutable kernel column
pub type Column = Rc<[f64]>;

/// LRU cache of kernel matrix columns
pub struct KernelCache {
    cache: LruCache<usize, Column>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache holding at most `capacity` columns (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache bounded by `megabytes` for columns of `column_len` values
    ///
    /// The matrix is square, so no more than `column_len` columns are ever
    /// kept. At least two are, since every solver step touches a pair.
    pub fn with_megabytes(megabytes: f64, column_len: usize) -> Self {
        let bytes = (megabytes.max(0.0) * 1024.0 * 1024.0) as usize;
        let column_bytes = column_len.max(1) * std::mem::size_of::<f64>();
        let columns = (bytes / column_bytes).max(2).min(column_len.max(2));
        Self::new(columns)
    }

    /// Fetch column `i`, computing it with `fill` on a miss
    pub fn get_or_compute<F>(&mut self, i: usize, fill: F) -> Column
    where
        F: FnOnce() -> Vec<f64>,
    {
        if let Some(column) = self.cache.get(&i) {
            self.hits += 1;
            return Rc::clone(column);
        }

        self.misses += 1;
        let column: Column = fill().into();
        self.cache.put(i, Rc::clone(&column));
        column
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.cache.cap().get(),
            size: self.cache.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}
