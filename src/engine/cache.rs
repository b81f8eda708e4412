// Copyright 2025 Rowsift Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compiled-predicate cache
//!
//! Keyed by (row-shape identity, expression text, option flags). The
//! concurrency contract: at most one compilation runs per key. Lookups take
//! the read lock; a miss re-checks under the write lock and compiles there,
//! so concurrent callers for the same key get the one winning predicate.
//! Predicate invocation itself takes no lock.
//!
//! The cache is size-capped: inserts past the cap prune the oldest entries
//! first. A background trimmer can additionally call [`PredicateCache::compact`]
//! on an interval.

use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::{MapRow, Record, Result};

use super::evaluator::CompiledPredicate;

/// Default maximum number of cached predicates
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Option flags participating in the cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EvalOptions {
    /// Normalize underscores to spaces in column-name lookups
    pub normalize_underscores: bool,
}

impl EvalOptions {
    /// Options with underscore normalization enabled
    pub fn normalized_underscores() -> Self {
        Self {
            normalize_underscores: true,
        }
    }
}

/// Cache key: row-shape identity, expression text, and option flags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    shape: TypeId,
    expression: String,
    options: EvalOptions,
}

impl CacheKey {
    /// Key for the map-row shape
    pub fn for_map(expression: &str, options: EvalOptions) -> Self {
        Self {
            shape: TypeId::of::<MapRow>(),
            expression: expression.to_string(),
            options,
        }
    }

    /// Key for a declared record type
    pub fn for_typed<T: Record>(expression: &str, options: EvalOptions) -> Self {
        Self {
            shape: TypeId::of::<T>(),
            expression: expression.to_string(),
            options,
        }
    }
}

/// A cached predicate with usage metadata for eviction
struct CacheEntry {
    predicate: CompiledPredicate,
    last_used: Instant,
    usage_count: u64,
}

/// Thread-safe cache of compiled predicates
pub struct PredicateCache {
    entries: RwLock<FxHashMap<CacheKey, CacheEntry>>,
    max_size: usize,
    prune_factor: f64,
    compilations: AtomicU64,
}

impl PredicateCache {
    /// Create a new cache with the given maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            max_size,
            prune_factor: 0.2,
            compilations: AtomicU64::new(0),
        }
    }

    /// Create a new cache with the default size
    pub fn default_sized() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }

    /// Fetch the predicate for a key, compiling it at most once
    ///
    /// The fast path takes only the read lock. On a miss the write lock is
    /// taken, the key re-checked, and the compile closure invoked under the
    /// lock, so a racing caller never compiles the same key twice. A failed
    /// compilation inserts nothing and the error propagates unchanged.
    pub fn get_or_compile<F>(&self, key: CacheKey, compile: F) -> Result<CompiledPredicate>
    where
        F: FnOnce() -> Result<CompiledPredicate>,
    {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(&key) {
                return Ok(entry.predicate.clone());
            }
        }

        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(&key) {
            entry.usage_count += 1;
            return Ok(entry.predicate.clone());
        }

        let predicate = compile()?;
        self.compilations.fetch_add(1, Ordering::Relaxed);

        if entries.len() >= self.max_size {
            Self::prune(&mut entries, self.max_size, self.prune_factor);
        }

        entries.insert(
            key,
            CacheEntry {
                predicate: predicate.clone(),
                last_used: Instant::now(),
                usage_count: 1,
            },
        );
        Ok(predicate)
    }

    /// Number of codegen invocations so far
    ///
    /// Observable hook for the compile-once property: repeat compiles of a
    /// cached key do not increment this.
    pub fn compilations(&self) -> u64 {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Number of cached predicates
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove all cached predicates
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Evict the oldest entries, reclaiming roughly the given fraction
    ///
    /// Takes the write lock for the whole sweep. Returns the number of
    /// entries evicted.
    pub fn compact(&self, fraction: f64) -> usize {
        let mut entries = self.entries.write();
        let target = ((entries.len() as f64) * fraction.clamp(0.0, 1.0)).ceil() as usize;
        if target == 0 || entries.is_empty() {
            return 0;
        }
        Self::evict_oldest(&mut entries, target)
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let size = entries.len();
        let total_usage: u64 = entries.values().map(|e| e.usage_count).sum();
        CacheStats {
            size,
            max_size: self.max_size,
            total_usage,
            compilations: self.compilations(),
        }
    }

    /// Prune when the cache is full: drop a prune_factor share, at least one
    fn prune(entries: &mut FxHashMap<CacheKey, CacheEntry>, max_size: usize, prune_factor: f64) {
        let num_to_remove = (((max_size as f64) * prune_factor).ceil() as usize).max(1);
        if entries.len() <= num_to_remove {
            return;
        }
        Self::evict_oldest(entries, num_to_remove);
    }

    /// Remove the `count` entries least recently inserted/used
    fn evict_oldest(entries: &mut FxHashMap<CacheKey, CacheEntry>, count: usize) -> usize {
        let mut candidates: Vec<(&CacheKey, Instant, u64)> = entries
            .iter()
            .map(|(k, e)| (k, e.last_used, e.usage_count))
            .collect();

        // Oldest first, then least used first
        candidates.sort_unstable_by(|a, b| a.1.cmp(&b.1).then_with(|| a.2.cmp(&b.2)));

        let keys_to_remove: Vec<CacheKey> = candidates
            .into_iter()
            .take(count)
            .map(|(k, _, _)| k.clone())
            .collect();

        let removed = keys_to_remove.len();
        for key in keys_to_remove {
            entries.remove(&key);
        }
        removed
    }
}

impl Default for PredicateCache {
    fn default() -> Self {
        Self::default_sized()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Current number of cached predicates
    pub size: usize,
    /// Maximum cache size
    pub max_size: usize,
    /// Total usage count across cached predicates
    pub total_usage: u64,
    /// Total codegen invocations
    pub compilations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::program::Program;
    use crate::engine::ops::Op;
    use crate::core::Value;

    fn dummy_predicate() -> CompiledPredicate {
        CompiledPredicate::from_program(Program::new(vec![
            Op::LoadConst(Value::boolean(true)),
            Op::Return,
        ]))
    }

    #[test]
    fn test_compile_once_per_key() {
        let cache = PredicateCache::new(100);
        let key = CacheKey::for_map("Age > 5", EvalOptions::default());

        cache
            .get_or_compile(key.clone(), || Ok(dummy_predicate()))
            .unwrap();
        cache
            .get_or_compile(key.clone(), || {
                panic!("codegen must not run for a cached key")
            })
            .unwrap();

        assert_eq!(cache.compilations(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_keys_compile_separately() {
        let cache = PredicateCache::new(100);
        let options = EvalOptions::default();

        cache
            .get_or_compile(CacheKey::for_map("a = 1", options), || {
                Ok(dummy_predicate())
            })
            .unwrap();
        cache
            .get_or_compile(CacheKey::for_map("a = 2", options), || {
                Ok(dummy_predicate())
            })
            .unwrap();
        cache
            .get_or_compile(
                CacheKey::for_map("a = 1", EvalOptions::normalized_underscores()),
                || Ok(dummy_predicate()),
            )
            .unwrap();

        assert_eq!(cache.compilations(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_failed_compile_inserts_nothing() {
        let cache = PredicateCache::new(100);
        let key = CacheKey::for_map("bad", EvalOptions::default());

        let result = cache.get_or_compile(key.clone(), || {
            Err(crate::core::Error::internal("compile failed"))
        });
        assert!(result.is_err());
        assert_eq!(cache.len(), 0);

        // a later compile for the same key still runs
        cache
            .get_or_compile(key, || Ok(dummy_predicate()))
            .unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_prune_on_insert_past_cap() {
        let cache = PredicateCache::new(5);
        for i in 0..10 {
            let key = CacheKey::for_map(&format!("a = {}", i), EvalOptions::default());
            cache
                .get_or_compile(key, || Ok(dummy_predicate()))
                .unwrap();
        }
        assert!(cache.len() <= 5);
    }

    #[test]
    fn test_compact_evicts_fraction() {
        let cache = PredicateCache::new(100);
        for i in 0..10 {
            let key = CacheKey::for_map(&format!("a = {}", i), EvalOptions::default());
            cache
                .get_or_compile(key, || Ok(dummy_predicate()))
                .unwrap();
        }

        let evicted = cache.compact(0.5);
        assert_eq!(evicted, 5);
        assert_eq!(cache.len(), 5);

        assert_eq!(cache.compact(0.0), 0);
    }

    #[test]
    fn test_stats() {
        let cache = PredicateCache::new(100);
        let key = CacheKey::for_map("a = 1", EvalOptions::default());
        cache
            .get_or_compile(key.clone(), || Ok(dummy_predicate()))
            .unwrap();

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.max_size, 100);
        assert_eq!(stats.compilations, 1);
    }
}
