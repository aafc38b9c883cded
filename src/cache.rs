// =============================================================================
// Analysis cache — bounded memoization keyed by query value-equality
// =============================================================================
//
// The engines are pure, so a result can be reused for as long as the exact
// query repeats (the dashboard re-issues identical queries on every widget
// interaction). The cache is owned by the caller side, not the engines:
// they stay stateless.
//
// FIFO eviction at a fixed capacity. Values are shared as `Arc`, so a hit
// is a pointer clone and cached results stay immutable.
// =============================================================================

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::analysis::{AnalysisQuery, AnalysisResult};

struct Inner {
    map: HashMap<AnalysisQuery, Arc<AnalysisResult>>,
    order: VecDeque<AnalysisQuery>,
}

/// Thread-safe bounded memoization cache for analysis results.
pub struct AnalysisCache {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl AnalysisCache {
    /// A `capacity` of zero disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    pub fn get(&self, query: &AnalysisQuery) -> Option<Arc<AnalysisResult>> {
        self.inner.read().map.get(query).cloned()
    }

    /// Insert a freshly computed result, evicting the oldest entries beyond
    /// capacity. Re-inserting an existing key refreshes the value without
    /// growing the queue.
    pub fn insert(&self, query: AnalysisQuery, result: Arc<AnalysisResult>) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.write();
        if inner.map.insert(query.clone(), result).is_none() {
            inner.order.push_back(query);
        }
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
                debug!(symbol = %oldest.symbol, "evicted cached analysis");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
