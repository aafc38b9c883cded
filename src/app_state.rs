// =============================================================================
// Central Application State
// =============================================================================
//
// Shared across request handlers via `Arc<AppState>`. The engines themselves
// are stateless; everything stateful in the process lives here: the runtime
// config, the provider client (connection pool), and the memoization cache.
// =============================================================================

use crate::cache::AnalysisCache;
use crate::provider::YahooClient;
use crate::runtime_config::RuntimeConfig;

/// Shared state for the API layer.
pub struct AppState {
    pub config: RuntimeConfig,
    pub provider: YahooClient,
    pub cache: AnalysisCache,
}

impl AppState {
    pub fn new(config: RuntimeConfig) -> Self {
        let cache = AnalysisCache::new(config.cache_capacity);
        Self {
            config,
            provider: YahooClient::new(),
            cache,
        }
    }
}
