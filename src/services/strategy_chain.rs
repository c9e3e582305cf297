// src/services/strategy_chain.rs
//
// Strategy Chain
//
// Ordered list of match strategies, evaluated first to last for one source.
//
// CRITICAL RULES:
// - Order is fixed at construction; a strategy's index is its priority
// - First match wins, nothing after it runs
// - A strategy error stops the chain for that source only
// - Disabled or unbacked strategies are never added

use std::sync::Arc;

use crate::config::{RunConfig, StrategyToggles};
use crate::domain::{SourceEntry, TargetEntry};
use crate::error::{AppError, AppResult};
use crate::infrastructure::CrosswalkCaches;
use crate::integrations::{
    CachedCrosswalk, CrosswalkSource, DestinationService, LiveCrosswalkService,
    OfflineCrosswalkTable,
};
use crate::strategies::{
    ApiSearchStrategy, CrosswalkStrategy, ExactIdStrategy, ForeignIdSearchStrategy,
    KnownTargets, ManualMappingStrategy, MatchStrategy, RunContext, TitleStrategy,
};

/// What the chain found for one source
#[derive(Debug, Clone, PartialEq)]
pub struct ChainMatch {
    pub target: TargetEntry,
    pub strategy_name: String,
    pub strategy_index: usize,
}

/// Backing services for the strategies that need them.
/// A missing dependency leaves its strategy out of the chain.
#[derive(Default)]
pub struct ChainDependencies {
    pub destination: Option<Arc<dyn DestinationService>>,
    pub offline: Option<Arc<dyn CrosswalkSource>>,
    pub live: Vec<Arc<dyn CrosswalkSource>>,
}

impl ChainDependencies {
    /// Build crosswalk sources from config.
    ///
    /// An offline table that fails to load is logged and left out. Live
    /// services go through their shared cache when one was loaded.
    pub fn from_config(
        config: &RunConfig,
        destination: Option<Arc<dyn DestinationService>>,
        caches: &CrosswalkCaches,
    ) -> AppResult<Self> {
        let direction = config.direction;

        let offline = match &config.crosswalk.offline_table_path {
            Some(path) => match OfflineCrosswalkTable::load(path, direction) {
                Ok(table) => Some(Arc::new(table) as Arc<dyn CrosswalkSource>),
                Err(e) => {
                    log::warn!(
                        "Offline crosswalk table {} unavailable: {}",
                        path.display(),
                        e
                    );
                    None
                }
            },
            None => None,
        };

        let mut live = Vec::with_capacity(config.crosswalk.live_services.len());
        for service in &config.crosswalk.live_services {
            let client: Arc<dyn CrosswalkSource> =
                Arc::new(LiveCrosswalkService::new(service, direction)?);
            let source = match caches.get(&service.name) {
                Some(cache) => Arc::new(CachedCrosswalk::new(
                    client,
                    cache,
                    direction.origin_service(),
                )) as Arc<dyn CrosswalkSource>,
                None => client,
            };
            live.push(source);
        }

        Ok(Self {
            destination,
            offline,
            live,
        })
    }
}

pub struct StrategyChain {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Compose the chain in its fixed order, keeping only strategies that
    /// are enabled and have what they need.
    pub fn from_toggles(toggles: &StrategyToggles, deps: ChainDependencies) -> Self {
        let mut strategies: Vec<Box<dyn MatchStrategy>> = Vec::new();

        if toggles.exact_id {
            strategies.push(Box::new(ExactIdStrategy));
        }
        if toggles.manual_mapping {
            strategies.push(Box::new(ManualMappingStrategy));
        }
        if toggles.offline_crosswalk {
            if let Some(offline) = deps.offline {
                strategies.push(Box::new(CrosswalkStrategy::new(offline)));
            }
        }
        if toggles.live_crosswalk {
            for live in deps.live {
                strategies.push(Box::new(CrosswalkStrategy::new(live)));
            }
        }
        if toggles.title {
            strategies.push(Box::new(TitleStrategy));
        }
        if let Some(destination) = deps.destination {
            if toggles.foreign_id_search {
                strategies.push(Box::new(ForeignIdSearchStrategy::new(Arc::clone(
                    &destination,
                ))));
            }
            if toggles.api_search {
                strategies.push(Box::new(ApiSearchStrategy::new(destination)));
            }
        }

        let chain = Self::new(strategies);
        log::info!("Strategy chain: [{}]", chain.names().join(", "));
        chain
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the strategies in order for one source.
    ///
    /// Returns `NoTargetFound` when every strategy declined, and a
    /// `Strategy` error naming the strategy whose lookup failed.
    pub async fn resolve(
        &self,
        source: &SourceEntry,
        known: &KnownTargets,
        ctx: &RunContext,
    ) -> AppResult<ChainMatch> {
        for (index, strategy) in self.strategies.iter().enumerate() {
            log::debug!("Trying {} for {}", strategy.name(), source);

            match strategy.attempt(source, known, ctx).await {
                Ok(Some(target)) => {
                    return Ok(ChainMatch {
                        target,
                        strategy_name: strategy.name().to_string(),
                        strategy_index: index,
                    });
                }
                Ok(None) => continue,
                Err(e) => return Err(AppError::strategy(strategy.name(), e)),
            }
        }

        Err(AppError::NoTargetFound(source.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{MockCrosswalkSource, MockDestinationService};
    use crate::strategies::test_support::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strategy with a canned answer that counts its calls
    struct Fixed {
        name: &'static str,
        answer: Option<u64>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn new(name: &'static str, answer: Option<u64>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let strategy = Self {
                name,
                answer,
                fail: false,
                calls: Arc::clone(&calls),
            };
            (strategy, calls)
        }
    }

    #[async_trait]
    impl MatchStrategy for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn attempt(
            &self,
            _source: &SourceEntry,
            _known: &KnownTargets,
            _ctx: &RunContext,
        ) -> AppResult<Option<TargetEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::ExternalService("HTTP 502".to_string()));
            }
            Ok(self.answer.map(|id| anime(id, "Target", 12)))
        }
    }

    #[tokio::test]
    async fn test_first_match_short_circuits() {
        let (first, first_calls) = Fixed::new("first", None);
        let (second, _) = Fixed::new("second", Some(7));
        let (third, third_calls) = Fixed::new("third", Some(8));
        let chain = StrategyChain::new(vec![Box::new(first), Box::new(second), Box::new(third)]);

        let found = chain.resolve(&anime(1, "Source", 12), &known(vec![]), &ctx()).await.unwrap();

        assert_eq!(found.target.id, 7);
        assert_eq!(found.strategy_name, "second");
        assert_eq!(found.strategy_index, 1);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_no_target() {
        let (only, _) = Fixed::new("only", None);
        let chain = StrategyChain::new(vec![Box::new(only)]);

        let err = chain.resolve(&anime(1, "Source", 12), &known(vec![]), &ctx()).await.unwrap_err();
        assert!(matches!(err, AppError::NoTargetFound(_)));
        assert!(err.to_string().starts_with("no target found for Source"));
    }

    #[tokio::test]
    async fn test_failure_is_wrapped_and_stops_chain() {
        let (mut failing, _) = Fixed::new("flaky", None);
        failing.fail = true;
        let (after, after_calls) = Fixed::new("after", Some(1));
        let chain = StrategyChain::new(vec![Box::new(failing), Box::new(after)]);

        let err = chain.resolve(&anime(1, "Source", 12), &known(vec![]), &ctx()).await.unwrap_err();
        assert!(matches!(err, AppError::Strategy { ref strategy, .. } if strategy == "flaky"));
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_full_chain_order() {
        let mut offline = MockCrosswalkSource::new();
        offline.expect_name().return_const("offline".to_string());
        let mut live = MockCrosswalkSource::new();
        live.expect_name().return_const("arm".to_string());

        let deps = ChainDependencies {
            destination: Some(Arc::new(MockDestinationService::new())),
            offline: Some(Arc::new(offline)),
            live: vec![Arc::new(live)],
        };
        let chain = StrategyChain::from_toggles(&StrategyToggles::default(), deps);

        assert_eq!(
            chain.names(),
            vec![
                "exact_id",
                "manual_mapping",
                "crosswalk_offline",
                "crosswalk_arm",
                "title",
                "foreign_id_search",
                "api_search",
            ]
        );
    }

    #[test]
    fn test_missing_dependencies_leave_strategies_out() {
        let chain =
            StrategyChain::from_toggles(&StrategyToggles::default(), ChainDependencies::default());
        assert_eq!(chain.names(), vec!["exact_id", "manual_mapping", "title"]);
    }

    #[test]
    fn test_disabled_strategies_left_out() {
        let toggles = StrategyToggles {
            manual_mapping: false,
            title: false,
            api_search: false,
            ..StrategyToggles::default()
        };
        let deps = ChainDependencies {
            destination: Some(Arc::new(MockDestinationService::new())),
            ..ChainDependencies::default()
        };
        let chain = StrategyChain::from_toggles(&toggles, deps);
        assert_eq!(chain.names(), vec!["exact_id", "foreign_id_search"]);
    }

    #[test]
    fn test_unreadable_offline_table_is_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = RunConfig::default();
        config.crosswalk.offline_table_path = Some(dir.path().join("missing.json"));

        let deps =
            ChainDependencies::from_config(&config, None, &CrosswalkCaches::default()).unwrap();
        assert!(deps.offline.is_none());
        assert!(deps.live.is_empty());
    }
}
