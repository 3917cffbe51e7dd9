//! Query pipeline
//!
//! Routing, extraction, compilation and execution run as an explicit state
//! machine. Every stage degrades instead of failing, and the per-query
//! deadline is checked before each stage, so [`QueryPipeline::search`]
//! always returns an outcome.

use crate::catalog_cache::CatalogCache;
use crate::classifier::{Classifier, StrategyDecision};
use crate::compiler::QueryCompiler;
use crate::config::{ConfigError, PipelineConfig};
use crate::executor::HybridExecutor;
use crate::extractor::FilterExtractor;
use crate::fusion::RrfParams;
use crate::router::StrategyRouter;
use dealscout_core::{
    CatalogSource, CompiledQuery, ConstraintSet, DocumentSchema, FusedResult, SearchStore, Strategy,
    ValueCatalog,
};
use serde::Serialize;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Routing,
    Extraction,
    Compilation,
    Execution,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Routing => "routing",
            Stage::Extraction => "extraction",
            Stage::Compilation => "compilation",
            Stage::Execution => "execution",
        }
    }
}

/// A degraded, non-fatal step of one search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub decision: StrategyDecision,
    pub constraints: ConstraintSet,
    /// `None` when the deadline expired before compilation
    pub compiled: Option<CompiledQuery>,
    pub result: FusedResult,
    pub failures: Vec<StageFailure>,
    pub timed_out: bool,
    pub elapsed_ms: u64,
}

impl SearchOutcome {
    /// Outcome of a search that never got to run a stage
    pub fn empty() -> Self {
        Self {
            decision: StrategyDecision::new(Strategy::Strict, "not routed"),
            constraints: ConstraintSet::new(),
            compiled: None,
            result: FusedResult::empty(),
            failures: Vec::new(),
            timed_out: false,
            elapsed_ms: 0,
        }
    }

    /// Outcome of a search whose caller stopped waiting after `waited`
    pub fn abandoned(waited: Duration) -> Self {
        Self {
            timed_out: true,
            elapsed_ms: waited.as_millis() as u64,
            ..Self::empty()
        }
    }

    fn fail(&mut self, stage: Stage, message: impl Into<String>) {
        self.failures.push(StageFailure {
            stage,
            message: message.into(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    RoutingDecision,
    Extracting,
    Compiling,
    Executing,
    Done,
}

impl State {
    fn stage(self) -> Option<Stage> {
        match self {
            State::RoutingDecision => Some(Stage::Routing),
            State::Extracting => Some(Stage::Extraction),
            State::Compiling => Some(Stage::Compilation),
            State::Executing => Some(Stage::Execution),
            State::Done => None,
        }
    }
}

/// Per-request context threaded through the state machine
struct Run<'a> {
    text: &'a str,
    catalog: Arc<ValueCatalog>,
    strategy_override: Option<Strategy>,
    outcome: SearchOutcome,
}

pub struct QueryPipeline {
    router: StrategyRouter,
    extractor: FilterExtractor,
    compiler: QueryCompiler,
    executor: HybridExecutor,
    catalog: CatalogCache,
    config: PipelineConfig,
}

impl QueryPipeline {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn SearchStore>,
        catalog_source: Arc<dyn CatalogSource>,
        schema: DocumentSchema,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let schema = schema.with_semantic_field(config.semantic_field.clone());

        let executor = HybridExecutor::new(store, config.semantic_field.clone())
            .with_fusion(config.flexible_fusion)
            .with_rrf(RrfParams {
                rank_constant: config.rank_constant,
                rank_window_size: config.rank_window_size,
            })
            .with_final_k(config.final_k);

        Ok(Self {
            router: StrategyRouter::new(Arc::clone(&classifier)),
            extractor: FilterExtractor::new(classifier, schema.clone()),
            compiler: QueryCompiler::new(schema.clone(), config.minimum_should_match),
            executor,
            catalog: CatalogCache::new(
                catalog_source,
                schema,
                config.catalog_ttl(),
                config.catalog_max_values,
            ),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current value catalog snapshot
    pub fn catalog(&self) -> Arc<ValueCatalog> {
        self.catalog.current()
    }

    pub fn refresh_catalog(&self) -> dealscout_core::Result<Arc<ValueCatalog>> {
        self.catalog.refresh()
    }

    pub fn search(&self, text: &str) -> SearchOutcome {
        self.search_with(text, None)
    }

    /// Search on a worker thread, waiting at most the query deadline plus
    /// `grace`.
    ///
    /// Stages only check the deadline between external calls, so a single
    /// slow call can overrun it. Past the limit the caller gets an empty,
    /// timed-out outcome and the worker's late result is discarded.
    pub fn search_bounded(
        self: &Arc<Self>,
        text: &str,
        strategy_override: Option<Strategy>,
        grace: Duration,
    ) -> SearchOutcome {
        let limit = self.config.query_timeout() + grace;
        let (tx, rx) = mpsc::channel();
        let worker = Arc::clone(self);
        let owned = text.to_string();

        let spawned = thread::Builder::new()
            .name("dealscout-search".to_string())
            .spawn(move || {
                // the receiver may already be gone
                let _ = tx.send(worker.search_with(&owned, strategy_override));
            });
        if let Err(e) = spawned {
            warn!(query = text, error = %e, "failed to spawn search worker, searching inline");
            return self.search_with(text, strategy_override);
        }

        match rx.recv_timeout(limit) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                warn!(query = text, stage = "request", "search abandoned after {}ms", limit.as_millis());
                SearchOutcome::abandoned(limit)
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!(query = text, stage = "request", "search worker stopped without an outcome");
                SearchOutcome::abandoned(limit)
            }
        }
    }

    /// Search with routing skipped in favour of `strategy_override`
    pub fn search_with(&self, text: &str, strategy_override: Option<Strategy>) -> SearchOutcome {
        let started = Instant::now();
        let deadline = started + self.config.query_timeout();
        info!(query = text, "search started");

        let mut run = Run {
            text,
            catalog: self.catalog.current(),
            strategy_override,
            outcome: SearchOutcome::empty(),
        };

        let mut state = State::RoutingDecision;
        while state != State::Done {
            if Instant::now() >= deadline {
                if let Some(stage) = state.stage() {
                    warn!(query = text, stage = stage.as_str(), "query deadline exceeded");
                    run.outcome.fail(
                        stage,
                        format!("deadline of {}ms exceeded", self.config.query_timeout_ms),
                    );
                }
                run.outcome.timed_out = true;
                run.outcome.result = FusedResult::empty();
                break;
            }
            state = self.step(state, &mut run);
        }

        let mut outcome = run.outcome;
        outcome.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            query = text,
            strategy = %outcome.decision.strategy,
            shape = outcome.compiled.as_ref().map_or("none", CompiledQuery::shape),
            hits = outcome.result.len(),
            failures = outcome.failures.len(),
            elapsed_ms = outcome.elapsed_ms,
            "search finished"
        );
        outcome
    }

    fn step(&self, state: State, run: &mut Run<'_>) -> State {
        match state {
            State::RoutingDecision => {
                run.outcome.decision = match run.strategy_override {
                    Some(strategy) => StrategyDecision::new(strategy, "strategy set by caller"),
                    None => {
                        let routed = self.router.decide(run.text, &run.catalog);
                        if let Some(error) = &routed.error {
                            run.outcome.fail(Stage::Routing, error.to_string());
                        }
                        routed.decision
                    }
                };
                State::Extracting
            }
            State::Extracting => {
                let extracted = self.extractor.extract(run.text, &run.catalog);
                if let Some(error) = &extracted.error {
                    run.outcome.fail(Stage::Extraction, error.to_string());
                }
                run.outcome.constraints = extracted.constraints;
                State::Compiling
            }
            State::Compiling => {
                let compilation = self.compiler.compile(
                    &run.outcome.constraints,
                    run.text,
                    run.outcome.decision.strategy,
                    &run.catalog,
                );
                for issue in &compilation.issues {
                    run.outcome.fail(Stage::Compilation, issue.to_string());
                }
                run.outcome.compiled = Some(compilation.query);
                State::Executing
            }
            State::Executing => {
                if let Some(compiled) = &run.outcome.compiled {
                    let executed = self.executor.execute(compiled);
                    for failure in &executed.failures {
                        run.outcome.fail(Stage::Execution, failure.to_string());
                    }
                    run.outcome.result = executed.result;
                }
                State::Done
            }
            State::Done => State::Done,
        }
    }
}
