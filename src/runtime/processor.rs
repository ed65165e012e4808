//! Processor - concurrent execution of a fact graph
//!
//! - One tokio task per fact, spawned into a JoinSet (no concurrency limit)
//! - Each worker waits for its dependencies' completion signals
//! - Handler errors are logged and swallowed; the result stays unset
//! - The run reduces to the single sink's value as a number

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::aggregator::Aggregator;
use super::extractor::Extractor;
use super::task::{DoneGuard, Task};
use super::validator::Validator;
use crate::ast::{Fact, TaskType};
use crate::config::TokenSource;
use crate::dag::FactGraph;
use crate::error::{FactError, Result};
use crate::source::Sources;
use crate::value::Value;

/// Outcome of one fact after a run
#[derive(Debug, Clone, PartialEq)]
pub struct FactOutcome {
    pub id: String,
    pub task_type: TaskType,
    pub result: Option<Value>,
}

/// Everything a run produced
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Id of the fact the run reduced to
    pub sink: Option<String>,
    /// Sink value as a number
    pub value: f64,
    /// Every fact, dependencies first
    pub outcomes: Vec<FactOutcome>,
}

impl Run {
    pub fn outcome(&self, id: &str) -> Option<&FactOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}

/// Fact graph executor with shared handlers
#[derive(Clone)]
pub struct Processor {
    extractor: Arc<Extractor>,
    validator: Validator,
    aggregator: Aggregator,
}

impl Processor {
    pub fn new(extractor: Extractor, validator: Validator, aggregator: Aggregator) -> Self {
        Self {
            extractor: Arc::new(extractor),
            validator,
            aggregator,
        }
    }

    /// Processor with the default validator and aggregator
    pub fn from_sources(sources: Sources, tokens: Arc<dyn TokenSource>) -> Self {
        Self::new(
            Extractor::new(sources, tokens),
            Validator::new(),
            Aggregator::new(),
        )
    }

    /// Execute `facts` and return the sink's value as a number
    pub async fn process(&self, cancel: CancellationToken, facts: Vec<Fact>) -> Result<f64> {
        self.run(cancel, facts).await.map(|run| run.value)
    }

    /// Execute `facts`, keeping every fact's result
    ///
    /// Fails before spawning anything on duplicate ids, cycles, or more than
    /// one sink; after execution only if the sink value is not numeric.
    /// An unset sink result (or an empty fact list) reads as `0.0`.
    #[instrument(name = "process", skip_all, fields(facts = facts.len()))]
    pub async fn run(&self, cancel: CancellationToken, facts: Vec<Fact>) -> Result<Run> {
        let started = Instant::now();

        let graph = FactGraph::from_facts(&facts)?;
        let sink = graph.validate()?;
        let tasks = build_tasks(&graph, facts);
        info!(tasks = tasks.len(), sink = ?sink.as_deref(), "starting fact graph");

        let mut join_set = JoinSet::new();
        for task in &tasks {
            let task = Arc::clone(task);
            let processor = self.clone();
            let cancel = cancel.clone();
            join_set.spawn(async move { processor.execute(task, cancel).await });
        }

        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "task worker aborted");
            }
        }

        let sink_result = sink
            .as_deref()
            .and_then(|id| tasks.iter().find(|t| t.id() == id))
            .and_then(|t| t.result());
        let value = match sink_result {
            Some(result) => result.to_number()?,
            None => 0.0,
        };

        info!(
            value,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fact graph finished"
        );

        Ok(Run {
            sink: sink.map(|s| s.to_string()),
            value,
            outcomes: tasks
                .iter()
                .map(|t| FactOutcome {
                    id: t.id().to_string(),
                    task_type: t.task_type(),
                    result: t.result().cloned(),
                })
                .collect(),
        })
    }

    /// Worker for one task: wait, dispatch, store, signal
    async fn execute(self, task: Arc<Task>, cancel: CancellationToken) {
        let _done = DoneGuard(&task);

        for dep in task.dependencies() {
            dep.wait_done().await;
        }

        debug!(task_id = %task.id(), task_type = %task.task_type(), "dispatching");
        let outcome = match task.task_type() {
            TaskType::Extract => {
                let deps: Vec<Arc<Task>> = task
                    .dependencies()
                    .iter()
                    .filter(|dep| dep.task_type() == TaskType::Extract)
                    .cloned()
                    .collect();
                self.extractor.extract(&cancel, &task, &deps).await
            }
            TaskType::Validate => self.validator.check(&task, task.dependencies()),
            TaskType::Aggregate => self.aggregator.combine(&task, task.dependencies()),
            TaskType::Unknown => {
                warn!(task_id = %task.id(), "unknown task type, skipped");
                return;
            }
        };

        match outcome {
            Ok(Some(value)) => {
                task.set_result(value);
            }
            Ok(None) => debug!(task_id = %task.id(), "no data"),
            Err(e) => log_task_error(&task, &e),
        }
    }
}

fn log_task_error(task: &Task, error: &FactError) {
    warn!(
        task_id = %task.id(),
        task_type = %task.task_type(),
        error = %error,
        "task failed, result left unset"
    );
}

/// Tasks in topological order, each linked to its resolved dependencies
fn build_tasks(graph: &FactGraph, facts: Vec<Fact>) -> Vec<Arc<Task>> {
    let mut facts: FxHashMap<String, Fact> =
        facts.into_iter().map(|f| (f.id.clone(), f)).collect();
    let mut built: FxHashMap<Arc<str>, Arc<Task>> =
        FxHashMap::with_capacity_and_hasher(graph.len(), Default::default());
    let mut order = Vec::with_capacity(graph.len());

    for id in graph.topological_order() {
        let Some(fact) = facts.remove(id.as_ref()) else {
            continue;
        };
        let dependencies = graph
            .dependencies(&id)
            .iter()
            .filter_map(|dep| built.get(dep).cloned())
            .collect();
        let task = Arc::new(Task::new(fact, dependencies));
        built.insert(id, Arc::clone(&task));
        order.push(task);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Method, Rule, Source};
    use crate::source::mock::{MockJsonApi, MockSourceControl, MockTimeSeries};
    use std::collections::HashMap;

    fn processor(api: MockJsonApi) -> Processor {
        let sources = Sources {
            source_control: Arc::new(MockSourceControl::new()),
            json_api: Arc::new(api),
            time_series: Arc::new(MockTimeSeries::new()),
        };
        Processor::from_sources(sources, Arc::new(HashMap::<String, String>::new()))
    }

    #[tokio::test]
    async fn empty_fact_list_is_zero() {
        let value = processor(MockJsonApi::new())
            .process(CancellationToken::new(), Vec::new())
            .await
            .unwrap();
        assert_eq!(value, 0.0);
    }

    #[tokio::test]
    async fn single_extract_number() {
        let api = MockJsonApi::new().with_response("http://svc/count", "42");
        let facts = vec![Fact::extract("count", Source::JsonApi).with_uri("http://svc/count")];
        let value = processor(api)
            .process(CancellationToken::new(), facts)
            .await
            .unwrap();
        assert_eq!(value, 42.0);
    }

    #[tokio::test]
    async fn build_tasks_links_dependencies() {
        let facts = vec![
            Fact::aggregate("all", Method::And).with_depends_on(["check"]),
            Fact::validate("check", Rule::Formula)
                .with_pattern("> 1")
                .with_depends_on(["n"]),
            Fact::extract("n", Source::JsonApi).with_uri("http://svc/n"),
        ];
        let graph = FactGraph::from_facts(&facts).unwrap();
        let tasks = build_tasks(&graph, facts);

        let ids: Vec<&str> = tasks.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["n", "check", "all"]);
        assert_eq!(tasks[2].dependencies()[0].id(), "check");
        assert!(Arc::ptr_eq(&tasks[1].dependencies()[0], &tasks[0]));
    }

    #[tokio::test]
    async fn failing_task_still_signals_dependents() {
        let facts = vec![
            Fact::extract("missing", Source::JsonApi).with_uri("http://svc/404"),
            Fact::validate("check", Rule::Formula)
                .with_pattern("> 1")
                .with_depends_on(["missing"]),
        ];
        let run = processor(MockJsonApi::new())
            .run(CancellationToken::new(), facts)
            .await
            .unwrap();

        assert_eq!(run.sink.as_deref(), Some("check"));
        assert_eq!(run.value, 0.0);
        assert!(run.outcomes.iter().all(|o| o.result.is_none()));
    }
}
