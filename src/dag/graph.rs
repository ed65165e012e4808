//! FactGraph - dependency structure built from a fact list
//!
//! - Arc<str> IDs shared between both adjacency maps
//! - FxHashMap for fast lookups
//! - SmallVec for dependency lists (most facts have 0-2)
//!
//! Validation before execution:
//! - Duplicate IDs
//! - Cycle detection using DFS three-color algorithm
//! - Exactly one sink (fact nothing depends on)

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ast::Fact;
use crate::error::{FactError, Result};

/// Stack-allocated deps: most facts have 0-2 dependencies
pub type DepVec = SmallVec<[Arc<str>; 2]>;

/// Immutable dependency graph of one metric source
#[derive(Debug)]
pub struct FactGraph {
    /// fact id -> ids it depends on, in `dependsOn` order
    predecessors: FxHashMap<Arc<str>, DepVec>,
    /// fact id -> ids depending on it
    successors: FxHashMap<Arc<str>, DepVec>,
    /// All ids in declaration order
    fact_ids: Vec<Arc<str>>,
}

impl FactGraph {
    /// Build the graph. Duplicate ids are rejected; `dependsOn` entries
    /// naming unknown facts are dropped.
    pub fn from_facts(facts: &[Fact]) -> Result<Self> {
        let capacity = facts.len();
        let mut predecessors: FxHashMap<Arc<str>, DepVec> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut successors: FxHashMap<Arc<str>, DepVec> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut fact_ids: Vec<Arc<str>> = Vec::with_capacity(capacity);

        for fact in facts {
            let id: Arc<str> = Arc::from(fact.id.as_str());
            if predecessors.contains_key(&id) {
                return Err(FactError::DuplicateTask {
                    task_id: fact.id.clone(),
                });
            }
            predecessors.insert(Arc::clone(&id), DepVec::new());
            successors.insert(Arc::clone(&id), DepVec::new());
            fact_ids.push(id);
        }

        for (fact, id) in facts.iter().zip(&fact_ids) {
            for dep in &fact.depends_on {
                // Reuse the interned Arc of the dependency
                let Some((dep_id, _)) = successors.get_key_value(dep.as_str()) else {
                    continue;
                };
                let dep_id = Arc::clone(dep_id);

                let deps = predecessors.entry(Arc::clone(id)).or_default();
                if deps.contains(&dep_id) {
                    continue;
                }
                deps.push(Arc::clone(&dep_id));
                successors.entry(dep_id).or_default().push(Arc::clone(id));
            }
        }

        Ok(Self {
            predecessors,
            successors,
            fact_ids,
        })
    }

    pub fn len(&self) -> usize {
        self.fact_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fact_ids.is_empty()
    }

    pub fn fact_ids(&self) -> &[Arc<str>] {
        &self.fact_ids
    }

    /// Resolved dependencies of a fact, unknown ids already dropped
    #[inline]
    pub fn dependencies(&self, fact_id: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.predecessors
            .get(fact_id)
            .map_or(EMPTY, SmallVec::as_slice)
    }

    /// Facts depending on `fact_id`
    #[inline]
    pub fn dependents(&self, fact_id: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.successors
            .get(fact_id)
            .map_or(EMPTY, SmallVec::as_slice)
    }

    /// Facts nothing depends on, in declaration order
    pub fn sinks(&self) -> Vec<Arc<str>> {
        self.fact_ids
            .iter()
            .filter(|id| self.dependents(id).is_empty())
            .cloned()
            .collect()
    }

    /// The single sink whose value a run reduces to. `None` for an empty graph.
    pub fn single_sink(&self) -> Result<Option<Arc<str>>> {
        let mut sinks = self.sinks();
        match sinks.len() {
            0 | 1 => Ok(sinks.pop()),
            count => Err(FactError::AmbiguousSink {
                count,
                sinks: sinks
                    .iter()
                    .map(|s| s.as_ref())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Detect cycles using DFS with three-color marking.
    ///
    /// - White: unvisited
    /// - Gray: on the current DFS path
    /// - Black: fully processed
    ///
    /// Reaching a Gray node closes a cycle; its path is reported as `a → b → a`.
    pub fn detect_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn dfs(
            node: &Arc<str>,
            graph: &FactGraph,
            colors: &mut FxHashMap<Arc<str>, Color>,
            stack: &mut Vec<Arc<str>>,
        ) -> std::result::Result<(), String> {
            colors.insert(Arc::clone(node), Color::Gray);
            stack.push(Arc::clone(node));

            for next in graph.dependents(node) {
                match colors.get(next) {
                    Some(Color::Gray) => {
                        let start = stack.iter().position(|x| x == next).unwrap_or(0);
                        let path: Vec<&str> = stack[start..].iter().map(|s| s.as_ref()).collect();
                        return Err(format!("{} → {}", path.join(" → "), next));
                    }
                    Some(Color::White) | None => dfs(next, graph, colors, stack)?,
                    Some(Color::Black) => {}
                }
            }

            stack.pop();
            colors.insert(Arc::clone(node), Color::Black);
            Ok(())
        }

        let mut colors: FxHashMap<Arc<str>, Color> = self
            .fact_ids
            .iter()
            .map(|id| (Arc::clone(id), Color::White))
            .collect();
        let mut stack = Vec::new();

        for id in &self.fact_ids {
            if colors.get(id) == Some(&Color::White) {
                dfs(id, self, &mut colors, &mut stack)
                    .map_err(|cycle| FactError::CycleDetected { cycle })?;
            }
        }

        Ok(())
    }

    /// Kahn's order: every fact after all its dependencies, ties in declaration order.
    /// Facts on a cycle are left out, so call [`detect_cycles`](Self::detect_cycles) first.
    pub fn topological_order(&self) -> Vec<Arc<str>> {
        let mut pending: FxHashMap<&str, usize> = self
            .fact_ids
            .iter()
            .map(|id| (id.as_ref(), self.dependencies(id).len()))
            .collect();
        let mut queue: VecDeque<&Arc<str>> = self
            .fact_ids
            .iter()
            .filter(|id| self.dependencies(id).is_empty())
            .collect();
        let mut order = Vec::with_capacity(self.fact_ids.len());

        while let Some(id) = queue.pop_front() {
            order.push(Arc::clone(id));
            for next in self.dependents(id) {
                if let Some(count) = pending.get_mut(next.as_ref()) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        order
    }

    /// Every check a fact list must pass before it is executed; returns the sink
    pub fn validate(&self) -> Result<Option<Arc<str>>> {
        self.detect_cycles()?;
        self.single_sink()
    }
}
