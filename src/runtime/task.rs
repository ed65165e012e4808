//! Task - one executable node of a fact graph
//!
//! A task pairs the declarative [`Fact`] with its runtime state:
//! resolved dependency links, a write-once result and a completion signal.
//! The owning worker is the only writer; other workers read the result
//! only after the signal fired.

use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use crate::ast::{Fact, TaskType};
use crate::value::Value;

pub struct Task {
    fact: Fact,
    /// Resolved at construction, never mutated
    dependencies: Vec<Arc<Task>>,
    result: OnceLock<Value>,
    done: watch::Sender<bool>,
}

impl Task {
    pub fn new(fact: Fact, dependencies: Vec<Arc<Task>>) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            fact,
            dependencies,
            result: OnceLock::new(),
            done,
        }
    }

    /// A task that already ran, with the given result
    pub fn completed(fact: Fact, result: Option<Value>) -> Self {
        let task = Self::new(fact, Vec::new());
        if let Some(value) = result {
            task.set_result(value);
        }
        task.mark_done();
        task
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.fact.id
    }

    #[inline]
    pub fn fact(&self) -> &Fact {
        &self.fact
    }

    #[inline]
    pub fn task_type(&self) -> TaskType {
        self.fact.task_type
    }

    pub fn dependencies(&self) -> &[Arc<Task>] {
        &self.dependencies
    }

    /// The result, if the task produced one
    pub fn result(&self) -> Option<&Value> {
        self.result.get()
    }

    /// Store the result. Returns `false` if one was already stored.
    pub(crate) fn set_result(&self, value: Value) -> bool {
        self.result.set(value).is_ok()
    }

    pub fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    /// Fire the completion signal; idempotent
    pub(crate) fn mark_done(&self) {
        self.done.send_replace(true);
    }

    /// Wait until the task finished, successfully or not
    pub async fn wait_done(&self) {
        let mut rx = self.done.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.fact.id)
            .field("type", &self.fact.task_type)
            .field(
                "dependencies",
                &self.dependencies.iter().map(|d| d.id()).collect::<Vec<_>>(),
            )
            .field("result", &self.result.get())
            .field("done", &self.is_done())
            .finish()
    }
}

/// Fires the completion signal when dropped, so dependents never wait on a task
/// whose worker returned early or panicked
pub(crate) struct DoneGuard<'a>(pub(crate) &'a Task);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_done();
    }
}
