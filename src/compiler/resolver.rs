use std::collections::{BTreeMap, HashMap};
use futures::future::try_join_all;
use tracing::{debug, info};
use crate::client::ForkInputSource;
use crate::compiler::registry::TaskRegistry;
use crate::dsl::{TaskConfig, TaskType};
use crate::error::{Error, Result};
use crate::runtime::task::TaskResult;

/// Output of fork resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub tasks: Vec<TaskResult>,
    /// Definitions reported by fork inputs, keyed by child reference name.
    pub forked_task_defs: BTreeMap<String, TaskConfig>,
}

/// Links task results to the fork that spawned them.
///
/// The server does not report which fork a child belongs to, so every fork
/// task's input is fetched and its `forkedTasks` list is matched against the
/// task list by reference name. This is a client-side compatibility shim.
pub struct ForkResolver;

impl ForkResolver {
    pub async fn resolve(tasks: Vec<TaskResult>, source: &dyn ForkInputSource) -> Result<Vec<TaskResult>> {
        Ok(Self::resolve_with_defs(tasks, source).await?.tasks)
    }

    /// Fetches all fork inputs concurrently and returns a new task list with
    /// `parent_task_reference_name` assigned. Any failed fetch fails the
    /// whole resolution.
    pub async fn resolve_with_defs(tasks: Vec<TaskResult>, source: &dyn ForkInputSource) -> Result<Resolution> {
        let forks: Vec<(String, String)> = tasks.iter()
            .filter(|t| t.task_type == TaskType::Fork)
            .map(|t| (t.reference_task_name.clone(), t.task_id.clone()))
            .collect();

        if forks.is_empty() {
            return Ok(Resolution { tasks, forked_task_defs: BTreeMap::new() });
        }

        debug!(forks = forks.len(), "fetching fork inputs");
        let inputs = try_join_all(forks.iter().map(|(reference, task_id)| async move {
            source.fork_input(reference, task_id).await
                .map_err(|e| Error::ForkInput {
                    reference: reference.clone(),
                    task_id: task_id.clone(),
                    source: Box::new(e),
                })
        }))
        .await?;

        let mut parent_of: HashMap<String, String> = HashMap::new();
        let mut forked_task_defs = BTreeMap::new();
        {
            let registry = TaskRegistry::index(&tasks);
            for ((fork_ref, _), input) in forks.iter().zip(inputs) {
                for child in &input.forked_tasks {
                    if registry.contains(child) {
                        parent_of.insert(child.clone(), fork_ref.clone());
                    } else {
                        debug!(fork = %fork_ref, child = %child, "forked task not started yet");
                    }
                }
                for def in input.forked_task_defs {
                    forked_task_defs.insert(def.task_reference_name.clone(), def);
                }
            }
        }

        info!(forks = forks.len(), linked = parent_of.len(), "fork resolution complete");

        let tasks = tasks.into_iter()
            .map(|mut task| {
                if let Some(parent) = parent_of.get(&task.reference_task_name) {
                    task.parent_task_reference_name = Some(parent.clone());
                }
                task
            })
            .collect();

        Ok(Resolution { tasks, forked_task_defs })
    }
}
