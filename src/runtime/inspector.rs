use std::sync::Arc;
use dashmap::DashMap;
use tracing::{debug, info, warn};
use crate::client::{ExecutionApi, ExecutionScope};
use crate::compiler::core::DagBuilder;
use crate::compiler::resolver::ForkResolver;
use crate::dsl::WorkflowDef;
use crate::error::{Error, Result};
use crate::runtime::execution::ExecutionAndTasks;
use crate::runtime::graph::Graph;

/// Drives one fetch cycle per call: execution and task list are fetched
/// concurrently, fork inputs after the task list, and the graph is built
/// only from a fully resolved snapshot.
pub struct Inspector {
    api: Arc<dyn ExecutionApi>,
    // Definitions are immutable for the session.
    definitions: DashMap<(String, Option<u32>), Arc<WorkflowDef>>,
}

impl Inspector {
    pub fn new(api: Arc<dyn ExecutionApi>) -> Self {
        Self {
            api,
            definitions: DashMap::new(),
        }
    }

    pub fn api(&self) -> &dyn ExecutionApi {
        self.api.as_ref()
    }

    pub async fn execution_and_tasks(&self, execution_id: &str) -> Result<ExecutionAndTasks> {
        let scope = ExecutionScope::new(self.api.as_ref(), execution_id);
        let tasks = async {
            let tasks = self.api.tasks(execution_id).await?;
            debug!(execution_id, tasks = tasks.len(), "task list fetched");
            ForkResolver::resolve_with_defs(tasks, &scope).await
        };

        let (execution, resolution) = tokio::try_join!(self.api.execution(execution_id), tasks)?;
        info!(
            execution_id,
            status = %execution.status,
            tasks = resolution.tasks.len(),
            "execution snapshot ready"
        );

        Ok(ExecutionAndTasks {
            execution,
            tasks: resolution.tasks,
            forked_task_defs: resolution.forked_task_defs,
        })
    }

    /// Snapshot plus its graph. The definition embedded in the execution is
    /// preferred; otherwise it is fetched by name and version. Only a
    /// definition the server does not know is tolerated; any other fetch
    /// failure fails the cycle.
    pub async fn execution_graph(&self, execution_id: &str) -> Result<(ExecutionAndTasks, Graph)> {
        let snapshot = self.execution_and_tasks(execution_id).await?;
        let fallback = match snapshot.execution.workflow_definition {
            Some(_) => None,
            None => {
                let name = snapshot.execution.workflow_name.clone();
                let version = Some(snapshot.execution.workflow_version).filter(|v| *v > 0);
                match self.definition(&name, version).await {
                    Ok(def) => Some(def),
                    Err(Error::DefinitionNotFound(_)) => {
                        warn!(execution_id, workflow = %name, "definition not found, graph will only hold executed tasks");
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
        };
        let graph = DagBuilder::from_execution_and_tasks(&snapshot, fallback.as_deref());
        Ok((snapshot, graph))
    }

    pub async fn definition(&self, name: &str, version: Option<u32>) -> Result<Arc<WorkflowDef>> {
        let key = (name.to_string(), version);
        if let Some(def) = self.definitions.get(&key) {
            return Ok(def.clone());
        }
        let def = Arc::new(self.api.workflow_def(name, version).await?);
        info!(workflow = %def.name, version = def.version, tasks = def.tasks.len(), "definition loaded");
        self.definitions.insert(key, def.clone());
        Ok(def)
    }

    pub async fn definition_graph(&self, name: &str, version: Option<u32>) -> Result<Graph> {
        let def = self.definition(name, version).await?;
        Ok(DagBuilder::from_definition_only(&def))
    }
}
