use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::client::ExecutionApi;
use crate::dsl::WorkflowDef;
use crate::error::{Error, Result};
use crate::runtime::execution::Execution;
use crate::runtime::task::{ForkTaskInput, TaskResult};

/// Offline dataset: executions (with their task lists) and definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub executions: Vec<Execution>,
    #[serde(default)]
    pub definitions: Vec<WorkflowDef>,
}

/// [`ExecutionApi`] served from memory. Fork inputs are read from the fork
/// task's own `inputData`, as the server does.
#[derive(Default)]
pub struct InMemoryApi {
    executions: DashMap<String, Execution>,
    definitions: DashMap<String, Vec<WorkflowDef>>,
    failing_tasks: DashSet<String>,
    failing_definitions: DashSet<String>,
    fork_input_calls: AtomicUsize,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let api = Self::new();
        for execution in fixture.executions {
            api.insert_execution(execution);
        }
        for def in fixture.definitions {
            api.insert_definition(def);
        }
        api
    }

    pub fn insert_execution(&self, execution: Execution) {
        self.executions.insert(execution.workflow_id.clone(), execution);
    }

    pub fn insert_definition(&self, def: WorkflowDef) {
        let mut versions = self.definitions.entry(def.name.clone()).or_default();
        versions.retain(|d| d.version != def.version);
        versions.push(def);
        versions.sort_by_key(|d| d.version);
    }

    /// Makes every fork-input lookup for `task_id` fail.
    pub fn fail_fork_input(&self, task_id: &str) {
        self.failing_tasks.insert(task_id.to_string());
    }

    /// Makes every definition lookup for `name` fail as unavailable.
    pub fn fail_definition(&self, name: &str) {
        self.failing_definitions.insert(name.to_string());
    }

    pub fn fork_input_calls(&self) -> usize {
        self.fork_input_calls.load(Ordering::SeqCst)
    }

    fn with_execution<T>(&self, execution_id: &str, f: impl FnOnce(&Execution) -> T) -> Result<T> {
        self.executions.get(execution_id)
            .map(|e| f(e.value()))
            .ok_or_else(|| Error::ExecutionNotFound(execution_id.to_string()))
    }

    fn find_task(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<TaskResult> {
        self.with_execution(execution_id, |e| {
            e.tasks.iter()
                .filter(|t| t.reference_task_name == reference)
                .filter(|t| task_id.is_none_or(|id| t.task_id == id))
                .last()
                .cloned()
        })?
        .ok_or_else(|| Error::status(
            format!("memory://{}/task/{}", execution_id, reference),
            404,
            "task not found",
        ))
    }
}

#[async_trait]
impl ExecutionApi for InMemoryApi {
    async fn execution(&self, execution_id: &str) -> Result<Execution> {
        self.with_execution(execution_id, Execution::clone)
    }

    async fn tasks(&self, execution_id: &str) -> Result<Vec<TaskResult>> {
        self.with_execution(execution_id, |e| e.tasks.clone())
    }

    async fn fork_input(&self, execution_id: &str, reference: &str, task_id: &str) -> Result<ForkTaskInput> {
        self.fork_input_calls.fetch_add(1, Ordering::SeqCst);
        let url = format!("memory://{}/task/{}/input", execution_id, reference);
        if self.failing_tasks.contains(task_id) {
            return Err(Error::status(url, 503, "fork input unavailable"));
        }
        let task = self.find_task(execution_id, reference, Some(task_id))?;
        serde_json::from_value(Value::Object(task.input_data))
            .map_err(|source| Error::Decode { url, source })
    }

    async fn workflow_def(&self, name: &str, version: Option<u32>) -> Result<WorkflowDef> {
        if self.failing_definitions.contains(name) {
            return Err(Error::status(format!("memory://metadata/workflow/{}", name), 503, "definition unavailable"));
        }
        let versions = self.definitions.get(name)
            .ok_or_else(|| Error::DefinitionNotFound(name.to_string()))?;
        let found = match version {
            Some(v) => versions.iter().find(|d| d.version == v),
            None => versions.last(),
        };
        found.cloned().ok_or_else(|| Error::DefinitionNotFound(format!("{} v{:?}", name, version)))
    }

    async fn variables(&self, execution_id: &str) -> Result<Map<String, Value>> {
        self.with_execution(execution_id, |e| e.variables.clone())
    }

    async fn input(&self, execution_id: &str) -> Result<Map<String, Value>> {
        self.with_execution(execution_id, |e| e.input.clone())
    }

    async fn output(&self, execution_id: &str) -> Result<Map<String, Value>> {
        self.with_execution(execution_id, |e| e.output.clone())
    }

    async fn task(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<TaskResult> {
        self.find_task(execution_id, reference, task_id)
    }

    async fn task_input(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<Map<String, Value>> {
        Ok(self.find_task(execution_id, reference, task_id)?.input_data)
    }

    async fn task_output(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<Map<String, Value>> {
        Ok(self.find_task(execution_id, reference, task_id)?.output_data)
    }
}
