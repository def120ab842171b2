use async_trait::async_trait;
use serde_json::{Map, Value};
use crate::dsl::WorkflowDef;
use crate::runtime::execution::Execution;
use crate::runtime::task::{ForkTaskInput, TaskResult};
use crate::error::Result;

pub mod http;

/// Read-only view of the orchestration server.
#[async_trait]
pub trait ExecutionApi: Send + Sync {
    async fn execution(&self, execution_id: &str) -> Result<Execution>;

    async fn tasks(&self, execution_id: &str) -> Result<Vec<TaskResult>>;

    async fn fork_input(&self, execution_id: &str, reference: &str, task_id: &str) -> Result<ForkTaskInput>;

    async fn workflow_def(&self, name: &str, version: Option<u32>) -> Result<WorkflowDef>;

    async fn variables(&self, execution_id: &str) -> Result<Map<String, Value>>;

    async fn input(&self, execution_id: &str) -> Result<Map<String, Value>>;

    async fn output(&self, execution_id: &str) -> Result<Map<String, Value>>;

    async fn task(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<TaskResult>;

    async fn task_input(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<Map<String, Value>>;

    async fn task_output(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<Map<String, Value>>;
}

/// Source of fork inputs for a single execution.
#[async_trait]
pub trait ForkInputSource: Send + Sync {
    async fn fork_input(&self, reference: &str, task_id: &str) -> Result<ForkTaskInput>;
}

/// Binds an [`ExecutionApi`] to one execution id.
pub struct ExecutionScope<'a> {
    api: &'a dyn ExecutionApi,
    execution_id: &'a str,
}

impl<'a> ExecutionScope<'a> {
    pub fn new(api: &'a dyn ExecutionApi, execution_id: &'a str) -> Self {
        Self { api, execution_id }
    }
}

#[async_trait]
impl ForkInputSource for ExecutionScope<'_> {
    async fn fork_input(&self, reference: &str, task_id: &str) -> Result<ForkTaskInput> {
        self.api.fork_input(self.execution_id, reference, task_id).await
    }
}
