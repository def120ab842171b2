use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use crate::dsl::{TaskConfig, WorkflowDef};
use crate::runtime::task::TaskResult;

string_enum! {
    pub enum WorkflowStatus {
        Running => "RUNNING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        TimedOut => "TIMED_OUT",
        Terminated => "TERMINATED",
        Paused => "PAUSED",
    }
}

/// Workflow-level runtime record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub workflow_id: String,
    #[serde(default)]
    pub workflow_name: String,
    #[serde(default)]
    pub workflow_version: u32,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
    #[serde(default)]
    pub input: Map<String, Value>,
    #[serde(default)]
    pub output: Map<String, Value>,
    #[serde(default)]
    pub variables: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_for_incompletion: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_definition: Option<WorkflowDef>,
}

impl Execution {
    pub fn new(workflow_id: &str, workflow_name: &str, status: WorkflowStatus) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            workflow_name: workflow_name.to_string(),
            workflow_version: 1,
            status,
            start_time: 0,
            end_time: 0,
            input: Map::new(),
            output: Map::new(),
            variables: Map::new(),
            reason_for_incompletion: None,
            tasks: Vec::new(),
            workflow_definition: None,
        }
    }
}

/// Fully resolved snapshot of one fetch cycle. Replaced wholesale on refetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionAndTasks {
    pub execution: Execution,
    /// Task results with fork parents assigned, in server order.
    pub tasks: Vec<TaskResult>,
    /// Definitions of dynamically forked tasks, keyed by reference name.
    pub forked_task_defs: BTreeMap<String, TaskConfig>,
}
