use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use crate::dsl::{TaskConfig, TaskType};

string_enum! {
    pub enum TaskStatus {
        Scheduled => "SCHEDULED",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        CompletedWithErrors => "COMPLETED_WITH_ERRORS",
        Failed => "FAILED",
        FailedWithTerminalError => "FAILED_WITH_TERMINAL_ERROR",
        Canceled => "CANCELED",
        TimedOut => "TIMED_OUT",
        Skipped => "SKIPPED",
    }
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Scheduled | TaskStatus::InProgress)
    }
}

/// One execution attempt of a task reference name.
///
/// Several results may share a `reference_task_name` (retries, loop
/// iterations); their relative order is the order the server returned them in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub task_id: String,
    #[serde(default)]
    pub reference_task_name: String,
    pub task_type: TaskType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_def_name: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub scheduled_time: i64,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub seq: Option<String>,
    #[serde(default)]
    pub iteration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_for_incompletion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_for_ref: Option<String>,
    #[serde(default)]
    pub input_data: Map<String, Value>,
    #[serde(default)]
    pub output_data: Map<String, Value>,
    /// Set by fork resolution for children of a fork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_reference_name: Option<String>,
}

fn reached(ms: i64) -> Option<i64> {
    (ms > 0).then_some(ms)
}

impl TaskResult {
    pub fn new(task_id: &str, reference: &str, task_type: TaskType, status: TaskStatus) -> Self {
        Self {
            task_id: task_id.to_string(),
            reference_task_name: reference.to_string(),
            task_type,
            task_def_name: None,
            status,
            scheduled_time: 0,
            start_time: 0,
            end_time: 0,
            retry_count: 0,
            seq: None,
            iteration: 0,
            worker_id: None,
            domain: None,
            reason_for_incompletion: None,
            sub_workflow_id: None,
            alias_for_ref: None,
            input_data: Map::new(),
            output_data: Map::new(),
            parent_task_reference_name: None,
        }
    }

    pub fn scheduled_at(&self) -> Option<i64> {
        reached(self.scheduled_time)
    }

    pub fn started_at(&self) -> Option<i64> {
        reached(self.start_time)
    }

    pub fn ended_at(&self) -> Option<i64> {
        reached(self.end_time)
    }

    pub fn duration_ms(&self) -> Option<i64> {
        Some(self.ended_at()? - self.started_at()?)
    }
}

/// Input record of a fork task, listing the children it spawned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ForkTaskInput {
    #[serde(default)]
    pub forked_tasks: Vec<String>,
    #[serde(default)]
    pub forked_task_defs: Vec<TaskConfig>,
}
